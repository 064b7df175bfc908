pub use super::model::{Country, Method, ParsedRequest, Rejection};

pub trait RequestParser: Send + Sync {
    /// Extract the counted fields from one raw log line.
    fn parse(&self, raw: &str) -> Result<ParsedRequest, Rejection>;
}
