use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Sentinel rendered for a country token that is not a two-letter code.
pub const UNKNOWN_COUNTRY: &str = "-";

/// Why a line was not counted.
///
/// Rejections are an expected outcome for access logs and never stop the
/// pipeline. Each variant maps to a stable reason string used in
/// diagnostics and in the `outcome` label of the lines counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Rejection {
    #[error("too few tokens: {found} (need at least {required})")]
    TooFewTokens { found: usize, required: usize },

    #[error("domain does not look like a hostname")]
    BadDomain,

    #[error("method is neither GET nor POST")]
    BadMethod,

    #[error("status code is not 2xx-5xx")]
    BadStatusCode,

    #[error("duration is not a decimal literal")]
    BadDuration,
}

impl Rejection {
    /// Number of distinct rejection reasons.
    pub const COUNT: usize = 5;

    /// Reason strings in index order.
    pub const REASONS: [&'static str; Self::COUNT] = [
        "too-few-tokens",
        "bad-domain",
        "bad-method",
        "bad-status-code",
        "bad-duration",
    ];

    pub fn as_str(&self) -> &'static str {
        Self::REASONS[self.index()]
    }

    /// Dense index, used for per-reason counters.
    pub fn index(&self) -> usize {
        match self {
            Rejection::TooFewTokens { .. } => 0,
            Rejection::BadDomain => 1,
            Rejection::BadMethod => 2,
            Rejection::BadStatusCode => 3,
            Rejection::BadDuration => 4,
        }
    }
}

/// Country dimension of a request.
///
/// This is the only lenient field: a token that is not two ASCII letters
/// becomes `Unknown` instead of rejecting the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Country {
    Code(String),
    Unknown,
}

impl Country {
    pub fn as_str(&self) -> &str {
        match self {
            Country::Code(code) => code,
            Country::Unknown => UNKNOWN_COUNTRY,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Country::Unknown)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP methods that are counted. Anything else rejects the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl FromStr for Method {
    type Err = Rejection;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(Rejection::BadMethod),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields extracted from one accepted access log line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub country: Country,
    pub domain: String,
    pub method: Method,
    /// Three digits, first one in 2..=5.
    pub status_code: u16,
    pub duration_seconds: f64,
}
