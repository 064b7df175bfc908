use crate::error::{ExporterError, ExporterResult};
use crate::parser::grammar::{normalize, Grammars};
use crate::parser::layout::{Field, FieldLayout};
use crate::parser::traits::{Country, Method, ParsedRequest, Rejection, RequestParser};

/// Parser for space-delimited nginx access logs with a GeoIP country column.
///
/// Fields are validated in layout order (domain, method, status code,
/// duration) and the first failing field rejects the whole line. The
/// country is lenient and falls back to [`Country::Unknown`].
#[derive(Debug, Clone)]
pub struct AccessLogParser {
    grammars: Grammars,
    layout: FieldLayout,
}

impl AccessLogParser {
    /// Fails if a field position lies outside `min_tokens`; `parse` indexes
    /// tokens by position right after the token count check.
    pub fn new(layout: FieldLayout) -> ExporterResult<Self> {
        layout.validate().map_err(ExporterError::Layout)?;
        Ok(Self {
            grammars: Grammars::new()?,
            layout,
        })
    }

    fn country(&self, token: &str) -> Country {
        let stripped: String = token.chars().filter(|c| *c != '(' && *c != ')').collect();
        if self.grammars.is_country(&stripped) {
            Country::Code(stripped)
        } else {
            Country::Unknown
        }
    }

    fn duration(&self, token: &str) -> Result<f64, Rejection> {
        if !self.grammars.is_duration(token) {
            return Err(Rejection::BadDuration);
        }
        // A bare "." passes the grammar but is not a number; it counts as 0.
        Ok(token.parse::<f64>().unwrap_or(0.0))
    }
}

impl RequestParser for AccessLogParser {
    fn parse(&self, raw: &str) -> Result<ParsedRequest, Rejection> {
        let line = normalize(raw);
        let tokens: Vec<&str> = line.split(' ').collect();

        if tokens.len() < self.layout.min_tokens {
            return Err(Rejection::TooFewTokens {
                found: tokens.len(),
                required: self.layout.min_tokens,
            });
        }
        let token = |field: Field| tokens[self.layout.position(field)];

        let country = self.country(token(Field::Country));

        let domain = token(Field::Domain);
        if !self.grammars.is_domain(domain) {
            return Err(Rejection::BadDomain);
        }

        let method: Method = token(Field::Method).parse()?;

        let code = token(Field::StatusCode);
        if !self.grammars.is_status_code(code) {
            return Err(Rejection::BadStatusCode);
        }
        let status_code = code.parse::<u16>().map_err(|_| Rejection::BadStatusCode)?;

        let duration_seconds = self.duration(token(Field::Duration))?;

        Ok(ParsedRequest {
            country,
            domain: domain.to_string(),
            method,
            status_code,
            duration_seconds,
        })
    }
}
