//! Layout: which token of a normalized line carries which field.
//!
//! Extraction is purely positional. Changing the nginx `log_format`
//! without updating this table silently breaks parsing, so the table is
//! kept in one place and can be overridden from configuration.

use serde::{Deserialize, Serialize};

/// A field the parser extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Country,
    Domain,
    Method,
    StatusCode,
    Duration,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Country,
        Field::Domain,
        Field::Method,
        Field::StatusCode,
        Field::Duration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Country => "country",
            Field::Domain => "domain",
            Field::Method => "method",
            Field::StatusCode => "status_code",
            Field::Duration => "duration",
        }
    }
}

/// Zero-based token positions plus the minimum token count a line needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLayout {
    pub min_tokens: usize,
    pub country: usize,
    pub domain: usize,
    pub method: usize,
    pub status_code: usize,
    pub duration: usize,
}

impl FieldLayout {
    /// `$remote_addr ($geoip_country_code) - $remote_user [$time_local] $host
    /// $request $status $body_bytes_sent $request_time ...`
    pub const NGINX_GEOIP: FieldLayout = FieldLayout {
        min_tokens: 16,
        country: 1,
        domain: 6,
        method: 7,
        status_code: 10,
        duration: 12,
    };

    pub fn position(&self, field: Field) -> usize {
        match field {
            Field::Country => self.country,
            Field::Domain => self.domain,
            Field::Method => self.method,
            Field::StatusCode => self.status_code,
            Field::Duration => self.duration,
        }
    }

    /// Every position must fall inside the guaranteed token range.
    pub fn validate(&self) -> Result<(), String> {
        for field in Field::ALL {
            let pos = self.position(field);
            if pos >= self.min_tokens {
                return Err(format!(
                    "layout.{} = {} is outside layout.min_tokens = {}",
                    field.as_str(),
                    pos,
                    self.min_tokens
                ));
            }
        }
        Ok(())
    }
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self::NGINX_GEOIP
    }
}
