//! Grammar: line normalization and the per-field acceptance patterns.

use regex::Regex;

/// Acceptance patterns for the regex-validated fields.
pub struct Patterns;

impl Patterns {
    /// Two ASCII letters, after parentheses are stripped.
    pub const COUNTRY: &'static str = r"^[a-zA-Z]{2}$";

    /// A 3-63 character label followed by one or more alphabetic labels of
    /// at least two letters.
    pub const DOMAIN: &'static str =
        r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,61}[a-zA-Z0-9](?:\.[a-zA-Z]{2,})+$";

    pub const STATUS_CODE: &'static str = r"^[2345][0-9][0-9]$";

    /// Both sides of the decimal point may be empty.
    pub const DURATION: &'static str = r"^[0-9]*\.[0-9]*$";
}

/// Field grammars compiled once and shared by every parsed line.
#[derive(Debug, Clone)]
pub struct Grammars {
    country: Regex,
    domain: Regex,
    status_code: Regex,
    duration: Regex,
}

impl Grammars {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            country: Regex::new(Patterns::COUNTRY)?,
            domain: Regex::new(Patterns::DOMAIN)?,
            status_code: Regex::new(Patterns::STATUS_CODE)?,
            duration: Regex::new(Patterns::DURATION)?,
        })
    }

    #[inline]
    pub fn is_country(&self, s: &str) -> bool {
        self.country.is_match(s)
    }

    #[inline]
    pub fn is_domain(&self, s: &str) -> bool {
        self.domain.is_match(s)
    }

    #[inline]
    pub fn is_status_code(&self, s: &str) -> bool {
        self.status_code.is_match(s)
    }

    #[inline]
    pub fn is_duration(&self, s: &str) -> bool {
        self.duration.is_match(s)
    }
}

/// Remove every `"` and collapse runs of spaces into one.
///
/// Quotes go first so that an emptied `""` token cannot leave a double
/// space behind; this keeps `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_space = false;
    for c in raw.chars() {
        match c {
            '"' => continue,
            ' ' if prev_space => continue,
            ' ' => {
                prev_space = true;
                out.push(c);
            }
            _ => {
                prev_space = false;
                out.push(c);
            }
        }
    }
    out
}
