//! Anti-forgery token scraping.
//!
//! The service embeds its tokens in rendered pages rather than handing them
//! out through an API, so extraction is a text search. Call sites only see
//! [`TokenExtractor`]; the strategy can change with the markup.

use regex::Regex;

/// Pulls a token out of a page body.
pub trait TokenExtractor: Send + Sync {
    /// Return the first token found in `body`, if any.
    fn extract(&self, body: &str) -> Option<String>;
}

/// Token sits between a fixed prefix marker and a terminator.
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    marker: String,
    terminator: char,
}

impl MarkerExtractor {
    pub fn new(marker: impl Into<String>, terminator: char) -> Self {
        Self {
            marker: marker.into(),
            terminator,
        }
    }

    /// Hidden `_token` field of the login form.
    pub fn login_form() -> Self {
        Self::new(r#"name="_token" value=""#, '"')
    }

    /// `csrfToken: '…'` in the inline bootstrap script of authenticated pages.
    pub fn inline_script() -> Self {
        Self::new("csrfToken: '", '\'')
    }
}

impl TokenExtractor for MarkerExtractor {
    fn extract(&self, body: &str) -> Option<String> {
        let (_, tail) = body.split_once(self.marker.as_str())?;
        let (token, _) = tail.split_once(self.terminator)?;
        (!token.is_empty()).then(|| token.to_string())
    }
}

/// Token is the first capture group of a pattern.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
}

impl RegexExtractor {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl TokenExtractor for RegexExtractor {
    fn extract(&self, body: &str) -> Option<String> {
        self.pattern
            .captures(body)?
            .get(1)
            .map(|m| m.as_str().to_string())
            .filter(|t| !t.is_empty())
    }
}
