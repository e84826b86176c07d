//! CSS selectors, parsed and matched by `scraper`.

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;

use crate::error::DomError;

/// A parsed selector list.
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    parsed: scraper::Selector,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let parsed =
            scraper::Selector::parse(source).map_err(|e| DomError::InvalidSelector {
                selector: source.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            parsed,
        })
    }

    /// The selector text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn compiled(&self) -> &scraper::Selector {
        &self.parsed
    }
}
