use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A normalized registrable hostname: lowercase, no scheme/port/path, at most
/// one leading "www." stripped. The unit of blocking, learning and
/// whitelisting; equality is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Box<str>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid domain: {0:?}")]
pub struct InvalidDomain(pub String);

impl Domain {
    /// Validates a user-entered bare domain ("tracker.io"). Rejects empty
    /// input and anything that still carries URL syntax.
    pub fn parse(input: &str) -> Result<Self, InvalidDomain> {
        let lowered = input.trim().to_ascii_lowercase();
        let host = lowered.strip_prefix("www.").unwrap_or(&lowered);
        if host.is_empty()
            || host
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '/' | ':' | '?' | '#' | '@'))
        {
            return Err(InvalidDomain(input.to_string()));
        }
        Ok(Domain(host.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets hash-set lookups take a &str without allocating a Domain.
impl std::borrow::Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Extracts the canonical host from a URL-like string.
///
/// `None` is the explicit unknown marker: it never matches any list and is
/// never counted. An empty hostname is never produced.
pub fn normalize(input: &str) -> Option<Domain> {
    let url = Url::parse(input).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }
    Some(Domain(host.into()))
}
