//! Round-robin credential pools
//!
//! Rotation is blind: no health checks, back-off or removal of bad keys.
//! Spreading requests over several quota-limited accounts is the only goal.

use crate::error::{PrimerError, Result};
use std::fmt;

/// A bearer-style API credential. Redacted in `Debug` and `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building request headers
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", redact(&self.0))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(&self.0))
    }
}

fn redact(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

/// Cycles through a fixed pool of credentials in order, wrapping at the end
#[derive(Debug, Clone)]
pub struct CredentialRotator {
    label: String,
    pool: Vec<Credential>,
    cursor: usize,
}

impl CredentialRotator {
    /// Create a rotator over `pool`. `label` names the provider in error messages.
    pub fn new<I, S>(label: &str, pool: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.to_string(),
            pool: pool
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.trim().is_empty())
                .map(Credential::new)
                .collect(),
            cursor: 0,
        }
    }

    /// Next credential in round-robin order
    pub fn next(&mut self) -> Result<Credential> {
        if self.pool.is_empty() {
            return Err(PrimerError::ConfigurationError(format!(
                "no credentials configured for '{}'",
                self.label
            )));
        }
        let credential = self.pool[self.cursor].clone();
        log::debug!(
            "{} credential {}/{} ({})",
            self.label,
            self.cursor + 1,
            self.pool.len(),
            credential
        );
        self.cursor = (self.cursor + 1) % self.pool.len();
        Ok(credential)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
