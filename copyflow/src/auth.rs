//! Access token validation.
//!
//! The pipeline never sees tokens. The service asks an injected
//! [`Authenticator`] before starting a run; how tokens are issued or stored
//! is up to the implementation.

use crate::config::AuthConfig;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

/// Decides whether a caller may trigger runs.
pub trait Authenticator: Send + Sync + Debug {
    /// Returns true if the token grants access.
    fn validate(&self, token: Option<&str>) -> bool;
}

/// Accepts every caller, with or without a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn validate(&self, _token: Option<&str>) -> bool {
        true
    }
}

/// Accepts only tokens from a fixed set.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashSet<String>,
}

impl StaticTokens {
    /// Creates an authenticator from a token list. Blank tokens are ignored.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.trim().is_empty())
                .collect(),
        }
    }

    /// Returns the number of accepted tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if no token is accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokens {
    fn validate(&self, token: Option<&str>) -> bool {
        token.is_some_and(|t| self.tokens.contains(t.trim()))
    }
}

/// Builds the authenticator for a configuration.
///
/// No configured tokens means the service is open.
#[must_use]
pub fn authenticator_from_config(config: &AuthConfig) -> Arc<dyn Authenticator> {
    let tokens = StaticTokens::new(config.tokens.iter().cloned());
    if tokens.is_empty() {
        Arc::new(AllowAll)
    } else {
        Arc::new(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.validate(None));
        assert!(AllowAll.validate(Some("anything")));
    }

    #[test]
    fn test_static_tokens() {
        let auth = StaticTokens::new(["secret", " "]);
        assert_eq!(auth.len(), 1);
        assert!(auth.validate(Some("secret")));
        assert!(!auth.validate(Some("guess")));
        assert!(!auth.validate(None));
    }

    #[test]
    fn test_from_config() {
        let open = authenticator_from_config(&AuthConfig::default());
        assert!(open.validate(None));

        let closed = authenticator_from_config(&AuthConfig {
            tokens: vec!["t1".to_string()],
        });
        assert!(!closed.validate(None));
        assert!(closed.validate(Some("t1")));
    }
}
