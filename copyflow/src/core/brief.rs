//! Client briefs and slug derivation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[^\p{Alphabetic}\p{N}]+").expect("slug pattern is valid")
});

/// Derives a filesystem-safe slug from a client name.
///
/// Lowercases the name, collapses every run of non-alphanumeric characters
/// into a single `-`, and trims leading and trailing dashes. Letters and
/// digits outside ASCII are kept.
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// The immutable input to one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    client_name: String,
    slug: String,
    text: String,
}

impl Brief {
    /// Creates a brief, deriving the slug from the client name.
    #[must_use]
    pub fn new(client_name: impl Into<String>, text: impl Into<String>) -> Self {
        let client_name = client_name.into().trim().to_string();
        let slug = slugify(&client_name);
        Self {
            client_name,
            slug,
            text: text.into(),
        }
    }

    /// Returns the client name.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Returns the client slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Returns the brief text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}
