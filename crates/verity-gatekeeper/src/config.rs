//! Gatekeeper configuration

/// Configuration for field validation rules
///
/// Score ranges ([0, 1] for quality, strength and weights) are always
/// enforced. The presets only move the text limits.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Reject claims with an empty title
    pub require_title: bool,

    /// Maximum title length in characters
    pub max_title_len: usize,

    /// Maximum statement length in characters
    pub max_statement_len: usize,

    /// Maximum number of topic tags on a claim
    pub max_topic_tags: usize,

    /// Maximum source locator length in characters
    pub max_source_len: usize,

    /// Maximum quoted passage length in characters
    pub max_quote_len: usize,

    /// Maximum method description length in characters
    pub max_description_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_title: true,
            max_title_len: 300,
            max_statement_len: 10_000,
            max_topic_tags: 32,
            max_source_len: 2_048,
            max_quote_len: 10_000,
            max_description_len: 10_000,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (only ranges and non-empty statements)
    pub fn permissive() -> Self {
        Self {
            require_title: false,
            max_title_len: usize::MAX,
            max_statement_len: usize::MAX,
            max_topic_tags: usize::MAX,
            max_source_len: usize::MAX,
            max_quote_len: usize::MAX,
            max_description_len: usize::MAX,
        }
    }

    /// Create a strict configuration (tight text limits)
    pub fn strict() -> Self {
        Self {
            require_title: true,
            max_title_len: 150,
            max_statement_len: 2_000,
            max_topic_tags: 8,
            max_source_len: 1_024,
            max_quote_len: 2_000,
            max_description_len: 4_000,
        }
    }

    /// Look up a preset by name ("default", "permissive", "strict")
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "permissive" => Some(Self::permissive()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }
}
