//! Runtime settings for the dispatch registry.

use serde::Deserialize;

/// Registry settings. Every field has a default, so the struct can be
/// embedded in a host configuration file as an optional table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Placeholder rendered for absent values.
    pub null_text: String,
    /// Result text for calls that return nothing.
    pub void_text: String,
    /// Isolate panicking formatters and render the fallback instead.
    pub catch_panics: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            null_text: "null".to_string(),
            void_text: "void".to_string(),
            catch_panics: true,
        }
    }
}
