//! Default configuration values for mentionkit.
//!
//! These are the lowest config layer and what `mentionkit config` prints
//! when no config file exists.

use super::settings::{DiffSettings, MentionSettings, SyntaxConfig};
use crate::syntax::{
    DEFAULT_INNER_PATTERN, DEFAULT_MISSING_TEXT, DEFAULT_PREFIX, DEFAULT_SUFFIX, MentionSyntax,
    SyntaxRegistry,
};

/// Name of the syntax registered when nothing else is configured
pub const DEFAULT_SYNTAX_NAME: &str = "user";

/// Returns the default settings: a single `@` user mention syntax.
pub fn default_settings() -> MentionSettings {
    MentionSettings {
        syntaxes: vec![SyntaxConfig {
            name: DEFAULT_SYNTAX_NAME.to_string(),
            starting_character: Some('@'),
            prefix: Some(DEFAULT_PREFIX.to_string()),
            suffix: Some(DEFAULT_SUFFIX.to_string()),
            inner_pattern: Some(DEFAULT_INNER_PATTERN.to_string()),
            missing_text: Some(DEFAULT_MISSING_TEXT.to_string()),
        }],
        diff: Some(DiffSettings::default()),
    }
}

/// Registry equivalent to [`default_settings`]
pub fn default_registry() -> SyntaxRegistry {
    SyntaxRegistry::new([MentionSyntax::new(DEFAULT_SYNTAX_NAME, '@')])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_compile_to_default_registry() {
        let built = default_settings().build_registry().unwrap();
        let expected = default_registry();
        assert_eq!(built.len(), 1);
        assert_eq!(
            built.get(DEFAULT_SYNTAX_NAME).map(|s| s.as_ref()),
            expected.get(DEFAULT_SYNTAX_NAME).map(|s| s.as_ref())
        );
    }

    #[test]
    fn default_settings_serialize_to_toml() {
        let toml_str = toml::to_string_pretty(&default_settings())
            .expect("should serialize to TOML without error");
        assert!(toml_str.contains("startingCharacter = \"@\""));
        assert!(toml_str.contains("algorithm = \"myers\""));

        let parsed: MentionSettings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, default_settings());
    }
}
