use crate::error::{MentionError, MentionResult};
use crate::syntax::{MentionSyntax, SyntaxRegistry};
use crate::text::diff::DiffAlgorithm;
use serde::{Deserialize, Serialize};

/// One `[[syntaxes]]` table.
///
/// Every field but `name` is optional so that a later config layer can
/// override a single field of a syntax defined by an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_character: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_text: Option<String>,
}

impl SyntaxConfig {
    /// Compile into a syntax, filling unset fields with the built-in defaults.
    pub fn to_syntax(&self) -> MentionResult<MentionSyntax> {
        let trigger = self.starting_character.ok_or_else(|| {
            MentionError::config(format!(
                "syntax '{}' has no startingCharacter",
                self.name
            ))
        })?;

        let mut syntax = MentionSyntax::new(&self.name, trigger);
        if self.prefix.is_some() || self.suffix.is_some() {
            let prefix = self.prefix.as_deref().unwrap_or(syntax.prefix()).to_string();
            let suffix = self.suffix.as_deref().unwrap_or(syntax.suffix()).to_string();
            syntax = syntax.with_delimiters(prefix, suffix);
        }
        if let Some(pattern) = &self.inner_pattern {
            syntax = syntax.with_inner_pattern(pattern.as_str())?;
        }
        if let Some(missing_text) = &self.missing_text {
            syntax = syntax.with_missing_text(missing_text.as_str());
        }
        Ok(syntax)
    }

    /// Field-wise merge; values set in `primary` win.
    pub fn merged(self, primary: SyntaxConfig) -> SyntaxConfig {
        SyntaxConfig {
            name: primary.name,
            starting_character: primary.starting_character.or(self.starting_character),
            prefix: primary.prefix.or(self.prefix),
            suffix: primary.suffix.or(self.suffix),
            inner_pattern: primary.inner_pattern.or(self.inner_pattern),
            missing_text: primary.missing_text.or(self.missing_text),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSettings {
    #[serde(default)]
    pub algorithm: DiffAlgorithm,
}

/// Contents of a `mentionkit.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syntaxes: Vec<SyntaxConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffSettings>,
}

impl MentionSettings {
    pub fn diff_algorithm(&self) -> DiffAlgorithm {
        self.diff.map(|diff| diff.algorithm).unwrap_or_default()
    }

    /// Compile all syntaxes into a registry, rejecting shared triggers.
    pub fn build_registry(&self) -> MentionResult<SyntaxRegistry> {
        let syntaxes = self
            .syntaxes
            .iter()
            .map(SyntaxConfig::to_syntax)
            .collect::<MentionResult<Vec<_>>>()?;
        SyntaxRegistry::new_strict(syntaxes)
    }
}
