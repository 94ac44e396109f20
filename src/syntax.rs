//! Mention syntax definitions and the registry that matches them in markup.
//!
//! A mention is written in markup as `prefix + startingCharacter + id + suffix`,
//! e.g. `<###@42###>`. Matching is a small hand-written descent: literal
//! prefix, literal trigger, one or more id characters, literal suffix. The id
//! run is consumed greedily and backtracks only as far as needed for the suffix
//! to match.

use crate::error::{MentionError, MentionResult};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_PREFIX: &str = "<###";
pub const DEFAULT_SUFFIX: &str = "###>";
pub const DEFAULT_INNER_PATTERN: &str = "[A-Za-z0-9_-]";
pub const DEFAULT_MISSING_TEXT: &str = "Unknown";

/// Character class describing one character of a mention id.
#[derive(Clone)]
enum IdCharset {
    /// ASCII letters, digits, `_` and `-` (same as [`DEFAULT_INNER_PATTERN`])
    Default,
    /// A user-supplied class, compiled to match exactly one character
    Pattern(Regex),
}

impl IdCharset {
    fn compile(pattern: &str) -> Result<Self, regex::Error> {
        if pattern == DEFAULT_INNER_PATTERN {
            return Ok(IdCharset::Default);
        }
        Regex::new(&format!("^(?:{pattern})$")).map(IdCharset::Pattern)
    }

    fn accepts(&self, ch: char) -> bool {
        match self {
            IdCharset::Default => ch.is_ascii_alphanumeric() || ch == '_' || ch == '-',
            IdCharset::Pattern(regex) => {
                let mut buf = [0u8; 4];
                regex.is_match(ch.encode_utf8(&mut buf))
            }
        }
    }
}

/// How a mention kind is written in markup and triggered in plain text.
#[derive(Clone)]
pub struct MentionSyntax {
    name: String,
    starting_character: char,
    prefix: String,
    suffix: String,
    inner_pattern: String,
    charset: IdCharset,
    missing_text: String,
}

impl MentionSyntax {
    /// Create a syntax with the default delimiters, id pattern and missing text.
    pub fn new(name: impl Into<String>, starting_character: char) -> Self {
        Self {
            name: name.into(),
            starting_character,
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            inner_pattern: DEFAULT_INNER_PATTERN.to_string(),
            charset: IdCharset::Default,
            missing_text: DEFAULT_MISSING_TEXT.to_string(),
        }
    }

    pub fn with_delimiters(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    /// Replace the id character class.
    ///
    /// `pattern` must be a regular expression matching exactly one character,
    /// such as `[a-z0-9.]`.
    pub fn with_inner_pattern(mut self, pattern: impl Into<String>) -> MentionResult<Self> {
        let pattern = pattern.into();
        self.charset = IdCharset::compile(&pattern)
            .map_err(|err| MentionError::invalid_syntax(&self.name, err.to_string()))?;
        self.inner_pattern = pattern;
        Ok(self)
    }

    pub fn with_missing_text(mut self, missing_text: impl Into<String>) -> Self {
        self.missing_text = missing_text.into();
        self
    }

    /// Reject definitions the engine cannot work with.
    pub fn validate(&self) -> MentionResult<()> {
        if self.starting_character.is_whitespace() {
            return Err(MentionError::invalid_syntax(
                &self.name,
                "starting character must not be whitespace",
            ));
        }
        if self.charset.accepts(self.starting_character) && self.prefix.is_empty() {
            return Err(MentionError::invalid_syntax(
                &self.name,
                "starting character is also an id character and no prefix separates them",
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn starting_character(&self) -> char {
        self.starting_character
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn inner_pattern(&self) -> &str {
        &self.inner_pattern
    }

    pub fn missing_text(&self) -> &str {
        &self.missing_text
    }

    /// True if `ch` may appear in an id of this syntax
    pub fn accepts_id_char(&self, ch: char) -> bool {
        self.charset.accepts(ch)
    }

    /// Markup for a mention of `id`
    pub fn encode(&self, id: &str) -> String {
        let mut out =
            String::with_capacity(self.prefix.len() + id.len() + self.suffix.len() + 4);
        out.push_str(&self.prefix);
        out.push(self.starting_character);
        out.push_str(id);
        out.push_str(&self.suffix);
        out
    }

    /// Visible run for a mention displayed as `display_name`
    pub fn display_run(&self, display_name: &str) -> String {
        let mut out = String::with_capacity(display_name.len() + 4);
        out.push(self.starting_character);
        out.push_str(display_name);
        out
    }

    /// Match this syntax starting exactly at byte `offset` of `markup`.
    ///
    /// Returns the id and the byte length of the whole match.
    pub fn match_at(&self, markup: &str, offset: usize) -> Option<(String, usize)> {
        let rest = markup.get(offset..)?;
        let after_prefix = rest.strip_prefix(self.prefix.as_str())?;
        let after_trigger = after_prefix.strip_prefix(self.starting_character)?;

        // Byte ends of each candidate id, shortest first
        let id_ends: Vec<usize> = after_trigger
            .char_indices()
            .take_while(|(_, ch)| self.charset.accepts(*ch))
            .map(|(pos, ch)| pos + ch.len_utf8())
            .collect();

        let id_end = id_ends
            .into_iter()
            .rev()
            .find(|end| after_trigger[*end..].starts_with(self.suffix.as_str()))?;

        let id = &after_trigger[..id_end];
        let head = rest.len() - after_trigger.len();
        Some((id.to_string(), head + id_end + self.suffix.len()))
    }
}

impl fmt::Debug for MentionSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionSyntax")
            .field("name", &self.name)
            .field("starting_character", &self.starting_character)
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("inner_pattern", &self.inner_pattern)
            .field("missing_text", &self.missing_text)
            .finish()
    }
}

impl PartialEq for MentionSyntax {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.starting_character == other.starting_character
            && self.prefix == other.prefix
            && self.suffix == other.suffix
            && self.inner_pattern == other.inner_pattern
            && self.missing_text == other.missing_text
    }
}

impl Eq for MentionSyntax {}

/// A successful markup match
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxMatch {
    pub syntax: Arc<MentionSyntax>,
    pub id: String,
    /// Byte length of the whole `prefix + trigger + id + suffix` run
    pub matched_len: usize,
}

/// The set of syntaxes known to a controller.
///
/// The registry does not arbitrate between syntaxes sharing a starting
/// character: the first registered one wins. Use
/// [`SyntaxRegistry::new_strict`] to reject such conflicts up front.
#[derive(Clone, Debug, Default)]
pub struct SyntaxRegistry {
    syntaxes: Vec<Arc<MentionSyntax>>,
}

impl SyntaxRegistry {
    pub fn new(syntaxes: impl IntoIterator<Item = MentionSyntax>) -> Self {
        Self {
            syntaxes: syntaxes.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build a registry, validating each syntax and rejecting shared triggers.
    pub fn new_strict(syntaxes: impl IntoIterator<Item = MentionSyntax>) -> MentionResult<Self> {
        let registry = Self::new(syntaxes);
        for (index, syntax) in registry.syntaxes.iter().enumerate() {
            syntax.validate()?;
            let trigger = syntax.starting_character();
            if registry.syntaxes[..index]
                .iter()
                .any(|earlier| earlier.starting_character() == trigger)
            {
                return Err(MentionError::DuplicateTrigger { trigger });
            }
        }
        Ok(registry)
    }

    pub fn is_empty(&self) -> bool {
        self.syntaxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.syntaxes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MentionSyntax>> {
        self.syntaxes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MentionSyntax>> {
        self.syntaxes.iter().find(|syntax| syntax.name() == name)
    }

    pub fn for_trigger(&self, ch: char) -> Option<&Arc<MentionSyntax>> {
        self.syntaxes
            .iter()
            .find(|syntax| syntax.starting_character() == ch)
    }

    /// The syntax whose starting character is exactly `text`, if any.
    pub fn for_trigger_text(&self, text: &str) -> Option<&Arc<MentionSyntax>> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => self.for_trigger(ch),
            _ => None,
        }
    }

    /// Match any registered syntax starting exactly at byte `offset`.
    ///
    /// No leftward search is done.
    pub fn match_at(&self, markup: &str, offset: usize) -> Option<SyntaxMatch> {
        self.syntaxes.iter().find_map(|syntax| {
            syntax
                .match_at(markup, offset)
                .map(|(id, matched_len)| SyntaxMatch {
                    syntax: Arc::clone(syntax),
                    id,
                    matched_len,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user() -> MentionSyntax {
        MentionSyntax::new("user", '@')
    }

    #[rstest]
    #[case("<###@42###>", 0, Some(("42", 11)))]
    #[case("Hi <###@bob_1###>!", 3, Some(("bob_1", 14)))]
    #[case("Hi <###@bob###>!", 2, None)]
    #[case("<###@###>", 0, None)]
    #[case("<###@4 2###>", 0, None)]
    #[case("<###@42##>", 0, None)]
    #[case("<####42###>", 0, None)]
    fn match_at_default_user_syntax(
        #[case] markup: &str,
        #[case] offset: usize,
        #[case] expected: Option<(&str, usize)>,
    ) {
        let got = user().match_at(markup, offset);
        assert_eq!(
            got.as_ref().map(|(id, len)| (id.as_str(), *len)),
            expected
        );
    }

    #[test]
    fn id_backtracks_when_suffix_starts_with_an_id_character() {
        let syntax = MentionSyntax::new("tag", '#')
            .with_delimiters("[", "-]")
            .with_inner_pattern("[a-z-]")
            .unwrap();
        assert_eq!(
            syntax.match_at("[#rust-lang-]", 0),
            Some(("rust-lang".to_string(), 13))
        );
    }

    #[test]
    fn custom_pattern_accepts_non_ascii_ids() {
        let syntax = MentionSyntax::new("item", '$')
            .with_inner_pattern(r"\w")
            .unwrap();
        assert_eq!(
            syntax.match_at("<###$zoë###>", 0),
            Some(("zoë".to_string(), 13))
        );
    }

    #[test]
    fn invalid_inner_pattern_is_rejected() {
        let err = MentionSyntax::new("user", '@')
            .with_inner_pattern("[a-")
            .unwrap_err();
        assert!(matches!(err, MentionError::InvalidSyntax { .. }));
    }

    #[test]
    fn whitespace_trigger_fails_validation() {
        assert!(MentionSyntax::new("blank", ' ').validate().is_err());
        assert!(user().validate().is_ok());
    }

    #[test]
    fn encode_and_display_run() {
        let syntax = user();
        assert_eq!(syntax.encode("42"), "<###@42###>");
        assert_eq!(syntax.display_run("Amber"), "@Amber");
    }

    #[test]
    fn registry_first_registered_syntax_wins_on_shared_trigger() {
        let registry = SyntaxRegistry::new([
            MentionSyntax::new("user", '@'),
            MentionSyntax::new("team", '@'),
        ]);
        let found = registry.match_at("<###@x###>", 0).unwrap();
        assert_eq!(found.syntax.name(), "user");
        assert_eq!(registry.for_trigger('@').unwrap().name(), "user");
    }

    #[test]
    fn strict_registry_rejects_shared_trigger() {
        let err = SyntaxRegistry::new_strict([
            MentionSyntax::new("user", '@'),
            MentionSyntax::new("team", '@'),
        ])
        .unwrap_err();
        assert!(matches!(err, MentionError::DuplicateTrigger { trigger: '@' }));
    }

    #[test]
    fn for_trigger_text_requires_exactly_one_character() {
        let registry = SyntaxRegistry::new([user(), MentionSyntax::new("tag", '#')]);
        assert_eq!(registry.for_trigger_text("#").unwrap().name(), "tag");
        assert!(registry.for_trigger_text("@@").is_none());
        assert!(registry.for_trigger_text("").is_none());
        assert!(registry.for_trigger_text("!").is_none());
    }
}
