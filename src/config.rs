pub mod defaults;
pub mod settings;
pub mod user;

pub use settings::{DiffSettings, MentionSettings, SyntaxConfig};
pub use user::{
    CONFIG_FILE_NAME, UserConfigError, UserConfigResult, load_config_file, load_user_config,
    user_config_path,
};

use defaults::default_settings;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

/// Something worth reporting that happened while loading settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }

    /// Forward this event to the `log` facade
    pub fn log(&self) {
        match self.kind {
            SettingsEventKind::Info => log::info!(target: "mentionkit::config", "{}", self.message),
            SettingsEventKind::Warning => {
                log::warn!(target: "mentionkit::config", "{}", self.message)
            }
        }
    }
}

#[derive(Default, Debug)]
pub struct SettingsLoadOutcome {
    pub settings: MentionSettings,
    pub events: Vec<SettingsEvent>,
}

/// Load layered settings.
///
/// Layers, lowest precedence first: built-in defaults, the user config, the
/// project config at `<root>/mentionkit.toml`, and an explicit config file.
/// A layer that fails to load is skipped with a warning event.
pub fn load_settings(root_path: Option<&Path>, explicit: Option<&Path>) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let defaults = Some(default_settings());

    let user_config = match load_user_config() {
        Ok(Some(settings)) => {
            events.push(SettingsEvent::info("Loaded user config"));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    };

    let project = root_path.and_then(|root| {
        load_layer(&root.join(CONFIG_FILE_NAME), "project config", &mut events)
    });
    let explicit = explicit.and_then(|path| {
        if !path.exists() {
            events.push(SettingsEvent::warning(format!(
                "Config file {} does not exist",
                path.display()
            )));
            return None;
        }
        load_layer(path, "config file", &mut events)
    });

    let settings = merge_all(&[defaults, user_config, project, explicit]).unwrap_or_default();
    SettingsLoadOutcome { settings, events }
}

fn load_layer(
    path: &Path,
    description: &str,
    events: &mut Vec<SettingsEvent>,
) -> Option<MentionSettings> {
    match load_config_file(path) {
        Ok(Some(settings)) => {
            events.push(SettingsEvent::info(format!(
                "Loaded {} from {}",
                description,
                path.display()
            )));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load {}: {}",
                description, err
            )));
            None
        }
    }
}

/// Merge multiple settings layers in order.
/// Later layers in the slice have higher precedence (override earlier ones).
pub fn merge_all(configs: &[Option<MentionSettings>]) -> Option<MentionSettings> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two settings layers, preferring values from `primary` over `fallback`.
///
/// Syntaxes merge by name: a syntax in `primary` overrides the fields it sets
/// on the same-named syntax in `fallback`, and new names are appended.
pub fn merge_settings(
    fallback: Option<MentionSettings>,
    primary: Option<MentionSettings>,
) -> Option<MentionSettings> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) | (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => {
            let mut syntaxes = fallback.syntaxes;
            for syntax in primary.syntaxes {
                match syntaxes.iter().position(|existing| existing.name == syntax.name) {
                    Some(index) => {
                        let existing = std::mem::take(&mut syntaxes[index]);
                        syntaxes[index] = existing.merged(syntax);
                    }
                    None => syntaxes.push(syntax),
                }
            }
            Some(MentionSettings {
                syntaxes,
                diff: primary.diff.or(fallback.diff),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::diff::DiffAlgorithm;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    fn syntax(name: &str, trigger: char) -> SyntaxConfig {
        SyntaxConfig {
            name: name.into(),
            starting_character: Some(trigger),
            ..Default::default()
        }
    }

    #[test]
    fn merge_overrides_by_name_and_appends_new_syntaxes() {
        let fallback = MentionSettings {
            syntaxes: vec![syntax("user", '@')],
            diff: None,
        };
        let primary = MentionSettings {
            syntaxes: vec![
                SyntaxConfig {
                    name: "user".into(),
                    missing_text: Some("Ghost".into()),
                    ..Default::default()
                },
                syntax("tag", '#'),
            ],
            diff: Some(DiffSettings {
                algorithm: DiffAlgorithm::Lcs,
            }),
        };

        let merged = merge_all(&[Some(fallback), None, Some(primary)]).unwrap();
        assert_eq!(merged.syntaxes.len(), 2);
        assert_eq!(merged.syntaxes[0].starting_character, Some('@'));
        assert_eq!(merged.syntaxes[0].missing_text.as_deref(), Some("Ghost"));
        assert_eq!(merged.syntaxes[1].name, "tag");
        assert_eq!(merged.diff_algorithm(), DiffAlgorithm::Lcs);
    }

    #[test]
    fn merge_all_of_nothing_is_none() {
        assert_eq!(merge_all(&[None, None]), None);
    }

    #[test]
    #[serial(xdg_env)]
    fn load_settings_layers_user_project_and_explicit() {
        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        let user_dir = TempDir::new().expect("failed to create user config temp dir");
        let project_dir = TempDir::new().expect("failed to create project temp dir");

        let user_config_dir = user_dir.path().join("mentionkit");
        fs::create_dir_all(&user_config_dir).expect("failed to create config dir");
        fs::write(
            user_config_dir.join(CONFIG_FILE_NAME),
            "[[syntaxes]]\nname = \"user\"\nmissingText = \"Nobody\"\n",
        )
        .expect("failed to write user config");
        fs::write(
            project_dir.path().join(CONFIG_FILE_NAME),
            "[[syntaxes]]\nname = \"tag\"\nstartingCharacter = \"#\"\n",
        )
        .expect("failed to write project config");
        let explicit = project_dir.path().join("override.toml");
        fs::write(&explicit, "[diff]\nalgorithm = \"patience\"\n")
            .expect("failed to write explicit config");

        // SAFETY: serialized with every other test touching XDG_CONFIG_HOME
        unsafe {
            env::set_var("XDG_CONFIG_HOME", user_dir.path());
        }
        let outcome = load_settings(Some(project_dir.path()), Some(&explicit));
        // SAFETY: Same as above - restoring original env state
        unsafe {
            match original_xdg {
                Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        let settings = outcome.settings;
        assert_eq!(settings.syntaxes.len(), 2);
        assert_eq!(settings.syntaxes[0].missing_text.as_deref(), Some("Nobody"));
        assert_eq!(settings.syntaxes[0].starting_character, Some('@'));
        assert_eq!(settings.syntaxes[1].starting_character, Some('#'));
        assert_eq!(settings.diff_algorithm(), DiffAlgorithm::Patience);
        assert_eq!(outcome.events.len(), 3);
        assert!(
            outcome
                .events
                .iter()
                .all(|event| event.kind == SettingsEventKind::Info)
        );
    }

    #[test]
    #[serial(xdg_env)]
    fn broken_project_config_is_skipped_with_warning() {
        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        let empty_user_dir = TempDir::new().expect("failed to create temp dir");
        let project_dir = TempDir::new().expect("failed to create project temp dir");
        fs::write(project_dir.path().join(CONFIG_FILE_NAME), "[[syntaxes]\n")
            .expect("failed to write project config");

        // SAFETY: serialized with every other test touching XDG_CONFIG_HOME
        unsafe {
            env::set_var("XDG_CONFIG_HOME", empty_user_dir.path());
        }
        let outcome = load_settings(Some(project_dir.path()), None);
        // SAFETY: Same as above - restoring original env state
        unsafe {
            match original_xdg {
                Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert_eq!(outcome.settings, default_settings());
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind, SettingsEventKind::Warning);
    }
}
