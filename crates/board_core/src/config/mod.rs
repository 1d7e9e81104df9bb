use crate::error::AppError;
use crate::store::StoreOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "BOARD_CONFIG_PATH";

fn default_seed() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Artificial pause before a create operation is applied.
    #[serde(default)]
    pub creation_delay_ms: u64,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default = "default_seed")]
    pub seed_default_project: bool,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            creation_delay_ms: 0,
            log_level: None,
            seed_default_project: true,
            aliases: HashMap::new(),
        }
    }
}

impl Config {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            creation_delay: Duration::from_millis(self.creation_delay_ms),
            seed_default: self.seed_default_project,
        }
    }

    /// Rewrites the first word of `args` when it names an alias.
    pub fn expand_alias(&self, args: Vec<String>) -> Vec<String> {
        let Some(expansion) = args.first().and_then(|first| self.aliases.get(first)) else {
            return args;
        };
        expansion
            .split_whitespace()
            .map(str::to_string)
            .chain(args.into_iter().skip(1))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub creation_delay_ms: Option<u64>,
    pub log_level: Option<String>,
    pub seed_default_project: Option<bool>,
    pub aliases: HashMap<String, String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("board").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("board")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(delay) = overrides.creation_delay_ms {
        merged.creation_delay_ms = delay;
    }
    if let Some(level) = overrides.log_level.as_ref() {
        merged.log_level = Some(level.clone());
    }
    if let Some(seed) = overrides.seed_default_project {
        merged.seed_default_project = seed;
    }

    for (alias, value) in overrides.aliases.iter() {
        merged.aliases.insert(alias.clone(), value.clone());
    }

    merged
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    CreationDelayMs,
    LogLevel,
    SeedDefaultProject,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, AppError> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| AppError::validation("override must be in KEY=VALUE format"))?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonicalize_key(field)
        .ok_or_else(|| AppError::validation("override key cannot be empty"))?;

    let scalar = |target: ConfigOverrideTarget| {
        if remainder.is_some() {
            Err(AppError::validation(format!(
                "{canonical_field} override cannot have subfields"
            )))
        } else {
            Ok(ParsedConfigOverride {
                target,
                value: value.clone(),
            })
        }
    };

    match canonical_field.as_str() {
        "creation_delay_ms" | "creation_delay" => scalar(ConfigOverrideTarget::CreationDelayMs),
        "log_level" | "log" => scalar(ConfigOverrideTarget::LogLevel),
        "seed_default_project" | "seed" => scalar(ConfigOverrideTarget::SeedDefaultProject),
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| AppError::validation("aliases override requires an alias name"))?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value: value.clone(),
            })
        }
        other => Err(AppError::validation(format!(
            "unknown config field '{other}'"
        ))),
    }
}

/// Folds parsed `--config-override` values into a single override set.
pub fn collect_overrides<S: AsRef<str>>(raw: &[S]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry.as_ref())?;
        match parsed.target {
            ConfigOverrideTarget::CreationDelayMs => {
                let delay = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::validation("creation_delay_ms must be a non-negative integer")
                })?;
                overrides.creation_delay_ms = Some(delay);
            }
            ConfigOverrideTarget::LogLevel => {
                if parsed.value.is_empty() {
                    return Err(AppError::validation("log_level cannot be empty"));
                }
                overrides.log_level = Some(parsed.value);
            }
            ConfigOverrideTarget::SeedDefaultProject => {
                let seed = parse_bool(&parsed.value).ok_or_else(|| {
                    AppError::validation("seed_default_project must be true or false")
                })?;
                overrides.seed_default_project = Some(seed);
            }
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
        }
    }
    Ok(overrides)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn canonicalize_key(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrideTarget, ConfigOverrides, collect_overrides, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, parse_config_override,
    };
    use std::fs;
    use std::time::Duration;

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_with_fallback_from_path(&dir.path().join("missing.json"));

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valid.json");
        let content = serde_json::json!({
            "creation_delay_ms": 250,
            "log_level": "debug",
            "seed_default_project": false,
            "aliases": {
                "ls": "project list"
            }
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();

        assert_eq!(loaded.creation_delay_ms, 250);
        assert_eq!(loaded.log_level.as_deref(), Some("debug"));
        assert!(!loaded.seed_default_project);
        assert_eq!(
            loaded.aliases.get("ls").map(String::as_str),
            Some("project list")
        );
    }

    #[test]
    fn partial_file_keeps_seeding_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "creation_delay_ms": 300 }"#).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        assert!(loaded.seed_default_project);
        assert!(loaded.aliases.is_empty());
    }

    #[test]
    fn store_options_follow_config() {
        let config = Config {
            creation_delay_ms: 200,
            seed_default_project: false,
            ..Config::default()
        };

        let options = config.store_options();
        assert_eq!(options.creation_delay, Duration::from_millis(200));
        assert!(!options.seed_default);
    }

    #[test]
    fn expand_alias_replaces_first_word_only() {
        let config = Config {
            aliases: [("ls".into(), "project list".into())].into_iter().collect(),
            ..Config::default()
        };

        let expanded = config.expand_alias(vec!["ls".into(), "--json".into()]);
        assert_eq!(expanded, vec!["project", "list", "--json"]);

        let untouched = config.expand_alias(vec!["counts".into()]);
        assert_eq!(untouched, vec!["counts"]);
    }

    #[test]
    fn merge_overrides_updates_fields_and_aliases() {
        let base = Config {
            creation_delay_ms: 0,
            aliases: [("ls".into(), "project list".into())].into_iter().collect(),
            ..Config::default()
        };

        let overrides = ConfigOverrides {
            creation_delay_ms: Some(300),
            log_level: Some("info".into()),
            seed_default_project: None,
            aliases: [
                ("ls".into(), "task list".into()),
                ("c".into(), "counts".into()),
            ]
            .into_iter()
            .collect(),
        };

        let merged = merge_overrides(&base, &overrides);
        assert_eq!(merged.creation_delay_ms, 300);
        assert_eq!(merged.log_level.as_deref(), Some("info"));
        assert!(merged.seed_default_project);
        assert_eq!(
            merged.aliases.get("ls").map(String::as_str),
            Some("task list")
        );
        assert_eq!(merged.aliases.get("c").map(String::as_str), Some("counts"));
        assert_eq!(
            base.aliases.get("ls").map(String::as_str),
            Some("project list")
        );
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            creation_delay_ms: 200,
            ..Config::default()
        };

        let merged = merge_overrides(&base, &ConfigOverrides::default());

        assert_eq!(merged, base);
    }

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Creation-Delay-MS = 250 ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::CreationDelayMs);
        assert_eq!(parsed.value, "250");
    }

    #[test]
    fn parse_config_override_rejects_empty_alias_name() {
        let err = parse_config_override("aliases. = foo").unwrap_err();
        assert!(err.message().contains("aliases override requires an alias name"));
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("theme=noir").unwrap_err();
        assert!(err.message().contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("aliasesls").unwrap_err();
        assert!(err.message().contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_scalar_subfields() {
        let err = parse_config_override("log_level.core=debug").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn parse_config_override_trims_whitespace_for_alias_names() {
        let parsed = parse_config_override("aliases. ls = project list").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::Alias("ls".into()));
        assert_eq!(parsed.value, "project list");
    }

    #[test]
    fn collect_overrides_parses_typed_values() {
        let overrides = collect_overrides(&[
            "creation_delay_ms=300",
            "seed_default_project=no",
            "log_level=trace",
            "alias.ls=project list",
        ])
        .unwrap();

        assert_eq!(overrides.creation_delay_ms, Some(300));
        assert_eq!(overrides.seed_default_project, Some(false));
        assert_eq!(overrides.log_level.as_deref(), Some("trace"));
        assert_eq!(
            overrides.aliases.get("ls").map(String::as_str),
            Some("project list")
        );
    }

    #[test]
    fn collect_overrides_rejects_bad_numbers() {
        let err = collect_overrides(&["creation_delay_ms=soon"]).unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }
}
