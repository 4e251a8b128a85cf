//! Runtime configuration.
//!
//! Defaults < YAML config file < `LOREKEYS_*` environment variables.
//! The injection section holds the panel-level toggles (depth, role,
//! ephemeral) that the host UI would otherwise own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::Role;

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub injection: InjectionConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    pub settings: SettingsConfig,
}

/// How chain steps pick their ephemeral flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainEphemeralPolicy {
    /// Chain steps are always ephemeral.
    #[default]
    Forced,
    /// Use the chain template's own `ephemeral` flag.
    PerChain,
    /// Use the global ephemeral toggle, like a manual injection.
    FollowToggle,
}

impl ChainEphemeralPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forced => "forced",
            Self::PerChain => "per_chain",
            Self::FollowToggle => "follow_toggle",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forced" => Some(Self::Forced),
            "per_chain" | "per-chain" => Some(Self::PerChain),
            "follow_toggle" | "follow-toggle" => Some(Self::FollowToggle),
            _ => None,
        }
    }

    /// Resolve the ephemeral flag for one chain step.
    pub fn resolve(self, chain_ephemeral: bool, global_toggle: bool) -> bool {
        match self {
            Self::Forced => true,
            Self::PerChain => chain_ephemeral,
            Self::FollowToggle => global_toggle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionConfig {
    /// Depth override for every injection; `None` uses each snippet's default depth.
    pub depth: Option<u32>,
    pub role: Role,
    /// Global ephemeral toggle used by manual injections and by `flush`.
    pub ephemeral: bool,
    pub chain_policy: ChainEphemeralPolicy,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            depth: None,
            role: Role::System,
            ephemeral: true,
            chain_policy: ChainEphemeralPolicy::Forced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Pause between deleting the last message and re-injecting.
    pub settle_delay: Duration,
    /// How long chat-changed events stay suppressed after a retry.
    pub guard_hold: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(200),
            guard_hold: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "console".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsConfig {
    /// JSON settings file used by standalone tools; hosts supply their own store.
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(depth) = self.injection.depth {
            if depth > 99 {
                return Err(ConfigError::invalid(
                    "injection.depth",
                    format!("must be between 0 and 99 (got {depth})"),
                ));
            }
        }
        if self.retry.guard_hold < self.retry.settle_delay {
            return Err(ConfigError::invalid(
                "retry.guard_hold_ms",
                "must be at least retry.settle_delay_ms",
            ));
        }
        match self.logging.level.to_lowercase().trim() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::invalid(
                    "logging.level",
                    "must be one of trace, debug, info, warn, error",
                ))
            }
        }
        match self.logging.format.to_lowercase().trim() {
            "console" | "json" => {}
            _ => {
                return Err(ConfigError::invalid(
                    "logging.format",
                    "must be one of console, json",
                ))
            }
        }
        Ok(())
    }

    /// Apply `LOREKEYS_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("LOREKEYS_DEPTH") {
            let depth = raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::invalid("LOREKEYS_DEPTH", format!("not a depth: {raw:?}"))
            })?;
            self.injection.depth = Some(depth);
        }
        if let Some(raw) = get("LOREKEYS_ROLE") {
            self.injection.role = Role::from_str(&raw).ok_or_else(|| {
                ConfigError::invalid("LOREKEYS_ROLE", format!("unknown role {raw:?}"))
            })?;
        }
        if let Some(raw) = get("LOREKEYS_EPHEMERAL") {
            self.injection.ephemeral = parse_bool(&raw).ok_or_else(|| {
                ConfigError::invalid("LOREKEYS_EPHEMERAL", format!("not a boolean: {raw:?}"))
            })?;
        }
        if let Some(raw) = get("LOREKEYS_CHAIN_POLICY") {
            self.injection.chain_policy = ChainEphemeralPolicy::from_str(&raw).ok_or_else(|| {
                ConfigError::invalid("LOREKEYS_CHAIN_POLICY", format!("unknown policy {raw:?}"))
            })?;
        }
        if let Some(raw) = get("LOREKEYS_LOG_LEVEL") {
            self.logging.level = raw.trim().to_string();
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    #[serde(default)]
    injection: PartialInjectionConfig,
    #[serde(default)]
    retry: PartialRetryConfig,
    #[serde(default)]
    logging: PartialLoggingConfig,
    #[serde(default)]
    settings: PartialSettingsConfig,
}

#[derive(Debug, Default, Deserialize)]
struct PartialInjectionConfig {
    depth: Option<u32>,
    role: Option<Role>,
    ephemeral: Option<bool>,
    chain_policy: Option<ChainEphemeralPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialRetryConfig {
    settle_delay_ms: Option<u64>,
    guard_hold_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialLoggingConfig {
    #[serde(default)]
    level: String,
    #[serde(default)]
    format: String,
}

#[derive(Debug, Default, Deserialize)]
struct PartialSettingsConfig {
    #[serde(default)]
    path: String,
}

/// Parse a YAML document on top of the defaults.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();
    let partial: PartialConfig = if text.trim().is_empty() {
        PartialConfig::default()
    } else {
        serde_yaml::from_str(text)?
    };
    apply_partial(&mut cfg, partial);
    Ok(cfg)
}

/// Load config from `config_file` (hard error if unreadable) or from the
/// first default location that exists, then apply environment overrides
/// and validate. Returns the file actually used.
pub fn load_config(config_file: Option<&Path>) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let (mut cfg, used) = match config_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            (parse_config(&text)?, Some(path.to_path_buf()))
        }
        None => match find_config_file() {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(text) => (parse_config(&text)?, Some(path)),
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "skipping unreadable config");
                    (Config::default(), None)
                }
            },
            None => (Config::default(), None),
        },
    };
    cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
    cfg.validate()?;
    Ok((cfg, used))
}

fn apply_partial(cfg: &mut Config, partial: PartialConfig) {
    if let Some(depth) = partial.injection.depth {
        cfg.injection.depth = Some(depth);
    }
    if let Some(role) = partial.injection.role {
        cfg.injection.role = role;
    }
    if let Some(ephemeral) = partial.injection.ephemeral {
        cfg.injection.ephemeral = ephemeral;
    }
    if let Some(policy) = partial.injection.chain_policy {
        cfg.injection.chain_policy = policy;
    }
    if let Some(ms) = partial.retry.settle_delay_ms {
        cfg.retry.settle_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = partial.retry.guard_hold_ms {
        cfg.retry.guard_hold = Duration::from_millis(ms);
    }
    if !partial.logging.level.trim().is_empty() {
        cfg.logging.level = partial.logging.level.trim().to_string();
    }
    if !partial.logging.format.trim().is_empty() {
        cfg.logging.format = partial.logging.format.trim().to_string();
    }
    if !partial.settings.path.trim().is_empty() {
        cfg.settings.path = Some(PathBuf::from(expand_tilde(partial.settings.path.trim())));
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if path == "~" {
        return home_dir().display().to_string();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home_dir().join(rest).display().to_string();
    }
    path.to_string()
}

/// First existing `config.yaml` under the standard config directories.
pub fn find_config_file() -> Option<PathBuf> {
    config_search_paths()
        .into_iter()
        .map(|dir| dir.join("config.yaml"))
        .find(|candidate| candidate.is_file())
}

fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            paths.push(Path::new(&xdg).join("lorekeys"));
        }
    }
    let home = home_dir();
    if home.as_os_str() != "" {
        paths.push(home.join(".config/lorekeys"));
    }
    paths
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.injection.depth, None);
        assert_eq!(cfg.injection.role, Role::System);
        assert!(cfg.injection.ephemeral);
        assert_eq!(cfg.injection.chain_policy, ChainEphemeralPolicy::Forced);
        assert_eq!(cfg.retry.settle_delay, Duration::from_millis(200));
        assert_eq!(cfg.retry.guard_hold, Duration::from_millis(2000));
        assert!(cfg.validate().is_ok(), "default config must validate");
    }

    #[test]
    fn parse_overrides_defaults() {
        let yaml = "injection:\n  depth: 4\n  role: assistant\n  ephemeral: false\n  chain_policy: per_chain\nretry:\n  settle_delay_ms: 50\nlogging:\n  level: debug\n";
        let cfg = match parse_config(yaml) {
            Ok(cfg) => cfg,
            Err(err) => panic!("parse: {err}"),
        };
        assert_eq!(cfg.injection.depth, Some(4));
        assert_eq!(cfg.injection.role, Role::Assistant);
        assert!(!cfg.injection.ephemeral);
        assert_eq!(cfg.injection.chain_policy, ChainEphemeralPolicy::PerChain);
        assert_eq!(cfg.retry.settle_delay, Duration::from_millis(50));
        assert_eq!(cfg.retry.guard_hold, Duration::from_millis(2000));
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn parse_rejects_unknown_sections() {
        assert!(matches!(
            parse_config("bogus:\n  x: 1\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "bogus".into();
        let err = match cfg.validate() {
            Ok(()) => panic!("expected error"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("logging.level"), "err={err}");
    }

    #[test]
    fn validate_rejects_guard_shorter_than_settle() {
        let mut cfg = Config::default();
        cfg.retry.guard_hold = Duration::from_millis(10);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overrides_apply_and_validate_values() {
        let mut cfg = Config::default();
        let env = |key: &str| match key {
            "LOREKEYS_DEPTH" => Some("2".to_string()),
            "LOREKEYS_ROLE" => Some("user".to_string()),
            "LOREKEYS_EPHEMERAL" => Some("off".to_string()),
            "LOREKEYS_CHAIN_POLICY" => Some("follow-toggle".to_string()),
            _ => None,
        };
        if let Err(err) = cfg.apply_env_overrides(env) {
            panic!("overrides: {err}");
        }
        assert_eq!(cfg.injection.depth, Some(2));
        assert_eq!(cfg.injection.role, Role::User);
        assert!(!cfg.injection.ephemeral);
        assert_eq!(cfg.injection.chain_policy, ChainEphemeralPolicy::FollowToggle);

        let bad = |key: &str| (key == "LOREKEYS_DEPTH").then(|| "deep".to_string());
        assert!(cfg.apply_env_overrides(bad).is_err());
    }

    #[test]
    fn chain_policy_resolution() {
        assert!(ChainEphemeralPolicy::Forced.resolve(false, false));
        assert!(!ChainEphemeralPolicy::PerChain.resolve(false, true));
        assert!(ChainEphemeralPolicy::FollowToggle.resolve(false, true));
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/tmp/x.json"), "/tmp/x.json");
        assert!(!expand_tilde("~/x.json").starts_with('~'));
    }
}
