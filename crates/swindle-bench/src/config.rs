use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use swindle_core::model::config::{Difficulty, GameConfig, SetupError};
use thiserror::Error;
use tracing::Level;

const DEFAULT_STARTING_BALANCE: u32 = 10;
const MAX_GAMES: usize = 100_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root harness configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HarnessConfig {
    pub run_id: String,
    pub games: GamesConfig,
    #[serde(default)]
    pub table: GameConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub challenger: ChallengerConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: HarnessConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.games.validate()?;
        self.table
            .validate(self.account.starting_balance)
            .map_err(|err| ValidationError::InvalidField {
                field: "table".to_string(),
                message: err.to_string(),
            })?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        if self.logging.level().is_none() {
            return Err(ValidationError::InvalidField {
                field: "logging.tracing_level".to_string(),
                message: format!("unknown level '{}'", self.logging.tracing_level),
            });
        }
        Ok(())
    }

    /// Applies a numeric difficulty tier from the command line. Tiers that
    /// exist but cannot be played yet are caught later by [`Self::validate`].
    pub fn set_difficulty_tier(&mut self, tier: u8) -> Result<(), SetupError> {
        self.table.difficulty = Difficulty::from_tier(tier)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            statistics: resolve_template(&self.run_id, &self.outputs.statistics),
        }
    }
}

/// How many games to play and from which seed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub count: usize,
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "games.count".to_string(),
                message: "number of games must be greater than zero".to_string(),
            });
        }

        if self.count > MAX_GAMES {
            return Err(ValidationError::InvalidField {
                field: "games.count".to_string(),
                message: format!("at most {MAX_GAMES} games per run"),
            });
        }

        Ok(())
    }
}

/// Coins the human seat holds before each game.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AccountConfig {
    #[serde(default = "default_starting_balance")]
    pub starting_balance: u32,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

fn default_starting_balance() -> u32 {
    DEFAULT_STARTING_BALANCE
}

/// Who sits in the human seat.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChallengerConfig {
    #[serde(default)]
    pub kind: ChallengerKind,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengerKind {
    /// The reasoning engine itself, with its own belief memory.
    #[default]
    Mirror,
    /// Calls whenever the standing bid exceeds its expectation.
    Cautious,
}

impl ChallengerKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ChallengerKind::Mirror => "mirror",
            ChallengerKind::Cautious => "cautious",
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub statistics: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.statistics", &self.statistics),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub statistics: PathBuf,
}

impl ResolvedOutputs {
    /// Directory that receives telemetry next to the summary.
    pub fn telemetry_dir(&self) -> PathBuf {
        self.summary_md
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
