//! Application configuration management.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_TOLERANCE;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Input file configuration.
    pub input: InputConfig,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
    /// Engine behaviour.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Path to the journal entries file.
    pub journal_file: String,
    /// Path to the mapping rules file.
    pub rules_file: String,
    /// Path to the account hierarchy file.
    pub hierarchy_file: Option<String>,
    /// Path to the `(year, old_type) -> new_type` mapping file.
    pub type_mapping_file: Option<String>,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output directory path.
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Report file name inside the output directory.
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            report_file: default_report_file(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_report_file() -> String {
    "report.json".to_string()
}

/// How warning-level rule issues are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Warning-level issues (e.g. unknown account codes) block the rule.
    Strict,
    /// Warning-level issues are reported but the rule stays active.
    #[default]
    Lenient,
}

/// What the applicator does with a rule whose account code cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedAccountPolicy {
    /// Drop the posting for that rule.
    Skip,
    /// Post anyway, using the raw account code as the path.
    #[default]
    RawCode,
}

/// How negative journal amounts are posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeAmountPolicy {
    /// Copy the signed amount unchanged.
    Preserve,
    /// Post the absolute amount on the opposite ledger side.
    #[default]
    Reverse,
}

/// Engine configuration consumed by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule validation strictness.
    #[serde(default)]
    pub validation_level: ValidationLevel,
    /// Tolerance for amount comparisons.
    #[serde(default = "default_tolerance")]
    pub amount_tolerance: Decimal,
    /// Behaviour for rules targeting unknown accounts.
    #[serde(default)]
    pub unresolved_accounts: UnresolvedAccountPolicy,
    /// Behaviour for negative journal amounts.
    #[serde(default)]
    pub negative_amounts: NegativeAmountPolicy,
    /// Earliest year consulted by the type mapping fallback.
    #[serde(default = "default_floor_year")]
    pub type_mapping_floor_year: i32,
    /// Apply rules to entries in parallel.
    #[serde(default)]
    pub parallel: bool,
    /// Maximum number of compiled conditions kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub compiled_cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation_level: ValidationLevel::default(),
            amount_tolerance: default_tolerance(),
            unresolved_accounts: UnresolvedAccountPolicy::default(),
            negative_amounts: NegativeAmountPolicy::default(),
            type_mapping_floor_year: default_floor_year(),
            parallel: false,
            compiled_cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_tolerance() -> Decimal {
    DEFAULT_TOLERANCE
}

fn default_floor_year() -> i32 {
    2020
}

fn default_cache_capacity() -> u64 {
    10_000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "ledgerflow=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.validation_level, ValidationLevel::Lenient);
        assert_eq!(engine.amount_tolerance, dec!(0.01));
        assert_eq!(engine.unresolved_accounts, UnresolvedAccountPolicy::RawCode);
        assert_eq!(engine.negative_amounts, NegativeAmountPolicy::Reverse);
        assert_eq!(engine.type_mapping_floor_year, 2020);
        assert!(!engine.parallel);
    }

    #[test]
    fn test_engine_from_json_partial() {
        let engine: EngineConfig = serde_json::from_str(
            r#"{"validation_level": "strict", "unresolved_accounts": "skip", "amount_tolerance": "0.05"}"#,
        )
        .unwrap();
        assert_eq!(engine.validation_level, ValidationLevel::Strict);
        assert_eq!(engine.unresolved_accounts, UnresolvedAccountPolicy::Skip);
        assert_eq!(engine.amount_tolerance, dec!(0.05));
        assert_eq!(engine.type_mapping_floor_year, 2020);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("LEDGERFLOW__INPUT__JOURNAL_FILE", Some("journal.json")),
                ("LEDGERFLOW__INPUT__RULES_FILE", Some("rules.json")),
                ("LEDGERFLOW__ENGINE__VALIDATION_LEVEL", Some("strict")),
                ("LEDGERFLOW__ENGINE__TYPE_MAPPING_FLOOR_YEAR", Some("2018")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.input.journal_file, "journal.json");
                assert_eq!(config.input.rules_file, "rules.json");
                assert!(config.input.hierarchy_file.is_none());
                assert_eq!(config.engine.validation_level, ValidationLevel::Strict);
                assert_eq!(config.engine.type_mapping_floor_year, 2018);
                assert_eq!(config.output.report_file, "report.json");
            },
        );
    }

    #[test]
    fn test_load_requires_input_section() {
        temp_env::with_vars_unset(
            [
                "LEDGERFLOW__INPUT__JOURNAL_FILE",
                "LEDGERFLOW__INPUT__RULES_FILE",
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
