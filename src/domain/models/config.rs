use serde::{Deserialize, Serialize};

use super::calibration::Calibration;

/// Main configuration structure for Ferroscan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Pass/fail thresholds applied by the policy evaluator
    #[serde(default)]
    pub thresholds: PolicyThresholds,

    /// Stage execution configuration
    #[serde(default)]
    pub stage: StageConfig,

    /// History retention configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Dimensional calibration for the active camera setup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
}

/// Thresholds consulted when turning stage results into a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyThresholds {
    /// Minimum confidence at which a reported defect counts against the part
    #[serde(default = "default_detection_accuracy")]
    pub detection_accuracy: f64,

    /// Maximum allowed deviation from nominal dimensions, in millimeters
    #[serde(default = "default_tolerance_mm")]
    pub tolerance_mm: f64,

    /// Defect types that count against the part. Empty means every type does.
    #[serde(default)]
    pub critical_types: Vec<String>,
}

const fn default_detection_accuracy() -> f64 {
    0.85
}

const fn default_tolerance_mm() -> f64 {
    0.2
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            detection_accuracy: default_detection_accuracy(),
            tolerance_mm: default_tolerance_mm(),
            critical_types: vec![],
        }
    }
}

impl PolicyThresholds {
    /// Whether a defect of the given type counts against the part.
    /// An empty critical set treats every type as critical.
    pub fn is_critical_type(&self, defect_type: &str) -> bool {
        self.critical_types.is_empty()
            || self
                .critical_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(defect_type))
    }

    /// Check threshold values are usable.
    pub fn validate(&self) -> Result<(), String> {
        if !self.detection_accuracy.is_finite()
            || !(0.0..=1.0).contains(&self.detection_accuracy)
        {
            return Err(format!(
                "detection_accuracy must be between 0.0 and 1.0, got {}",
                self.detection_accuracy
            ));
        }
        if !self.tolerance_mm.is_finite() || self.tolerance_mm < 0.0 {
            return Err(format!(
                "tolerance_mm must be a non-negative number, got {}",
                self.tolerance_mm
            ));
        }
        if self.critical_types.iter().any(|t| t.trim().is_empty()) {
            return Err("critical_types must not contain blank entries".to_string());
        }
        Ok(())
    }
}

/// Stage execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StageConfig {
    /// Per-stage timeout in milliseconds
    #[serde(default = "default_stage_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_stage_timeout_ms() -> u64 {
    30_000
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_stage_timeout_ms(),
        }
    }
}

/// History retention configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryConfig {
    /// Keep at most this many entries, oldest pruned first. None keeps everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_limit: Option<usize>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".ferroscan/history.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = PolicyThresholds::default();
        assert_eq!(thresholds.detection_accuracy, 0.85);
        assert_eq!(thresholds.tolerance_mm, 0.2);
        assert!(thresholds.critical_types.is_empty());
        assert!(thresholds.validate().is_ok());
    }

    #[test]
    fn test_empty_critical_set_treats_every_type_as_critical() {
        let thresholds = PolicyThresholds::default();
        assert!(thresholds.is_critical_type("scratch"));
        assert!(thresholds.is_critical_type("dent"));
        assert!(thresholds.is_critical_type("anything"));
    }

    #[test]
    fn test_named_critical_types_match_case_insensitively() {
        let thresholds = PolicyThresholds {
            critical_types: vec!["crack".to_string(), "Dent".to_string()],
            ..PolicyThresholds::default()
        };
        assert!(thresholds.is_critical_type("crack"));
        assert!(thresholds.is_critical_type("CRACK"));
        assert!(thresholds.is_critical_type("dent"));
        assert!(!thresholds.is_critical_type("scratch"));
    }

    #[test]
    fn test_threshold_validation() {
        let out_of_range = PolicyThresholds {
            detection_accuracy: 1.5,
            ..PolicyThresholds::default()
        };
        assert!(out_of_range.validate().is_err());

        let negative_tolerance = PolicyThresholds {
            tolerance_mm: -0.1,
            ..PolicyThresholds::default()
        };
        assert!(negative_tolerance.validate().is_err());

        let nan_tolerance = PolicyThresholds {
            tolerance_mm: f64::NAN,
            ..PolicyThresholds::default()
        };
        assert!(nan_tolerance.validate().is_err());

        let blank_type = PolicyThresholds {
            critical_types: vec!["  ".to_string()],
            ..PolicyThresholds::default()
        };
        assert!(blank_type.validate().is_err());
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.stage.timeout_ms, 30_000);
        assert!(config.history.retention_limit.is_none());
        assert_eq!(config.database.path, ".ferroscan/history.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
        assert!(config.calibration.is_none());
    }
}
