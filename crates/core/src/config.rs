//! Tunable heuristic constants and the collection run configuration.
//!
//! The run configuration is read from TOML or JSON, selected by file
//! extension:
//!
//! ```toml
//! [output]
//! folder = "output"
//! top_k_output = 5
//! top_k_matches = 10
//!
//! [heuristics]
//! center_tolerance = 25.0
//!
//! [collections."Travel Planner"]
//! input_folder = "collections/travel/pdfs"
//! persona = "Travel Planner"
//! job_to_be_done = "Plan a trip of 4 days for a group of 10 college friends."
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Empirically chosen constants behind line reconstruction, baselining and
/// heading classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// "Larger font" fires above `median * larger_font_ratio`.
    pub larger_font_ratio: f32,
    /// Maximum difference between left and right margins for "Centered".
    pub center_tolerance: f32,
    /// Fraction of the dominant line width below which a line is compact.
    pub width_threshold_ratio: f32,
    /// Bucket size used when looking for the dominant line width.
    pub width_bucket: f32,
    /// Lines with fewer words than this count as short.
    pub short_line_words: usize,
    /// A vertical jump above `previous font size * paragraph_gap_ratio`
    /// starts a new line.
    pub paragraph_gap_ratio: f32,
    /// Decimal places kept when rounding vertical origins.
    pub y_precision: u32,
    /// Median font size assumed for documents without lines.
    pub default_font_size: f32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            larger_font_ratio: 1.15,
            center_tolerance: 20.0,
            width_threshold_ratio: 0.75,
            width_bucket: 10.0,
            short_line_words: 10,
            paragraph_gap_ratio: 1.2,
            y_precision: 1,
            default_font_size: 12.0,
        }
    }
}

/// Beyond this many decimals `round_y` overflows `f32`.
pub const MAX_Y_PRECISION: u32 = 6;

impl HeuristicConfig {
    /// Reject values that would turn the layout math into NaN or infinity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("larger_font_ratio", self.larger_font_ratio),
            ("center_tolerance", self.center_tolerance),
            ("width_threshold_ratio", self.width_threshold_ratio),
            ("width_bucket", self.width_bucket),
            ("paragraph_gap_ratio", self.paragraph_gap_ratio),
            ("default_font_size", self.default_font_size),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidHeuristic(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.y_precision > MAX_Y_PRECISION {
            return Err(ConfigError::InvalidHeuristic(format!(
                "y_precision must be at most {}, got {}",
                MAX_Y_PRECISION, self.y_precision
            )));
        }

        Ok(())
    }

    /// Round a vertical origin to the configured precision.
    pub fn round_y(&self, y: f32) -> f32 {
        let factor = 10f32.powi(self.y_precision as i32);
        (y * factor).round() / factor
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Invalid heuristic setting: {0}")]
    InvalidHeuristic(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub folder: String,
    /// Sections kept in the final report.
    pub top_k_output: usize,
    /// Candidates kept per document after ranking.
    pub top_k_matches: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            folder: "output".to_string(),
            top_k_output: 5,
            top_k_matches: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub input_folder: String,
    pub persona: String,
    pub job_to_be_done: String,
    /// Query sent to the ranker; defaults to `job_to_be_done`.
    #[serde(default)]
    pub job_query: Option<String>,
}

impl CollectionConfig {
    pub fn query(&self) -> &str {
        self.job_query.as_deref().unwrap_or(&self.job_to_be_done)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub heuristics: HeuristicConfig,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.heuristics.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.heuristics.validate()?;
        Ok(config)
    }

    /// Load a configuration file, choosing the format from its extension.
    /// Heuristic values are validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    pub fn collection(&self, name: &str) -> Result<&CollectionConfig, ConfigError> {
        self.collections
            .get(name)
            .ok_or_else(|| ConfigError::CollectionNotFound(name.to_string()))
    }
}

/// File name of a collection's report: spaces become underscores.
pub fn results_file_name(collection: &str) -> String {
    format!("{}_results.json", collection.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_TOML: &str = r#"
[output]
folder = "out"
top_k_output = 3

[heuristics]
center_tolerance = 25.0

[collections."Travel Planner"]
input_folder = "travel"
persona = "Travel Planner"
job_to_be_done = "Plan a trip"

[collections.hr]
input_folder = "forms"
persona = "HR professional"
job_to_be_done = "Create fillable forms"
job_query = "fillable forms onboarding"
"#;

    #[test]
    fn test_heuristic_defaults() {
        let config = HeuristicConfig::default();
        assert_eq!(config.larger_font_ratio, 1.15);
        assert_eq!(config.center_tolerance, 20.0);
        assert_eq!(config.width_threshold_ratio, 0.75);
        assert_eq!(config.short_line_words, 10);
        assert_eq!(config.paragraph_gap_ratio, 1.2);
    }

    #[test]
    fn test_round_y() {
        let config = HeuristicConfig::default();
        assert!((config.round_y(100.04) - 100.0).abs() < 1e-4);
        assert!((config.round_y(100.06) - 100.1).abs() < 1e-4);
    }

    #[test]
    fn test_parse_toml() {
        let config = RunConfig::from_toml_str(SAMPLE_TOML).unwrap();
        assert_eq!(config.output.folder, "out");
        assert_eq!(config.output.top_k_output, 3);
        // Unspecified fields keep their defaults.
        assert_eq!(config.output.top_k_matches, 10);
        assert_eq!(config.heuristics.center_tolerance, 25.0);
        assert_eq!(config.heuristics.larger_font_ratio, 1.15);
        assert_eq!(config.collection_names(), vec!["Travel Planner", "hr"]);
    }

    #[test]
    fn test_collection_query_fallback() {
        let config = RunConfig::from_toml_str(SAMPLE_TOML).unwrap();
        assert_eq!(config.collection("Travel Planner").unwrap().query(), "Plan a trip");
        assert_eq!(
            config.collection("hr").unwrap().query(),
            "fillable forms onboarding"
        );
    }

    #[test]
    fn test_missing_collection() {
        let config = RunConfig::from_toml_str(SAMPLE_TOML).unwrap();
        assert!(matches!(
            config.collection("nope"),
            Err(ConfigError::CollectionNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "output": {"folder": "results", "top_k_matches": 4},
            "collections": {
                "c1": {"input_folder": "in", "persona": "p", "job_to_be_done": "j"}
            }
        }"#;
        let config = RunConfig::from_json_str(json).unwrap();
        assert_eq!(config.output.folder, "results");
        assert_eq!(config.output.top_k_matches, 4);
        assert_eq!(config.output.top_k_output, 5);
        assert_eq!(config.heuristics, HeuristicConfig::default());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("config.toml");
        let mut file = fs::File::create(&toml_path).unwrap();
        file.write_all(SAMPLE_TOML.as_bytes()).unwrap();
        assert_eq!(RunConfig::load(&toml_path).unwrap().collections.len(), 2);

        let yaml_path = dir.path().join("config.yaml");
        fs::write(&yaml_path, "output: {}").unwrap();
        assert!(matches!(
            RunConfig::load(&yaml_path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(HeuristicConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_heuristics() {
        let toml = "[heuristics]\nwidth_bucket = 0.0\n";
        assert!(matches!(
            RunConfig::from_toml_str(toml),
            Err(ConfigError::InvalidHeuristic(msg)) if msg.contains("width_bucket")
        ));

        let toml = "[heuristics]\ny_precision = 60\n";
        assert!(matches!(
            RunConfig::from_toml_str(toml),
            Err(ConfigError::InvalidHeuristic(msg)) if msg.contains("y_precision")
        ));

        let json = r#"{"heuristics": {"paragraph_gap_ratio": -1.0}}"#;
        assert!(matches!(
            RunConfig::from_json_str(json),
            Err(ConfigError::InvalidHeuristic(_))
        ));

        let config = HeuristicConfig {
            larger_font_ratio: f32::NAN,
            ..HeuristicConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_validates_heuristics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[heuristics]\ncenter_tolerance = 0.0\n").unwrap();
        assert!(matches!(
            RunConfig::load(&path),
            Err(ConfigError::InvalidHeuristic(_))
        ));
    }

    #[test]
    fn test_results_file_name() {
        assert_eq!(results_file_name("Travel Planner"), "Travel_Planner_results.json");
    }
}
