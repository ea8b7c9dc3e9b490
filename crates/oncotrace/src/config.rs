//! Pipeline configuration, loadable from JSON.

use std::path::Path;

use oncotrace_registration::RegistrationConfig;
use oncotrace_segmentation::SegmentationConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Settings for every stage of [`crate::LongitudinalPipeline`].
///
/// Missing JSON fields take their defaults, so `{}` is a valid document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub registration: RegistrationConfig,
    pub segmentation: SegmentationConfig,
    /// Segment both time points concurrently.
    pub parallel_segmentation: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            registration: RegistrationConfig::default(),
            segmentation: SegmentationConfig::default(),
            parallel_segmentation: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registration(mut self, registration: RegistrationConfig) -> Self {
        self.registration = registration;
        self
    }

    pub fn with_segmentation(mut self, segmentation: SegmentationConfig) -> Self {
        self.segmentation = segmentation;
        self
    }

    pub fn with_parallel_segmentation(mut self, parallel: bool) -> Self {
        self.parallel_segmentation = parallel;
        self
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Validate the configuration of every stage.
    pub fn validate(&self) -> Result<()> {
        self.registration.validate()?;
        self.segmentation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotrace_segmentation::ComponentSelection;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.parallel_segmentation);
    }

    #[test]
    fn test_nested_overrides() {
        let text = r#"{
            "registration": { "histogram_bins": 32 },
            "segmentation": { "percentile": 97.0, "selection": "LargestOnly" },
            "parallel_segmentation": false
        }"#;
        let config = PipelineConfig::from_json_str(text).unwrap();
        assert_eq!(config.registration.histogram_bins, 32);
        assert_eq!(config.registration.learning_rate, 1.0);
        assert_eq!(config.segmentation.percentile, 97.0);
        assert_eq!(config.segmentation.selection, ComponentSelection::LargestOnly);
        assert!(!config.parallel_segmentation);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PipelineConfig::from_json_str("{ not json"),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let result = PipelineConfig::from_json_str(r#"{"segmentation": {"percentile": 150.0}}"#);
        assert!(matches!(result, Err(PipelineError::Segmentation(_))));
    }

    #[test]
    fn test_roundtrip() {
        let config = PipelineConfig::default().with_parallel_segmentation(false);
        let text = config.to_json_string().unwrap();
        assert_eq!(PipelineConfig::from_json_str(&text).unwrap(), config);
    }
}
