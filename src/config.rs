use std::path::PathBuf;

use crate::error::{PortraitError, PortraitResult};
use crate::normalize::QUALITY_FLOOR;

/// Session-scoped pipeline configuration, loaded once at startup and passed
/// explicitly into the components that need it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base URL of the consumer API (settings, portrait, credits, checkout).
    pub api_base: String,
    /// Maximum allowed long-edge dimension of the normalized photo, pixels.
    pub max_dimension: u32,
    /// Lossy re-encoding quality factor in [0.4, 1]. The lower bound matches
    /// the quality floor of the payload-ceiling back-off.
    pub jpeg_quality: f32,
    /// Ceiling on the serialized photo payload, bytes. Normalization backs
    /// the quality off until the payload fits or the quality floor is hit.
    pub payload_ceiling: usize,
    /// Font used for the overlay text. When absent, well-known system
    /// locations are probed; when none resolves, text layers are skipped.
    pub font_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_base: "https://studio.picturepros.ai".to_string(),
            max_dimension: 1536,
            jpeg_quality: 0.85,
            payload_ceiling: 4_000_000,
            font_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> PortraitResult<()> {
        if self.api_base.trim().is_empty() {
            return Err(PortraitError::validation("api_base must not be empty"));
        }
        if self.max_dimension == 0 {
            return Err(PortraitError::validation("max_dimension must be > 0"));
        }
        if !self.jpeg_quality.is_finite()
            || self.jpeg_quality < QUALITY_FLOOR
            || self.jpeg_quality > 1.0
        {
            return Err(PortraitError::validation(
                "jpeg_quality must be in [0.4, 1]",
            ));
        }
        if self.payload_ceiling == 0 {
            return Err(PortraitError::validation("payload_ceiling must be > 0"));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> PortraitResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PortraitError::validation(format!("parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let mut config = PipelineConfig::default();
        config.jpeg_quality = 0.0;
        assert!(config.validate().is_err());
        config.jpeg_quality = 0.39;
        assert!(config.validate().is_err());
        config.jpeg_quality = 1.5;
        assert!(config.validate().is_err());
        config.jpeg_quality = QUALITY_FLOOR;
        assert!(config.validate().is_ok());
        config.jpeg_quality = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_bounds() {
        let mut config = PipelineConfig::default();
        config.max_dimension = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.payload_ceiling = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_json_fills_defaults_and_validates() {
        let config = PipelineConfig::from_json(r#"{"max_dimension": 1024}"#).unwrap();
        assert_eq!(config.max_dimension, 1024);
        assert_eq!(config.jpeg_quality, PipelineConfig::default().jpeg_quality);

        assert!(PipelineConfig::from_json(r#"{"jpeg_quality": 0.0}"#).is_err());
        assert!(PipelineConfig::from_json("not json").is_err());
    }
}
