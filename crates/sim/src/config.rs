//! Session configuration, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::brush::BrushConfig;
use crate::error::{ConfigurationError, SimResult};
use crate::grid::GridDims;
use crate::render::PixelFormat;

/// Steps run between two displayed frames.
pub const DEFAULT_STEPS_PER_FRAME: u32 = 8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width in cells (even, positive)
    pub width: u32,
    /// Grid height in cells (even, positive)
    pub height: u32,
    pub steps_per_frame: u32,
    pub brush: BrushConfig,
    pub pixel_format: PixelFormat,
    /// Integer window magnification used by the display front end
    pub window_scale: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            steps_per_frame: DEFAULT_STEPS_PER_FRAME,
            brush: BrushConfig::default(),
            pixel_format: PixelFormat::Rgba8,
            window_scale: 3,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<GridDims, ConfigurationError> {
        let dims = GridDims::new(self.width, self.height)?;
        if self.steps_per_frame == 0 {
            return Err(ConfigurationError::ZeroSteps);
        }
        if self.brush.radius == 0 {
            return Err(ConfigurationError::ZeroBrushRadius);
        }
        self.window_size()?;
        Ok(dims)
    }

    /// Inner window size in physical pixels: the grid magnified by
    /// `window_scale` (at least 1).
    pub fn window_size(&self) -> Result<(u32, u32), ConfigurationError> {
        let scale = self.window_scale.max(1);
        let too_large = ConfigurationError::WindowTooLarge {
            width: self.width,
            height: self.height,
            scale,
        };
        let width = self.width.checked_mul(scale).ok_or(too_large.clone())?;
        let height = self.height.checked_mul(scale).ok_or(too_large)?;
        Ok((width, height))
    }

    /// Validated grid dimensions.
    pub fn dims(&self) -> Result<GridDims, ConfigurationError> {
        self.validate()
    }

    /// Save configuration to a JSON file.
    pub fn save_json(&self, path: &Path) -> SimResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load_json(path: &Path) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushPolicy;
    use crate::error::SimError;

    #[test]
    fn defaults_match_reference_session() {
        let config = SimConfig::default();
        let dims = config.validate().unwrap();
        assert_eq!((dims.width(), dims.height()), (256, 256));
        assert_eq!(config.steps_per_frame, 8);
        assert_eq!(config.brush.radius, 10);
        assert_eq!(config.brush.policy, BrushPolicy::Breach);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "width": 128, "brush": { "policy": "contain" } }"#).unwrap();
        assert_eq!(config.width, 128);
        assert_eq!(config.height, 256);
        assert_eq!(config.brush.radius, 10);
        assert_eq!(config.brush.policy, BrushPolicy::Contain);
        assert_eq!(config.pixel_format, PixelFormat::Rgba8);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = SimConfig {
            width: 255,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigurationError::Odd { .. })));

        let config = SimConfig {
            steps_per_frame: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::ZeroSteps));
    }

    #[test]
    fn oversized_values_are_rejected() {
        let config = SimConfig {
            width: 1 << 30,
            height: 2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigurationError::TooLarge { .. })));

        let config = SimConfig {
            width: 1 << 20,
            height: 64,
            window_scale: 1 << 13,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::WindowTooLarge { scale: 8192, .. })
        ));
    }

    #[test]
    fn window_is_grid_times_scale() {
        let config = SimConfig::default();
        assert_eq!(config.window_size(), Ok((768, 768)));
        let config = SimConfig {
            window_scale: 0,
            ..Default::default()
        };
        assert_eq!(config.window_size(), Ok((256, 256)));
    }

    #[test]
    fn huge_brush_radius_is_accepted() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "width": 64, "height": 64, "brush": { "radius": 4000000000 } }"#)
                .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.brush.radius, 4_000_000_000);
    }

    fn temp_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("cellsim-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_json_reports_malformed_file() {
        let path = temp_config("malformed", "{ \"width\": ");
        let result = SimConfig::load_json(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn load_json_validates_contents() {
        let path = temp_config("odd", r#"{ "width": 3 }"#);
        let result = SimConfig::load_json(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(SimError::Configuration(ConfigurationError::Odd { width: 3, height: 256 }))
        ));
    }

    #[test]
    fn load_json_reports_missing_file() {
        let path = std::env::temp_dir().join("cellsim-no-such-config.json");
        assert!(matches!(SimConfig::load_json(&path), Err(SimError::Config(_))));
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("cellsim-config-{}.json", std::process::id()));
        let config = SimConfig {
            width: 64,
            height: 32,
            pixel_format: PixelFormat::Bgra8,
            ..Default::default()
        };
        config.save_json(&path).unwrap();
        let loaded = SimConfig::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
