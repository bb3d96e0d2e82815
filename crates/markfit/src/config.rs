//! Pipeline configuration.
//!
//! All colors are RGB triples. Every section has defaults, so a partial
//! JSON file only needs to name the fields it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

const DEFAULT_TARGET_COLOR: [u8; 3] = [230, 60, 60];
const DEFAULT_BACKGROUND: [u8; 3] = [0, 0, 0];
const DEFAULT_ANNOTATION: [u8; 3] = [255, 255, 255];
const DEFAULT_LABEL_OFFSET_PX: f64 = 10.0;
const DEFAULT_MIN_POINTS: usize = 2;

/// Marker pixel selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Color of marker pixels.
    pub target_color: [u8; 3],
    /// Per-channel absolute tolerance. `0` means exact match.
    pub tolerance: u8,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            target_color: DEFAULT_TARGET_COLOR,
            tolerance: 0,
        }
    }
}

impl MarkerConfig {
    /// Whether `rgb` counts as a marker pixel.
    #[inline]
    pub fn matches(&self, rgb: [u8; 3]) -> bool {
        rgb.iter()
            .zip(self.target_color.iter())
            .all(|(&c, &t)| c.abs_diff(t) <= self.tolerance)
    }
}

/// Strategy for locating the farthest pair of marker points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterSearch {
    /// All-pairs scan over every marker point.
    #[default]
    Exhaustive,
    /// All-pairs scan over convex hull vertices only.
    ConvexHull,
}

/// Ellipse fit parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Minimum number of marker points required to attempt a fit (>= 2).
    pub min_points: usize,
    /// Farthest-pair strategy.
    pub diameter_search: DiameterSearch,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            diameter_search: DiameterSearch::Exhaustive,
        }
    }
}

/// Output rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Background of the filled-silhouette render.
    pub background: [u8; 3],
    /// Fill color of the silhouette ellipse.
    pub fill_color: [u8; 3],
    /// Outline, axis and label color of the diagnostic render.
    pub annotation_color: [u8; 3],
    /// Labels are drawn this many pixels up and left of their anchor.
    pub label_offset_px: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            fill_color: DEFAULT_TARGET_COLOR,
            annotation_color: DEFAULT_ANNOTATION,
            label_offset_px: DEFAULT_LABEL_OFFSET_PX,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub marker: MarkerConfig,
    pub fit: FitConfig,
    pub render: RenderConfig,
    /// Input file extensions to process (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Process images on the rayon thread pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            marker: MarkerConfig::default(),
            fit: FitConfig::default(),
            render: RenderConfig::default(),
            extensions: vec!["png".to_string()],
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.fit.min_points < 2 {
            return Err(PipelineError::Config(format!(
                "fit.min_points must be >= 2, got {}",
                self.fit.min_points
            )));
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(PipelineError::Config(
                "extensions must name at least one file extension".to_string(),
            ));
        }
        if !self.render.label_offset_px.is_finite() {
            return Err(PipelineError::Config(
                "render.label_offset_px must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `path` has one of the configured input extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let data = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            PipelineError::Config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty JSON.
    pub fn to_json_file(&self, path: &Path) -> Result<(), PipelineError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))
    }
}
