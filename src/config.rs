//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Configs are validated as a whole before the engine accepts them.

use crate::compute::encoding::Encoding;
use crate::error::{ClusterError, Result};
use crate::index::IndexOptions;
use crate::layout::LayoutStrategy;
use crate::picking::PickTier;
use serde::{Deserialize, Serialize};

/// How the cluster radius reacts to the zoom level the data is loaded at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RadiusScaling {
    /// Use `radius` as configured
    #[default]
    Constant,
    /// `radius / max(1, zoom * factor)`
    InverseZoom { factor: f64 },
}

impl RadiusScaling {
    pub fn effective_radius(&self, radius: f64, zoom: Option<f64>) -> f64 {
        match (self, zoom) {
            (RadiusScaling::InverseZoom { factor }, Some(z)) if z.is_finite() => {
                radius / (z * factor).max(1.0)
            }
            _ => radius,
        }
    }
}

/// Clustering engine configuration
///
/// # Example
///
/// ```rust
/// use geocluster::config::EngineConfig;
/// use geocluster::layout::LayoutStrategy;
///
/// let config = EngineConfig::from_json(r#"{
///     "radius": 60.0,
///     "layout": { "mode": "pack", "direct_above": 18.0 },
///     "encoding": { "domain": [0.0, 500.0] }
/// }"#)?;
/// assert_eq!(config.radius, 60.0);
/// assert_eq!(config.layout.name(), "pack");
/// assert_eq!(config.max_zoom, 16);
/// # Ok::<(), geocluster::ClusterError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Cluster radius in pixels at tile `extent`
    #[serde(default = "EngineConfig::default_radius")]
    pub radius: f64,

    #[serde(default)]
    pub min_zoom: u8,

    /// Zoom at and above which every point renders on its own
    #[serde(default = "EngineConfig::default_max_zoom")]
    pub max_zoom: u8,

    #[serde(default = "EngineConfig::default_extent")]
    pub extent: f64,

    /// Minimum number of points to form a cluster
    #[serde(default = "EngineConfig::default_min_points")]
    pub min_points: usize,

    #[serde(default)]
    pub radius_scaling: RadiusScaling,

    #[serde(default)]
    pub layout: LayoutStrategy,

    #[serde(default)]
    pub encoding: Encoding,

    /// Most leaves fetched per cluster when laying out its members
    #[serde(default = "EngineConfig::default_leaf_limit")]
    pub leaf_limit: usize,

    /// Most points returned by a cluster selection
    #[serde(default = "EngineConfig::default_pick_limit")]
    pub pick_limit: usize,

    #[serde(default)]
    pub pick_tier: PickTier,
}

impl EngineConfig {
    const fn default_radius() -> f64 {
        40.0
    }

    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_extent() -> f64 {
        512.0
    }

    const fn default_min_points() -> usize {
        2
    }

    const fn default_leaf_limit() -> usize {
        1000
    }

    const fn default_pick_limit() -> usize {
        25
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_zoom(mut self, min_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_radius_scaling(mut self, scaling: RadiusScaling) -> Self {
        self.radius_scaling = scaling;
        self
    }

    pub fn with_layout(mut self, layout: LayoutStrategy) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_leaf_limit(mut self, limit: usize) -> Self {
        self.leaf_limit = limit;
        self
    }

    pub fn with_pick_limit(mut self, limit: usize) -> Self {
        self.pick_limit = limit;
        self
    }

    pub fn with_pick_tier(mut self, tier: PickTier) -> Self {
        self.pick_tier = tier;
        self
    }

    /// Index parameters for a build at `zoom` (the last zoom the host
    /// reported, if any).
    pub fn index_options(&self, zoom: Option<f64>) -> IndexOptions {
        IndexOptions {
            radius: self.radius_scaling.effective_radius(self.radius, zoom),
            extent: self.extent,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            min_points: self.min_points,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.index_options(None).validate()?;

        if let RadiusScaling::InverseZoom { factor } = self.radius_scaling
            && !(factor.is_finite() && factor > 0.0)
        {
            return Err(ClusterError::InvalidConfig(format!(
                "Radius scaling factor must be positive, got: {}",
                factor
            )));
        }

        self.layout.validate()?;
        self.encoding.validate()?;

        if self.leaf_limit == 0 {
            return Err(ClusterError::InvalidConfig(
                "Leaf limit must be greater than zero".to_string(),
            ));
        }
        if self.leaf_limit > 100_000 {
            log::warn!(
                "Leaf limit of {} is very large; every cluster may expand to that many primitives",
                self.leaf_limit
            );
        }

        if self.pick_limit == 0 {
            return Err(ClusterError::InvalidConfig(
                "Pick limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(toml_str).map_err(|e| ClusterError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ClusterError::Toml(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            extent: Self::default_extent(),
            min_points: Self::default_min_points(),
            radius_scaling: RadiusScaling::default(),
            layout: LayoutStrategy::default(),
            encoding: Encoding::default(),
            leaf_limit: Self::default_leaf_limit(),
            pick_limit: Self::default_pick_limit(),
            pick_tier: PickTier::default(),
        }
    }
}
