//! Color and size encoding of scalar values.
//!
//! Values map onto a continuous color ramp through an ordered list of
//! breakpoints, and onto a radius through an area-proportional scale. Values
//! outside the domain clamp to the ends; missing values (`NaN`, infinities, or
//! an empty member count) map to the neutral sentinel: black and zero size.

use crate::compute::validation::validate_domain;
use crate::error::{ClusterError, Result};
use geocluster_types::color::Rgba;
use serde::{Deserialize, Serialize};

/// How a cluster's aggregate value is turned into an encodable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Divide the aggregate by the member count (per-member average)
    #[default]
    PerMember,
    /// Use the raw aggregate sum
    Aggregate,
}

/// Color/size scale configuration.
///
/// # Example
///
/// ```rust
/// use geocluster::compute::encoding::Encoding;
/// use geocluster::Rgba;
///
/// let encoding = Encoding::default();
/// assert_eq!(encoding.color_for(0.0, None), Rgba::SKY_BLUE);
/// assert_eq!(encoding.color_for(250.0, None), Rgba::RED);
///
/// // Two members with a total of 100: per-member value 50
/// assert_eq!(encoding.color_for(100.0, Some(2)), encoding.color_for(50.0, None));
///
/// assert_eq!(encoding.color_for(f64::NAN, None).to_array()[..3], [0, 0, 0]);
/// assert_eq!(encoding.size_for(f64::NAN, None), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Encoding {
    /// `[min, max]` of the value scale; the first and last breakpoint take
    /// its place when `breakpoints` is set
    #[serde(default = "Encoding::default_domain")]
    pub domain: [f64; 2],

    /// Ramp colors, evenly spaced over `domain` unless `breakpoints` is set
    #[serde(default = "Encoding::default_colors")]
    pub colors: Vec<Rgba>,

    /// Explicit ascending breakpoints, one per color
    #[serde(default)]
    pub breakpoints: Option<Vec<f64>>,

    /// `[min, max]` radius in metres
    #[serde(default = "Encoding::default_size_range")]
    pub size_range: [f64; 2],

    #[serde(default)]
    pub normalization: Normalization,
}

impl Encoding {
    fn default_domain() -> [f64; 2] {
        [0.0, 100.0]
    }

    fn default_colors() -> Vec<Rgba> {
        vec![Rgba::SKY_BLUE, Rgba::RED]
    }

    fn default_size_range() -> [f64; 2] {
        [1_000.0, 10_000.0]
    }

    pub fn with_domain(mut self, domain: [f64; 2]) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_colors(mut self, colors: Vec<Rgba>) -> Self {
        self.colors = colors;
        self
    }

    /// Use explicit breakpoints; the domain becomes their first and last value.
    pub fn with_breakpoints(mut self, breakpoints: Vec<f64>) -> Self {
        if let (Some(&first), Some(&last)) = (breakpoints.first(), breakpoints.last()) {
            self.domain = [first, last];
        }
        self.breakpoints = Some(breakpoints);
        self
    }

    pub fn with_size_range(mut self, size_range: [f64; 2]) -> Self {
        self.size_range = size_range;
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_domain(self.domain)?;

        if self.colors.is_empty() {
            return Err(ClusterError::InvalidConfig(
                "Encoding needs at least one color".to_string(),
            ));
        }

        if let Some(breakpoints) = &self.breakpoints {
            if breakpoints.len() != self.colors.len() {
                return Err(ClusterError::InvalidConfig(format!(
                    "Expected {} breakpoints (one per color), got {}",
                    self.colors.len(),
                    breakpoints.len()
                )));
            }
            if breakpoints.iter().any(|b| !b.is_finite())
                || breakpoints.windows(2).any(|w| w[0] >= w[1])
            {
                return Err(ClusterError::InvalidConfig(
                    "Breakpoints must be finite and strictly ascending".to_string(),
                ));
            }
        }

        let [min_size, max_size] = self.size_range;
        if !min_size.is_finite() || !max_size.is_finite() || min_size < 0.0 || min_size > max_size
        {
            return Err(ClusterError::InvalidConfig(format!(
                "Size range must satisfy 0 <= min <= max, got: [{}, {}]",
                min_size, max_size
            )));
        }

        Ok(())
    }

    /// The value to encode, or `None` when it must render as the sentinel.
    pub fn normalize(&self, value: f64, count: Option<usize>) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match (self.normalization, count) {
            (_, Some(0)) => None,
            (Normalization::PerMember, Some(n)) => Some(value / n as f64),
            _ => Some(value),
        }
    }

    /// Color for a value; `count` is the member count of a cluster.
    pub fn color_for(&self, value: f64, count: Option<usize>) -> Rgba {
        match self.normalize(value, count) {
            Some(v) => self.ramp(v),
            None => self.sentinel_color(),
        }
    }

    /// Radius in metres for a value; zero for missing values.
    pub fn size_for(&self, value: f64, count: Option<usize>) -> f64 {
        let Some(v) = self.normalize(value, count) else {
            return 0.0;
        };
        let [lo, hi] = self.value_range();
        let t = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
        let [min_size, max_size] = self.size_range;
        min_size + (max_size - min_size) * t.sqrt()
    }

    /// Rounded per-member value as an icon label, `None` for missing values.
    pub fn label_for(&self, value: f64, count: Option<usize>) -> Option<String> {
        self.normalize(value, count)
            .map(|v| format!("{}", v.round() + 0.0))
    }

    /// Black, carrying the ramp's alpha.
    pub fn sentinel_color(&self) -> Rgba {
        let alpha = self.colors.first().map_or(255, |c| c.a);
        Rgba::BLACK.with_alpha(alpha)
    }

    /// Ends of the scale shared by the color ramp and the size scale.
    pub fn value_range(&self) -> [f64; 2] {
        match self.breakpoints.as_deref() {
            Some([first, .., last]) => [*first, *last],
            _ => self.domain,
        }
    }

    fn ramp(&self, v: f64) -> Rgba {
        let n = self.colors.len();
        if n == 0 {
            return self.sentinel_color();
        }
        if n == 1 {
            return self.colors[0];
        }

        let stops = self.stops();
        if v <= stops[0] {
            return self.colors[0];
        }
        if v >= stops[n - 1] {
            return self.colors[n - 1];
        }

        let seg = stops.windows(2).position(|w| v <= w[1]).unwrap_or(n - 2);
        let t = (v - stops[seg]) / (stops[seg + 1] - stops[seg]);
        self.colors[seg].lerp(self.colors[seg + 1], t)
    }

    fn stops(&self) -> Vec<f64> {
        if let Some(breakpoints) = &self.breakpoints {
            return breakpoints.clone();
        }
        let n = self.colors.len();
        let [lo, hi] = self.domain;
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            domain: Self::default_domain(),
            colors: Self::default_colors(),
            breakpoints: None,
            size_range: Self::default_size_range(),
            normalization: Normalization::default(),
        }
    }
}
