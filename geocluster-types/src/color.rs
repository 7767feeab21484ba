use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color.
///
/// Serializes as a `[r, g, b, a]` array, the shape map renderers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque black, the neutral color for missing values.
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const SKY_BLUE: Rgba = Rgba::new(135, 206, 235, 255);
    pub const BLUE: Rgba = Rgba::new(0, 0, 255, 255);
    pub const RED: Rgba = Rgba::new(255, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear interpolation in RGB space; `t` is clamped to `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use geocluster_types::color::Rgba;
    ///
    /// let mid = Rgba::BLUE.lerp(Rgba::RED, 0.5);
    /// assert_eq!(mid, Rgba::rgb(128, 0, 128));
    /// ```
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(c: [u8; 4]) -> Self {
        Rgba::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(c: Rgba) -> Self {
        c.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints_and_clamp() {
        assert_eq!(Rgba::SKY_BLUE.lerp(Rgba::RED, 0.0), Rgba::SKY_BLUE);
        assert_eq!(Rgba::SKY_BLUE.lerp(Rgba::RED, 1.0), Rgba::RED);
        assert_eq!(Rgba::SKY_BLUE.lerp(Rgba::RED, 7.0), Rgba::RED);
        assert_eq!(Rgba::SKY_BLUE.lerp(Rgba::RED, -1.0), Rgba::SKY_BLUE);
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&Rgba::new(1, 2, 3, 200)).unwrap();
        assert_eq!(json, "[1,2,3,200]");
        let back: Rgba = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgba::new(1, 2, 3, 200));
    }
}
