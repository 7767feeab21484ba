use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A geographic bounding box in `[west, south, east, north]` order.
///
/// Unlike `geo::Rect`, `west` may be greater than `east`, in which case the box
/// crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// The whole map as seen by a Web-Mercator viewport.
    pub const WORLD: BoundingBox = BoundingBox {
        west: -180.0,
        south: -85.0,
        east: 180.0,
        north: 85.0,
    };

    /// Every valid coordinate, poles included.
    pub const GLOBE: BoundingBox = BoundingBox {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    /// Create a new bounding box.
    ///
    /// # Examples
    ///
    /// ```
    /// use geocluster_types::bbox::BoundingBox;
    ///
    /// let manhattan = BoundingBox::new(-74.02, 40.70, -73.93, 40.80);
    /// assert!(!manhattan.crosses_antimeridian());
    /// ```
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Create a bounding box from a `[west, south, east, north]` array.
    pub fn from_array(bounds: [f64; 4]) -> Self {
        Self::new(bounds[0], bounds[1], bounds[2], bounds[3])
    }

    /// Create a bounding box from a `geo::Rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// All four edges are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Whether the box wraps across the ±180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Check if a point lies inside this box (edges inclusive).
    pub fn contains_point(&self, point: &Point) -> bool {
        let (x, y) = (point.x(), point.y());
        if y < self.south || y > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            x >= self.west || x <= self.east
        } else {
            x >= self.west && x <= self.east
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

/// Camera state delivered by the map host on every camera change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Continuous zoom level
    pub zoom: f64,
    /// Visible area; the whole globe when the host only reports a zoom
    #[serde(default = "Viewport::default_bounds")]
    pub bounds: BoundingBox,
}

impl Viewport {
    pub fn new(zoom: f64, bounds: BoundingBox) -> Self {
        Self { zoom, bounds }
    }

    /// Viewport covering the whole globe, poles included, at the given zoom.
    pub fn world(zoom: f64) -> Self {
        Self::new(zoom, Self::default_bounds())
    }

    const fn default_bounds() -> BoundingBox {
        BoundingBox::GLOBE
    }
}
