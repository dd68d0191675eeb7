use crate::Point;

/// Converts a query radius into the squared threshold used by every index.
/// Returns `None` when no non-negative distance can be strictly below the
/// radius (negative, zero or NaN radius).
#[inline]
pub fn radius_squared(radius: f64) -> Option<f64> {
    if radius > 0f64 {
        Some(radius * radius)
    } else {
        None
    }
}

/// Strict-inequality membership test shared by all indexes.
#[inline]
pub fn within(candidate: &Point, centre: &Point, radius_sq: f64) -> bool {
    (candidate - centre).norm_squared() < radius_sq
}

/// Axis aligned rectangle, closed on all sides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Aabb {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Rectangle spanning `[0, width] x [0, height]`
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(Point::new(0f64, 0f64), Point::new(width, height))
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn centre(&self) -> Point {
        (self.min + self.max) * 0.5f64
    }

    /// Squared distance from `p` to the closest point of the rectangle. Zero
    /// when `p` lies inside.
    pub fn distance_squared_to(&self, p: &Point) -> f64 {
        let dx = p.x - p.x.clamp(self.min.x, self.max.x);
        let dy = p.y - p.y.clamp(self.min.y, self.max.y);
        dx * dx + dy * dy
    }

    /// True if some point of the rectangle is strictly closer than the
    /// radius to `centre`. Any stored point strictly inside the circle makes
    /// this true for the rectangle that holds it.
    pub fn intersects_circle(&self, centre: &Point, radius_sq: f64) -> bool {
        self.distance_squared_to(centre) < radius_sq
    }

    /// Index of the quadrant `p` is routed to. Points on a split line go to
    /// the west/south side. Order matches [`Aabb::quadrants`].
    #[inline]
    pub fn quadrant_of(&self, p: &Point) -> usize {
        let mid = self.centre();
        let east = (p.x > mid.x) as usize;
        let north = (p.y > mid.y) as usize;
        north * 2 + east
    }

    /// Four equal quarters: south-west, south-east, north-west, north-east.
    pub fn quadrants(&self) -> [Aabb; 4] {
        let mid = self.centre();
        [
            Aabb::new(self.min, mid),
            Aabb::new(Point::new(mid.x, self.min.y), Point::new(self.max.x, mid.y)),
            Aabb::new(Point::new(self.min.x, mid.y), Point::new(mid.x, self.max.y)),
            Aabb::new(mid, self.max),
        ]
    }
}
