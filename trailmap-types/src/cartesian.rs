//! Points in a planar (projected) coordinate system.

use num_traits::Float;

/// A point with `x` and `y` coordinates in a cartesian space.
pub trait CartesianPoint2d {
    /// Numeric type of the coordinates.
    type Num: Float;

    /// Easting.
    fn x(&self) -> Self::Num;
    /// Northing.
    fn y(&self) -> Self::Num;

    /// Squared euclidean distance to the `other` point.
    fn distance_sq(&self, other: &impl CartesianPoint2d<Num = Self::Num>) -> Self::Num {
        let dx = self.x() - other.x();
        let dy = self.y() - other.y();
        dx * dx + dy * dy
    }

    /// Euclidean distance to the `other` point.
    fn distance(&self, other: &impl CartesianPoint2d<Num = Self::Num>) -> Self::Num {
        self.distance_sq(other).sqrt()
    }
}

/// A cartesian point that can be constructed from its coordinates.
pub trait NewCartesianPoint2d<Num = f64>: CartesianPoint2d<Num = Num> + Sized {
    /// Creates a new point.
    fn new(x: Num, y: Num) -> Self;
}
