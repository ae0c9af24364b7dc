use geo_types::{coord, point, Coord, CoordFloat, Point};

use crate::cartesian::{CartesianPoint2d, NewCartesianPoint2d};
use crate::geo::{GeoPoint, NewGeoPoint};

impl<T: CoordFloat> CartesianPoint2d for Coord<T> {
    type Num = T;

    fn x(&self) -> T {
        self.x
    }

    fn y(&self) -> T {
        self.y
    }
}

impl<T: CoordFloat> NewCartesianPoint2d<T> for Coord<T> {
    fn new(x: T, y: T) -> Self {
        coord!(x: x, y: y)
    }
}

impl<T: CoordFloat> GeoPoint for Coord<T> {
    type Num = T;

    fn lat(&self) -> T {
        self.y
    }

    fn lon(&self) -> T {
        self.x
    }
}

impl<T: CoordFloat> NewGeoPoint<T> for Coord<T> {
    fn latlon(lat: T, lon: T) -> Self {
        coord!(x: lon, y: lat)
    }
}

impl<T: CoordFloat> CartesianPoint2d for Point<T> {
    type Num = T;

    fn x(&self) -> T {
        self.0.x
    }

    fn y(&self) -> T {
        self.0.y
    }
}

impl<T: CoordFloat> NewCartesianPoint2d<T> for Point<T> {
    fn new(x: T, y: T) -> Self {
        point!(x: x, y: y)
    }
}

impl<T: CoordFloat> GeoPoint for Point<T> {
    type Num = T;

    fn lat(&self) -> T {
        self.0.y
    }

    fn lon(&self) -> T {
        self.0.x
    }
}

impl<T: CoordFloat> NewGeoPoint<T> for Point<T> {
    fn latlon(lat: T, lon: T) -> Self {
        point!(x: lon, y: lat)
    }
}
