//! A few useful geometric types

use crate::Coordinate;
use itertools::Itertools as _;
use itertools::MinMaxResult;
use nalgebra::Vector2;

pub type Point2D<T> = Vector2<T>;

/// Squared euclidean distance between two points.
///
/// The result is computed in `f64` so that large integer coordinates cannot
/// overflow.
pub fn distance_squared<T>(a: &Point2D<T>, b: &Point2D<T>) -> f64
where
    T: Coordinate,
{
    let dx = a.x.as_() - b.x.as_();
    let dy = a.y.as_() - b.y.as_();
    dx * dx + dy * dy
}

/// Axis-aligned bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<T: Coordinate> {
    pub p_min: Point2D<T>,
    pub p_max: Point2D<T>,
}

impl<T> BoundingBox<T>
where
    T: Coordinate,
{
    /// Returns `None` iff `points` is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2D<T>>,
        I::IntoIter: Clone,
    {
        let points = points.into_iter();
        let (min_x, max_x) = minmax(points.clone().map(|p| p.x))?;
        let (min_y, max_y) = minmax(points.map(|p| p.y))?;
        Some(Self {
            p_min: Point2D::new(min_x, min_y),
            p_max: Point2D::new(max_x, max_y),
        })
    }

    pub fn center(&self) -> Point2D<T> {
        Point2D::new(
            T::avg(self.p_min.x, self.p_max.x),
            T::avg(self.p_min.y, self.p_max.y),
        )
    }

    /// Horizontal extent of the box, in the wide type so that it cannot
    /// overflow.
    pub fn width(&self) -> T::Wide {
        self.p_max.x.widen() - self.p_min.x.widen()
    }
}

fn minmax<T: Coordinate>(values: impl Iterator<Item = T>) -> Option<(T, T)> {
    // `Itertools::minmax` only needs `PartialOrd`, so it works with floats.
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}
