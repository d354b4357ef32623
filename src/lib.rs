//! A library that partitions 2D point sets into clusters.
//!
//! # Crate Layout
//!
//! Grappe exposes a [`Partition`] trait, which is in turn implemented by
//! algorithms.  See its documentation for more details.  The trait is generic
//! around the coordinate type, which means algorithms can partition integer
//! and floating-point point sets alike.
//!
//! # Available algorithms
//!
//! - [K-means][KMeans] (Lloyd's algorithm, random seeding)
//! - [K-medoids][KMedoids] (deterministic seeding)
//!
//! The routines both algorithms are built upon (assignment, centroid,
//! dissimilarity...) are available in the [`cluster`] module.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    rust_2018_idioms
)]

mod algorithms;
mod average;
pub mod cluster;
mod geometry;
mod num;
mod profile;

pub use crate::algorithms::*;
pub use crate::average::Average;
pub use crate::cluster::Cluster;
pub use crate::cluster::Color;
pub use crate::cluster::Palette;
pub use crate::geometry::distance_squared;
pub use crate::geometry::BoundingBox;
pub use crate::geometry::Point2D;
pub use crate::num::Coordinate;
pub use crate::profile::Profile;

pub use nalgebra;
pub use num_traits;
pub use rand;

/// The `Partition` trait allows for clustering observations.
///
/// Partitioning algorithms implement this trait.  It is object safe, so that
/// callers can keep a list of `Box<dyn Partition<T>>` and run whichever is
/// currently selected.
///
/// The generic argument `T` is the coordinate type of the observations.
pub trait Partition<T: Coordinate> {
    /// Human-readable name of the algorithm.
    fn name(&self) -> &str;

    /// Name of the tunable parameter.
    fn param_name(&self) -> &str;

    /// The number of clusters the next run will produce.
    fn param(&self) -> usize;

    fn set_param(&mut self, param: usize);

    /// Partition the given observations.
    ///
    /// On success, `profile` is overwritten with the details of this run.  On
    /// failure, it is left untouched.
    ///
    /// Returned clusters refer to observations by their index in
    /// `observations`, which is never reordered.
    fn partition(
        &mut self,
        observations: &[Point2D<T>],
        profile: &mut Profile,
    ) -> Result<Vec<Cluster<T>>, Error>;
}
