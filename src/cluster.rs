//! Clusters and the routines shared by the partitioning algorithms.
//!
//! Cluster membership is index-based: a [`Cluster`] stores the indices of its
//! observations in the slice given to the partitioner, never the points
//! themselves.

use crate::geometry::distance_squared;
use crate::Coordinate;
use crate::Point2D;
use num_traits::Zero;
use std::fmt;

/// An RGB color tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Colors that are easy to tell apart on screen.
///
/// Ref: <https://sashamaps.net/docs/resources/20-colors/>
pub const VISUALLY_DISTINCT_COLORS: [Color; 20] = [
    Color::new(230, 25, 75),
    Color::new(60, 180, 75),
    Color::new(255, 225, 25),
    Color::new(67, 99, 216),
    Color::new(245, 130, 48),
    Color::new(145, 30, 180),
    Color::new(66, 212, 244),
    Color::new(240, 50, 230),
    Color::new(191, 239, 69),
    Color::new(250, 190, 212),
    Color::new(70, 153, 144),
    Color::new(220, 190, 255),
    Color::new(154, 99, 36),
    Color::new(255, 250, 200),
    Color::new(128, 0, 0),
    Color::new(170, 255, 195),
    Color::new(128, 128, 0),
    Color::new(255, 216, 177),
    Color::new(0, 0, 117),
    Color::new(169, 169, 169),
];

/// An ordered, non-empty list of colors given to clusters by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<Color>);

impl Palette {
    /// Returns `None` if `colors` is empty.
    pub fn new(colors: Vec<Color>) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        Some(Self(colors))
    }

    /// The color of the `index`-th cluster.  Cycles when `index` is larger
    /// than the palette.
    pub fn color(&self, index: usize) -> Color {
        self.0[index % self.0.len()]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(VISUALLY_DISTINCT_COLORS.to_vec())
    }
}

/// A group of observations represented by a point, either their mean
/// (k-means) or one of them (k-medoids).
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster<T: Coordinate> {
    pub mean: Point2D<T>,
    pub color: Color,
    /// Indices of the observations assigned to this cluster, in assignment
    /// order.
    pub observations: Vec<usize>,
}

impl<T> Cluster<T>
where
    T: Coordinate,
{
    pub fn new(mean: Point2D<T>, color: Color) -> Self {
        Self {
            mean,
            color,
            observations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The points assigned to this cluster.
    pub fn points<'a>(
        &'a self,
        observations: &'a [Point2D<T>],
    ) -> impl Iterator<Item = &'a Point2D<T>> + 'a {
        self.observations.iter().map(move |&i| &observations[i])
    }
}

/// Build one cluster per mean, tagged with the palette's colors.
pub fn init_clusters<T, I>(means: I, palette: &Palette) -> Vec<Cluster<T>>
where
    T: Coordinate,
    I: IntoIterator<Item = Point2D<T>>,
{
    means
        .into_iter()
        .enumerate()
        .map(|(i, mean)| Cluster::new(mean, palette.color(i)))
        .collect()
}

/// Arithmetic mean of the cluster's observations.
///
/// Coordinates are summed in [`Coordinate::Wide`], then divided with the
/// native semantics of `T` (truncation for integers).  An empty cluster
/// yields the zero vector.
pub fn compute_centroid<T>(cluster: &Cluster<T>, observations: &[Point2D<T>]) -> Point2D<T>
where
    T: Coordinate,
{
    let mut sum_x: T::Wide = Zero::zero();
    let mut sum_y: T::Wide = Zero::zero();
    for point in cluster.points(observations) {
        sum_x += point.x.widen();
        sum_y += point.y.widen();
    }
    let count = T::wide_count(usize::max(cluster.len(), 1));
    Point2D::new(T::narrow(sum_x / count), T::narrow(sum_y / count))
}

/// Whether every cluster mean is equal to its previous value.
///
/// Means are compared by index, exactly.
pub fn converged<T>(clusters: &[Cluster<T>], previous_means: &[Point2D<T>]) -> bool
where
    T: Coordinate,
{
    debug_assert_eq!(clusters.len(), previous_means.len());
    clusters
        .iter()
        .zip(previous_means)
        .all(|(cluster, previous_mean)| cluster.mean == *previous_mean)
}

/// Assign every observation to the cluster with the closest mean.
///
/// On ties, the first cluster wins.
pub fn assign_observations<T>(clusters: &mut [Cluster<T>], observations: &[Point2D<T>])
where
    T: Coordinate,
{
    if clusters.is_empty() {
        return;
    }
    for (i, observation) in observations.iter().enumerate() {
        let mut closest_distance = f64::INFINITY;
        let mut closest_cluster = 0;

        for (j, cluster) in clusters.iter().enumerate() {
            let distance = distance_squared(observation, &cluster.mean);
            if distance < closest_distance {
                closest_distance = distance;
                closest_cluster = j;
            }
        }

        clusters[closest_cluster].observations.push(i);
    }
}

/// Remove all observations from the clusters, keeping their means.
pub fn clear_clusters<T>(clusters: &mut [Cluster<T>])
where
    T: Coordinate,
{
    for cluster in clusters {
        cluster.observations.clear();
    }
}

/// Index of the first cluster without observations.
pub fn find_empty_cluster<T>(clusters: &[Cluster<T>]) -> Option<usize>
where
    T: Coordinate,
{
    clusters.iter().position(Cluster::is_empty)
}

/// Sum of the squared distances between observations and the mean of their
/// cluster.
pub fn dissimilarity<T>(clusters: &[Cluster<T>], observations: &[Point2D<T>]) -> f64
where
    T: Coordinate,
{
    clusters
        .iter()
        .map(|cluster| {
            cluster
                .points(observations)
                .map(|point| distance_squared(point, &cluster.mean))
                .sum::<f64>()
        })
        .sum()
}

/// Flatten clusters into a part ID array, where `part_ids[i]` is the index
/// of the cluster observation `i` belongs to.
///
/// Observations that belong to no cluster get the part ID `clusters.len()`.
pub fn part_ids<T>(clusters: &[Cluster<T>], observation_count: usize) -> Vec<usize>
where
    T: Coordinate,
{
    let mut part_ids = vec![clusters.len(); observation_count];
    for (part, cluster) in clusters.iter().enumerate() {
        for &i in &cluster.observations {
            part_ids[i] = part;
        }
    }
    part_ids
}
