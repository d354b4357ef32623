//! Lloyd's algorithm, seeded with distinct random observations.

use super::validate;
use super::Error;
use super::DEFAULT_MAX_ATTEMPTS;
use super::DEFAULT_PART_COUNT;
use crate::cluster::assign_observations;
use crate::cluster::clear_clusters;
use crate::cluster::compute_centroid;
use crate::cluster::converged;
use crate::cluster::dissimilarity;
use crate::cluster::find_empty_cluster;
use crate::cluster::init_clusters;
use crate::profile::profiled;
use crate::Cluster;
use crate::Coordinate;
use crate::Palette;
use crate::Point2D;
use crate::Profile;

/// One run of Lloyd's algorithm.
///
/// Returns `None` as soon as a cluster ends up empty.
fn k_means_attempt<T, R>(
    observations: &[Point2D<T>],
    part_count: usize,
    rng: &mut R,
    palette: &Palette,
    max_iter: usize,
    iterations: &mut usize,
) -> Option<Vec<Cluster<T>>>
where
    T: Coordinate,
    R: rand::Rng,
{
    let seeds = rand::seq::index::sample(rng, observations.len(), part_count);
    let mut clusters = init_clusters(seeds.iter().map(|i| observations[i]), palette);
    let mut previous_means = vec![Point2D::zeros(); part_count];

    loop {
        clear_clusters(&mut clusters);
        assign_observations(&mut clusters, observations);

        if let Some(empty) = find_empty_cluster(&clusters) {
            tracing::debug!(cluster = empty, iteration = *iterations, "empty cluster");
            return None;
        }

        for (cluster, previous_mean) in clusters.iter_mut().zip(&mut previous_means) {
            *previous_mean = cluster.mean;
            cluster.mean = compute_centroid(cluster, observations);
        }

        *iterations += 1;

        if converged(&clusters, &previous_means) {
            return Some(clusters);
        }
        if max_iter <= *iterations {
            tracing::info!("reached max iterations before convergence");
            return Some(clusters);
        }
    }
}

fn k_means<T, R>(
    observations: &[Point2D<T>],
    part_count: usize,
    rng: &mut R,
    palette: &Palette,
    max_attempts: usize,
    max_iter: usize,
    profile: &mut Profile,
) -> Result<Vec<Cluster<T>>, Error>
where
    T: Coordinate,
    R: rand::Rng,
{
    for attempt in 0..max_attempts {
        // Iterations of failed attempts are not accumulated.
        profile.iterations = 0;
        profile.attempts = attempt;

        let clusters = k_means_attempt(
            observations,
            part_count,
            rng,
            palette,
            max_iter,
            &mut profile.iterations,
        );
        if let Some(clusters) = clusters {
            profile.dissimilarity = dissimilarity(&clusters, observations);
            return Ok(clusters);
        }
    }

    Err(Error::DegenerateInput {
        attempts: max_attempts,
    })
}

/// # K-means algorithm
///
/// Partitions observations into `part_count` clusters by alternating two
/// steps until the cluster means stop moving:
///
/// - assign each observation to the cluster with the closest mean,
/// - move each mean to the centroid of its observations.
///
/// Means are initially set to distinct observations drawn at random from
/// `rng`.  Whenever a cluster ends up empty, the run is restarted from new
/// seeds, at most `max_attempts` times.
///
/// With integer coordinates, centroids are computed with integer division and
/// convergence means the means are exactly the same from one iteration to
/// the next.
///
/// # Example
///
/// ```rust
/// # fn main() -> Result<(), grappe::Error> {
/// use grappe::Partition as _;
/// use grappe::Point2D;
///
/// let observations = [
///     Point2D::new(0, 0),
///     Point2D::new(0, 1),
///     Point2D::new(10, 0),
///     Point2D::new(10, 1),
/// ];
/// let mut profile = grappe::Profile::default();
///
/// let clusters = grappe::KMeans::new(rand::thread_rng(), 2)
///     .partition(&observations, &mut profile)?;
///
/// assert_eq!(clusters.len(), 2);
/// assert!(clusters.iter().all(|cluster| cluster.len() == 2));
/// # Ok(())
/// # }
/// ```
///
/// # Reference
///
/// Lloyd, S. (1982). Least squares quantization in PCM. *IEEE Transactions on
/// Information Theory*, 28(2), 129–137.
#[derive(Debug, Clone)]
pub struct KMeans<R> {
    pub rng: R,
    /// Number of clusters, also known as K.
    pub part_count: usize,
    pub palette: Palette,
    pub max_attempts: usize,
    /// Stop iterating after that many assignment/update cycles, even if the
    /// means still move.
    pub max_iter: usize,
}

impl<R> KMeans<R> {
    pub fn new(rng: R, part_count: usize) -> Self {
        Self {
            rng,
            part_count,
            palette: Palette::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_iter: usize::MAX,
        }
    }
}

impl<R> Default for KMeans<R>
where
    R: Default,
{
    fn default() -> Self {
        Self::new(R::default(), DEFAULT_PART_COUNT)
    }
}

impl<T, R> crate::Partition<T> for KMeans<R>
where
    T: Coordinate,
    R: rand::Rng,
{
    fn name(&self) -> &str {
        "K means"
    }

    fn param_name(&self) -> &str {
        "K"
    }

    fn param(&self) -> usize {
        self.part_count
    }

    fn set_param(&mut self, param: usize) {
        self.part_count = param;
    }

    fn partition(
        &mut self,
        observations: &[Point2D<T>],
        profile: &mut Profile,
    ) -> Result<Vec<Cluster<T>>, Error> {
        let part_count = self.part_count;
        let _span = tracing::info_span!("k_means", part_count, len = observations.len()).entered();

        validate(observations, part_count)?;

        let (run, clusters) = profiled(|run| {
            k_means(
                observations,
                part_count,
                &mut self.rng,
                &self.palette,
                self.max_attempts,
                self.max_iter,
                run,
            )
        });
        let clusters = clusters?;
        tracing::info!(
            iterations = run.iterations,
            attempts = run.attempts,
            dissimilarity = run.dissimilarity,
            "converged"
        );

        *profile = run;
        Ok(clusters)
    }
}
