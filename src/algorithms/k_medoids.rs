//! K-medoids with deterministic seeding.
//!
//! Seeds are spread along the horizontal extent of the data, then medoids and
//! assignments are refined for as long as the dissimilarity strictly
//! decreases.

use super::cmp_x;
use super::validate;
use super::Error;
use super::DEFAULT_MAX_ATTEMPTS;
use super::DEFAULT_PART_COUNT;
use crate::cluster::assign_observations;
use crate::cluster::clear_clusters;
use crate::cluster::compute_centroid;
use crate::cluster::dissimilarity;
use crate::cluster::find_empty_cluster;
use crate::cluster::init_clusters;
use crate::profile::profiled;
use crate::BoundingBox;
use crate::Cluster;
use crate::Coordinate;
use crate::Palette;
use crate::Point2D;
use crate::Profile;
use rand::seq::SliceRandom as _;

/// Pick `part_count` seeds spread along the X axis.
///
/// The bounding box of the observations is split into `part_count` vertical
/// strips of equal width.  The seed of each strip is the first observation
/// (by X) that lies at or after the strip's horizontal middle, or the
/// rightmost observation if there is none.
///
/// `observations` are left untouched, sorting happens on a copy.
pub fn find_optimal_means<T>(part_count: usize, observations: &[Point2D<T>]) -> Vec<Point2D<T>>
where
    T: Coordinate,
{
    let bb = match BoundingBox::from_points(observations) {
        Some(bb) if part_count != 0 => bb,
        _ => return Vec::new(),
    };

    let mut sorted = observations.to_vec();
    sorted.sort_by(cmp_x);
    let rightmost = sorted[sorted.len() - 1];

    // Strip middles are computed in the wide type, they can lie outside of
    // the range of `T`.
    let min_x = bb.p_min.x.widen();
    let section_width = bb.width() / T::wide_count(part_count);
    let half_section = section_width / T::wide_count(2);

    (0..part_count)
        .map(|i| {
            let target_x = min_x + section_width * T::wide_count(i) + half_section;
            let idx = sorted.partition_point(|observation| observation.x.widen() < target_x);
            sorted.get(idx).copied().unwrap_or(rightmost)
        })
        .collect()
}

/// The observation of `cluster` that stands in for its centroid.
///
/// It is the first observation (by X) at or after the centroid.  Should there
/// be none, a random observation of the cluster is picked.
fn compute_medoid<T, R>(cluster: &Cluster<T>, observations: &[Point2D<T>], rng: &mut R) -> Point2D<T>
where
    T: Coordinate,
    R: rand::Rng,
{
    let centroid = compute_centroid(cluster, observations);

    // Stable sort: observations sharing an X coordinate stay in assignment
    // order.
    let mut points: Vec<&Point2D<T>> = cluster.points(observations).collect();
    points.sort_by(|a, b| cmp_x(a, b));

    let idx = points.partition_point(|observation| observation.x < centroid.x);
    match points.get(idx) {
        Some(medoid) => **medoid,
        None => points.choose(rng).map_or(centroid, |medoid| **medoid),
    }
}

/// Returns the clusters with the lowest dissimilarity, and the dissimilarity
/// of every iteration.
fn k_medoids<T, R>(
    observations: &[Point2D<T>],
    part_count: usize,
    rng: &mut R,
    palette: &Palette,
    max_attempts: usize,
    profile: &mut Profile,
) -> Result<(Vec<Cluster<T>>, Vec<f64>), Error>
where
    T: Coordinate,
    R: rand::Rng,
{
    let seeds = find_optimal_means(part_count, observations);
    let mut clusters = init_clusters(seeds, palette);

    let mut best_clusters = None;
    let mut best_dissimilarity = f64::INFINITY;
    let mut history = Vec::new();
    let mut reseeds_in_a_row = 0;

    loop {
        clear_clusters(&mut clusters);
        assign_observations(&mut clusters, observations);

        if let Some(empty) = find_empty_cluster(&clusters) {
            if reseeds_in_a_row == max_attempts {
                return Err(Error::DegenerateInput {
                    attempts: reseeds_in_a_row,
                });
            }
            let index = rng.gen_range(0..observations.len());
            tracing::debug!(cluster = empty, observation = index, "reseeding empty cluster");
            clusters[empty].mean = observations[index];
            reseeds_in_a_row += 1;
            profile.attempts += 1;
            continue;
        }
        reseeds_in_a_row = 0;

        for cluster in &mut clusters {
            cluster.mean = compute_medoid(cluster, observations, rng);
        }

        profile.iterations += 1;

        let current_dissimilarity = dissimilarity(&clusters, observations);
        tracing::debug!(
            iteration = profile.iterations,
            dissimilarity = current_dissimilarity
        );
        history.push(current_dissimilarity);

        if best_dissimilarity <= current_dissimilarity {
            break;
        }
        best_dissimilarity = current_dissimilarity;
        best_clusters = Some(clusters.clone());
    }

    match best_clusters {
        Some(best_clusters) => {
            profile.dissimilarity = best_dissimilarity;
            Ok((best_clusters, history))
        }
        None => {
            // Only happens if the dissimilarity is not finite.
            profile.dissimilarity = history.last().copied().unwrap_or(f64::INFINITY);
            Ok((clusters, history))
        }
    }
}

/// # K-medoids algorithm
///
/// Partitions observations into `part_count` clusters, each represented by
/// one of its observations (its medoid) rather than by a computed mean.
///
/// Seeds are chosen deterministically (see [`find_optimal_means`]).  Then,
/// observations are assigned to their closest medoid and medoids are moved
/// to the observation closest (by X) to their cluster centroid, until the
/// dissimilarity stops strictly decreasing.  The clusters of the best
/// iteration are returned.
///
/// Empty clusters are reseeded with a random observation drawn from `rng`,
/// at most `max_attempts` times in a row.
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
///     Point2D::new(10, 3),
///     Point2D::new(30, 1),
///     Point2D::new(70, 101),
///     Point2D::new(90, 100),
///     Point2D::new(100, 98),
/// ];
/// let mut profile = grappe::Profile::default();
///
/// let clusters = grappe::KMedoids::new(rand::thread_rng(), 2)
///     .partition(&observations, &mut profile)?;
///
/// assert_eq!(clusters[0].observations, [0, 1, 2]);
/// assert_eq!(clusters[1].observations, [3, 4, 5]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KMedoids<R> {
    pub rng: R,
    /// Number of clusters, also known as K.
    pub part_count: usize,
    pub palette: Palette,
    pub max_attempts: usize,
}

impl<R> KMedoids<R> {
    pub fn new(rng: R, part_count: usize) -> Self {
        Self {
            rng,
            part_count,
            palette: Palette::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl<R> Default for KMedoids<R>
where
    R: Default,
{
    fn default() -> Self {
        Self::new(R::default(), DEFAULT_PART_COUNT)
    }
}

impl<T, R> crate::Partition<T> for KMedoids<R>
where
    T: Coordinate,
    R: rand::Rng,
{
    fn name(&self) -> &str {
        "K medoids"
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
        let _span =
            tracing::info_span!("k_medoids", part_count, len = observations.len()).entered();

        validate(observations, part_count)?;

        let (run, result) = profiled(|run| {
            k_medoids(
                observations,
                part_count,
                &mut self.rng,
                &self.palette,
                self.max_attempts,
                run,
            )
        });
        let (clusters, _history) = result?;
        tracing::info!(
            iterations = run.iterations,
            reseeds = run.attempts,
            dissimilarity = run.dissimilarity,
            "done"
        );

        *profile = run;
        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Partition;
    use proptest::prelude::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    fn rng(seed: u64) -> Pcg64 {
        Pcg64::seed_from_u64(seed)
    }

    #[test]
    fn seeds_are_spread_along_x() {
        let observations = [
            Point2D::new(95, 3),
            Point2D::new(0, 0),
            Point2D::new(40, 7),
            Point2D::new(12, 5),
            Point2D::new(70, 1),
            Point2D::new(100, 10),
        ];
        let before = observations;

        // Strip width 25, targets at x = 12, 37, 62, 87.
        let seeds = find_optimal_means(4, &observations);
        assert_eq!(
            seeds,
            [
                Point2D::new(12, 5),
                Point2D::new(40, 7),
                Point2D::new(70, 1),
                Point2D::new(95, 3),
            ]
        );
        assert_eq!(observations, before);
    }

    #[test]
    fn seeds_with_an_offset_plane() {
        let observations = [
            Point2D::new(-300, 0),
            Point2D::new(-290, 0),
            Point2D::new(-200, 0),
            Point2D::new(-100, 0),
        ];
        // Strip width 100, targets at x = -250, -150.
        let seeds = find_optimal_means(2, &observations);
        assert_eq!(seeds, [Point2D::new(-200, 0), Point2D::new(-100, 0)]);
    }

    #[test]
    fn seeds_on_a_zero_width_plane() {
        // A zero-width plane puts every target on the same X.
        let observations = [Point2D::new(3, 0), Point2D::new(3, 9)];
        let seeds = find_optimal_means(2, &observations);
        assert_eq!(seeds.len(), 2);
        assert!(seeds.iter().all(|seed| seed.x == 3));

        assert!(find_optimal_means::<i32>(3, &[]).is_empty());
    }

    #[test]
    fn medoid_is_an_observation() {
        let observations = [
            Point2D::new(9, 0),
            Point2D::new(1, 0),
            Point2D::new(4, 4),
            Point2D::new(5, 0),
        ];
        let mut cluster = Cluster::new(Point2D::new(0, 0), crate::Color::new(0, 0, 0));
        cluster.observations = vec![0, 1, 2, 3];

        // Centroid is (4, 1): the first observation at x >= 4 is (4, 4).
        let medoid = compute_medoid(&cluster, &observations, &mut rng(0));
        assert_eq!(medoid, Point2D::new(4, 4));
    }

    #[test]
    fn two_groups() {
        let observations = [
            Point2D::new(90, 100),
            Point2D::new(0, 0),
            Point2D::new(100, 98),
            Point2D::new(30, 1),
            Point2D::new(70, 101),
            Point2D::new(10, 3),
        ];
        let mut profile = Profile::default();
        let clusters = KMedoids::new(rng(0), 2)
            .partition(&observations, &mut profile)
            .unwrap();

        // Seeds are (30, 1) and (90, 100), which are already the medoids.
        assert_eq!(clusters[0].observations, [1, 3, 5]);
        assert_eq!(clusters[0].mean, Point2D::new(30, 1));
        assert_eq!(clusters[1].observations, [0, 2, 4]);
        assert_eq!(clusters[1].mean, Point2D::new(90, 100));
        // The second iteration brings no improvement and is discarded, but
        // still counted.
        assert_eq!(profile.iterations, 2);
        assert_eq!(profile.attempts, 0);
        assert_eq!(profile.dissimilarity, 1810.0);
        assert_eq!(profile.dissimilarity, dissimilarity(&clusters, &observations));
    }

    #[test]
    fn reseeds_empty_clusters() {
        // Two seeds land on the same location, which leaves one cluster
        // empty until it is reseeded.
        let observations = [
            Point2D::new(0, 0),
            Point2D::new(0, 0),
            Point2D::new(1, 0),
            Point2D::new(50, 50),
        ];
        let mut profile = Profile::default();
        let clusters = KMedoids::new(rng(7), 3)
            .partition(&observations, &mut profile)
            .unwrap();
        assert_eq!(clusters.len(), 3);
        assert!(clusters.iter().all(|cluster| !cluster.is_empty()));
        assert!(2 <= profile.attempts);
    }

    #[test]
    fn reseeds_are_bounded() {
        // Every strip middle falls after (1, 0), so all three seeds are
        // (50, 50) and two clusters start empty.
        let observations = [
            Point2D::new(0, 0),
            Point2D::new(0, 0),
            Point2D::new(1, 0),
            Point2D::new(50, 50),
        ];
        let mut profile = Profile {
            iterations: 7,
            attempts: 3,
            ..Profile::default()
        };
        let before = profile;
        let mut algo = KMedoids {
            max_attempts: 0,
            ..KMedoids::new(rng(7), 3)
        };
        assert_eq!(
            algo.partition(&observations, &mut profile),
            Err(Error::DegenerateInput { attempts: 0 }),
        );
        assert_eq!(profile, before);
    }

    #[test]
    fn extreme_coordinates() {
        let observations = [
            Point2D::new(i32::MIN, 0),
            Point2D::new(0, 0),
            Point2D::new(i32::MAX, 0),
        ];
        let seeds = find_optimal_means(2, &observations);
        assert_eq!(seeds, [Point2D::new(0, 0), Point2D::new(i32::MAX, 0)]);

        // Both seeds are (i32::MAX, 0), the second cluster gets reseeded.
        let observations = [Point2D::new(i32::MIN, 0), Point2D::new(i32::MAX, 0)];
        let mut profile = Profile::default();
        let clusters = KMedoids::new(rng(0), 2)
            .partition(&observations, &mut profile)
            .unwrap();
        assert!(1 <= profile.attempts);
        assert_eq!(clusters[0].observations, [1]);
        assert_eq!(clusters[1].observations, [0]);
        assert_eq!(profile.dissimilarity, 0.0);
    }

    #[test]
    fn default_settings() {
        let algo = KMedoids {
            part_count: 2,
            ..KMedoids::<rand::rngs::ThreadRng>::default()
        };
        assert_eq!(algo.part_count, 2);
        assert_eq!(algo.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn invalid_parameters() {
        let observations = [Point2D::new(1, 1), Point2D::new(1, 1)];
        let mut profile = Profile::default();
        let mut algo = KMedoids::new(rng(0), 2);
        assert_eq!(
            algo.partition(&observations, &mut profile),
            Err(Error::InvalidParameter { param: 2, max: 1 }),
        );
        assert_eq!(profile, Profile::default());

        Partition::<i32>::set_param(&mut algo, 1);
        let clusters = algo.partition(&observations, &mut profile).unwrap();
        assert_eq!(clusters[0].observations, [0, 1]);
        assert_eq!(profile.dissimilarity, 0.0);
    }

    fn point() -> impl Strategy<Value = Point2D<i32>> {
        (-500..500, -500..500).prop_map(|(x, y)| Point2D::new(x, y))
    }

    proptest!(
        #![proptest_config(ProptestConfig{timeout: 2000, ..ProptestConfig::default()})]
        /// Dissimilarity strictly decreases until the last iteration and the
        /// returned clusters are the best ones.
        #[test]
        fn dissimilarity_decreases(
            observations in prop::collection::vec(point(), 10..200),
            part_count in 1..6_usize,
            seed in any::<u64>(),
        ) {
            prop_assume!(part_count <= crate::distinct_count(&observations));

            let mut profile = Profile::default();
            let (clusters, history) = k_medoids(
                &observations,
                part_count,
                &mut rng(seed),
                &Palette::default(),
                DEFAULT_MAX_ATTEMPTS,
                &mut profile,
            ).unwrap();

            prop_assert_eq!(history.len(), profile.iterations);
            for pair in history[..history.len() - 1].windows(2) {
                prop_assert!(pair[1] < pair[0], "{:?}", history);
            }
            prop_assert!(profile.dissimilarity <= history[0]);
            prop_assert_eq!(profile.dissimilarity, dissimilarity(&clusters, &observations));

            let total: usize = clusters.iter().map(Cluster::len).sum();
            prop_assert_eq!(total, observations.len());
            for cluster in &clusters {
                prop_assert!(observations.contains(&cluster.mean));
            }
        }
    );
}
