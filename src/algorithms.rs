use crate::Coordinate;
use crate::Point2D;
use std::cmp::Ordering;
use std::fmt;

mod k_means;
mod k_medoids;

pub use k_means::KMeans;
pub use k_medoids::find_optimal_means;
pub use k_medoids::KMedoids;

/// Number of degenerate attempts (k-means restarts, consecutive k-medoids
/// reseeds) after which partitioners give up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Cluster count of partitioners built with `Default::default()`.
pub const DEFAULT_PART_COUNT: usize = 4;

/// Common errors thrown by algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// There is nothing to partition.
    EmptyInput,

    /// The requested cluster count is zero or larger than the number of
    /// distinct observations.
    InvalidParameter { param: usize, max: usize },

    /// Every attempt ended up with an empty cluster.
    DegenerateInput { attempts: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "no observations to partition"),
            Error::InvalidParameter { param, max } => write!(
                f,
                "invalid cluster count {param} (expected a value between 1 and {max})",
            ),
            Error::DegenerateInput { attempts } => write!(
                f,
                "still got an empty cluster after {attempts} attempts",
            ),
        }
    }
}

impl std::error::Error for Error {}

fn cmp_x<T: Coordinate>(a: &Point2D<T>, b: &Point2D<T>) -> Ordering {
    a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal)
}

/// Number of distinct point locations in `observations`.
pub fn distinct_count<T>(observations: &[Point2D<T>]) -> usize
where
    T: Coordinate,
{
    let mut sorted = observations.to_vec();
    sorted.sort_unstable_by(|a, b| {
        cmp_x(a, b).then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    sorted.dedup();
    sorted.len()
}

/// Check the preconditions shared by all partitioners.
fn validate<T>(observations: &[Point2D<T>], part_count: usize) -> Result<(), Error>
where
    T: Coordinate,
{
    if observations.is_empty() {
        return Err(Error::EmptyInput);
    }
    let distinct = distinct_count(observations);
    if part_count == 0 || distinct < part_count {
        return Err(Error::InvalidParameter {
            param: part_count,
            max: distinct,
        });
    }
    Ok(())
}
