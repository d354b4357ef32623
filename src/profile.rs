use std::fmt;
use std::time::Duration;
use std::time::Instant;

/// Information on a partitioning run.
///
/// Filled in by partitioners when run on a given input.  Gives information
/// about how the run went.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Profile {
    /// Wall-clock time of the whole run, retries included.
    pub elapsed_time: Duration,

    /// Number of completed assignment/update cycles.
    ///
    /// For k-medoids, this includes the last cycle, whose clusters were not
    /// better than the previous ones and were discarded.
    pub iterations: usize,

    /// Number of restarts (k-means) or reseeds (k-medoids) caused by empty
    /// clusters.
    pub attempts: usize,

    /// Dissimilarity of the returned clusters.
    pub dissimilarity: f64,
}

impl Profile {
    pub fn reset(&mut self) {
        *self = Profile::default();
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Iterations: {}", self.iterations)?;
        if self.attempts != 0 {
            writeln!(f, "Retries: {}", self.attempts)?;
        }
        writeln!(f, "Dissimilarity: {:.2}", self.dissimilarity)?;

        let micros = self.elapsed_time.as_micros();
        if micros > 1_000_000 {
            write!(f, "Elapsed time: {:.3}s", self.elapsed_time.as_secs_f64())
        } else if micros > 10_000 {
            write!(f, "Elapsed time: {:.3}ms", micros as f64 / 1000.0)
        } else {
            write!(f, "Elapsed time: {micros}µs")
        }
    }
}

/// Writes the time elapsed since its creation into the given duration when
/// dropped.
pub(crate) struct Timer<'a> {
    start: Instant,
    elapsed_time: &'a mut Duration,
}

impl<'a> Timer<'a> {
    pub fn start(elapsed_time: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            elapsed_time,
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        *self.elapsed_time = self.start.elapsed();
    }
}

/// Run `f` against a fresh profile and record how long it took.
pub(crate) fn profiled<R>(f: impl FnOnce(&mut Profile) -> R) -> (Profile, R) {
    let mut profile = Profile::default();
    let mut elapsed_time = Duration::ZERO;
    let result = {
        let _timer = Timer::start(&mut elapsed_time);
        f(&mut profile)
    };
    profile.elapsed_time = elapsed_time;
    (profile, result)
}
