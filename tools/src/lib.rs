use anyhow::Context as _;
use anyhow::Result;
use grappe::Partition;
use grappe::Point2D;
use rand::Rng;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use std::env;
use std::fs;
use std::io;
use std::process;

pub use grappe::DEFAULT_PART_COUNT;

/// Parse command-line arguments, handling `-h, --help` and the number of free
/// arguments.
pub fn parse_args(
    mut options: getopts::Options,
    usage: &str,
    max_free_args: usize,
) -> Result<getopts::Matches> {
    options.optflag("h", "help", "print this help menu");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(usage));
        process::exit(0);
    }
    if max_free_args < matches.free.len() {
        anyhow::bail!("too many arguments\n\n{}", options.usage(usage));
    }

    Ok(matches)
}

/// Buffered reader on the given file, or on stdin if none is given.
pub fn reader(filename: Option<&String>) -> Result<Box<dyn io::BufRead>> {
    Ok(match filename {
        Some(filename) if filename != "-" => {
            let file = fs::File::open(filename)
                .with_context(|| format!("failed to open {filename:?}"))?;
            Box::new(io::BufReader::new(file))
        }
        _ => Box::new(io::stdin().lock()),
    })
}

/// Buffered writer on the given file, or on stdout if none is given.
pub fn writer(filename: Option<&String>) -> Result<Box<dyn io::Write>> {
    Ok(match filename {
        Some(filename) if filename != "-" => {
            let file = fs::File::create(filename)
                .with_context(|| format!("failed to create {filename:?}"))?;
            Box::new(io::BufWriter::new(file))
        }
        _ => Box::new(io::BufWriter::new(io::stdout().lock())),
    })
}

/// Parse an algorithm definition of the form `NAME[,K[,MAX_ATTEMPTS]]`.
///
/// The random number generator of the algorithm is seeded from `rng`.
pub fn parse_algorithm(
    definition: &str,
    rng: &mut impl Rng,
) -> Result<Box<dyn Partition<i32>>> {
    let mut args = definition.split(',');
    let name = args.next().context("empty definition")?;

    fn usize_arg(arg: Option<&str>) -> Result<Option<usize>> {
        arg.map(|arg| {
            arg.parse::<usize>()
                .with_context(|| format!("arg {:?} is not a valid unsigned integer", arg))
        })
        .transpose()
    }

    let part_count = usize_arg(args.next())?.unwrap_or(DEFAULT_PART_COUNT);
    let max_attempts = usize_arg(args.next())?.unwrap_or(grappe::DEFAULT_MAX_ATTEMPTS);
    if let Some(arg) = args.next() {
        anyhow::bail!("unexpected argument {:?}", arg);
    }

    let algo_rng = Pcg64::seed_from_u64(rng.gen());

    let algorithm: Box<dyn Partition<i32>> = match name {
        "kmeans" | "k-means" => Box::new(grappe::KMeans {
            max_attempts,
            ..grappe::KMeans::new(algo_rng, part_count)
        }),
        "kmedoids" | "k-medoids" => Box::new(grappe::KMedoids {
            max_attempts,
            ..grappe::KMedoids::new(algo_rng, part_count)
        }),
        _ => anyhow::bail!("unknown algorithm {:?}", name),
    };
    Ok(algorithm)
}

/// Generate clumps of observations.
///
/// The first `root_count` observations (at least one) are uniformly
/// distributed in `[0, plane_size)²`.  Each of the following ones is an
/// already generated observation moved by at most `offset` on each axis.
pub fn generate_observations(
    rng: &mut impl Rng,
    plane_size: Point2D<i32>,
    offset: Point2D<i32>,
    root_count: usize,
    count: usize,
) -> Vec<Point2D<i32>> {
    let root_count = usize::min(usize::max(root_count, 1), count);
    let mut observations = Vec::with_capacity(count);

    for _ in 0..root_count {
        observations.push(Point2D::new(
            rng.gen_range(0..plane_size.x),
            rng.gen_range(0..plane_size.y),
        ));
    }

    for _ in root_count..count {
        let cell = observations[rng.gen_range(0..observations.len())];
        let offset = Point2D::new(
            rng.gen_range(-offset.x..=offset.x),
            rng.gen_range(-offset.y..=offset.y),
        );
        observations.push(cell + offset);
    }

    observations
}

/// Read observations, one `x y` pair per line.
///
/// Empty lines and lines starting with `#` are ignored.
pub fn read_observations(r: impl io::BufRead) -> Result<Vec<Point2D<i32>>> {
    let mut observations = Vec::new();
    for (line_number, line) in r.lines().enumerate() {
        let line = line.context("failed to read observations")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let observation = parse_observation(line)
            .with_context(|| format!("line {}: invalid observation", line_number + 1))?;
        observations.push(observation);
    }
    Ok(observations)
}

fn parse_observation(line: &str) -> Result<Point2D<i32>> {
    let mut coordinates = line.split_whitespace();
    let mut coordinate = |axis: &str| -> Result<i32> {
        let arg = coordinates
            .next()
            .with_context(|| format!("missing {axis} coordinate"))?;
        arg.parse()
            .with_context(|| format!("{axis} coordinate {arg:?} is not a valid integer"))
    };
    let x = coordinate("x")?;
    let y = coordinate("y")?;
    if let Some(extra) = coordinates.next() {
        anyhow::bail!("unexpected value {:?}", extra);
    }
    Ok(Point2D::new(x, y))
}

/// Write observations, one `x y part` triple per line.
pub fn write_partition(
    mut w: impl io::Write,
    observations: &[Point2D<i32>],
    part_ids: &[usize],
) -> io::Result<()> {
    for (observation, part) in observations.iter().zip(part_ids) {
        writeln!(w, "{} {} {}", observation.x, observation.y, part)?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_algorithm() {
        let mut rng = Pcg64::seed_from_u64(0);

        let algorithm = parse_algorithm("kmeans,3", &mut rng).unwrap();
        assert_eq!(algorithm.name(), "K means");
        assert_eq!(algorithm.param_name(), "K");
        assert_eq!(algorithm.param(), 3);

        let algorithm = parse_algorithm("kmedoids", &mut rng).unwrap();
        assert_eq!(algorithm.name(), "K medoids");
        assert_eq!(algorithm.param(), DEFAULT_PART_COUNT);

        assert!(parse_algorithm("kmeans,two", &mut rng).is_err());
        assert!(parse_algorithm("kmeans,2,10,3", &mut rng).is_err());
        assert!(parse_algorithm("dbscan", &mut rng).is_err());
    }

    #[test]
    fn test_read_write() {
        let input = "# clusters\n0 0\n\n  10 -3\n7 2\n";
        let observations = read_observations(input.as_bytes()).unwrap();
        assert_eq!(
            observations,
            [Point2D::new(0, 0), Point2D::new(10, -3), Point2D::new(7, 2)]
        );

        let mut output = Vec::new();
        write_partition(&mut output, &observations, &[0, 1, 0]).unwrap();
        assert_eq!(output, b"0 0 0\n10 -3 1\n7 2 0\n");
    }

    #[test]
    fn test_read_errors() {
        let err = read_observations("1 2\n3\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "line 2: invalid observation");
        assert!(read_observations("1 2 3\n".as_bytes()).is_err());
        assert!(read_observations("1 x\n".as_bytes()).is_err());
    }

    proptest!(
        #[test]
        fn generated_observations_stay_close_to_the_plane(
            root_count in 1..30_usize,
            count in 0..500_usize,
            seed in any::<u64>(),
        ) {
            const PLANE: i32 = 1000;
            const OFFSET: i32 = 10;
            let mut rng = Pcg64::seed_from_u64(seed);
            let observations = generate_observations(
                &mut rng,
                Point2D::new(PLANE, PLANE),
                Point2D::new(OFFSET, OFFSET),
                root_count,
                count,
            );
            prop_assert_eq!(observations.len(), count);

            // Each observation drifts by at most OFFSET from its parent, and
            // a chain of parents is at most count long.
            let margin = OFFSET * count as i32;
            for (i, observation) in observations.iter().enumerate() {
                if i < root_count {
                    prop_assert!((0..PLANE).contains(&observation.x));
                    prop_assert!((0..PLANE).contains(&observation.y));
                } else {
                    prop_assert!((-margin..PLANE + margin).contains(&observation.x));
                    prop_assert!((-margin..PLANE + margin).contains(&observation.y));
                }
            }
        }
    );
}
