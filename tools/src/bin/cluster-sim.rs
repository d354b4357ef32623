use anyhow::Context as _;
use anyhow::Result;
use grappe::BoundingBox;
use grappe::Partition;
use grappe::Point2D;
use grappe::Profile;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;

const USAGE: &str = "Usage: cluster-sim [options] [out-part] >out.part";

const DEFAULT_PLANE_SIZE: i32 = 10000;
const DEFAULT_OFFSET: i32 = 100;
const DEFAULT_ROOT_OBSERVATIONS_AMOUNT: usize = 20;
const DEFAULT_OBSERVATIONS_AMOUNT: usize = 40000;

fn opt_or<T>(matches: &getopts::Matches, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(matches
        .opt_get(name)
        .with_context(|| format!("invalid value for option {name:?}"))?
        .unwrap_or(default))
}

fn observations(matches: &getopts::Matches, rng: &mut Pcg64) -> Result<Vec<Point2D<i32>>> {
    if let Some(filename) = matches.opt_str("i") {
        let r = grappe_tools::reader(Some(&filename))?;
        return grappe_tools::read_observations(r);
    }

    let count = opt_or(matches, "n", DEFAULT_OBSERVATIONS_AMOUNT)?;
    let root_count = opt_or(matches, "r", DEFAULT_ROOT_OBSERVATIONS_AMOUNT)?;
    let plane_size: i32 = opt_or(matches, "s", DEFAULT_PLANE_SIZE)?;
    let offset: i32 = opt_or(matches, "o", DEFAULT_OFFSET)?;
    if root_count == 0 {
        anyhow::bail!("expected at least one root observation");
    }
    if plane_size <= 0 {
        anyhow::bail!("expected a positive plane size, got {plane_size}");
    }
    if offset < 0 {
        anyhow::bail!("expected a non-negative offset, got {offset}");
    }

    Ok(grappe_tools::generate_observations(
        rng,
        Point2D::new(plane_size, plane_size),
        Point2D::new(offset, offset),
        root_count,
        count,
    ))
}

fn print_clusters(clusters: &[grappe::Cluster<i32>]) {
    eprintln!("Clusters: {}", clusters.len());
    for (i, cluster) in clusters.iter().enumerate() {
        eprintln!(
            " - {i:3}: {} mean=({}, {}) observations={}",
            cluster.color,
            cluster.mean.x,
            cluster.mean.y,
            cluster.len(),
        );
    }
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optmulti(
        "a",
        "algorithm",
        "name of the algorithm to run, see ALGORITHMS",
        "NAME[,K]",
    );
    options.optopt("i", "input", "read observations from a file", "FILE");
    options.optopt("n", "observations", "number of generated observations", "N");
    options.optopt("o", "offset", "max distance between an observation and its parent", "N");
    options.optopt("r", "roots", "number of uniformly distributed observations", "N");
    options.optopt("s", "plane-size", "width and height of the plane", "N");
    options.optopt("S", "seed", "seed of the random number generator", "N");
    options.optopt("t", "trace", "emit a chrome trace", "FILE");
    options.optflag("v", "verbose", "print the clusters");

    let matches = grappe_tools::parse_args(options, USAGE, 1)?;

    let registry = Registry::default().with(EnvFilter::from_env("LOG")).with(
        HierarchicalLayer::new(4)
            .with_thread_ids(true)
            .with_targets(true)
            .with_bracketed_fields(true),
    );
    let _chrome_trace_guard = match matches.opt_str("t") {
        Some(filename) => {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(filename)
                .build();
            registry.with(chrome_layer).init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    };

    let mut rng = match matches.opt_get::<u64>("S").context("invalid value for -S, --seed")? {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_entropy(),
    };

    let mut algorithm_specs = matches.opt_strs("a");
    if algorithm_specs.is_empty() {
        algorithm_specs.push(String::from("kmeans"));
    }
    let mut partitioners: Vec<Box<dyn Partition<i32>>> = algorithm_specs
        .iter()
        .map(|algorithm_spec| {
            grappe_tools::parse_algorithm(algorithm_spec, &mut rng)
                .with_context(|| format!("invalid algorithm {:?}", algorithm_spec))
        })
        .collect::<Result<_>>()?;

    let observations = observations(&matches, &mut rng)?;
    eprintln!("Observations: {}", observations.len());

    let verbose = matches.opt_present("v");
    if verbose {
        if let Some(bb) = BoundingBox::from_points(&observations) {
            let center = bb.center();
            eprintln!(
                "Plane: ({}, {}) to ({}, {}), center ({}, {})",
                bb.p_min.x, bb.p_min.y, bb.p_max.x, bb.p_max.y, center.x, center.y,
            );
        }
    }
    let mut clusters = Vec::new();
    let mut profile = Profile::default();

    for (algorithm_spec, partitioner) in algorithm_specs.iter().zip(&mut partitioners) {
        clusters = partitioner
            .partition(&observations, &mut profile)
            .with_context(|| format!("failed to apply algorithm {:?}", algorithm_spec))?;

        eprintln!(
            "{}, {}={}",
            partitioner.name(),
            partitioner.param_name(),
            partitioner.param(),
        );
        eprintln!("{profile}");
        if verbose {
            print_clusters(&clusters);
        }
    }

    let part_ids = grappe::cluster::part_ids(&clusters, observations.len());
    let output = grappe_tools::writer(matches.free.first())?;
    grappe_tools::write_partition(output, &observations, &part_ids)
        .context("failed to write partition")?;

    Ok(())
}
