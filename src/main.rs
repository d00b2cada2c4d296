use std::time::Instant;

use clap::Parser;
use nalgebra::Vector3;
use olib::{Bounds, Item, Octree, OctreeError, OctreeSettings, QueryStats, settings};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Fills an octree with random point masses and times insertion, a
/// full-domain query and the mass aggregation pass.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Number of random items to insert
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    count: usize,

    /// Seed for the item generator; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Half width of the root cube centered on the origin
    #[arg(long, default_value_t = 1000.0)]
    extent: f64,

    #[arg(long, default_value_t = settings::DEFAULT_MAX_ITEMS)]
    max_items: usize,

    #[arg(long, default_value_t = settings::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Build the root octants on the rayon thread pool
    #[arg(long)]
    parallel: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn random_items(rng: &mut StdRng, count: usize) -> Vec<Item<f64>> {
    (0..count)
        .map(|_| {
            Item::at(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(0.0..2.0),
            )
        })
        .collect()
}

fn main() -> Result<(), OctreeError> {
    init_logger();
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let items = random_items(&mut rng, args.count);

    let bounds = Bounds::try_new(
        Vector3::repeat(-args.extent),
        Vector3::repeat(args.extent),
    )?;
    let settings = OctreeSettings {
        max_items: args.max_items,
        max_depth: args.max_depth,
        ..Default::default()
    };

    let start = Instant::now();
    let mut tree = if args.parallel {
        Octree::par_build(bounds, settings, items)?
    } else {
        let mut tree = Octree::new(bounds, settings)?;
        tree.extend(items)?;
        tree
    };
    log::info!("Inserting {} items took {:?}", tree.len(), start.elapsed());

    let start = Instant::now();
    let mut query_stats = QueryStats::default();
    let results = tree.query_with_stats(&bounds, &mut query_stats);
    log::info!("Query took {:?}", start.elapsed());
    log::info!("Results from query: {}", results.len());

    let stats = tree.stats();
    log::info!("Octants: {}", stats.nodes);
    log::info!("Deepest: {}", stats.deepest);
    log::info!("Overfull leaves: {}", stats.overfull_leaves);
    log::info!("Octant queries: {}", query_stats.nodes_visited);
    log::info!("Item queries: {}", query_stats.leaves_scanned);

    let start = Instant::now();
    let mass = tree.calculate_mass_distribution();
    log::info!("Mass distribution took {:?}", start.elapsed());
    log::info!(
        "Mass: {} -> X {} Y {} Z {}",
        mass.mass,
        mass.center.x,
        mass.center.y,
        mass.center.z
    );

    Ok(())
}
