use std::time::Instant;

use clap::{Parser, Subcommand};
use mirror_tree::{FlatTree, Tree};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Parser, Debug, Clone)]
#[clap(version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
    #[clap(
        short,
        long,
        default_value = "42",
        help = "Seed for the tree generator, the same seed gives the same tree"
    )]
    pub seed: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a random tree and time the three mirror variants against each other
    Bench {
        #[clap(
            long,
            default_value = "18",
            help = "Levels that always branch, the tree has at least 2^min_depth leaves"
        )]
        min_depth: u32,
        #[clap(
            long,
            default_value = "0.3",
            help = "Probability that a node below the depth floor branches again"
        )]
        branch_probability: f64,
        #[clap(
            long,
            default_value = "100",
            help = "Leaf values are drawn from 0..max_value"
        )]
        max_value: u64,
        #[clap(long, default_value = "9", help = "Timed runs per variant")]
        repeats: usize,
    },
    /// Generate a small tree and dump it together with its flat encoding
    Dump {
        #[clap(long, default_value = "2")]
        min_depth: u32,
        #[clap(long, default_value = "0.3")]
        branch_probability: f64,
        #[clap(long, default_value = "100")]
        max_value: u64,
    },
}

/// Generate a random tree.
///
/// Every node above `min_depth` levels branches unconditionally, below that
/// a node branches with `branch_probability`. Leaf values are drawn
/// uniformly from `0..max_value`.
fn random_tree(
    rng: &mut StdRng,
    max_value: u64,
    branch_probability: f64,
    min_depth: u32,
    level: u32,
) -> Tree {
    if level < min_depth || rng.gen_bool(branch_probability) {
        Tree::node(
            random_tree(rng, max_value, branch_probability, min_depth, level + 1),
            random_tree(rng, max_value, branch_probability, min_depth, level + 1),
        )
    } else {
        Tree::leaf(rng.gen_range(0..max_value))
    }
}

fn generate(
    rng: &mut StdRng,
    max_value: u64,
    branch_probability: f64,
    min_depth: u32,
) -> anyhow::Result<Tree> {
    anyhow::ensure!(max_value > 0, "max_value must be positive");
    anyhow::ensure!(
        (0.0..=1.0).contains(&branch_probability),
        "branch_probability must be between 0 and 1"
    );
    Ok(random_tree(rng, max_value, branch_probability, min_depth, 0))
}

fn times(repeats: usize, mut f: impl FnMut()) -> Vec<f64> {
    (0..repeats)
        .map(|_| {
            let t0 = Instant::now();
            f();
            t0.elapsed().as_secs_f64()
        })
        .collect()
}

fn report(name: &str, times: &[f64]) {
    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    println!(
        "{name}: min {:.3} ms, mean {:.3} ms over {} runs",
        min * 1e3,
        mean * 1e3,
        times.len()
    );
}

fn bench(
    rng: &mut StdRng,
    min_depth: u32,
    branch_probability: f64,
    max_value: u64,
    repeats: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(repeats > 0, "repeats must be positive");
    let t0 = Instant::now();
    let mut tree = generate(rng, max_value, branch_probability, min_depth)?;
    println!(
        "generated {} leaves, depth {}, in {:.3}s",
        tree.leaf_count(),
        tree.depth(),
        t0.elapsed().as_secs_f64()
    );
    let mut flat = FlatTree::from_tree(&tree)?;
    println!("flat encoding has {} records", flat.record_count());

    // one untimed round per variant to warm up caches and the allocator
    tree.mirror_in_place();
    tree.mirror_in_place();
    flat.mirror_in_place();
    flat.mirror_in_place();
    tree = tree.mirror().mirror();

    report(
        "mirror_rebuild",
        &times(repeats, || {
            let t = std::mem::replace(&mut tree, Tree::leaf(0));
            tree = t.mirror();
        }),
    );
    report("mirror_in_place", &times(repeats, || tree.mirror_in_place()));
    report("mirror_flat", &times(repeats, || flat.mirror_in_place()));

    // cross check the variants against each other once
    let mut check = tree.clone();
    check.mirror_in_place();
    anyhow::ensure!(check == tree.clone().mirror(), "mirror variants disagree");
    let mut flat_check = FlatTree::from_tree(&tree)?;
    flat_check.mirror_in_place();
    anyhow::ensure!(flat_check.to_tree()? == check, "flat mirror disagrees");
    println!("all variants agree");
    Ok(())
}

fn dump(
    rng: &mut StdRng,
    min_depth: u32,
    branch_probability: f64,
    max_value: u64,
) -> anyhow::Result<()> {
    let tree = generate(rng, max_value, branch_probability, min_depth)?;
    println!("tree:     {tree:?}");
    let flat = FlatTree::from_tree(&tree)?;
    println!("cells:    {:?}", flat.cells());
    let mut mirrored = flat;
    mirrored.mirror_in_place();
    println!("mirrored: {:?}", mirrored.cells());
    println!("decoded:  {:?}", mirrored.to_tree()?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);
    match args.command {
        Command::Bench {
            min_depth,
            branch_probability,
            max_value,
            repeats,
        } => bench(&mut rng, min_depth, branch_probability, max_value, repeats),
        Command::Dump {
            min_depth,
            branch_probability,
            max_value,
        } => dump(&mut rng, min_depth, branch_probability, max_value),
    }
}
