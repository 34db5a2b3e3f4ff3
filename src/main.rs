//! alignspace command-line interface.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::error;

use alignspace::aggregate;
use alignspace::builder::{AlignerBuilder, AlignmentMethod};
use alignspace::error::{Error, Result};
use alignspace::ingest;
use alignspace::levels::build_levels;
use alignspace::registry::IdRegistry;
use alignspace::stats::{Confidence, NanPolicy};
use alignspace::vertexsim::VertexSimMap;

#[derive(Parser)]
#[command(name = "alignspace")]
#[command(about = "Score per-entity consistency across experiment levels", long_about = None)]
#[command(version)]
struct Cli {
    /// Measurement table: dataLevel,dataReplicate,vertex,intensity
    #[arg(long = "dataInput")]
    data_input: PathBuf,

    /// Cross-level similarity table:
    /// vertexLevel1,vertexLevel2,vertex1,vertex2,similarity
    #[arg(long = "vertexInput")]
    vertex_input: Option<PathBuf>,

    /// Separator for matching suffixed entity names across levels
    /// (ARG29 vs ARG29_7 with separator "_")
    #[arg(long = "entityDiff")]
    entity_diff: Option<String>,

    /// Alignment method
    #[arg(long, value_enum, default_value = "CosineSimilarity")]
    method: MethodArg,

    /// Restart probability for the random walker, in (0, 1)
    #[arg(long = "walkerRestart", default_value_t = 0.05)]
    walker_restart: f64,

    /// Bootstrap/permutation trial count (cosine) or walk length (walker)
    #[arg(long, default_value_t = 10_000, value_parser = clap::value_parser!(u64).range(1..))]
    steps: u64,

    /// Confidence statistic under the cosine method
    #[arg(long, value_enum, default_value = "Bootstrap")]
    stat: StatArg,

    /// Treatment of zero-norm cosines inside the confidence machinery
    #[arg(long = "nanPolicy", value_enum, default_value = "zero")]
    nan_policy: NanArg,

    /// Global seed; fixes the run deterministically
    #[arg(long)]
    seed: Option<u64>,

    /// Truth set (one entity per line); logs the ranking accuracy
    #[arg(long = "truthInput")]
    truth_input: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    #[value(name = "CosineSimilarity")]
    CosineSimilarity,
    #[value(name = "RandomWalker")]
    RandomWalker,
}

impl From<MethodArg> for AlignmentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::CosineSimilarity => AlignmentMethod::CosineSimilarity,
            MethodArg::RandomWalker => AlignmentMethod::RandomWalker,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatArg {
    #[value(name = "Bootstrap")]
    Bootstrap,
    #[value(name = "Permutation")]
    Permutation,
}

impl From<StatArg> for Confidence {
    fn from(arg: StatArg) -> Self {
        match arg {
            StatArg::Bootstrap => Confidence::Bootstrap,
            StatArg::Permutation => Confidence::Permutation,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum NanArg {
    #[value(name = "zero")]
    Zero,
    #[value(name = "propagate")]
    Propagate,
}

impl From<NanArg> for NanPolicy {
    fn from(arg: NanArg) -> Self {
        match arg {
            NanArg::Zero => NanPolicy::Zero,
            NanArg::Propagate => NanPolicy::Propagate,
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let rows = ingest::read_data_file(&cli.data_input)?;
    let mut registry = IdRegistry::new();
    let set = build_levels(&rows, &mut registry)?;
    registry.freeze();
    let n = registry.len();

    let vertex_map = match &cli.vertex_input {
        Some(path) => {
            let vertex_rows = ingest::read_vertex_file(path)?;
            VertexSimMap::from_rows(&vertex_rows, &set, &registry)?
        }
        None => VertexSimMap::identity(&set, &registry, cli.entity_diff.as_deref()),
    };

    let mut builder = AlignerBuilder::new()
        .with_method(cli.method.into())
        .with_confidence(cli.stat.into())
        .with_nan_policy(cli.nan_policy.into())
        .with_steps(cli.steps as usize)
        .with_restart(cli.walker_restart);
    if let Some(seed) = cli.seed {
        builder = builder.with_seed(seed);
    }
    let aligner = builder.build()?;

    let scores = aligner.align(&set, &vertex_map, n);

    if let Some(path) = &cli.truth_input {
        let names = ingest::read_truth_file(path)?;
        let truth: HashSet<usize> = names
            .iter()
            .map(|name| {
                registry
                    .resolve(name)
                    .ok_or_else(|| Error::UnknownEntity(name.clone()))
            })
            .collect::<Result<_>>()?;
        aggregate::accuracy(&truth, &scores);
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    aggregate::write_scores(&mut out, &registry, &scores)?;
    out.flush()?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
