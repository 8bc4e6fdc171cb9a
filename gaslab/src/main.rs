use std::{
    fmt::Display,
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use gaslab::{
    algorithms::{
        connected_components::{weakly_connected_components, ConnectedComponents},
        pagerank::{pagerank, PageRank},
        sssp::{shortest_paths, ShortestPaths, UNREACHABLE},
        AlgorithmResult,
    },
    config::{load_config, EngineConfigBuilder},
    errors::GasError,
    graph_loader::EdgeListLoader,
};
use gaslab_api::core::utils::logging::init_global_logger;
use regex::Regex;
use tracing::{info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Program {
    Pagerank,
    Sssp,
    Wcc,
}

#[derive(Parser)]
#[command(about = "Run a bundled vertex program over an edge list")]
struct Args {
    /// The vertex program to run
    #[arg(value_enum)]
    program: Program,

    /// Edge list file or directory of edge lists
    edges: PathBuf,

    /// TOML or JSON engine configuration, flags given here take precedence
    #[arg(long, env = "GASLAB_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "GASLAB_MAX_ITERATIONS")]
    max_iterations: Option<usize>,

    #[arg(long)]
    threads: Option<usize>,

    /// Source vertex for sssp
    #[arg(long)]
    source: Option<u64>,

    /// Only load files whose path matches this regex
    #[arg(long)]
    filter: Option<String>,

    /// Skip the first line of every edge file
    #[arg(long, default_value_t = false)]
    header: bool,

    #[arg(long, default_value_t = 0.85)]
    damping: f64,

    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    /// Fail when the iteration bound is reached before convergence
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Write `id<TAB>value` lines here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, env = "GASLAB_LOG_LEVEL")]
    log_level: Option<String>,
}

fn write_values<T: Display>(
    result: &AlgorithmResult<T>,
    output: &Option<PathBuf>,
) -> Result<(), GasError> {
    let out: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);
    for (id, value) in result.values.iter() {
        writeln!(out, "{id}\t{value}")?;
    }
    out.flush()?;
    Ok(())
}

fn finish<T: Display>(result: AlgorithmResult<T>, args: &Args) -> Result<(), GasError> {
    let summary = if args.strict {
        result.summary.clone().into_result()?
    } else {
        result.summary.clone()
    };
    if !summary.is_converged() {
        warn!("Run ended without converging: {:?}", summary.status);
    }
    write_values(&result, &args.output)
}

fn main() -> Result<(), GasError> {
    let args = Args::parse();

    let file_config = load_config(None, args.config.clone())?;
    let mut builder = EngineConfigBuilder::from(file_config);
    if let Some(max_iterations) = args.max_iterations {
        builder = builder.with_max_iterations(max_iterations);
    }
    if let Some(threads) = args.threads {
        builder = builder.with_num_threads(threads);
    }
    if let Some(log_level) = args.log_level.clone() {
        builder = builder.with_log_level(log_level);
    }
    let config = builder.build();
    init_global_logger(config.logging.log_level.clone());

    let mut loader = EdgeListLoader::new(&args.edges).set_header(args.header);
    if let Some(filter) = &args.filter {
        let regex = Regex::new(filter)
            .map_err(|err| GasError::InvalidArgument(format!("bad --filter: {err}")))?;
        loader = loader.with_filter(regex);
    }

    info!("Running {:?} over {}", args.program, args.edges.display());
    match args.program {
        Program::Pagerank => {
            let program = PageRank::new(args.damping, args.tolerance);
            let store = loader.load(&program)?;
            finish(pagerank(program, store, config)?, &args)
        }
        Program::Sssp => {
            let source = args
                .source
                .ok_or_else(|| GasError::InvalidArgument("sssp needs --source".to_string()))?;
            let store = loader.load(&ShortestPaths)?;
            let result = shortest_paths(store, source, config)?;
            let result = AlgorithmResult {
                values: result
                    .values
                    .into_iter()
                    .map(|(id, d)| {
                        let d = if d == UNREACHABLE {
                            "inf".to_string()
                        } else {
                            d.to_string()
                        };
                        (id, d)
                    })
                    .collect(),
                summary: result.summary,
            };
            finish(result, &args)
        }
        Program::Wcc => {
            let store = loader.load(&ConnectedComponents)?;
            finish(weakly_connected_components(store, config)?, &args)
        }
    }
}
