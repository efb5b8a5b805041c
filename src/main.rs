use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use song_graph::loader::load_rows_from_path;
use song_graph::progress::{
    create_progress_bar, create_spinner, format_duration, log_phase, set_log_only,
};
use song_graph::session::{Session, SessionOptions};
use song_graph::{ScoringStrategy, SimilarityGraph};

#[derive(Parser)]
#[command(name = "song-graph")]
#[command(about = "Recommend songs similar to a chosen one from a Spotify songs CSV")]
struct Args {
    /// Catalog CSV (Spotify top-songs layout, header row first)
    catalog: PathBuf,

    /// Song to recommend from; without it an interactive session starts
    #[arg(long)]
    title: Option<String>,

    /// Artist of --title, needed when several artists share the title
    #[arg(long, requires = "title")]
    artist: Option<String>,

    /// Maximum number of recommendations
    #[arg(long, default_value = "10")]
    count: usize,

    /// Minimum similarity score (0-100)
    #[arg(long, default_value = "0")]
    threshold: f64,

    /// How artist and genre contribute to the score
    #[arg(long, value_enum, default_value_t = ScoringStrategy::Flat)]
    scoring: ScoringStrategy,

    /// Compute every similarity edge up front
    #[arg(long)]
    warm: bool,

    /// Worker threads for --warm (0 = one per core)
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Write graph statistics to this JSON file on exit
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Print recommendations as JSON
    #[arg(long)]
    json: bool,

    /// Hide progress bars and log phases as plain lines
    #[arg(long)]
    log_only: bool,
}

fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")
}

fn recommend_once(
    graph: &mut SimilarityGraph,
    title: &str,
    artist: Option<&str>,
    args: &Args,
) -> Result<()> {
    let artist = match artist {
        Some(a) => a.to_string(),
        None => {
            let artists = graph.catalog().find_artists_by_title(title);
            if artists.len() > 1 {
                let names: Vec<&str> = artists.iter().map(String::as_str).collect();
                bail!(
                    "Several artists recorded '{}': {}. Pick one with --artist",
                    title,
                    names.join(", ")
                );
            }
            // An unknown title falls through to an empty result
            artists.into_iter().next().unwrap_or_default()
        }
    };

    let results = graph.recommend_scored(title, &artist, args.count, args.threshold);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?;
    } else if results.is_empty() {
        writeln!(out, "No recommendations.")?;
    } else {
        for (i, r) in results.iter().enumerate() {
            writeln!(out, "{:>3}. {:<50} {:6.2}", i + 1, r.song.to_string(), r.score)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;
    set_log_only(args.log_only);

    if !args.threshold.is_finite() || args.threshold < 0.0 {
        bail!("--threshold must be a non-negative number");
    }

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();

    let spinner = create_spinner("Loading catalog");
    let rows = load_rows_from_path(&args.catalog)
        .with_context(|| format!("Failed to load catalog {:?}", args.catalog))?;
    spinner.finish_with_message(format!("Loaded {} rows", rows.len()));
    log_phase("LOAD", &format!("{} rows from {:?}", rows.len(), args.catalog));

    let mut graph = SimilarityGraph::from_rows(&rows, args.scoring)
        .context("Failed to build similarity graph")?;
    drop(rows);

    if args.warm {
        let pb = create_progress_bar(graph.catalog().len() as u64, "Warming edge cache");
        let added = graph.warm_cache(Some(&pb));
        pb.finish_with_message(format!("Cached {} edges", added));
        log_phase("WARM", &format!("{} edges cached", added));
    }

    info!(elapsed = %format_duration(start.elapsed()), "ready");

    if let Some(title) = args.title.as_deref() {
        recommend_once(&mut graph, title, args.artist.as_deref(), &args)?;
    } else {
        let options = SessionOptions {
            max_results: args.count,
            threshold: args.threshold,
        };
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        Session::new(&mut graph, options)
            .run(stdin.lock(), &mut out)
            .context("Interactive session failed")?;
    }

    let stats = graph.stats();
    if args.log_only {
        stats.log_phase("FINAL");
    }
    if let Some(path) = &args.stats {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {:?}", path))?;
    }

    Ok(())
}
