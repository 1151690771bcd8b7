use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use vedanga::ephemeris::EphemerisSnapshot;
use vedanga::{AnalysisError, UnifiedAnalyzer};

#[derive(Parser, Debug)]
#[command(author, version, about = "Analyze a natal chart from an ephemeris snapshot")]
struct Args {
    #[arg(help = "Path to a JSON snapshot holding the request and body states")]
    snapshot: PathBuf,

    #[arg(long, help = "Config file (defaults to configs/vedanga.toml when present)")]
    config: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,

    #[arg(long)]
    dasha_depth: Option<usize>,

    #[arg(long, help = "Abort the analysis after this many milliseconds")]
    deadline_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => vedanga_config::load_config(path)?,
        None => vedanga_config::load_default_config()?,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if let Some(depth) = args.dasha_depth {
        config.analyzer.dasha_depth = depth;
    }

    let text = std::fs::read_to_string(&args.snapshot)
        .with_context(|| format!("Could not read snapshot {}", args.snapshot.display()))?;
    let (request, provider) = EphemerisSnapshot::from_json_str(&text)
        .with_context(|| format!("Invalid snapshot {}", args.snapshot.display()))?
        .into_provider();
    log::info!(
        "analyzing {} at ({}, {})",
        request.timestamp,
        request.location.lat,
        request.location.lon
    );

    let result = UnifiedAnalyzer::new(Arc::new(provider), config.analyzer).and_then(|analyzer| {
        match args.deadline_ms {
            Some(ms) => analyzer
                .analyze_chart_with_deadline(&request, std::time::Duration::from_millis(ms)),
            None => analyzer.analyze_chart(&request),
        }
    });

    match result {
        Ok(analysis) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(analysis.as_ref())?
            } else {
                serde_json::to_string(analysis.as_ref())?
            };
            println!("{}", json);
            Ok(())
        }
        Err(err) => report_and_exit(&err),
    }
}

fn report_and_exit(err: &AnalysisError) -> ! {
    log::error!("{}", err);
    match serde_json::to_string_pretty(&err.report()) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", err),
    }
    std::process::exit(2);
}
