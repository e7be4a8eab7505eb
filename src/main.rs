use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Serialize;
use std::path::PathBuf;

use rusty_psth::config::AnalysisConfig;
use rusty_psth::error::PsthError;
use rusty_psth::parser::LoadSummary;
use rusty_psth::psth::PsthCurve;
use rusty_psth::report::ExportPaths;
use rusty_psth::session::AnalysisSession;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The event log, with one `name,timestamp` record per line (timestamps in seconds)
    events: PathBuf,
    /// A JSON file with the analysis parameters (pre_ms, post_ms, bin_size_ms)
    #[arg(long)]
    config: Option<PathBuf>,
    /// The window start relative to the events, in ms (overrides the config file)
    #[arg(long, allow_negative_numbers = true)]
    pre: Option<f64>,
    /// The window end relative to the events, in ms (overrides the config file)
    #[arg(long, allow_negative_numbers = true)]
    post: Option<f64>,
    /// The PSTH bin size, in ms (overrides the config file)
    #[arg(long)]
    bin_size: Option<f64>,
    /// The base name of the exported plots
    #[arg(long, default_value = "output")]
    export_name: String,
    /// The directory of the exported plots
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
    /// Also write the logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// The log level
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct RasterReport {
    bin_scale: usize,
    extent: (f64, f64, f64, f64),
    counts: Vec<Vec<u32>>,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a LoadSummary,
    config: AnalysisConfig,
    raster: RasterReport,
    psth: &'a PsthCurve,
    export: ExportPaths,
}

fn init_logging(args: &Args) -> Result<(), PsthError> {
    let pattern = "{d(%H:%M:%S)} {l} - {m}{n}";
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let mut config = Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));
    let mut root = Root::builder().appender("stderr");

    if let Some(log_path) = &args.log_file {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
            .build(log_path)
            .map_err(|e| PsthError::IOError(e.to_string()))?;
        config = config.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    let config = config
        .build(root.build(args.log_level))
        .map_err(|e| PsthError::IOError(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| PsthError::IOError(e.to_string()))?;
    Ok(())
}

fn main() -> Result<(), PsthError> {
    let args = Args::parse();
    init_logging(&args)?;
    log::debug!("{:?}", args);

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load_from(path)?,
        None => AnalysisConfig::default(),
    };
    config.pre_ms = args.pre.unwrap_or(config.pre_ms);
    config.post_ms = args.post.unwrap_or(config.post_ms);
    config.bin_size_ms = args.bin_size.unwrap_or(config.bin_size_ms);

    let mut session = AnalysisSession::new();
    session.configure(&config)?;
    session.load_events(&args.events)?;
    log::info!("Event log loading: done!");

    session.run_trialization()?;
    log::info!("Trialization: done!");
    session.run_psth()?;
    log::info!("PSTH: done!");

    let missing = |what: &str| PsthError::InvalidOperation(format!("no {} available", what));
    let summary = session.summary().ok_or_else(|| missing("summary"))?;
    let raster = session.raster().ok_or_else(|| missing("raster"))?;
    let psth = session.psth().ok_or_else(|| missing("PSTH"))?;

    let report = Report {
        summary,
        config,
        raster: RasterReport {
            bin_scale: raster.bin_scale(),
            extent: raster.extent(),
            counts: raster.to_rows(),
        },
        psth,
        export: ExportPaths::new(&args.export_dir, &args.export_name),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| PsthError::IOError(e.to_string()))?;
    println!("{}", json);

    Ok(())
}
