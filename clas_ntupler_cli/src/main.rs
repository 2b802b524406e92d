//! # clas_ntupler_cli
//!
//! Part of the clas_ntupler crate family.
//!
//! This is the command line application converting CLAS12 HIPO files into a flat HDF5
//! table.
//!
//! ## Install
//!
//! Use `cargo install --path ./clas_ntupler_cli` from the top level repository
//!
//! ## Use
//!
//! To make a template configuration file use
//!
//! ```bash
//! clas_ntupler_cli new --config <your_config.yml>
//! ```
//!
//! Edit the configuration to your needs, then run the conversion with
//!
//! ```bash
//! clas_ntupler_cli --config <your_config.yml>
//! ```
//!
//! Any value of the configuration can be overridden on the command line:
//!
//! ```bash
//! clas_ntupler_cli NickRuns.dat --variant experiment --max-events 100000 --out skim.h5
//! ```
//!
//! The positional argument (or `--in`) is a text file listing one HIPO file per line.
//! Logs are written to the terminal and to `clas_ntupler.log` in the working directory.
//! While the progress bar is shown, messages only go to the log file.
use clap::{value_parser, Arg, ArgMatches, Command};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use libclas_ntupler::config::{Config, ExtractionConfig, Variant};
use libclas_ntupler::error::ConfigError;
use libclas_ntupler::process::process;
use libclas_ntupler::worker_status::WorkerStatus;

const LOG_PATH: &str = "./clas_ntupler.log";

/// The terminal + file logger, and a file only logger used while the progress bar is drawn
struct Loggers {
    terminal: Arc<spdlog::Logger>,
    file_only: Arc<spdlog::Logger>,
}

/// Log to the terminal and to a file
fn setup_logging() -> spdlog::Result<Loggers> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from(LOG_PATH))
            .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
                ),
            )))
            .truncate(true)
            .build()?,
    );
    let terminal_sink = Arc::new(
        spdlog::sink::StdStreamSink::builder()
            .std_stream(spdlog::sink::StdStream::Stdout)
            .build()?,
    );
    let terminal = Arc::new(
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(terminal_sink)
            .sink(file_sink.clone())
            .build()?,
    );
    let file_only = Arc::new(
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(file_sink)
            .build()?,
    );
    spdlog::set_default_logger(terminal.clone());
    Ok(Loggers {
        terminal,
        file_only,
    })
}

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    Config::default().write_config_file(path)
}

/// Load the config file (if any) and apply the command line overrides
fn build_config(matches: &ArgMatches) -> Result<Config, ConfigError> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            spdlog::info!("Loading config from {path}...");
            Config::read_config_file(Path::new(path))?
        }
        None => Config::default(),
    };

    if let Some(variant) = matches.get_one::<String>("variant") {
        config.extraction = ExtractionConfig::from_variant(variant.parse::<Variant>()?);
    }
    if let Some(list) = matches
        .get_one::<String>("input")
        .or(matches.get_one::<String>("in"))
    {
        config.input_list = PathBuf::from(list);
    }
    if let Some(out) = matches.get_one::<String>("out") {
        config.output_path = Some(PathBuf::from(out));
    }
    if let Some(max) = matches.get_one::<u64>("max-events") {
        config.max_events = Some(*max);
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    // Create a cli
    let matches = Command::new("clas_ntupler_cli")
        .about("Convert CLAS12 HIPO files into a flat HDF5 table")
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Path to the configuration file"),
        )
        .arg(Arg::new("input").help("Text file listing the HIPO files to convert"))
        .arg(
            Arg::new("in")
                .long("in")
                .conflicts_with("input")
                .help("Text file listing the HIPO files to convert"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .help("Path of the output HDF5 file"),
        )
        .arg(
            Arg::new("variant")
                .long("variant")
                .value_parser(["simulation", "sim", "experiment", "exp", "full"])
                .help("Extraction preset, replaces the extraction section of the config"),
        )
        .arg(
            Arg::new("max-events")
                .long("max-events")
                .value_parser(value_parser!(u64))
                .help("Stop after reading this many events"),
        )
        .get_matches();

    // Initialize feedback
    let loggers = match setup_logging() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Could not create logging: {e}");
            std::process::exit(1);
        }
    };

    if let Some(("new", sub_matches)) = matches.subcommand() {
        let config_path = match sub_matches
            .get_one::<String>("config")
            .or(matches.get_one::<String>("config"))
        {
            Some(path) => PathBuf::from(path),
            None => {
                spdlog::error!("The new command requires a --config path");
                std::process::exit(1);
            }
        };
        spdlog::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        if let Err(e) = make_template_config(&config_path) {
            spdlog::error!("{e}");
            std::process::exit(1);
        }
        spdlog::info!("Done.");
        return;
    }

    let config = match build_config(&matches) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            std::process::exit(1);
        }
    };
    spdlog::info!("Config successfully loaded.");
    spdlog::info!("Input list: {}", config.input_list.to_string_lossy());
    spdlog::info!("Output: {}", config.get_output_path().to_string_lossy());
    match config.max_events {
        Some(max) => spdlog::info!("Max events: {max}"),
        None => spdlog::info!("Max events: all"),
    }

    // Setup the progress bar
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos:>3}% {msg}") {
        pb.set_style(style);
    }
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    // Keep the terminal for the bar until the worker is done
    spdlog::set_default_logger(loggers.file_only.clone());
    // Spawn the task!
    let handle = std::thread::spawn(move || process(&config, &tx));

    loop {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(status) => {
                pb.set_position((status.progress * 100.0) as u64);
                pb.set_message(format!(
                    "source {}/{} rows {}",
                    status.source_index + 1,
                    status.n_sources,
                    status.records_written
                ));
            }
            Err(mpsc::RecvTimeoutError::Timeout) => (),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    pb.finish();
    let result = handle.join();
    spdlog::set_default_logger(loggers.terminal.clone());

    let success = match result {
        Ok(Ok(summary)) => {
            spdlog::info!(
                "Successfully converted {} events into {} rows!",
                summary.events_read,
                summary.records_written
            );
            if summary.sources_skipped + summary.sources_aborted > 0 {
                spdlog::warn!(
                    "{} sources were skipped and {} stopped early, see {LOG_PATH} for details.",
                    summary.sources_skipped,
                    summary.sources_aborted
                );
            }
            true
        }
        Ok(Err(e)) => {
            spdlog::error!("Conversion failed with error: {e}, see {LOG_PATH} for details.");
            false
        }
        Err(_) => {
            spdlog::error!("Failed to join the processing task!");
            false
        }
    };

    spdlog::info!("Done.");
    if !success {
        std::process::exit(1);
    }
}
