use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::Instant;

use super::config::Config;
use super::constants::PROGRESS_LOG_INTERVAL;
use super::correlator::BankCorrelator;
use super::error::{ProcessorError, SourceError};
use super::event_source::{EventSource, HipoEventSource};
use super::table_schema::TableSchema;
use super::table_writer::TableWriter;
use super::worker_status::WorkerStatus;

/// Events between two progress messages
const STATUS_INTERVAL: u64 = 10_000;

/// Tallies of a processing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub sources_processed: usize,
    pub sources_skipped: usize,
    /// Sources whose reading stopped early on a decoding error
    pub sources_aborted: usize,
    pub events_read: u64,
    pub events_skipped: u64,
    pub records_written: u64,
}

impl ProcessSummary {
    fn limit_reached(&self, max_events: Option<u64>) -> bool {
        max_events.is_some_and(|max| self.events_read >= max)
    }
}

/// How a single source ended
#[derive(Debug)]
enum SourceOutcome {
    Completed,
    LimitReached,
    Aborted(SourceError),
}

/// Where in the input list we are, for progress messages
struct Position<'a> {
    tx: &'a Sender<WorkerStatus>,
    source_index: usize,
    n_sources: usize,
}

impl Position<'_> {
    fn send(&self, source_progress: f32, summary: &ProcessSummary) -> Result<(), ProcessorError> {
        let progress = (self.source_index as f32 + source_progress) / self.n_sources.max(1) as f32;
        self.tx.send(WorkerStatus::new(
            progress,
            self.source_index,
            self.n_sources,
            summary.records_written,
        ))?;
        Ok(())
    }
}

/// Stream every event of a source through the correlator into the writer.
///
/// A source error ends this source only; writer errors are fatal and returned.
fn process_source<S: EventSource>(
    source: &mut S,
    correlator: &BankCorrelator,
    writer: &mut TableWriter,
    summary: &mut ProcessSummary,
    max_events: Option<u64>,
    position: &Position,
) -> Result<SourceOutcome, ProcessorError> {
    loop {
        if summary.limit_reached(max_events) {
            return Ok(SourceOutcome::LimitReached);
        }
        let event = match source.next_event() {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(SourceOutcome::Completed),
            Err(e) => return Ok(SourceOutcome::Aborted(e)),
        };
        summary.events_read += 1;

        match correlator.correlate(&event) {
            Ok(record) => {
                writer.append(&record)?;
                summary.records_written += 1;
            }
            Err(_) => summary.events_skipped += 1,
        }

        if summary.events_read % PROGRESS_LOG_INTERVAL == 0 {
            spdlog::info!("Processed {}M events", summary.events_read / PROGRESS_LOG_INTERVAL);
        }
        if summary.events_read % STATUS_INTERVAL == 0 {
            position.send(source.get_progress(), summary)?;
        }
    }
}

/// The main loop of clas_ntupler.
///
/// Reads the input list, then converts every listed HIPO file in order into rows of a
/// single output table. Sources which cannot be opened or are missing a mandatory bank
/// are logged and skipped. Only an unreadable input list, an invalid configuration, or
/// a failure of the output table is an error.
pub fn process(config: &Config, tx: &Sender<WorkerStatus>) -> Result<ProcessSummary, ProcessorError> {
    config.validate()?;
    let sources = config
        .read_input_list()
        .map_err(|e| ProcessorError::InputListError(config.input_list.clone(), e))?;
    spdlog::info!(
        "Found {} event sources in {}",
        sources.len(),
        config.input_list.to_string_lossy()
    );

    let output_path = config.get_output_path();
    let schema = TableSchema::from_extraction(&config.extraction);
    spdlog::info!(
        "Writing {} columns to {}",
        schema.len(),
        output_path.to_string_lossy()
    );
    let mut writer = TableWriter::new(&output_path, schema, config.flush_size)?;
    let correlator = BankCorrelator::new(config.extraction.clone());

    let start = Instant::now();
    let mut summary = ProcessSummary::default();
    for (source_index, path) in sources.iter().enumerate() {
        let position = Position {
            tx,
            source_index,
            n_sources: sources.len(),
        };
        if summary.limit_reached(config.max_events) {
            spdlog::info!("Reached the maximum of {} events, stopping.", summary.events_read);
            break;
        }

        let mut source = match HipoEventSource::new(path, &config.extraction) {
            Ok(source) => source,
            Err(e) => {
                spdlog::warn!("Skipping {}: {e}", path.to_string_lossy());
                summary.sources_skipped += 1;
                position.send(1.0, &summary)?;
                continue;
            }
        };
        let file = source.get_file();
        spdlog::info!(
            "Processing {} ({}, {} records)...",
            file.get_filename().to_string_lossy(),
            human_bytes::human_bytes(file.get_size_bytes() as f64),
            file.get_record_count()
        );

        match process_source(
            &mut source,
            &correlator,
            &mut writer,
            &mut summary,
            config.max_events,
            &position,
        )? {
            SourceOutcome::Completed | SourceOutcome::LimitReached => (),
            SourceOutcome::Aborted(e) => {
                summary.sources_aborted += 1;
                spdlog::error!(
                    "Error while reading {}: {e}\nSkipping the rest of this source.",
                    path.to_string_lossy()
                );
            }
        }
        summary.sources_processed += 1;
        position.send(1.0, &summary)?;
    }

    let records = writer.close()?;
    log_summary(&summary, records, &output_path, start);
    Ok(summary)
}

fn log_summary(summary: &ProcessSummary, records: u64, output_path: &Path, start: Instant) {
    spdlog::info!(
        "Sources processed: {} skipped: {} aborted: {}",
        summary.sources_processed,
        summary.sources_skipped,
        summary.sources_aborted
    );
    spdlog::info!(
        "Events read: {} skipped: {} written: {}",
        summary.events_read,
        summary.events_skipped,
        records
    );
    let size = std::fs::metadata(output_path).map(|m| m.len()).unwrap_or(0);
    spdlog::info!(
        "Wrote {} in {:.2} seconds.",
        human_bytes::human_bytes(size as f64),
        start.elapsed().as_secs_f64()
    );
}
