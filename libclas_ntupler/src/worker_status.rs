/// Progress message sent from the processing loop to whoever is watching it (the CLI progress bar)
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    /// Overall fraction of the input list consumed, 0.0 to 1.0
    pub progress: f32,
    pub source_index: usize,
    pub n_sources: usize,
    pub records_written: u64,
}

impl WorkerStatus {
    pub fn new(progress: f32, source_index: usize, n_sources: usize, records_written: u64) -> Self {
        Self {
            progress,
            source_index,
            n_sources,
            records_written,
        }
    }
}
