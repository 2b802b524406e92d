use std::path::Path;

use super::config::ExtractionConfig;
use super::constants::*;
use super::error::{BankError, SourceError};
use super::event_context::*;
use super::hipo::hipo_file::HipoFile;

/// Anything that can hand out the banks of one event at a time.
///
/// Each call produces a brand new EventContext. Returns `Ok(None)` when the
/// source is exhausted.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<EventContext>, SourceError>;

    /// Fraction of the source consumed so far
    fn get_progress(&self) -> f32 {
        0.0
    }
}

/// An EventSource reading one HIPO file.
///
/// The banks required by the extraction configuration are resolved against the
/// file dictionary on open. A missing mandatory bank rejects the whole file; a
/// missing MC::Particle bank is treated as empty (experimental data).
#[derive(Debug)]
pub struct HipoEventSource {
    file: HipoFile,
    readers: BankReaders,
}

impl HipoEventSource {
    pub fn new(path: &Path, extraction: &ExtractionConfig) -> Result<Self, SourceError> {
        let file = HipoFile::new(path)?;
        let dictionary = file.get_dictionary();

        let particles = BankReader::new(dictionary, REC_PARTICLE_BANK, &PARTICLE_COLUMNS)?;
        let mc_particles = if !extraction.truth {
            None
        } else {
            match BankReader::new(dictionary, MC_PARTICLE_BANK, &MC_PARTICLE_COLUMNS) {
                Ok(reader) => Some(reader),
                Err(BankError::MissingSchema(_)) => {
                    spdlog::warn!(
                        "{} has no {} bank; generated momenta will be left at zero",
                        path.to_string_lossy(),
                        MC_PARTICLE_BANK
                    );
                    None
                }
                Err(e) => return Err(SourceError::BankError(e)),
            }
        };
        let tracks = if extraction.tracks {
            Some(BankReader::new(dictionary, REC_TRACK_BANK, &TRACK_COLUMNS)?)
        } else {
            None
        };
        let trajectories = if extraction.trajectories {
            Some(BankReader::new(dictionary, REC_TRAJ_BANK, &TRAJECTORY_COLUMNS)?)
        } else {
            None
        };

        Ok(Self {
            file,
            readers: BankReaders {
                particles,
                mc_particles,
                tracks,
                trajectories,
            },
        })
    }

    pub fn get_file(&self) -> &HipoFile {
        &self.file
    }
}

impl EventSource for HipoEventSource {
    fn next_event(&mut self) -> Result<Option<EventContext>, SourceError> {
        match self.file.next_event()? {
            Some(event) => Ok(Some(EventContext::from_event(&event, &self.readers)?)),
            None => Ok(None),
        }
    }

    fn get_progress(&self) -> f32 {
        self.file.get_progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::hipo::test_file::{write_hipo_file, CLAS12_SCHEMAS};

    fn events() -> Vec<EventContext> {
        (0..4)
            .map(|i| EventContext {
                particles: vec![ParticleRow {
                    pid: 2212,
                    status: 4000 + i,
                    ..Default::default()
                }],
                tracks: vec![TrackRow { pindex: 0, sector: i }],
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_read_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.hipo");
        write_hipo_file(&path, CLAS12_SCHEMAS, &events(), COMPRESSION_LZ4);

        let mut source = HipoEventSource::new(&path, &ExtractionConfig::default()).unwrap();
        let mut read = Vec::new();
        while let Some(ctx) = source.next_event().unwrap() {
            read.push(ctx);
        }
        assert_eq!(read, events());
        assert_eq!(source.get_progress(), 1.0);
    }

    #[test]
    fn test_missing_mandatory_bank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.hipo");
        // No REC::Traj in this file
        write_hipo_file(&path, &CLAS12_SCHEMAS[..3], &events(), COMPRESSION_NONE);

        assert!(matches!(
            HipoEventSource::new(&path, &ExtractionConfig::default()),
            Err(SourceError::BankError(BankError::MissingSchema(_)))
        ));
        // Not needed by the experiment preset
        assert!(HipoEventSource::new(&path, &ExtractionConfig::from_variant(Variant::Experiment)).is_ok());
    }

    #[test]
    fn test_missing_truth_bank_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.hipo");
        let schemas = [CLAS12_SCHEMAS[0], CLAS12_SCHEMAS[2], CLAS12_SCHEMAS[3]];
        write_hipo_file(&path, &schemas, &events(), COMPRESSION_NONE);

        let mut source = HipoEventSource::new(&path, &ExtractionConfig::default()).unwrap();
        let first = source.next_event().unwrap().unwrap();
        assert!(first.mc_particles.is_empty());
        assert_eq!(first.tracks[0].sector, 0);
    }
}
