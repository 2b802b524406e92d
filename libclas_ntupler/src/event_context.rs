use super::error::{BankError, HipoEventError};
use super::hipo::bank::Bank;
use super::hipo::dictionary::{Dictionary, Schema};
use super::hipo::event::HipoEvent;

/// A row of REC::Particle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParticleRow {
    pub pid: i32,
    pub status: i32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
}

/// A row of MC::Particle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct McParticleRow {
    pub pid: i32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
}

/// A row of REC::Track. `pindex` refers to a REC::Particle row of the same event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackRow {
    pub pindex: i32,
    pub sector: i32,
}

/// A row of REC::Traj, one per (particle, detector layer) crossing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrajectoryRow {
    pub pindex: i32,
    pub detector: i32,
    pub layer: i32,
    pub edge: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Every bank row of interest for exactly one event.
///
/// A new context is built for each event; nothing is carried over from the
/// previous one. Banks that are absent hold no rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContext {
    pub particles: Vec<ParticleRow>,
    pub mc_particles: Vec<McParticleRow>,
    pub tracks: Vec<TrackRow>,
    pub trajectories: Vec<TrajectoryRow>,
}

pub const PARTICLE_COLUMNS: [&str; 8] = ["pid", "status", "px", "py", "pz", "vx", "vy", "vz"];
pub const MC_PARTICLE_COLUMNS: [&str; 4] = ["pid", "px", "py", "pz"];
pub const TRACK_COLUMNS: [&str; 2] = ["pindex", "sector"];
pub const TRAJECTORY_COLUMNS: [&str; 7] = ["pindex", "detector", "layer", "edge", "x", "y", "z"];

/// A bank schema with the indices of the columns we read, resolved once per source
#[derive(Debug, Clone)]
pub struct BankReader {
    schema: Schema,
    columns: Vec<usize>,
}

impl BankReader {
    /// Resolve the named columns of a bank. Fails if the bank or any column is missing.
    pub fn new(dictionary: &Dictionary, bank: &str, columns: &[&str]) -> Result<Self, BankError> {
        let schema = dictionary
            .get_schema(bank)
            .ok_or_else(|| BankError::MissingSchema(bank.to_string()))?
            .clone();
        let columns = columns
            .iter()
            .map(|name| {
                schema
                    .column_index(name)
                    .ok_or_else(|| BankError::MissingColumn {
                        bank: bank.to_string(),
                        column: name.to_string(),
                    })
            })
            .collect::<Result<Vec<usize>, BankError>>()?;
        Ok(Self { schema, columns })
    }

    /// Convert each row of this bank in the event with `convert`, which receives the
    /// bank view, the row and the resolved column indices (in the order requested).
    pub fn read_rows<T, F>(&self, event: &HipoEvent, convert: F) -> Result<Vec<T>, HipoEventError>
    where
        F: Fn(&Bank, usize, &[usize]) -> T,
    {
        let bank = Bank::from_event(&self.schema, event)?;
        Ok((0..bank.get_rows())
            .map(|row| convert(&bank, row, &self.columns))
            .collect())
    }
}

/// The bank readers available for one source. Optional banks are None when not
/// requested or not present in the source dictionary.
#[derive(Debug, Clone)]
pub struct BankReaders {
    pub particles: BankReader,
    pub mc_particles: Option<BankReader>,
    pub tracks: Option<BankReader>,
    pub trajectories: Option<BankReader>,
}

impl EventContext {
    /// Extract the typed rows of every available bank for this event
    pub fn from_event(event: &HipoEvent, readers: &BankReaders) -> Result<Self, HipoEventError> {
        let particles = readers.particles.read_rows(event, |bank, row, c| ParticleRow {
            pid: bank.get_int(c[0], row),
            status: bank.get_int(c[1], row),
            px: bank.get_float(c[2], row),
            py: bank.get_float(c[3], row),
            pz: bank.get_float(c[4], row),
            vx: bank.get_float(c[5], row),
            vy: bank.get_float(c[6], row),
            vz: bank.get_float(c[7], row),
        })?;

        let mc_particles = match &readers.mc_particles {
            Some(reader) => reader.read_rows(event, |bank, row, c| McParticleRow {
                pid: bank.get_int(c[0], row),
                px: bank.get_float(c[1], row),
                py: bank.get_float(c[2], row),
                pz: bank.get_float(c[3], row),
            })?,
            None => Vec::new(),
        };

        let tracks = match &readers.tracks {
            Some(reader) => reader.read_rows(event, |bank, row, c| TrackRow {
                pindex: bank.get_int(c[0], row),
                sector: bank.get_int(c[1], row),
            })?,
            None => Vec::new(),
        };

        let trajectories = match &readers.trajectories {
            Some(reader) => reader.read_rows(event, |bank, row, c| TrajectoryRow {
                pindex: bank.get_int(c[0], row),
                detector: bank.get_int(c[1], row),
                layer: bank.get_int(c[2], row),
                edge: bank.get_float(c[3], row),
                x: bank.get_float(c[4], row),
                y: bank.get_float(c[5], row),
                z: bank.get_float(c[6], row),
            })?,
            None => Vec::new(),
        };

        Ok(Self {
            particles,
            mc_particles,
            tracks,
            trajectories,
        })
    }
}
