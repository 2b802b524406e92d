use super::config::Species;
use super::constants::{EDGE_SENTINEL, FIDUCIAL_SENTINEL, SECTOR_SENTINEL};

/// Euclidean norm of a momentum triple
pub fn magnitude(px: f32, py: f32, pz: f32) -> f32 {
    (px * px + py * py + pz * pz).sqrt()
}

/// The flattened kinematics of one particle role in one event.
///
/// `Default` gives the documented sentinels: zero momenta/ids, sector -1,
/// edges -1 and fiducial position -1000.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    pub px_gen: f32,
    pub py_gen: f32,
    pub pz_gen: f32,
    pub p_gen: f32,
    pub px_rec: f32,
    pub py_rec: f32,
    pub pz_rec: f32,
    pub p_rec: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub pid: i32,
    pub status: i32,
    pub sector: i32,
    pub edge: [f32; 3],
    pub fiducial: [f32; 3],
}

impl Default for ParticleRecord {
    fn default() -> Self {
        Self {
            px_gen: 0.0,
            py_gen: 0.0,
            pz_gen: 0.0,
            p_gen: 0.0,
            px_rec: 0.0,
            py_rec: 0.0,
            pz_rec: 0.0,
            p_rec: 0.0,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            pid: 0,
            status: 0,
            sector: SECTOR_SENTINEL,
            edge: [EDGE_SENTINEL; 3],
            fiducial: [FIDUCIAL_SENTINEL; 3],
        }
    }
}

impl ParticleRecord {
    pub fn set_generated(&mut self, px: f32, py: f32, pz: f32) {
        self.px_gen = px;
        self.py_gen = py;
        self.pz_gen = pz;
        self.p_gen = magnitude(px, py, pz);
    }

    pub fn set_reconstructed(&mut self, px: f32, py: f32, pz: f32) {
        self.px_rec = px;
        self.py_rec = py;
        self.pz_rec = pz;
        self.p_rec = magnitude(px, py, pz);
    }
}

/// A floating point field of a ParticleRecord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatField {
    PxGen,
    PyGen,
    PzGen,
    PGen,
    PxRec,
    PyRec,
    PzRec,
    PRec,
    Vx,
    Vy,
    Vz,
    Edge(usize),
    Fiducial(usize),
}

/// An integer field of a ParticleRecord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntField {
    Pid,
    Status,
    Sector,
}

/// A field of a ParticleRecord that can be stored as a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleField {
    Float(FloatField),
    Int(IntField),
}

impl ParticleRecord {
    pub fn float(&self, field: FloatField) -> f32 {
        match field {
            FloatField::PxGen => self.px_gen,
            FloatField::PyGen => self.py_gen,
            FloatField::PzGen => self.pz_gen,
            FloatField::PGen => self.p_gen,
            FloatField::PxRec => self.px_rec,
            FloatField::PyRec => self.py_rec,
            FloatField::PzRec => self.pz_rec,
            FloatField::PRec => self.p_rec,
            FloatField::Vx => self.vx,
            FloatField::Vy => self.vy,
            FloatField::Vz => self.vz,
            FloatField::Edge(i) => self.edge[i],
            FloatField::Fiducial(i) => self.fiducial[i],
        }
    }

    pub fn int(&self, field: IntField) -> i32 {
        match field {
            IntField::Pid => self.pid,
            IntField::Status => self.status,
            IntField::Sector => self.sector,
        }
    }
}

/// One output row: a record per configured particle, in configuration order
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub particles: Vec<(Species, ParticleRecord)>,
}

impl OutputRecord {
    /// A fresh record with every particle at its defaults
    pub fn new(species: impl IntoIterator<Item = Species>) -> Self {
        Self {
            particles: species
                .into_iter()
                .map(|s| (s, ParticleRecord::default()))
                .collect(),
        }
    }

    pub fn get(&self, species: Species) -> Option<&ParticleRecord> {
        self.particles
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, r)| r)
    }

    pub fn get_mut(&mut self, species: Species) -> Option<&mut ParticleRecord> {
        self.particles
            .iter_mut()
            .find(|(s, _)| *s == species)
            .map(|(_, r)| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sentinels() {
        let record = ParticleRecord::default();
        assert_eq!(record.sector, -1);
        assert_eq!(record.edge, [-1.0; 3]);
        assert_eq!(record.fiducial, [-1000.0; 3]);
        assert_eq!(record.p_gen, 0.0);
    }

    #[test]
    fn test_magnitudes() {
        let mut record = ParticleRecord::default();
        record.set_generated(1.0, 0.0, 2.0);
        record.set_reconstructed(3.0, 4.0, 0.0);
        assert!((record.p_gen - 5.0f32.sqrt()).abs() < 1e-6);
        assert_eq!(record.p_rec, 5.0);
        assert_eq!(record.float(FloatField::PRec), 5.0);
        assert_eq!(record.float(FloatField::Edge(2)), -1.0);
        assert_eq!(record.int(IntField::Sector), -1);
    }
}
