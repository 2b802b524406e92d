use super::config::ExtractionConfig;
use super::output_record::{FloatField, IntField, OutputRecord, ParticleField, ParticleRecord};

/// A named column bound to one field of one particle of the output record
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub particle: usize,
    pub field: ParticleField,
}

/// The fixed, ordered column set of an output table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Derive the columns from the extraction configuration. Column names follow the
    /// historical ntuple naming (e.g. `px_prot_rec`, `p_proton_rec`, `edge1_proton`).
    pub fn from_extraction(extraction: &ExtractionConfig) -> Self {
        let mut columns = Vec::new();
        for (particle, selection) in extraction.particles.iter().enumerate() {
            let s = selection.species.short_name();
            let n = selection.species.name();
            let mut add = |name: String, field: ParticleField| {
                columns.push(ColumnSpec {
                    name,
                    particle,
                    field,
                });
            };
            let float = ParticleField::Float;
            let int = ParticleField::Int;

            if extraction.truth {
                add(format!("px_{s}_gen"), float(FloatField::PxGen));
                add(format!("py_{s}_gen"), float(FloatField::PyGen));
                add(format!("pz_{s}_gen"), float(FloatField::PzGen));
                add(format!("p_{n}_gen"), float(FloatField::PGen));
            }
            add(format!("px_{s}_rec"), float(FloatField::PxRec));
            add(format!("py_{s}_rec"), float(FloatField::PyRec));
            add(format!("pz_{s}_rec"), float(FloatField::PzRec));
            add(format!("p_{n}_rec"), float(FloatField::PRec));
            add(format!("vx_{s}"), float(FloatField::Vx));
            add(format!("vy_{s}"), float(FloatField::Vy));
            add(format!("vz_{s}"), float(FloatField::Vz));
            add(format!("pid_{n}"), int(IntField::Pid));
            add(format!("status_{n}"), int(IntField::Status));
            if extraction.tracks {
                add(format!("sector_{n}"), int(IntField::Sector));
            }
            if extraction.trajectories {
                for i in 0..3 {
                    add(format!("edge{}_{n}", i + 1), float(FloatField::Edge(i)));
                }
                add(format!("x1_{n}"), float(FloatField::Fiducial(0)));
                add(format!("y1_{n}"), float(FloatField::Fiducial(1)));
                add(format!("z1_{n}"), float(FloatField::Fiducial(2)));
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The particle of `record` that `column` reads from. Particles missing from the
    /// record read as defaults.
    pub fn particle(&self, column: &ColumnSpec, record: &OutputRecord) -> ParticleRecord {
        match record.particles.get(column.particle) {
            Some((_, particle)) => *particle,
            None => ParticleRecord::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;

    fn names(schema: &TableSchema) -> Vec<&str> {
        schema.columns().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_simulation_columns() {
        let schema = TableSchema::from_extraction(&ExtractionConfig::from_variant(Variant::Simulation));
        assert_eq!(
            names(&schema),
            vec![
                "px_prot_gen", "py_prot_gen", "pz_prot_gen", "p_proton_gen",
                "px_prot_rec", "py_prot_rec", "pz_prot_rec", "p_proton_rec",
                "vx_prot", "vy_prot", "vz_prot", "pid_proton", "status_proton",
            ]
        );
    }

    #[test]
    fn test_full_columns() {
        let schema = TableSchema::from_extraction(&ExtractionConfig::from_variant(Variant::Full));
        let n = names(&schema);
        assert_eq!(schema.len(), 2 * 20);
        assert!(n.contains(&"edge3_proton"));
        assert!(n.contains(&"z1_electron"));
        assert!(n.contains(&"sector_electron"));
        let sector = &schema.columns()[n.iter().position(|c| *c == "sector_proton").unwrap()];
        assert_eq!(sector.field, ParticleField::Int(IntField::Sector));
        assert_eq!(sector.particle, 0);
    }

    #[test]
    fn test_missing_particle_reads_defaults() {
        let schema = TableSchema::from_extraction(&ExtractionConfig::from_variant(Variant::Full));
        let record = OutputRecord::new([crate::config::Species::Proton]);
        let edge = schema
            .columns()
            .iter()
            .find(|c| c.name == "edge1_electron")
            .unwrap();
        assert_eq!(schema.particle(edge, &record), ParticleRecord::default());
    }

    #[test]
    fn test_experiment_has_no_truth() {
        let schema = TableSchema::from_extraction(&ExtractionConfig::from_variant(Variant::Experiment));
        assert!(names(&schema).iter().all(|c| !c.ends_with("_gen")));
        assert!(names(&schema).contains(&"sector_proton"));
    }
}
