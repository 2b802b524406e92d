use fxhash::FxHashMap;

use super::config::{ExtractionConfig, Species};
use super::constants::ELECTRON_PID;
use super::event_context::{EventContext, TrackRow, TrajectoryRow};
use super::output_record::{OutputRecord, ParticleRecord};

/// Why an event produced no output record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The first REC::Particle row was not an electron (or there were no rows)
    ElectronNotFirst,
    /// A required species had no REC::Particle row
    MissingSpecies(Species),
}

/// Detector attributes of one selected particle gathered from REC::Track and REC::Traj.
/// Every slot is filled by the first matching row only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParticleLinks {
    pub sector: Option<i32>,
    pub edges: [Option<f32>; 3],
    pub fiducial: Option<[f32; 3]>,
}

/// The BankCorrelator turns the banks of one event into (at most) one output record.
///
/// It selects the first REC::Particle row of each configured species, matches truth
/// particles by species, and joins REC::Track/REC::Traj rows to the selected particles
/// by their `pindex` back-reference. The correlator holds no per-event state: every call
/// starts from a freshly defaulted record.
#[derive(Debug, Clone)]
pub struct BankCorrelator {
    config: ExtractionConfig,
}

impl BankCorrelator {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Correlate the banks of one event.
    ///
    /// Returns `Err(SkipReason)` if the event does not qualify; this is not an error
    /// condition, the event simply contributes no row.
    pub fn correlate(&self, event: &EventContext) -> Result<OutputRecord, SkipReason> {
        if self.config.require_electron_first
            && event.particles.first().map(|p| p.pid) != Some(ELECTRON_PID)
        {
            return Err(SkipReason::ElectronNotFirst);
        }

        // First REC::Particle row per species; None for absent optional species
        let mut selected: Vec<(Species, Option<usize>)> = Vec::with_capacity(self.config.particles.len());
        for selection in self.config.particles.iter() {
            let index = Self::find_first(event, selection.species.pid());
            if index.is_none() && selection.required {
                return Err(SkipReason::MissingSpecies(selection.species));
            }
            selected.push((selection.species, index));
        }

        let selected_rows: Vec<usize> = selected.iter().filter_map(|(_, idx)| *idx).collect();
        let links = self.build_links(event, &selected_rows);

        let mut record = OutputRecord::new(selected.iter().map(|(species, _)| *species));
        for (species, index) in selected {
            let particle = match record.get_mut(species) {
                Some(p) => p,
                None => continue,
            };
            if self.config.truth {
                if let Some(mc) = event.mc_particles.iter().find(|mc| mc.pid == species.pid()) {
                    particle.set_generated(mc.px, mc.py, mc.pz);
                }
            }
            if let Some(index) = index {
                self.fill_reconstructed(particle, event, index, links.get(&index));
            }
        }
        Ok(record)
    }

    fn find_first(event: &EventContext, pid: i32) -> Option<usize> {
        event.particles.iter().position(|p| p.pid == pid)
    }

    fn fill_reconstructed(
        &self,
        particle: &mut ParticleRecord,
        event: &EventContext,
        index: usize,
        links: Option<&ParticleLinks>,
    ) {
        let row = &event.particles[index];
        particle.set_reconstructed(row.px, row.py, row.pz);
        particle.vx = row.vx;
        particle.vy = row.vy;
        particle.vz = row.vz;
        particle.pid = row.pid;
        particle.status = row.status;

        if let Some(links) = links {
            if let Some(sector) = links.sector {
                particle.sector = sector;
            }
            for (slot, edge) in particle.edge.iter_mut().zip(links.edges.iter()) {
                if let Some(edge) = edge {
                    *slot = *edge;
                }
            }
            if let Some(position) = links.fiducial {
                particle.fiducial = position;
            }
        }
    }

    /// Join tracks and trajectories to the selected particle rows in one pass over each bank.
    ///
    /// Rows pointing at particles that were not selected (or that do not exist) are ignored.
    pub fn build_links(&self, event: &EventContext, selected_rows: &[usize]) -> FxHashMap<usize, ParticleLinks> {
        let mut links: FxHashMap<usize, ParticleLinks> = selected_rows
            .iter()
            .map(|idx| (*idx, ParticleLinks::default()))
            .collect();
        let lookup = |pindex: i32| -> Option<usize> {
            usize::try_from(pindex)
                .ok()
                .filter(|idx| *idx < event.particles.len())
        };

        if self.config.tracks {
            for TrackRow { pindex, sector } in event.tracks.iter() {
                if let Some(entry) = lookup(*pindex).and_then(|idx| links.get_mut(&idx)) {
                    entry.sector.get_or_insert(*sector);
                }
            }
        }

        if self.config.trajectories {
            let innermost = self.config.edge_layers[0];
            for traj in event.trajectories.iter() {
                let TrajectoryRow { pindex, detector, layer, edge, x, y, z } = *traj;
                if detector != self.config.tracking_detector {
                    continue;
                }
                let entry = match lookup(pindex).and_then(|idx| links.get_mut(&idx)) {
                    Some(e) => e,
                    None => continue,
                };
                if let Some(slot) = self.config.edge_layers.iter().position(|l| *l == layer) {
                    entry.edges[slot].get_or_insert(edge);
                }
                if layer == innermost {
                    entry.fiducial.get_or_insert([x, y, z]);
                }
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParticleSelection, Variant};
    use crate::event_context::{McParticleRow, ParticleRow};

    fn particle(pid: i32, status: i32) -> ParticleRow {
        ParticleRow {
            pid,
            status,
            px: 0.3,
            py: -0.4,
            pz: 1.2,
            ..Default::default()
        }
    }

    fn traj(pindex: i32, detector: i32, layer: i32, edge: f32, pos: [f32; 3]) -> TrajectoryRow {
        TrajectoryRow {
            pindex,
            detector,
            layer,
            edge,
            x: pos[0],
            y: pos[1],
            z: pos[2],
        }
    }

    fn scenario_event() -> EventContext {
        EventContext {
            particles: vec![particle(11, 2000), particle(2212, 4000)],
            mc_particles: vec![
                McParticleRow { pid: 11, px: 0.1, py: 0.2, pz: 5.0 },
                McParticleRow { pid: 2212, px: 1.0, py: 0.0, pz: 2.0 },
            ],
            tracks: vec![TrackRow { pindex: 1, sector: 3 }],
            trajectories: vec![
                traj(1, 6, 6, 12.5, [1.0, 2.0, 3.0]),
                traj(1, 6, 18, 8.0, [0.0, 0.0, 0.0]),
            ],
        }
    }

    fn full() -> BankCorrelator {
        BankCorrelator::new(ExtractionConfig::from_variant(Variant::Full))
    }

    #[test]
    fn test_scenario_event() {
        let record = full().correlate(&scenario_event()).expect("qualifies");
        let proton = record.get(Species::Proton).unwrap();
        assert_eq!(proton.status, 4000);
        assert_eq!(proton.pid, 2212);
        assert_eq!(proton.sector, 3);
        assert_eq!(proton.edge, [12.5, 8.0, -1.0]);
        assert_eq!(proton.fiducial, [1.0, 2.0, 3.0]);
        assert!((proton.p_gen - 5.0f32.sqrt()).abs() < 1e-6);

        let electron = record.get(Species::Electron).unwrap();
        assert_eq!(electron.status, 2000);
        assert_eq!(electron.sector, -1);
        assert_eq!(electron.edge, [-1.0; 3]);
        assert_eq!(electron.fiducial, [-1000.0; 3]);
        assert_eq!(electron.px_gen, 0.1);
    }

    #[test]
    fn test_magnitudes_match_components() {
        let record = full().correlate(&scenario_event()).unwrap();
        for (_, p) in record.particles.iter() {
            let expected = (p.px_rec * p.px_rec + p.py_rec * p.py_rec + p.pz_rec * p.pz_rec).sqrt();
            assert!((p.p_rec - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_proton_is_skipped() {
        let mut event = scenario_event();
        event.particles[1].pid = 211;
        assert_eq!(
            full().correlate(&event),
            Err(SkipReason::MissingSpecies(Species::Proton))
        );
    }

    #[test]
    fn test_optional_species_keeps_defaults() {
        let mut config = ExtractionConfig::from_variant(Variant::Full);
        config.particles[1] = ParticleSelection {
            species: Species::Electron,
            required: false,
        };
        let mut event = scenario_event();
        event.particles.remove(0);
        event.tracks[0].pindex = 0;
        event.trajectories.iter_mut().for_each(|t| t.pindex = 0);

        let record = BankCorrelator::new(config).correlate(&event).expect("qualifies");
        let electron = record.get(Species::Electron).unwrap();
        assert_eq!(electron.pid, 0);
        assert_eq!(electron.p_rec, 0.0);
        assert_eq!(electron.sector, -1);
        // Truth is matched by species, not by reconstructed row
        assert_eq!(electron.pz_gen, 5.0);
        assert_eq!(record.get(Species::Proton).unwrap().sector, 3);
    }

    #[test]
    fn test_electron_first_policy() {
        let correlator = BankCorrelator::new(ExtractionConfig::from_variant(Variant::Experiment));
        assert!(correlator.correlate(&scenario_event()).is_ok());

        let mut event = scenario_event();
        event.particles.swap(0, 1);
        assert_eq!(correlator.correlate(&event), Err(SkipReason::ElectronNotFirst));
        // The same event qualifies when the policy is off
        assert!(full().correlate(&event).is_ok());

        assert_eq!(
            correlator.correlate(&EventContext::default()),
            Err(SkipReason::ElectronNotFirst)
        );
    }

    #[test]
    fn test_first_track_wins() {
        let mut event = scenario_event();
        event.tracks = vec![
            TrackRow { pindex: 1, sector: 5 },
            TrackRow { pindex: 1, sector: 2 },
        ];
        let record = full().correlate(&event).unwrap();
        assert_eq!(record.get(Species::Proton).unwrap().sector, 5);
    }

    #[test]
    fn test_first_trajectory_wins() {
        let mut event = scenario_event();
        event.trajectories.insert(0, traj(1, 6, 36, 4.5, [7.0, 8.0, 9.0]));
        event.trajectories.push(traj(1, 6, 6, 99.0, [9.0, 9.0, 9.0]));
        event.trajectories.push(traj(1, 6, 36, 99.0, [9.0, 9.0, 9.0]));
        let record = full().correlate(&event).unwrap();
        let proton = record.get(Species::Proton).unwrap();
        assert_eq!(proton.edge, [12.5, 8.0, 4.5]);
        assert_eq!(proton.fiducial, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_other_detectors_and_dangling_rows_ignored() {
        let mut event = scenario_event();
        event.trajectories = vec![
            traj(1, 12, 6, 50.0, [5.0, 5.0, 5.0]),
            traj(7, 6, 6, 50.0, [5.0, 5.0, 5.0]),
            traj(-1, 6, 18, 50.0, [5.0, 5.0, 5.0]),
            traj(1, 6, 18, 8.0, [0.0, 0.0, 0.0]),
        ];
        event.tracks = vec![TrackRow { pindex: 9, sector: 4 }, TrackRow { pindex: 0, sector: 1 }];
        let record = full().correlate(&event).unwrap();
        let proton = record.get(Species::Proton).unwrap();
        assert_eq!(proton.edge, [-1.0, 8.0, -1.0]);
        assert_eq!(proton.fiducial, [-1000.0; 3]);
        assert_eq!(proton.sector, -1);
        assert_eq!(record.get(Species::Electron).unwrap().sector, 1);
    }

    #[test]
    fn test_no_state_between_events() {
        let correlator = full();
        let first = correlator.correlate(&scenario_event()).unwrap();
        assert_eq!(first.get(Species::Proton).unwrap().edge[0], 12.5);

        let mut second_event = scenario_event();
        second_event.trajectories.clear();
        second_event.tracks.clear();
        let second = correlator.correlate(&second_event).unwrap();
        let proton = second.get(Species::Proton).unwrap();
        assert_eq!(proton.edge[0], -1.0);
        assert_eq!(proton.fiducial, [-1000.0; 3]);
        assert_eq!(proton.sector, -1);
    }

    #[test]
    fn test_truth_disabled() {
        let mut config = ExtractionConfig::from_variant(Variant::Full);
        config.truth = false;
        let record = BankCorrelator::new(config).correlate(&scenario_event()).unwrap();
        assert_eq!(record.get(Species::Proton).unwrap().p_gen, 0.0);
    }
}
