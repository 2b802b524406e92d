use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::error::ConfigError;

/// The particle species the converter knows how to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Proton,
    Electron,
}

impl Species {
    pub fn pid(&self) -> i32 {
        match self {
            Self::Proton => PROTON_PID,
            Self::Electron => ELECTRON_PID,
        }
    }

    /// Name used in column names such as `p_proton_rec` or `sector_proton`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Proton => "proton",
            Self::Electron => "electron",
        }
    }

    /// Abbreviation used in component column names such as `px_prot_rec`
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Proton => "prot",
            Self::Electron => "electron",
        }
    }
}

/// One particle role to extract. If `required`, events without it are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleSelection {
    pub species: Species,
    pub required: bool,
}

/// Which particles and which optional banks to extract per event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub particles: Vec<ParticleSelection>,
    /// Skip events whose first REC::Particle row is not an electron (trigger topology).
    /// Needs confirmation whether this is a real readout requirement or an ordering artifact.
    pub require_electron_first: bool,
    pub truth: bool,
    pub tracks: bool,
    pub trajectories: bool,
    pub tracking_detector: i32,
    /// Layers for edge1..edge3; the first is the innermost and also gives the fiducial hit
    pub edge_layers: [i32; 3],
}

/// Named presets of the historical converters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Simulation, proton only, with truth
    Simulation,
    /// Experimental data, electron first and a proton, with sectors
    Experiment,
    /// Simulation, proton and electron, with truth, sectors and trajectories
    Full,
}

impl std::str::FromStr for Variant {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simulation" | "sim" => Ok(Self::Simulation),
            "experiment" | "exp" => Ok(Self::Experiment),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::Invalid(format!("unknown variant {s}"))),
        }
    }
}

impl ExtractionConfig {
    pub fn from_variant(variant: Variant) -> Self {
        let proton = ParticleSelection {
            species: Species::Proton,
            required: true,
        };
        let electron = ParticleSelection {
            species: Species::Electron,
            required: true,
        };
        let base = Self {
            particles: vec![proton, electron],
            require_electron_first: false,
            truth: true,
            tracks: true,
            trajectories: true,
            tracking_detector: DEFAULT_TRACKING_DETECTOR,
            edge_layers: DEFAULT_EDGE_LAYERS,
        };
        match variant {
            Variant::Simulation => Self {
                particles: vec![proton],
                tracks: false,
                trajectories: false,
                ..base
            },
            Variant::Experiment => Self {
                require_electron_first: true,
                truth: false,
                trajectories: false,
                ..base
            },
            Variant::Full => base,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particles.is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "at least one particle must be selected",
            )));
        }
        for (idx, selection) in self.particles.iter().enumerate() {
            if self.particles[..idx]
                .iter()
                .any(|p| p.species == selection.species)
            {
                return Err(ConfigError::Invalid(format!(
                    "species {} is selected more than once",
                    selection.species.name()
                )));
            }
        }
        let [l1, l2, l3] = self.edge_layers;
        if l1 == l2 || l1 == l3 || l2 == l3 {
            return Err(ConfigError::Invalid(String::from(
                "edge layers must be distinct",
            )));
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::from_variant(Variant::Full)
    }
}

/// Structure representing the application configuration. Contains pathing and extraction information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub input_list: PathBuf,
    pub output_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub max_events: Option<u64>,
    pub flush_size: usize,
    pub extraction: ExtractionConfig,
}

impl Default for Config {
    /// Generate a new Config object. The input list is empty/invalid
    fn default() -> Self {
        Self {
            input_list: PathBuf::from("None"),
            output_path: None,
            data_dir: PathBuf::from("data_test"),
            max_events: None,
            flush_size: DEFAULT_FLUSH_SIZE,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_size == 0 {
            return Err(ConfigError::Invalid(String::from(
                "flush_size must be at least 1",
            )));
        }
        self.extraction.validate()
    }

    /// Get the path to the output table.
    ///
    /// Defaults to `<data_dir>/<input list file name>.h5`
    pub fn get_output_path(&self) -> PathBuf {
        if let Some(path) = &self.output_path {
            return path.clone();
        }
        let list_name = self
            .input_list
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("output"));
        self.data_dir.join(format!("{list_name}.h5"))
    }

    /// Read the list of event source paths, one per line. Blank lines are ignored.
    pub fn read_input_list(&self) -> std::io::Result<Vec<PathBuf>> {
        let contents = std::fs::read_to_string(&self.input_list)?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}
