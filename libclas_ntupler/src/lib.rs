//! # clas_ntupler
//!
//! clas_ntupler converts CLAS12 reconstruction output, written in the HIPO format, into a
//! flat columnar table in the HDF5 format. Each qualifying event becomes one row holding
//! the generated and reconstructed kinematics of the selected protons and electrons,
//! together with their drift chamber sector, the trajectory edge distances and the
//! fiducial hit position of the innermost tracking layer.
//!
//! ## Installation
//!
//! Currently the only method of install is from source.
//!
//! ### Rust
//!
//! If you have not used Rust before, you will most likely need to install the Rust tool
//! chain. See the [Rust docs](https://www.rust-lang.org/tools/install) for installation
//! instructions.
//!
//! ### HDF5
//!
//! Before building and running clas_ntupler, HDF5 must be installed. Typically this will
//! be installed using a package manager (homebrew, apt, etc), and the Rust libraries will
//! auto detect the location of the HDF install. If a custom install is needed, write the
//! following snippet into the file `.cargo/config.toml` in the repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./clas_ntupler_cli` from the
//! top level repository. See the `clas_ntupler_cli` README for usage.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! input_list: runs.dat
//! output_path: null
//! data_dir: data_test
//! max_events: null
//! flush_size: 10000
//! extraction:
//!   particles:
//!   - species: proton
//!     required: true
//!   - species: electron
//!     required: true
//!   require_electron_first: false
//!   truth: true
//!   tracks: true
//!   trajectories: true
//!   tracking_detector: 6
//!   edge_layers: [6, 18, 36]
//! ```
//!
//! - `input_list`: text file with one HIPO file path per line. Blank lines are ignored.
//! - `output_path`: path of the HDF5 output. If `null`, `<data_dir>/<input list name>.h5`
//! is used.
//! - `max_events`: stop after this many events have been read over all files.
//! - `flush_size`: number of rows buffered in memory before they are written.
//! - `extraction`: which particles to select, and which of the MC::Particle, REC::Track
//! and REC::Traj banks to join to them. A particle marked `required` must be present
//! for an event to produce a row. `require_electron_first` only keeps events whose first
//! REC::Particle is an electron. `edge_layers` are the REC::Traj layers of the tracking
//! detector used for `edge1..edge3`; the first one also gives the fiducial position.
//!
//! The presets `simulation`, `experiment` and `full` (see [`config::Variant`]) fill the
//! extraction section for the common cases.
//!
//! ## Output
//!
//! clas_ntupler outputs the HDF5 table and a log file. Missing or unreadable HIPO files
//! are logged and skipped, so check the log file when the row count looks wrong.
//!
//! ### HDF5 Data Format
//!
//! ```text
//! runs.dat.h5 - entries, version
//! |---- px_prot_gen(dset)
//! |---- ...
//! |---- p_proton_rec(dset)
//! |---- vx_prot(dset)
//! |---- pid_proton(dset)
//! |---- status_proton(dset)
//! |---- sector_proton(dset)
//! |---- edge1_proton(dset)
//! |---- x1_proton(dset)
//! |---- ...
//! ```
//!
//! Every dataset is 1-D with `entries` values, `f32` for kinematics and `i32` for pid,
//! status and sector. Values that were not found in an event keep their defaults: 0 for
//! momenta, -1 for sector and edges, and -1000 for the fiducial position.
//!
//! No object modification times are stored, so converting the same input twice gives
//! byte for byte identical files.
pub mod config;
pub mod constants;
pub mod correlator;
pub mod error;
pub mod event_context;
pub mod event_source;
pub mod hipo;
pub mod output_record;
pub mod process;
pub mod table_schema;
pub mod table_writer;
pub mod worker_status;
