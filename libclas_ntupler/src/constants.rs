// HIPO container layout
pub const HIPO_MAGIC_NUMBER: u32 = 0xc0da0100;
pub const HEADER_SIZE_WORDS: usize = 14;
pub const HEADER_SIZE_BYTES: usize = HEADER_SIZE_WORDS * 4;
pub const EVENT_HEADER_SIZE: usize = 16;
pub const STRUCTURE_HEADER_SIZE: usize = 8;
pub const EVENT_SIGNATURE: u32 = 0x61345645; // "EV4a"

pub const COMPRESSION_NONE: u32 = 0;
pub const COMPRESSION_LZ4: u32 = 1;
pub const COMPRESSION_LZ4_BEST: u32 = 2;
pub const COMPRESSION_GZIP: u32 = 3;
// Upper bounds on decompressed/stored size ratios
pub const LZ4_MAX_RATIO: u64 = 255;
pub const GZIP_MAX_RATIO: u64 = 1032;

// Dictionary schemas live in string structures with this address
pub const DICTIONARY_GROUP: u16 = 120;
pub const DICTIONARY_ITEM: u8 = 2;
pub const STRING_TYPE: u8 = 6;

// Bank names
pub const REC_PARTICLE_BANK: &str = "REC::Particle";
pub const MC_PARTICLE_BANK: &str = "MC::Particle";
pub const REC_TRACK_BANK: &str = "REC::Track";
pub const REC_TRAJ_BANK: &str = "REC::Traj";

// PDG codes
pub const PROTON_PID: i32 = 2212;
pub const ELECTRON_PID: i32 = 11;

// Drift chambers, region 1/2/3 midplanes
pub const DEFAULT_TRACKING_DETECTOR: i32 = 6;
pub const DEFAULT_EDGE_LAYERS: [i32; 3] = [6, 18, 36];

// Output sentinels
pub const SECTOR_SENTINEL: i32 = -1;
pub const EDGE_SENTINEL: f32 = -1.0;
pub const FIDUCIAL_SENTINEL: f32 = -1000.0;

pub const DEFAULT_FLUSH_SIZE: usize = 10_000;
pub const PROGRESS_LOG_INTERVAL: u64 = 1_000_000;
