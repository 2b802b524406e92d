use std::path::PathBuf;
use thiserror::Error;

use super::constants::{HEADER_SIZE_WORDS, HIPO_MAGIC_NUMBER};
use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum HipoRecordError {
    #[error("Failed to parse buffer into HIPO record: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Incorrect magic number {0:#x} found in HIPO record header; expected {exp:#x}", exp=HIPO_MAGIC_NUMBER)]
    BadMagicNumber(u32),
    #[error("Unsupported compression type {0} found in HIPO record")]
    UnsupportedCompression(u32),
    #[error("HIPO record failed to decompress LZ4 data: {0}")]
    Lz4Error(#[from] lz4_flex::block::DecompressError),
    #[error("HIPO record index claims {0} bytes of events but payload only has {1}")]
    BadIndex(usize, usize),
    #[error("HIPO record claims {0} events but its index only has {1} bytes")]
    BadEventCount(u32, u32),
    #[error("HIPO record header length of {0} words is shorter than the {min} word minimum", min=HEADER_SIZE_WORDS)]
    BadHeaderLength(u32),
    #[error("HIPO record claims {0} bytes but only {1} bytes remain")]
    BadLength(u64, u64),
    #[error("HIPO record claims {0} bytes of payload from {1} stored bytes")]
    PayloadTooLarge(u64, usize),
}

#[derive(Debug, Clone, Error)]
pub enum DictionaryError {
    #[error("Malformed schema string in HIPO dictionary: {0}")]
    BadSchema(String),
    #[error("Unknown column type '{0}' in HIPO schema {1}")]
    BadColumnType(String, String),
    #[error("Failed to parse an integer in HIPO schema: {0}")]
    ParsingError(#[from] std::num::ParseIntError),
}

#[derive(Debug, Error)]
pub enum HipoEventError {
    #[error("HIPO event is truncated: header claims {0} bytes, buffer has {1}")]
    Truncated(usize, usize),
    #[error("HIPO structure at offset {0} overruns its event")]
    StructureOverrun(usize),
}

#[derive(Debug, Error)]
pub enum HipoFileError {
    #[error("Could not open HIPO file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Incorrect magic number {0:#x} found in HIPO file header; expected {exp:#x}", exp=HIPO_MAGIC_NUMBER)]
    BadMagicNumber(u32),
    #[error("Error when reading record from HIPO file: {0}")]
    BadRecord(#[from] HipoRecordError),
    #[error("Error when reading event from HIPO file: {0}")]
    BadEvent(#[from] HipoEventError),
    #[error("Error when reading HIPO dictionary: {0}")]
    BadDictionary(#[from] DictionaryError),
    #[error("HIPO file header claims {0} bytes of index and user header but the file only has {1}")]
    BadUserHeader(u64, u64),
    #[error("HIPO file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Error)]
pub enum BankError {
    #[error("Bank {0} is not present in the dictionary")]
    MissingSchema(String),
    #[error("Bank {bank} has no column named {column}")]
    MissingColumn { bank: String, column: String },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Event source failed due to HIPO file error: {0}")]
    FileError(#[from] HipoFileError),
    #[error("Event source failed due to HIPO event error: {0}")]
    EventError(#[from] HipoEventError),
    #[error("Event source is missing a mandatory bank: {0}")]
    BankError(#[from] BankError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config is invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum TableWriterError {
    #[error("TableWriter failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("TableWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("TableWriter could not create output file {0:?}: {1}")]
    CreateError(PathBuf, hdf5::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor could not read input list {0:?}: {1}")]
    InputListError(PathBuf, std::io::Error),
    #[error("Processor failed due to TableWriter error: {0}")]
    WriterError(#[from] TableWriterError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
