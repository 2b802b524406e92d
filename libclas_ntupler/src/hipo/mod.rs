//! Reading of CLAS12 HIPO (version 4) event files.
//!
//! A file is a header, a dictionary of bank schemas, and a sequence of
//! (optionally LZ4 or gzip compressed) records, each holding events. Events
//! hold structures addressed by (group, item); banks are column-major tables
//! whose layout is given by the schema.
pub mod bank;
pub mod dictionary;
pub mod event;
pub mod hipo_file;
pub mod record;

#[cfg(test)]
pub(crate) mod test_file;
