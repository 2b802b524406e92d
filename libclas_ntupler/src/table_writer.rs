use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::TableWriterError;
use super::output_record::{FloatField, IntField, OutputRecord, ParticleField, ParticleRecord};
use super::table_schema::TableSchema;

/// This is the version of the output format
const FORMAT_VERSION: &str = "1.0";

/// Rows of one column waiting to be written, with the field they are read from
#[derive(Debug)]
enum ColumnBuffer {
    Float(FloatField, Vec<f32>),
    Int(IntField, Vec<i32>),
}

impl ColumnBuffer {
    fn new(field: ParticleField, capacity: usize) -> Self {
        match field {
            ParticleField::Float(f) => Self::Float(f, Vec::with_capacity(capacity)),
            ParticleField::Int(f) => Self::Int(f, Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, particle: &ParticleRecord) {
        match self {
            Self::Float(field, buf) => buf.push(particle.float(*field)),
            Self::Int(field, buf) => buf.push(particle.int(*field)),
        }
    }

    fn write(&mut self, dataset: &Dataset, start: usize) -> Result<(), hdf5::Error> {
        match self {
            Self::Float(_, buf) => {
                dataset.resize(start + buf.len())?;
                dataset.write_slice(buf.as_slice(), start..)?;
                buf.clear();
            }
            Self::Int(_, buf) => {
                dataset.resize(start + buf.len())?;
                dataset.write_slice(buf.as_slice(), start..)?;
                buf.clear();
            }
        }
        Ok(())
    }
}

/// A simple struct which wraps around the hdf5-rust library.
///
/// Writes output records as an append-only columnar table: one resizable 1-D
/// dataset per column in the root group of the file. Rows are buffered and flushed
/// every `flush_size` records; `close` flushes the remainder.
///
/// Object modification times are not recorded, so the same rows always give the
/// same file bytes.
#[derive(Debug)]
pub struct TableWriter {
    file_handle: File,
    file_path: PathBuf,
    schema: TableSchema,
    datasets: Vec<Dataset>,
    buffers: Vec<ColumnBuffer>,
    flush_size: usize,
    buffered_rows: usize,
    rows_written: u64,
}
// Structure
// / - entries, version
// |---- px_prot_gen(dset)
// |---- ...
// |---- z1_electron(dset)

impl TableWriter {
    /// Create the writer, opening a file at path and declaring every column of the schema
    pub fn new(path: &Path, schema: TableSchema, flush_size: usize) -> Result<Self, TableWriterError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // The root group takes its creation properties from the fcpl
        let file_handle = File::with_options()
            .with_fcpl(|p| p.obj_track_times(false))
            .create(path)
            .map_err(|e| TableWriterError::CreateError(path.to_path_buf(), e))?;
        let flush_size = flush_size.max(1);

        file_handle.new_attr::<u64>().create("entries")?;
        let version = format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION);
        file_handle
            .new_attr::<VarLenUnicode>()
            .create("version")?
            .write_scalar(&VarLenUnicode::from_str(&version).unwrap_or_default())?;

        let mut datasets = Vec::with_capacity(schema.len());
        let mut buffers = Vec::with_capacity(schema.len());
        for column in schema.columns() {
            let dataset = match column.field {
                ParticleField::Float(_) => file_handle
                    .new_dataset::<f32>()
                    .chunk(flush_size)
                    .obj_track_times(false)
                    .shape(0..)
                    .create(column.name.as_str())?,
                ParticleField::Int(_) => file_handle
                    .new_dataset::<i32>()
                    .chunk(flush_size)
                    .obj_track_times(false)
                    .shape(0..)
                    .create(column.name.as_str())?,
            };
            datasets.push(dataset);
            buffers.push(ColumnBuffer::new(column.field, flush_size));
        }

        Ok(Self {
            file_handle,
            file_path: path.to_path_buf(),
            schema,
            datasets,
            buffers,
            flush_size,
            buffered_rows: 0,
            rows_written: 0,
        })
    }

    /// Append one record as a row of the table
    pub fn append(&mut self, record: &OutputRecord) -> Result<(), TableWriterError> {
        for (column, buffer) in self.schema.columns().iter().zip(self.buffers.iter_mut()) {
            buffer.push(&self.schema.particle(column, record));
        }
        self.buffered_rows += 1;
        if self.buffered_rows >= self.flush_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write all buffered rows to disk
    pub fn flush(&mut self) -> Result<(), TableWriterError> {
        if self.buffered_rows == 0 {
            return Ok(());
        }
        let start = self.rows_written as usize;
        for (dataset, buffer) in self.datasets.iter().zip(self.buffers.iter_mut()) {
            buffer.write(dataset, start)?;
        }
        self.rows_written += self.buffered_rows as u64;
        self.buffered_rows = 0;
        self.file_handle.flush()?;
        Ok(())
    }

    /// Flush the remaining rows and write the table attributes, consume the writer
    pub fn close(mut self) -> Result<u64, TableWriterError> {
        self.flush()?;
        self.file_handle
            .attr("entries")?
            .write_scalar(&self.rows_written)?;
        spdlog::info!(
            "{} rows written to {}.",
            self.rows_written,
            self.file_path.to_string_lossy()
        );
        Ok(self.rows_written)
    }
}
