use super::dictionary::{ColumnType, Schema};
use super::event::HipoEvent;
use crate::error::HipoEventError;

/// A column-major view of one bank within one event.
///
/// Value (column, row) lives at `rows * column.offset + row * column.size`.
#[derive(Debug, Clone, Copy)]
pub struct Bank<'a> {
    schema: &'a Schema,
    data: &'a [u8],
    rows: usize,
}

impl<'a> Bank<'a> {
    pub fn new(schema: &'a Schema, data: &'a [u8]) -> Self {
        let rows = if schema.row_length == 0 {
            0
        } else {
            data.len() / schema.row_length
        };
        Self { schema, data, rows }
    }

    /// An event that does not carry the bank is a bank with zero rows
    pub fn empty(schema: &'a Schema) -> Self {
        Self {
            schema,
            data: &[],
            rows: 0,
        }
    }

    /// Bind the schema to the event's copy of the bank
    pub fn from_event(schema: &'a Schema, event: &'a HipoEvent) -> Result<Self, HipoEventError> {
        Ok(match event.get_structure(schema.group, schema.item)? {
            Some(structure) => Self::new(schema, structure.data),
            None => Self::empty(schema),
        })
    }

    pub fn get_rows(&self) -> usize {
        self.rows
    }

    fn bytes(&self, column: usize, row: usize) -> (&'a [u8], ColumnType) {
        let col = &self.schema.columns[column];
        let size = col.kind.size();
        let start = self.rows * col.offset + row * size;
        let data: &'a [u8] = self.data;
        (&data[start..start + size], col.kind)
    }

    /// Read any column widened to i64. Float columns are truncated.
    pub fn get_long(&self, column: usize, row: usize) -> i64 {
        let (b, kind) = self.bytes(column, row);
        match kind {
            ColumnType::Byte => b[0] as i8 as i64,
            ColumnType::Short => i16::from_le_bytes([b[0], b[1]]) as i64,
            ColumnType::Int => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64,
            ColumnType::Long => i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
            ColumnType::Float | ColumnType::Double => self.get_double(column, row) as i64,
        }
    }

    /// Read any column widened to f64
    pub fn get_double(&self, column: usize, row: usize) -> f64 {
        let (b, kind) = self.bytes(column, row);
        match kind {
            ColumnType::Float => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ColumnType::Double => {
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
            _ => self.get_long(column, row) as f64,
        }
    }

    pub fn get_int(&self, column: usize, row: usize) -> i32 {
        self.get_long(column, row) as i32
    }

    pub fn get_float(&self, column: usize, row: usize) -> f32 {
        self.get_double(column, row) as f32
    }
}
