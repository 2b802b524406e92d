use fxhash::FxHashMap;
use std::str::FromStr;

use crate::error::DictionaryError;

/// The storage type of a single bank column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Byte,
    Short,
    Int,
    Float,
    Double,
    Long,
}

impl ColumnType {
    /// Size of a single value in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Double | Self::Long => 8,
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(Self::Byte),
            "S" => Ok(Self::Short),
            "I" => Ok(Self::Int),
            "F" => Ok(Self::Float),
            "D" => Ok(Self::Double),
            "L" => Ok(Self::Long),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
    /// Byte offset of this column within one row; scaled by the row count in column-major data
    pub offset: usize,
}

/// The layout of a single bank, as declared in the file dictionary.
///
/// The textual form is `{Name/group/item}{col/T,col/T,...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub group: u16,
    pub item: u8,
    pub columns: Vec<Column>,
    pub row_length: usize,
}

impl Schema {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

impl FromStr for Schema {
    type Err = DictionaryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        let bad = || DictionaryError::BadSchema(text.to_string());

        let body = text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .ok_or_else(bad)?;
        let (header, entries) = body.split_once("}{").ok_or_else(bad)?;

        let header_fields: Vec<&str> = header.split('/').collect();
        if header_fields.len() != 3 {
            return Err(bad());
        }
        let name = header_fields[0].to_string();
        let group: u16 = header_fields[1].trim().parse()?;
        let item: u8 = header_fields[2].trim().parse()?;

        let mut columns = Vec::new();
        let mut offset = 0;
        for entry in entries.split(',').filter(|e| !e.trim().is_empty()) {
            let (col_name, type_str) = entry.trim().split_once('/').ok_or_else(bad)?;
            let kind = ColumnType::from_str(type_str.trim())
                .map_err(|t| DictionaryError::BadColumnType(t, name.clone()))?;
            columns.push(Column {
                name: col_name.trim().to_string(),
                kind,
                offset,
            });
            offset += kind.size();
        }
        if columns.is_empty() {
            return Err(bad());
        }

        Ok(Schema {
            name,
            group,
            item,
            columns,
            row_length: offset,
        })
    }
}

/// All bank schemas declared by a HIPO file, keyed by bank name
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    schemas: FxHashMap<String, Schema>,
}

impl Dictionary {
    pub fn add_schema(&mut self, schema: Schema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn get_schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
