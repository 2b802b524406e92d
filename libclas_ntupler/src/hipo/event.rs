use crate::constants::{EVENT_HEADER_SIZE, STRUCTURE_HEADER_SIZE};
use crate::error::HipoEventError;

/// A view of a single structure (bank, string, ...) within an event
#[derive(Debug, Clone, Copy)]
pub struct Structure<'a> {
    pub group: u16,
    pub item: u8,
    pub kind: u8,
    pub data: &'a [u8],
}

/// A single HIPO event. Owns its bytes; banks are looked up by (group, item).
#[derive(Debug, Clone, Default)]
pub struct HipoEvent {
    data: Vec<u8>,
}

impl HipoEvent {
    pub fn new(mut data: Vec<u8>) -> Result<Self, HipoEventError> {
        if data.len() < EVENT_HEADER_SIZE {
            return Err(HipoEventError::Truncated(EVENT_HEADER_SIZE, data.len()));
        }
        let size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        if size > data.len() {
            return Err(HipoEventError::Truncated(size, data.len()));
        } else if size >= EVENT_HEADER_SIZE {
            data.truncate(size);
        }
        Ok(Self { data })
    }

    /// Walk the structures of the event in storage order
    pub fn structures(&self) -> Result<Vec<Structure<'_>>, HipoEventError> {
        let mut structures = Vec::new();
        let mut position = EVENT_HEADER_SIZE;
        while position + STRUCTURE_HEADER_SIZE <= self.data.len() {
            let header = &self.data[position..position + STRUCTURE_HEADER_SIZE];
            let group = u16::from_le_bytes([header[0], header[1]]);
            let item = header[2];
            let kind = header[3];
            let length_word = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
            let format_length = (length_word >> 24) as usize;
            let data_length = (length_word & 0x00FF_FFFF) as usize;

            let start = position + STRUCTURE_HEADER_SIZE + format_length;
            let stop = start + data_length;
            if stop > self.data.len() {
                return Err(HipoEventError::StructureOverrun(position));
            }
            structures.push(Structure {
                group,
                item,
                kind,
                data: &self.data[start..stop],
            });
            position = stop;
        }
        Ok(structures)
    }

    /// Find the first structure with the given address. None if the event does not carry it.
    pub fn get_structure(&self, group: u16, item: u8) -> Result<Option<Structure<'_>>, HipoEventError> {
        Ok(self
            .structures()?
            .into_iter()
            .find(|s| s.group == group && s.item == item))
    }
}
