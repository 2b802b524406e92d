use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use std::io::Read;

use crate::constants::*;
use crate::error::HipoRecordError;

/// The 14 word header which precedes every HIPO record (and the file itself).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordHeader {
    pub record_length_words: u32,
    pub record_number: u32,
    pub header_length_words: u32,
    pub event_count: u32,
    pub index_length: u32,
    pub bit_info: u32,
    pub user_header_length: u32,
    pub magic_number: u32,
    pub data_length: u32,
    pub compression_type: u32,
    pub compressed_length_words: u32,
    pub user_register_1: u64,
    pub user_register_2: u64,
}

impl RecordHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, HipoRecordError> {
        let header = RecordHeader {
            record_length_words: reader.read_u32::<LittleEndian>()?,
            record_number: reader.read_u32::<LittleEndian>()?,
            header_length_words: reader.read_u32::<LittleEndian>()?,
            event_count: reader.read_u32::<LittleEndian>()?,
            index_length: reader.read_u32::<LittleEndian>()?,
            bit_info: reader.read_u32::<LittleEndian>()?,
            user_header_length: reader.read_u32::<LittleEndian>()?,
            magic_number: reader.read_u32::<LittleEndian>()?,
            data_length: reader.read_u32::<LittleEndian>()?,
            ..Default::default()
        };
        if header.magic_number != HIPO_MAGIC_NUMBER {
            return Err(HipoRecordError::BadMagicNumber(header.magic_number));
        }
        if (header.header_length_words as usize) < HEADER_SIZE_WORDS {
            return Err(HipoRecordError::BadHeaderLength(header.header_length_words));
        }
        let compression_word = reader.read_u32::<LittleEndian>()?;
        let mut header = RecordHeader {
            compression_type: compression_word >> 28,
            compressed_length_words: compression_word & 0x0FFF_FFFF,
            ..header
        };
        header.user_register_1 = reader.read_u64::<LittleEndian>()?;
        header.user_register_2 = reader.read_u64::<LittleEndian>()?;

        // Headers may be longer than the words we know about
        let extra = (header.header_length_words as usize).saturating_sub(HEADER_SIZE_WORDS) * 4;
        if extra > 0 {
            std::io::copy(&mut reader.by_ref().take(extra as u64), &mut std::io::sink())?;
        }
        Ok(header)
    }

    fn user_header_padding(&self) -> usize {
        ((self.bit_info >> 20) & 0x3) as usize
    }

    fn data_padding(&self) -> usize {
        ((self.bit_info >> 22) & 0x3) as usize
    }

    fn compressed_padding(&self) -> usize {
        ((self.bit_info >> 24) & 0x3) as usize
    }

    /// Bytes following the header on disk
    pub fn stored_length(&self) -> u64 {
        self.record_length_words.saturating_sub(self.header_length_words) as u64 * 4
    }

    /// Size of the decompressed payload: index array, padded user header, padded events
    pub fn payload_length(&self) -> u64 {
        self.index_length as u64
            + self.user_header_length as u64
            + self.user_header_padding() as u64
            + self.data_length as u64
            + self.data_padding() as u64
    }

    /// The payload length, refused if `stored` bytes cannot decompress to it
    fn bounded_payload_length(&self, stored: usize, max_ratio: u64) -> Result<usize, HipoRecordError> {
        let length = self.payload_length();
        match (stored as u64).checked_mul(max_ratio) {
            Some(bound) if length <= bound => Ok(length as usize),
            _ => Err(HipoRecordError::PayloadTooLarge(length, stored)),
        }
    }

    fn events_start(&self) -> usize {
        self.index_length as usize + self.user_header_length as usize + self.user_header_padding()
    }
}

/// A decompressed HIPO record, holding the raw bytes of each of its events.
#[derive(Debug, Clone)]
pub struct HipoRecord {
    pub header: RecordHeader,
    payload: Vec<u8>,
    event_ranges: Vec<(usize, usize)>,
}

impl HipoRecord {
    /// Read the next record from the reader, which must be positioned at a record header.
    ///
    /// `available` is the number of bytes left in the reader, header included. A record
    /// claiming more than that is refused before anything is allocated.
    pub fn read<R: Read>(reader: &mut R, available: u64) -> Result<Self, HipoRecordError> {
        let header = RecordHeader::read(reader)?;
        let header_bytes = header.header_length_words as u64 * 4;
        let remaining = available.saturating_sub(header_bytes);
        if header.stored_length() > remaining {
            return Err(HipoRecordError::BadLength(header.stored_length(), remaining));
        }
        let mut stored = vec![0u8; header.stored_length() as usize];
        reader.read_exact(&mut stored)?;
        Self::from_parts(header, stored)
    }

    /// Build a record from its header and the bytes stored after it
    pub fn from_parts(header: RecordHeader, stored: Vec<u8>) -> Result<Self, HipoRecordError> {
        let compressed_length = (header.compressed_length_words as usize * 4)
            .saturating_sub(header.compressed_padding())
            .min(stored.len());
        let payload = match header.compression_type {
            COMPRESSION_NONE => stored,
            COMPRESSION_LZ4 | COMPRESSION_LZ4_BEST => {
                let length = header.bounded_payload_length(compressed_length, LZ4_MAX_RATIO)?;
                lz4_flex::block::decompress(&stored[..compressed_length], length)?
            }
            COMPRESSION_GZIP => {
                let length = header.bounded_payload_length(compressed_length, GZIP_MAX_RATIO)?;
                let mut payload = Vec::with_capacity(length);
                GzDecoder::new(&stored[..compressed_length])
                    .take(length as u64)
                    .read_to_end(&mut payload)?;
                payload
            }
            other => return Err(HipoRecordError::UnsupportedCompression(other)),
        };

        if header.event_count as u64 * 4 > header.index_length as u64 {
            return Err(HipoRecordError::BadEventCount(header.event_count, header.index_length));
        }
        if header.index_length as usize > payload.len() {
            return Err(HipoRecordError::BadIndex(header.index_length as usize, payload.len()));
        }
        let mut event_ranges = Vec::with_capacity(header.event_count as usize);
        let mut index = &payload[..header.index_length as usize];
        let mut position = header.events_start();
        for _ in 0..header.event_count {
            let length = index.read_u32::<LittleEndian>()? as usize;
            event_ranges.push((position, position + length));
            position += length;
        }
        if position > payload.len() {
            return Err(HipoRecordError::BadIndex(position, payload.len()));
        }

        Ok(Self {
            header,
            payload,
            event_ranges,
        })
    }

    pub fn n_events(&self) -> usize {
        self.event_ranges.len()
    }

    pub fn get_event(&self, index: usize) -> Option<&[u8]> {
        self.event_ranges
            .get(index)
            .map(|(start, stop)| &self.payload[*start..*stop])
    }

    pub fn get_user_header(&self) -> &[u8] {
        let start = (self.header.index_length as usize).min(self.payload.len());
        let stop = (start + self.header.user_header_length as usize).min(self.payload.len());
        &self.payload[start..stop]
    }
}
