use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::dictionary::{Dictionary, Schema};
use super::event::HipoEvent;
use super::record::HipoRecord;
use crate::constants::*;
use crate::error::{HipoFileError, HipoRecordError};

/// The leading header of a HIPO file. Same size as a record header, but the
/// trailing words carry file level information.
#[derive(Debug, Clone, Default)]
pub struct FileHeader {
    pub file_id: u32,
    pub file_number: u32,
    pub header_length_words: u32,
    pub record_count: u32,
    pub index_length: u32,
    pub bit_info: u32,
    pub user_header_length: u32,
    pub magic_number: u32,
    pub user_register: u64,
    pub trailer_position: u64,
}

impl FileHeader {
    fn read<R: Read>(reader: &mut R) -> Result<Self, HipoFileError> {
        let header = FileHeader {
            file_id: reader.read_u32::<LittleEndian>()?,
            file_number: reader.read_u32::<LittleEndian>()?,
            header_length_words: reader.read_u32::<LittleEndian>()?,
            record_count: reader.read_u32::<LittleEndian>()?,
            index_length: reader.read_u32::<LittleEndian>()?,
            bit_info: reader.read_u32::<LittleEndian>()?,
            user_header_length: reader.read_u32::<LittleEndian>()?,
            magic_number: reader.read_u32::<LittleEndian>()?,
            user_register: reader.read_u64::<LittleEndian>()?,
            trailer_position: reader.read_u64::<LittleEndian>()?,
        };
        if header.magic_number != HIPO_MAGIC_NUMBER {
            return Err(HipoFileError::BadMagicNumber(header.magic_number));
        }
        // Two user integers close out the header
        reader.read_u64::<LittleEndian>()?;
        Ok(header)
    }

    fn user_header_padding(&self) -> usize {
        ((self.bit_info >> 20) & 0x3) as usize
    }
}

/// A single HIPO file, read sequentially one event at a time.
///
/// The dictionary is read from the file header on open, so schema discovery
/// is available before any event is touched.
#[derive(Debug)]
pub struct HipoFile {
    file_path: PathBuf,
    reader: BufReader<File>,
    header: FileHeader,
    dictionary: Dictionary,
    size_bytes: u64,
    position: u64,
    active_record: Option<HipoRecord>,
    next_event: usize,
    is_eof: bool,
}

impl HipoFile {
    pub fn new(path: &Path) -> Result<Self, HipoFileError> {
        if !path.exists() {
            return Err(HipoFileError::BadFilePath(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let size_bytes = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = FileHeader::read(&mut reader)?;
        let mut position = HEADER_SIZE_BYTES as u64;
        let extra_header = (header.header_length_words as u64).saturating_sub(HEADER_SIZE_WORDS as u64) * 4;
        let skip = extra_header + header.index_length as u64;
        let user_header_size = header.user_header_length as u64 + header.user_header_padding() as u64;
        if position + skip + user_header_size > size_bytes {
            return Err(HipoFileError::BadUserHeader(skip + user_header_size, size_bytes));
        }
        std::io::copy(&mut reader.by_ref().take(skip), &mut std::io::sink())?;
        position += skip;

        let mut user_header = vec![0u8; user_header_size as usize];
        reader.read_exact(&mut user_header)?;
        position += user_header_size;
        user_header.truncate(header.user_header_length as usize);

        let dictionary = Self::read_dictionary(&user_header)?;
        spdlog::debug!(
            "Read {} bank schemas from {}",
            dictionary.len(),
            path.to_string_lossy()
        );

        Ok(Self {
            file_path: path.to_path_buf(),
            reader,
            header,
            dictionary,
            size_bytes,
            position,
            active_record: None,
            next_event: 0,
            is_eof: false,
        })
    }

    /// The dictionary is stored as a record in the file's user header, one schema string per event
    fn read_dictionary(user_header: &[u8]) -> Result<Dictionary, HipoFileError> {
        let mut dictionary = Dictionary::default();
        if user_header.len() < HEADER_SIZE_BYTES {
            return Ok(dictionary);
        }
        let record = HipoRecord::read(&mut &user_header[..], user_header.len() as u64)?;
        for idx in 0..record.n_events() {
            let event = match record.get_event(idx) {
                Some(bytes) => HipoEvent::new(bytes.to_vec())?,
                None => continue,
            };
            for structure in event.structures()? {
                if structure.group == DICTIONARY_GROUP
                    && structure.item == DICTIONARY_ITEM
                    && structure.kind == STRING_TYPE
                {
                    let text = String::from_utf8_lossy(structure.data);
                    dictionary.add_schema(Schema::from_str(&text)?);
                }
            }
        }
        Ok(dictionary)
    }

    /// Get the next event in the file.
    ///
    /// Returns a `Result<Option<HipoEvent>>`. The Option is None once the file has no more events.
    pub fn next_event(&mut self) -> Result<Option<HipoEvent>, HipoFileError> {
        loop {
            if let Some(record) = &self.active_record {
                if let Some(bytes) = record.get_event(self.next_event) {
                    self.next_event += 1;
                    return Ok(Some(HipoEvent::new(bytes.to_vec())?));
                }
            }
            if !self.move_to_next_record()? {
                return Ok(None);
            }
        }
    }

    /// Load the next record. Returns false at the end of the file.
    fn move_to_next_record(&mut self) -> Result<bool, HipoFileError> {
        self.active_record = None;
        self.next_event = 0;
        if self.is_eof
            || self.position + HEADER_SIZE_BYTES as u64 > self.size_bytes
            || (self.header.trailer_position != 0 && self.position >= self.header.trailer_position)
        {
            self.is_eof = true;
            return Ok(false);
        }
        let available = self.size_bytes - self.position;
        let record = match HipoRecord::read(&mut self.reader, available) {
            Ok(r) => r,
            Err(HipoRecordError::BadLength(_, _)) => {
                spdlog::warn!(
                    "HIPO file {} ends in the middle of a record",
                    self.file_path.to_string_lossy()
                );
                self.is_eof = true;
                return Ok(false);
            }
            Err(HipoRecordError::IOError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                spdlog::warn!(
                    "HIPO file {} ends in the middle of a record",
                    self.file_path.to_string_lossy()
                );
                self.is_eof = true;
                return Ok(false);
            }
            Err(e) => return Err(HipoFileError::BadRecord(e)),
        };
        self.position += record.header.record_length_words as u64 * 4;
        self.active_record = Some(record);
        Ok(true)
    }

    pub fn get_dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn get_filename(&self) -> &Path {
        &self.file_path
    }

    pub fn get_size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn get_record_count(&self) -> u32 {
        self.header.record_count
    }

    /// Fraction of the file consumed so far
    pub fn get_progress(&self) -> f32 {
        if self.size_bytes == 0 {
            1.0
        } else {
            self.position as f32 / self.size_bytes as f32
        }
    }
}
