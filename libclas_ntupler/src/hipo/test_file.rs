//! Writers for small in-memory HIPO files, used to exercise the reader in tests.
use flate2::write::GzEncoder;
use std::io::Write;
use std::str::FromStr;

use super::dictionary::{ColumnType, Dictionary, Schema};
use crate::constants::*;
use crate::event_context::EventContext;

pub const CLAS12_SCHEMAS: &[&str] = &[
    "{REC::Particle/300/31}{pid/I,px/F,py/F,pz/F,vx/F,vy/F,vz/F,vt/F,charge/B,beta/F,chi2pid/F,status/S}",
    "{MC::Particle/40/2}{pid/I,px/F,py/F,pz/F,vx/F,vy/F,vz/F,vt/F}",
    "{REC::Track/300/36}{index/S,pindex/S,sector/B,detector/B,status/S,q/B,chi2/F,NDF/S}",
    "{REC::Traj/300/40}{pindex/S,index/S,detector/B,layer/B,x/F,y/F,z/F,cx/F,cy/F,cz/F,path/F,edge/F}",
];

#[derive(Debug, Clone, Copy)]
pub enum Value {
    Int(i64),
    Float(f64),
}

pub fn clas12_dictionary() -> Dictionary {
    let mut dict = Dictionary::default();
    for text in CLAS12_SCHEMAS {
        dict.add_schema(Schema::from_str(text).unwrap());
    }
    dict
}

fn pad4(n: usize) -> usize {
    (4 - n % 4) % 4
}

fn push_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

/// Column-major bank payload; each row gives one value per schema column
pub fn build_bank(schema: &Schema, rows: &[Vec<Value>]) -> Vec<u8> {
    let mut data = Vec::new();
    for (col_idx, column) in schema.columns.iter().enumerate() {
        for row in rows {
            let (int, float) = match row[col_idx] {
                Value::Int(i) => (i, i as f64),
                Value::Float(f) => (f as i64, f),
            };
            match column.kind {
                ColumnType::Byte => data.push(int as i8 as u8),
                ColumnType::Short => data.extend_from_slice(&(int as i16).to_le_bytes()),
                ColumnType::Int => data.extend_from_slice(&(int as i32).to_le_bytes()),
                ColumnType::Long => data.extend_from_slice(&int.to_le_bytes()),
                ColumnType::Float => data.extend_from_slice(&(float as f32).to_le_bytes()),
                ColumnType::Double => data.extend_from_slice(&float.to_le_bytes()),
            }
        }
    }
    data
}

/// An event from (group, item, type, data) structures
pub fn build_event(structures: &[(u16, u8, u8, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (group, item, kind, data) in structures {
        body.extend_from_slice(&group.to_le_bytes());
        body.push(*item);
        body.push(*kind);
        push_u32(&mut body, data.len() as u32);
        body.extend_from_slice(data);
    }
    let mut event = Vec::with_capacity(EVENT_HEADER_SIZE + body.len());
    push_u32(&mut event, EVENT_SIGNATURE);
    push_u32(&mut event, (EVENT_HEADER_SIZE + body.len()) as u32);
    push_u32(&mut event, 0);
    push_u32(&mut event, 0);
    event.extend_from_slice(&body);
    event
}

/// A complete record (header included) holding the given events
pub fn build_record(events: &[Vec<u8>], compression: u32) -> Vec<u8> {
    let mut payload = Vec::new();
    for event in events {
        push_u32(&mut payload, event.len() as u32);
    }
    let index_length = payload.len();
    let mut data_length = 0;
    for event in events {
        payload.extend_from_slice(event);
        data_length += event.len();
    }
    let data_padding = pad4(data_length);
    payload.extend(std::iter::repeat(0u8).take(data_padding));

    let (stored, compressed_words, compressed_padding) = match compression {
        COMPRESSION_LZ4 | COMPRESSION_LZ4_BEST => {
            let mut compressed = lz4_flex::block::compress(&payload);
            let padding = pad4(compressed.len());
            compressed.extend(std::iter::repeat(0u8).take(padding));
            let words = compressed.len() / 4;
            (compressed, words, padding)
        }
        COMPRESSION_GZIP => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&payload).unwrap();
            let mut compressed = encoder.finish().unwrap();
            let padding = pad4(compressed.len());
            compressed.extend(std::iter::repeat(0u8).take(padding));
            let words = compressed.len() / 4;
            (compressed, words, padding)
        }
        _ => (payload, 0, 0),
    };

    let bit_info = 6 | ((data_padding as u32) << 22) | ((compressed_padding as u32) << 24);
    let mut record = Vec::with_capacity(HEADER_SIZE_BYTES + stored.len());
    push_u32(&mut record, (HEADER_SIZE_WORDS + stored.len() / 4) as u32);
    push_u32(&mut record, 1);
    push_u32(&mut record, HEADER_SIZE_WORDS as u32);
    push_u32(&mut record, events.len() as u32);
    push_u32(&mut record, index_length as u32);
    push_u32(&mut record, bit_info);
    push_u32(&mut record, 0);
    push_u32(&mut record, HIPO_MAGIC_NUMBER);
    push_u32(&mut record, data_length as u32);
    push_u32(&mut record, (compression << 28) | compressed_words as u32);
    record.extend_from_slice(&[0u8; 16]);
    record.extend_from_slice(&stored);
    record
}

/// A complete file: header, dictionary record as user header, then the events
/// split into records of `events_per_record`
pub fn build_file(
    schemas: &[&str],
    events: &[Vec<u8>],
    compression: u32,
    events_per_record: usize,
) -> Vec<u8> {
    let dictionary_events: Vec<Vec<u8>> = schemas
        .iter()
        .map(|s| {
            build_event(&[(
                DICTIONARY_GROUP,
                DICTIONARY_ITEM,
                STRING_TYPE,
                s.as_bytes().to_vec(),
            )])
        })
        .collect();
    let user_header = build_record(&dictionary_events, COMPRESSION_NONE);
    let records: Vec<Vec<u8>> = events
        .chunks(events_per_record.max(1))
        .map(|chunk| build_record(chunk, compression))
        .collect();

    let mut file = Vec::new();
    push_u32(&mut file, 0x4F50_4948); // "HIPO"
    push_u32(&mut file, 1);
    push_u32(&mut file, HEADER_SIZE_WORDS as u32);
    push_u32(&mut file, records.len() as u32);
    push_u32(&mut file, 0);
    push_u32(&mut file, 6);
    push_u32(&mut file, user_header.len() as u32);
    push_u32(&mut file, HIPO_MAGIC_NUMBER);
    file.extend_from_slice(&[0u8; 24]);
    file.extend_from_slice(&user_header);
    for record in records {
        file.extend_from_slice(&record);
    }
    file
}

/// Byte offsets of the records following the user header of a file from `build_file`
pub fn record_offsets(file: &[u8]) -> Vec<usize> {
    let word = |at: usize| u32::from_le_bytes([file[at], file[at + 1], file[at + 2], file[at + 3]]);
    let mut offsets = Vec::new();
    let mut offset = HEADER_SIZE_BYTES + word(24) as usize;
    while offset + HEADER_SIZE_BYTES <= file.len() {
        offsets.push(offset);
        offset += word(offset) as usize * 4;
    }
    offsets
}

/// Encode an event context into a HIPO event with the CLAS12 bank layouts.
/// Banks without rows are left out of the event entirely.
pub fn encode_event(dictionary: &Dictionary, context: &EventContext) -> Vec<u8> {
    let mut structures = Vec::new();
    let mut add = |bank: &str, rows: Vec<Vec<(&str, Value)>>| {
        let schema = match dictionary.get_schema(bank) {
            Some(s) if !rows.is_empty() => s,
            _ => return,
        };
        let full_rows: Vec<Vec<Value>> = rows
            .iter()
            .map(|named| {
                schema
                    .columns
                    .iter()
                    .map(|c| {
                        named
                            .iter()
                            .find(|(n, _)| *n == c.name)
                            .map(|(_, v)| *v)
                            .unwrap_or(Value::Int(0))
                    })
                    .collect()
            })
            .collect();
        structures.push((schema.group, schema.item, 11u8, build_bank(schema, &full_rows)));
    };

    let f = |x: f32| Value::Float(x as f64);
    let i = |x: i32| Value::Int(x as i64);
    add(
        REC_PARTICLE_BANK,
        context
            .particles
            .iter()
            .map(|p| {
                vec![
                    ("pid", i(p.pid)),
                    ("status", i(p.status)),
                    ("px", f(p.px)),
                    ("py", f(p.py)),
                    ("pz", f(p.pz)),
                    ("vx", f(p.vx)),
                    ("vy", f(p.vy)),
                    ("vz", f(p.vz)),
                ]
            })
            .collect(),
    );
    add(
        MC_PARTICLE_BANK,
        context
            .mc_particles
            .iter()
            .map(|p| vec![("pid", i(p.pid)), ("px", f(p.px)), ("py", f(p.py)), ("pz", f(p.pz))])
            .collect(),
    );
    add(
        REC_TRACK_BANK,
        context
            .tracks
            .iter()
            .map(|t| vec![("pindex", i(t.pindex)), ("sector", i(t.sector))])
            .collect(),
    );
    add(
        REC_TRAJ_BANK,
        context
            .trajectories
            .iter()
            .map(|t| {
                vec![
                    ("pindex", i(t.pindex)),
                    ("detector", i(t.detector)),
                    ("layer", i(t.layer)),
                    ("edge", f(t.edge)),
                    ("x", f(t.x)),
                    ("y", f(t.y)),
                    ("z", f(t.z)),
                ]
            })
            .collect(),
    );
    build_event(&structures)
}

/// Write a HIPO file holding the given events
pub fn write_hipo_file(
    path: &std::path::Path,
    schemas: &[&str],
    contexts: &[EventContext],
    compression: u32,
) {
    let mut dict = Dictionary::default();
    for text in schemas {
        dict.add_schema(Schema::from_str(text).unwrap());
    }
    let events: Vec<Vec<u8>> = contexts.iter().map(|c| encode_event(&dict, c)).collect();
    std::fs::write(path, build_file(schemas, &events, compression, 3)).unwrap();
}
