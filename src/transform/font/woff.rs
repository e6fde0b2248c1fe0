// src/transform/font/woff.rs

//! WOFF 1.0 encoder: zlib-compressed sfnt tables.

use std::io::Write;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::ZlibEncoder;

use super::{Sfnt, pad4};

const SIGNATURE: u32 = u32::from_be_bytes(*b"wOFF");
const HEADER_LEN: usize = 44;
const DIRECTORY_ENTRY_LEN: usize = 20;

/// Encode a parsed font as WOFF.
///
/// Each table is compressed on its own; tables that do not shrink are
/// stored as-is, which the format signals by `compLength == origLength`.
pub fn encode(font: &Sfnt<'_>) -> Result<Vec<u8>> {
    let n = font.tables.len();
    let mut directory = Vec::with_capacity(n * DIRECTORY_ENTRY_LEN);
    let mut body = Vec::new();
    let mut offset = HEADER_LEN + n * DIRECTORY_ENTRY_LEN;

    for table in &font.tables {
        let compressed = compress(table.data)
            .with_context(|| format!("compressing '{}'", String::from_utf8_lossy(&table.tag)))?;
        let stored: &[u8] = if compressed.len() < table.data.len() {
            &compressed
        } else {
            table.data
        };

        directory.extend_from_slice(&table.tag);
        directory.extend_from_slice(&(offset as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        directory.extend_from_slice(&table.checksum.to_be_bytes());

        body.extend_from_slice(stored);
        body.resize(pad4(body.len()), 0);
        offset = HEADER_LEN + n * DIRECTORY_ENTRY_LEN + body.len();
    }

    let length = HEADER_LEN + directory.len() + body.len();
    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&(n as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&font.total_sfnt_size().to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
    out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&body);
    Ok(out)
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
