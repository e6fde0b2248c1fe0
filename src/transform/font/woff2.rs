// src/transform/font/woff2.rs

//! WOFF 2.0 encoder.
//!
//! Tables are stored with the null transform (`glyf`/`loca` included) and
//! compressed together as one Brotli stream.

use std::io::Write;

use anyhow::{Context, Result};

use super::{Sfnt, pad4};

const SIGNATURE: u32 = u32::from_be_bytes(*b"wOF2");
const HEADER_LEN: usize = 48;

/// Tags with a one-byte encoding in the table directory. The index is the
/// value stored in the low six bits of the flags byte.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// Flags value meaning "arbitrary tag follows".
const ARBITRARY_TAG: u8 = 63;

/// Transform version 3 is the null transform for `glyf` and `loca`; for
/// every other table the null transform is version 0.
const NULL_TRANSFORM_GLYF_LOCA: u8 = 3 << 6;

/// Brotli settings: buffer size, quality, window (lg).
const BROTLI_BUFFER: usize = 4096;
const BROTLI_QUALITY: u32 = 11;
const BROTLI_LG_WINDOW: u32 = 22;

/// Encode a parsed font as WOFF2.
pub fn encode(font: &Sfnt<'_>) -> Result<Vec<u8>> {
    let mut directory = Vec::new();
    let mut stream = Vec::new();

    for table in &font.tables {
        let known = KNOWN_TAGS.iter().position(|t| **t == table.tag);
        let transform = if matches!(&table.tag, b"glyf" | b"loca") {
            NULL_TRANSFORM_GLYF_LOCA
        } else {
            0
        };

        match known {
            Some(index) => directory.push(index as u8 | transform),
            None => {
                directory.push(ARBITRARY_TAG | transform);
                directory.extend_from_slice(&table.tag);
            }
        }
        write_base128(&mut directory, table.data.len() as u32);
        stream.extend_from_slice(table.data);
    }

    let compressed = compress(&stream).context("brotli compression failed")?;

    let unpadded = HEADER_LEN + directory.len() + compressed.len();
    let length = pad4(unpadded);

    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&(font.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&font.total_sfnt_size().to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
    out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out.resize(length, 0);
    Ok(out)
}

/// `UIntBase128`: big-endian groups of seven bits, high bit set on every
/// byte except the last, no leading zero groups.
fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7f) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut writer = brotli::CompressorWriter::new(
        Vec::new(),
        BROTLI_BUFFER,
        BROTLI_QUALITY,
        BROTLI_LG_WINDOW,
    );
    writer.write_all(data)?;
    writer.flush()?;
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::super::build_sfnt;
    use super::*;

    fn base128(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_base128(&mut out, value);
        out
    }

    #[test]
    fn base128_encoding() {
        assert_eq!(base128(0), vec![0x00]);
        assert_eq!(base128(127), vec![0x7f]);
        assert_eq!(base128(128), vec![0x81, 0x00]);
        assert_eq!(base128(63_000), vec![0x83, 0xec, 0x18]);
        assert_eq!(base128(u32::MAX), vec![0x8f, 0xff, 0xff, 0xff, 0x7f]);
    }

    #[test]
    fn directory_and_stream_round_trip() {
        let glyf = vec![3u8; 300];
        let font = build_sfnt(&[
            (b"glyf", &glyf[..]),
            (b"head", &[1u8; 54][..]),
            (b"zzzz", &b"custom"[..]),
        ]);
        let sfnt = Sfnt::parse(&font).unwrap();
        let woff2 = encode(&sfnt).unwrap();

        assert_eq!(&woff2[0..4], b"wOF2");
        assert_eq!(woff2.len() % 4, 0);
        assert_eq!(
            u32::from_be_bytes(woff2[8..12].try_into().unwrap()) as usize,
            woff2.len()
        );
        assert_eq!(u16::from_be_bytes([woff2[12], woff2[13]]), 3);

        // glyf: index 10 with null transform, length 300.
        let dir = &woff2[HEADER_LEN..];
        assert_eq!(dir[0], 10 | NULL_TRANSFORM_GLYF_LOCA);
        assert_eq!(&dir[1..3], &[0x82, 0x2c]);
        // head: index 1, length 54.
        assert_eq!(&dir[3..5], &[1, 54]);
        // zzzz: arbitrary tag.
        assert_eq!(dir[5], ARBITRARY_TAG);
        assert_eq!(&dir[6..10], b"zzzz");
        assert_eq!(dir[10], 6);

        let compressed_len = u32::from_be_bytes(woff2[20..24].try_into().unwrap()) as usize;
        let start = HEADER_LEN + 11;
        let mut stream = Vec::new();
        brotli::Decompressor::new(&woff2[start..start + compressed_len], 4096)
            .read_to_end(&mut stream)
            .unwrap();
        assert_eq!(stream.len(), 300 + 54 + 6);
        assert_eq!(&stream[354..], b"custom");
    }
}
