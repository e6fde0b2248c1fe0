// src/transform/font/mod.rs

//! TrueType/OpenType (sfnt) fonts to web font containers.
//!
//! [`Sfnt::parse`] reads the table directory; [`woff`] and [`woff2`] wrap
//! the tables unchanged (no glyph transforms) in the respective formats.

use anyhow::{Result, bail, ensure};

use super::{Asset, Step};

pub mod woff;
pub mod woff2;

const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;

/// `sfntVersion` values accepted on input.
const TRUETYPE: u32 = 0x0001_0000;
const OPENTYPE_CFF: u32 = u32::from_be_bytes(*b"OTTO");
const APPLE_TRUE: u32 = u32::from_be_bytes(*b"true");

/// One table of an sfnt font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfntTable<'a> {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub data: &'a [u8],
}

/// Parsed sfnt font: version plus tables sorted by tag.
#[derive(Debug, Clone)]
pub struct Sfnt<'a> {
    pub flavor: u32,
    pub tables: Vec<SfntTable<'a>>,
}

impl<'a> Sfnt<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        ensure!(data.len() >= SFNT_HEADER_LEN, "font is truncated ({} bytes)", data.len());

        let flavor = read_u32(data, 0)?;
        if ![TRUETYPE, OPENTYPE_CFF, APPLE_TRUE].contains(&flavor) {
            bail!("not an sfnt font (version 0x{flavor:08x})");
        }

        let num_tables = usize::from(read_u16(data, 4)?);
        ensure!(num_tables > 0, "font has no tables");

        let mut tables = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let record = SFNT_HEADER_LEN + i * SFNT_RECORD_LEN;
            let tag: [u8; 4] = slice(data, record, 4)?
                .try_into()
                .map_err(|_| anyhow::anyhow!("bad tag in record {i}"))?;
            let checksum = read_u32(data, record + 4)?;
            let offset = read_u32(data, record + 8)? as usize;
            let length = read_u32(data, record + 12)? as usize;
            let table = slice(data, offset, length).map_err(|_| {
                anyhow::anyhow!(
                    "table '{}' points outside the font ({offset}+{length} > {})",
                    String::from_utf8_lossy(&tag),
                    data.len()
                )
            })?;
            tables.push(SfntTable {
                tag,
                checksum,
                data: table,
            });
        }

        tables.sort_by(|a, b| a.tag.cmp(&b.tag));
        if let Some(pair) = tables.windows(2).find(|w| w[0].tag == w[1].tag) {
            bail!("duplicate table '{}'", String::from_utf8_lossy(&pair[0].tag));
        }

        Ok(Self { flavor, tables })
    }

    /// Size of the font once decoded back to a plain sfnt: header, table
    /// records and 4-byte padded tables.
    pub fn total_sfnt_size(&self) -> u32 {
        let tables: usize = self.tables.iter().map(|t| pad4(t.data.len())).sum();
        (SFNT_HEADER_LEN + SFNT_RECORD_LEN * self.tables.len() + tables) as u32
    }
}

pub(crate) fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| anyhow::anyhow!("font is truncated at offset {offset}"))
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = slice(data, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = slice(data, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EncodeWoff;

impl Step for EncodeWoff {
    fn name(&self) -> &'static str {
        "encode-woff"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let encoded = woff::encode(&Sfnt::parse(&asset.contents)?)?;
        Ok(asset.with_extension("woff").with_contents(encoded))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EncodeWoff2;

impl Step for EncodeWoff2 {
    fn name(&self) -> &'static str {
        "encode-woff2"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let encoded = woff2::encode(&Sfnt::parse(&asset.contents)?)?;
        Ok(asset.with_extension("woff2").with_contents(encoded))
    }
}

/// Minimal sfnt builder for tests.
#[cfg(test)]
pub(crate) fn build_sfnt(tables: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let n = tables.len();
    let mut out = Vec::new();
    out.extend_from_slice(&TRUETYPE.to_be_bytes());
    out.extend_from_slice(&(n as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);

    let mut offset = SFNT_HEADER_LEN + SFNT_RECORD_LEN * n;
    let mut body = Vec::new();
    for (tag, data) in tables {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        body.resize(pad4(body.len()), 0);
        offset = SFNT_HEADER_LEN + SFNT_RECORD_LEN * n + body.len();
    }
    out.extend_from_slice(&body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_tables() {
        let font = build_sfnt(&[
            (b"name", &b"abc"[..]),
            (b"head", &[1u8; 54][..]),
            (b"OS/2", &[2u8; 8][..]),
        ]);
        let sfnt = Sfnt::parse(&font).unwrap();
        let tags: Vec<_> = sfnt.tables.iter().map(|t| t.tag).collect();
        assert_eq!(tags, vec![*b"OS/2", *b"head", *b"name"]);
        assert_eq!(sfnt.tables[2].data, b"abc");
        // 12 + 3*16 + 56 + 8 + 4
        assert_eq!(sfnt.total_sfnt_size(), 128);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Sfnt::parse(b"hello world, not a font").is_err());
        assert!(Sfnt::parse(&[0, 1, 0, 0]).is_err());
    }

    #[test]
    fn rejects_tables_outside_the_file() {
        let mut font = build_sfnt(&[(b"head", &[0u8; 8][..])]);
        font.truncate(font.len() - 4);
        let err = Sfnt::parse(&font).unwrap_err();
        assert!(err.to_string().contains("points outside the font"), "{err}");
    }
}
