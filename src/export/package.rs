//! DOCX container packaging.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use crate::error::{Error, Result};
use crate::render::DocxPart;

/// Packages DOCX parts into a container.
pub trait DocxPackager {
    /// Build the container bytes from the parts, in order.
    fn package(&self, parts: &[DocxPart]) -> Result<Vec<u8>>;
}

const LOCAL_HEADER: u32 = 0x0403_4b50;
const CENTRAL_HEADER: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
const VERSION: u16 = 20;
const METHOD_DEFLATE: u16 = 8;
/// 1980-01-01, the earliest DOS date
const DOS_DATE: u16 = 0x21;
const DOS_TIME: u16 = 0;

/// ZIP packager with fixed timestamps, so equal parts give equal bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackager {
    level: Option<u32>,
}

impl ZipPackager {
    /// Create a packager using the default compression level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deflate compression level (0-9).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level.min(9));
        self
    }

    fn compression(&self) -> Compression {
        self.level.map(Compression::new).unwrap_or_default()
    }
}

struct Entry {
    name: Vec<u8>,
    crc: u32,
    compressed: u32,
    size: u32,
    offset: u32,
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Package(format!("{} exceeds 4 GiB", what)))
}

fn to_u16(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::Package(format!("too many {}", what)))
}

impl DocxPackager for ZipPackager {
    fn package(&self, parts: &[DocxPart]) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        let mut entries = Vec::with_capacity(parts.len());

        for part in parts {
            let mut crc = Crc::new();
            crc.update(&part.data);

            let mut encoder = DeflateEncoder::new(Vec::new(), self.compression());
            encoder.write_all(&part.data)?;
            let compressed = encoder.finish()?;

            let entry = Entry {
                name: part.name.as_bytes().to_vec(),
                crc: crc.sum(),
                compressed: to_u32(compressed.len(), &part.name)?,
                size: to_u32(part.data.len(), &part.name)?,
                offset: to_u32(out.len(), "container")?,
            };

            out.extend_from_slice(&LOCAL_HEADER.to_le_bytes());
            out.extend_from_slice(&VERSION.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // flags
            out.extend_from_slice(&METHOD_DEFLATE.to_le_bytes());
            out.extend_from_slice(&DOS_TIME.to_le_bytes());
            out.extend_from_slice(&DOS_DATE.to_le_bytes());
            out.extend_from_slice(&entry.crc.to_le_bytes());
            out.extend_from_slice(&entry.compressed.to_le_bytes());
            out.extend_from_slice(&entry.size.to_le_bytes());
            out.extend_from_slice(&to_u16(entry.name.len(), "name bytes")?.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // extra
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&compressed);

            entries.push(entry);
        }

        let directory_offset = to_u32(out.len(), "container")?;
        for entry in &entries {
            out.extend_from_slice(&CENTRAL_HEADER.to_le_bytes());
            out.extend_from_slice(&VERSION.to_le_bytes()); // made by
            out.extend_from_slice(&VERSION.to_le_bytes()); // needed
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&METHOD_DEFLATE.to_le_bytes());
            out.extend_from_slice(&DOS_TIME.to_le_bytes());
            out.extend_from_slice(&DOS_DATE.to_le_bytes());
            out.extend_from_slice(&entry.crc.to_le_bytes());
            out.extend_from_slice(&entry.compressed.to_le_bytes());
            out.extend_from_slice(&entry.size.to_le_bytes());
            out.extend_from_slice(&to_u16(entry.name.len(), "name bytes")?.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // extra
            out.extend_from_slice(&0u16.to_le_bytes()); // comment
            out.extend_from_slice(&0u16.to_le_bytes()); // disk
            out.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
            out.extend_from_slice(&0u32.to_le_bytes()); // external attributes
            out.extend_from_slice(&entry.offset.to_le_bytes());
            out.extend_from_slice(&entry.name);
        }
        let directory_size = to_u32(out.len(), "container")? - directory_offset;
        let count = to_u16(entries.len(), "parts")?;

        out.extend_from_slice(&END_OF_CENTRAL_DIRECTORY.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&directory_size.to_le_bytes());
        out.extend_from_slice(&directory_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // comment

        log::debug!("Packaged {} parts into {} bytes", entries.len(), out.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn parts() -> Vec<DocxPart> {
        vec![
            DocxPart {
                name: "a.xml".to_string(),
                data: b"<a>hello hello hello</a>".to_vec(),
            },
            DocxPart {
                name: "b/c.xml".to_string(),
                data: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_local_entry_decompresses() {
        let zip = ZipPackager::new().package(&parts()).unwrap();

        assert_eq!(u32_at(&zip, 0), LOCAL_HEADER);
        assert_eq!(u16_at(&zip, 8), METHOD_DEFLATE);
        let compressed = u32_at(&zip, 18) as usize;
        let name_len = u16_at(&zip, 26) as usize;
        assert_eq!(&zip[30..30 + name_len], b"a.xml");

        let start = 30 + name_len;
        let mut data = String::new();
        DeflateDecoder::new(&zip[start..start + compressed])
            .read_to_string(&mut data)
            .unwrap();
        assert_eq!(data, "<a>hello hello hello</a>");
    }

    #[test]
    fn test_end_of_central_directory() {
        let zip = ZipPackager::new().package(&parts()).unwrap();
        let eocd = zip.len() - 22;
        assert_eq!(u32_at(&zip, eocd), END_OF_CENTRAL_DIRECTORY);
        assert_eq!(u16_at(&zip, eocd + 10), 2);

        let directory = u32_at(&zip, eocd + 16) as usize;
        assert_eq!(u32_at(&zip, directory), CENTRAL_HEADER);
        assert_eq!(directory + u32_at(&zip, eocd + 12) as usize, eocd);
    }

    #[test]
    fn test_output_is_deterministic() {
        let packager = ZipPackager::new().with_level(9);
        assert_eq!(packager.package(&parts()).unwrap(), packager.package(&parts()).unwrap());
    }
}
