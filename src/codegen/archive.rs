use super::module::BinaryModule;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub const ARCHIVE_MAGIC: &[u8; 4] = b"VPK1";
pub const ARCHIVE_VERSION: u16 = 1;
pub const ARCHIVE_EXTENSION: &str = "vpk";

/// Packs the compiled modules into a single archive file. Layout, all
/// big-endian: magic, format version, entry module name, module count,
/// then each module as name + u32 payload length + payload.
pub fn write_archive(path: &Path, entry: &str, modules: &[BinaryModule]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(path)?;
    file.write_all(&encode_archive(entry, modules))?;
    Ok(())
}

pub fn encode_archive(entry: &str, modules: &[BinaryModule]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(ARCHIVE_MAGIC);
    write_u16(&mut bytes, ARCHIVE_VERSION);
    write_str(&mut bytes, entry);
    write_u16(&mut bytes, modules.len() as u16);
    for module in modules {
        write_str(&mut bytes, &module.name);
        write_u32(&mut bytes, module.bytes.len() as u32);
        bytes.extend_from_slice(&module.bytes);
    }
    bytes
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_str(bytes: &mut Vec<u8>, value: &str) {
    write_u16(bytes, value.len() as u16);
    bytes.extend_from_slice(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_layout_starts_with_magic_and_entry() {
        let modules = vec![BinaryModule {
            name: String::from("app"),
            bytes: vec![1, 2, 3],
        }];
        let bytes = encode_archive("app", &modules);
        assert_eq!(&bytes[0..4], ARCHIVE_MAGIC);
        assert_eq!(&bytes[4..6], &ARCHIVE_VERSION.to_be_bytes());
        assert_eq!(&bytes[6..8], &3u16.to_be_bytes());
        assert_eq!(&bytes[8..11], b"app");
    }
}
