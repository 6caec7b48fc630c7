use std::fs;
use std::path::Path;

use super::folder::format_size;
use super::{io_failure_message, ContentHandle, ExtensionSet, PreviewContent, Renderer};

const FONT_EXTENSIONS: ExtensionSet = ExtensionSet::new(&["ttf", "otf", "woff", "woff2"]);
pub const FONT_SAMPLE: &str = "The quick brown fox jumps over the lazy dog. 1234567890";

const NAME_FAMILY: u16 = 1;
const NAME_SUBFAMILY: u16 = 2;
const NAME_FULL: u16 = 4;

/// Font files: container format plus the names stored in the `name` table.
pub struct FontRenderer;

impl Renderer for FontRenderer {
    fn name(&self) -> &'static str {
        "font"
    }

    fn can_handle(&self, path: &Path) -> bool {
        FONT_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        ContentHandle::loading("Reading font", move || match fs::read(&path) {
            Ok(bytes) => PreviewContent::Details {
                title: super::file_title(&path),
                fields: describe_font(&bytes),
            },
            Err(err) => io_failure_message("loading font", &err),
        })
    }
}

fn describe_font(bytes: &[u8]) -> Vec<(String, String)> {
    let format = match bytes.get(..4) {
        Some(b"OTTO") => "OpenType (CFF)",
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"true") => "TrueType",
        Some(b"wOFF") => "WOFF",
        Some(b"wOF2") => "WOFF2",
        Some(b"ttcf") => "TrueType Collection",
        _ => "Unknown",
    };
    let mut fields = vec![
        ("Format".to_string(), format.to_string()),
        ("File Size".to_string(), format_size(bytes.len() as u64)),
    ];
    let names = [
        ("Family", NAME_FAMILY),
        ("Style", NAME_SUBFAMILY),
        ("Full Name", NAME_FULL),
    ];
    for (label, id) in names {
        if let Some(value) = sfnt_name(bytes, id) {
            fields.push((label.to_string(), value));
        }
    }
    fields.push(("Sample".to_string(), FONT_SAMPLE.to_string()));
    fields
}

fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let raw = bytes.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Looks up a name record in an uncompressed sfnt, preferring the Windows
/// Unicode encoding over the Macintosh Roman one.
fn sfnt_name(bytes: &[u8], name_id: u16) -> Option<String> {
    let table_count = usize::from(read_u16(bytes, 4)?);
    let name_table = (0..table_count).find_map(|index| {
        let record = 12 + index * 16;
        (bytes.get(record..record + 4)? == b"name")
            .then(|| read_u32(bytes, record + 8))
            .flatten()
    })? as usize;

    let count = usize::from(read_u16(bytes, name_table + 2)?);
    let storage = name_table + usize::from(read_u16(bytes, name_table + 4)?);
    let mut fallback = None;
    for index in 0..count {
        let record = name_table + 6 + index * 12;
        if read_u16(bytes, record + 6)? != name_id {
            continue;
        }
        let platform = read_u16(bytes, record)?;
        let length = usize::from(read_u16(bytes, record + 8)?);
        let offset = storage + usize::from(read_u16(bytes, record + 10)?);
        let Some(raw) = bytes.get(offset..offset + length) else {
            continue;
        };
        match platform {
            0 | 3 => {
                let units: Vec<u16> = raw
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                return Some(String::from_utf16_lossy(&units));
            }
            1 if fallback.is_none() => {
                fallback = Some(raw.iter().map(|byte| char::from(*byte)).collect());
            }
            _ => {}
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal sfnt with a single `name` table holding one family record.
    fn font_with_family(family: &str) -> Vec<u8> {
        let encoded: Vec<u8> = family.encode_utf16().flat_map(u16::to_be_bytes).collect();
        let name_offset: u32 = 12 + 16;

        let mut bytes = vec![0x00, 0x01, 0x00, 0x00];
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&[0; 6]);
        bytes.extend_from_slice(b"name");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&name_offset.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());

        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&(6u16 + 12).to_be_bytes());
        for field in [3u16, 1, 0x0409, NAME_FAMILY, encoded.len() as u16, 0] {
            bytes.extend_from_slice(&field.to_be_bytes());
        }
        bytes.extend_from_slice(&encoded);
        bytes
    }

    #[test]
    fn reads_family_from_name_table() {
        let fields = describe_font(&font_with_family("Inter"));
        assert!(fields.contains(&("Format".to_string(), "TrueType".to_string())));
        assert!(fields.contains(&("Family".to_string(), "Inter".to_string())));
        assert!(fields.iter().all(|(key, _)| key != "Style"));
    }

    #[test]
    fn compressed_fonts_report_format_only() {
        let fields = describe_font(b"wOF2\0\0\0\0");
        assert_eq!(fields[0], ("Format".to_string(), "WOFF2".to_string()));
        assert!(fields.iter().all(|(key, _)| key != "Family"));
        assert_eq!(fields.last().map(|(_, value)| value.as_str()), Some(FONT_SAMPLE));
    }
}
