use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{
    io_failure_message, ContentHandle, ExtensionSet, PreviewContent, Renderer, TextPreview,
};

const HEX_EXTENSIONS: ExtensionSet = ExtensionSet::new(&[
    "dll", "exe", "bin", "dat", "class", "so", "dylib", "o", "lib", "a", "pdb", "suo", "user",
    "iso", "img", "dmp", "torrent",
]);

const BYTES_PER_ROW: usize = 16;
pub(crate) const TRUNCATION_MARKER: &str = "... (Content truncated for preview) ...";

/// Hex dump of the head of a binary file.
pub struct HexRenderer {
    max_bytes: u64,
}

impl HexRenderer {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl Renderer for HexRenderer {
    fn name(&self) -> &'static str {
        "hex"
    }

    fn can_handle(&self, path: &Path) -> bool {
        HEX_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        let max_bytes = self.max_bytes;
        ContentHandle::loading("Loading hex view", move || {
            match read_head(&path, max_bytes) {
                Ok((bytes, truncated)) => PreviewContent::Hex(TextPreview {
                    body: format_hex_dump(&bytes, truncated),
                    syntax: None,
                    truncated,
                }),
                Err(err) => io_failure_message("reading file", &err),
            }
        })
    }
}

fn read_head(path: &Path, max_bytes: u64) -> io::Result<(Vec<u8>, bool)> {
    let file = File::open(path)?;
    let total = file.metadata()?.len();
    let mut bytes = Vec::new();
    file.take(max_bytes).read_to_end(&mut bytes)?;
    Ok((bytes, total > max_bytes))
}

/// Rows of `OFFSET  16 hex bytes (gap after 8)  |ascii|`.
pub fn format_hex_dump(data: &[u8], truncated: bool) -> String {
    let mut out = String::with_capacity(data.len() * 5);
    for (row, chunk) in data.chunks(BYTES_PER_ROW).enumerate() {
        let _ = write!(out, "{:08X}  ", row * BYTES_PER_ROW);
        for column in 0..BYTES_PER_ROW {
            match chunk.get(column) {
                Some(byte) => {
                    let _ = write!(out, "{byte:02X} ");
                }
                None => out.push_str("   "),
            }
            if column == 7 {
                out.push(' ');
            }
        }
        out.push_str(" |");
        for column in 0..BYTES_PER_ROW {
            out.push(match chunk.get(column) {
                Some(byte) if byte.is_ascii_graphic() || *byte == b' ' => char::from(*byte),
                Some(_) => '.',
                None => ' ',
            });
        }
        out.push_str("|\n");
    }
    if truncated {
        out.push('\n');
        out.push_str(TRUNCATION_MARKER);
        out.push('\n');
    }
    out
}
