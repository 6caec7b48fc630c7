use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{
    extension_of, io_failure_message, ContentHandle, ExtensionSet, PreviewContent, Renderer,
    TextPreview,
};

const TEXT_EXTENSIONS: ExtensionSet = ExtensionSet::new(&[
    "txt", "json", "xml", "cs", "js", "py", "cpp", "h", "css", "yaml", "ini", "log", "ts", "tsx",
    "jsx", "java", "kt", "gradle", "sql", "sh", "bat", "ps1", "config", "props", "targets", "toml",
    "dockerfile", "yml", "go", "rs", "rb", "php", "vue", "lua", "swift", "dart", "r", "pl", "vb",
    "fs", "asm", "s", "cmake", "editorconfig", "env", "gitignore", "dockerignore", "diff", "patch",
]);

/// Plain text and source code, read up to a byte ceiling.
pub struct TextRenderer {
    max_bytes: u64,
}

impl TextRenderer {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl Renderer for TextRenderer {
    fn name(&self) -> &'static str {
        "text"
    }

    fn can_handle(&self, path: &Path) -> bool {
        TEXT_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        let max_bytes = self.max_bytes;
        ContentHandle::loading("Reading file", move || {
            match read_text_capped(&path, max_bytes) {
                Ok(Some(text)) => PreviewContent::Text(text),
                Ok(None) => PreviewContent::info("File looks binary; no text preview."),
                Err(err) => io_failure_message("reading file", &err),
            }
        })
    }
}

/// Reads at most `max_bytes` and decodes lossily. `Ok(None)` when the head
/// of the file contains NUL bytes.
pub(crate) fn read_text_capped(path: &Path, max_bytes: u64) -> io::Result<Option<TextPreview>> {
    let file = File::open(path)?;
    let total = file.metadata()?.len();
    let mut bytes = Vec::new();
    file.take(max_bytes).read_to_end(&mut bytes)?;

    if bytes.iter().take(8 * 1024).any(|byte| *byte == 0) {
        return Ok(None);
    }

    let truncated = total > bytes.len() as u64;
    let mut body = String::from_utf8_lossy(&bytes).into_owned();
    if truncated {
        // The cap can split a multi-byte character; drop the replacement tail.
        while body.ends_with('\u{FFFD}') {
            body.pop();
        }
    }

    Ok(Some(TextPreview {
        body,
        syntax: extension_of(path),
        truncated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn handles_source_and_dotfiles() {
        let renderer = TextRenderer::new(1024);
        assert!(renderer.can_handle(Path::new("main.RS")));
        assert!(renderer.can_handle(Path::new("project/.gitignore")));
        assert!(!renderer.can_handle(Path::new("photo.png")));
        assert!(!renderer.can_handle(Path::new("README")));
    }

    #[test]
    fn reads_whole_small_file_with_syntax() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "name = \"demo\"\n").expect("write");

        let mut handle = TextRenderer::new(1024).render(&path);
        let content = handle.take_loader().expect("loader").load();
        assert_eq!(
            content,
            PreviewContent::Text(TextPreview {
                body: "name = \"demo\"\n".to_string(),
                syntax: Some("toml".to_string()),
                truncated: false,
            })
        );
    }

    #[test]
    fn caps_large_file_and_trims_split_character() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.txt");
        // "é" is two bytes; a cap of 3 splits the second one.
        fs::write(&path, "éé").expect("write");

        let text = read_text_capped(&path, 3).expect("read").expect("text");
        assert!(text.truncated);
        assert_eq!(text.body, "é");
    }

    #[test]
    fn binary_content_is_reported_inline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blob.dat.txt");
        fs::write(&path, [0x41, 0x00, 0x42]).expect("write");

        let mut handle = TextRenderer::new(1024).render(&path);
        let content = handle.take_loader().expect("loader").load();
        assert_eq!(content, PreviewContent::info("File looks binary; no text preview."));
    }
}
