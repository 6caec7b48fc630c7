//! Documents the surface shows through an embedded web view.

use std::path::Path;

use super::text::read_text_capped;
use super::{
    io_failure_message, ContentHandle, DocumentKind, ExtensionSet, PreviewContent, Renderer,
};

const MARKDOWN_EXTENSIONS: ExtensionSet = ExtensionSet::new(&["md", "markdown"]);
const PDF_EXTENSIONS: ExtensionSet = ExtensionSet::new(&["pdf"]);
const WEB_EXTENSIONS: ExtensionSet = ExtensionSet::new(&["html", "htm", "svg", "mhtml"]);

/// Markdown source is read eagerly so the surface can render it without
/// touching the disk again.
pub struct MarkdownRenderer {
    max_bytes: u64,
}

impl MarkdownRenderer {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl Renderer for MarkdownRenderer {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn can_handle(&self, path: &Path) -> bool {
        MARKDOWN_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        let max_bytes = self.max_bytes;
        ContentHandle::loading("Rendering markdown", move || {
            match read_text_capped(&path, max_bytes) {
                Ok(source) => PreviewContent::Document {
                    path,
                    kind: DocumentKind::Markdown,
                    source,
                },
                Err(err) => io_failure_message("reading file", &err),
            }
        })
    }
}

pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn can_handle(&self, path: &Path) -> bool {
        PDF_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        ContentHandle::ready(PreviewContent::Document {
            path: path.to_path_buf(),
            kind: DocumentKind::Pdf,
            source: None,
        })
    }
}

pub struct WebRenderer;

impl Renderer for WebRenderer {
    fn name(&self) -> &'static str {
        "web"
    }

    fn can_handle(&self, path: &Path) -> bool {
        WEB_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        ContentHandle::ready(PreviewContent::Document {
            path: path.to_path_buf(),
            kind: DocumentKind::Html,
            source: None,
        })
    }
}
