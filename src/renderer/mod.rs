//! Renderer contract and the type-specific renderers.
//!
//! `can_handle` is a pure extension or existence test. `render` returns at
//! once; when the real content needs I/O it returns a loading placeholder
//! plus a [`ContentLoader`] that the session runs on a worker thread.
//! Expected failures never escape: they become inline messages.

use std::fmt;
use std::io;
use std::path::Path;

use crate::geometry::Size;

mod archive;
mod certificate;
mod content;
mod document;
mod folder;
mod font;
mod hex;
mod image;
mod media;
mod mesh;
mod shell;
mod table;
mod text;

pub use archive::ArchiveRenderer;
pub use certificate::CertificateRenderer;
pub use content::{
    DocumentKind, Listing, ListingEntry, MediaKind, MessageKind, PreviewContent, Table,
    TextPreview,
};
pub use document::{MarkdownRenderer, PdfRenderer, WebRenderer};
pub use folder::FolderRenderer;
pub use font::FontRenderer;
pub use hex::{format_hex_dump, HexRenderer};
pub use image::ImageRenderer;
pub use media::MediaRenderer;
pub use mesh::MeshRenderer;
pub use shell::{
    platform_preview_handlers, NoPreviewHandlers, PreviewHandlerLookup, PreviewProvider,
    ShellRenderer,
};
pub use table::CsvRenderer;
pub use text::TextRenderer;

pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;
    fn can_handle(&self, path: &Path) -> bool;
    fn render(&self, path: &Path) -> ContentHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentLayout {
    #[default]
    Standard,
    /// Listing-style content that reads better in a wider default window.
    Wide,
}

/// Deferred content population, run off the UI thread.
pub struct ContentLoader(Box<dyn FnOnce() -> PreviewContent + Send>);

impl ContentLoader {
    pub fn new(load: impl FnOnce() -> PreviewContent + Send + 'static) -> Self {
        Self(Box::new(load))
    }

    pub fn load(self) -> PreviewContent {
        (self.0)()
    }
}

impl fmt::Debug for ContentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentLoader(..)")
    }
}

#[derive(Debug)]
pub struct ContentHandle {
    content: PreviewContent,
    size_hint: Option<Size>,
    layout: ContentLayout,
    loader: Option<ContentLoader>,
}

impl ContentHandle {
    pub fn ready(content: PreviewContent) -> Self {
        Self {
            content,
            size_hint: None,
            layout: ContentLayout::Standard,
            loader: None,
        }
    }

    pub fn loading(
        label: impl Into<String>,
        load: impl FnOnce() -> PreviewContent + Send + 'static,
    ) -> Self {
        Self {
            content: PreviewContent::loading(label),
            size_hint: None,
            layout: ContentLayout::Standard,
            loader: Some(ContentLoader::new(load)),
        }
    }

    pub fn with_size_hint(mut self, size: Size) -> Self {
        self.size_hint = (!size.is_empty()).then_some(size);
        self
    }

    pub fn with_layout(mut self, layout: ContentLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn content(&self) -> &PreviewContent {
        &self.content
    }

    pub fn size_hint(&self) -> Option<Size> {
        self.size_hint
    }

    pub fn layout(&self) -> ContentLayout {
        self.layout
    }

    pub fn is_pending(&self) -> bool {
        self.loader.is_some()
    }

    pub fn take_loader(&mut self) -> Option<ContentLoader> {
        self.loader.take()
    }

    pub fn set_content(&mut self, content: PreviewContent) {
        self.content = content;
    }
}

/// Read ceilings applied by the large-file renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    pub text_max_bytes: u64,
    pub hex_max_bytes: u64,
    pub archive_max_entries: usize,
    pub table_max_rows: usize,
    pub folder_max_dirs: usize,
    pub folder_max_files: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            text_max_bytes: 1024 * 1024,
            hex_max_bytes: 16 * 1024,
            archive_max_entries: 50,
            table_max_rows: 500,
            folder_max_dirs: 20,
            folder_max_files: 50,
        }
    }
}

/// Case-insensitive extension membership test.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionSet(&'static [&'static str]);

impl ExtensionSet {
    pub const fn new(extensions: &'static [&'static str]) -> Self {
        Self(extensions)
    }

    pub fn matches(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.0.contains(&ext.as_str()))
    }
}

/// Lower-case extension without the dot. Dotfiles such as `.gitignore` count
/// as their own extension.
pub fn extension_of(path: &Path) -> Option<String> {
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        return Some(ext.to_ascii_lowercase());
    }
    let name = path.file_name()?.to_str()?;
    name.strip_prefix('.')
        .filter(|rest| !rest.is_empty())
        .map(str::to_ascii_lowercase)
}

pub(crate) fn file_title(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Inline message for an I/O failure, with access problems called out.
pub(crate) fn io_failure_message(action: &str, err: &io::Error) -> PreviewContent {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PreviewContent::error("Access denied."),
        io::ErrorKind::NotFound => PreviewContent::error("File no longer exists."),
        _ => PreviewContent::error(format!("Error {action}: {err}")),
    }
}

/// Icon category shown in the preview header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Archive,
    Video,
    Audio,
    Pdf,
    Web,
    Code,
    Font,
    Certificate,
    Markdown,
    Folder,
    Document,
}

impl FileKind {
    pub fn for_path(path: &Path) -> Self {
        let ext = extension_of(path).unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "bmp" | "gif" | "ico" | "webp" | "tif" | "tiff" => {
                Self::Image
            }
            "zip" | "rar" | "7z" | "tar" | "gz" | "nupkg" | "iso" | "img" | "torrent" => {
                Self::Archive
            }
            "mp4" | "mkv" | "avi" | "mov" | "webm" | "wmv" => Self::Video,
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" | "m4a" => Self::Audio,
            "pdf" => Self::Pdf,
            "html" | "htm" | "js" | "ts" | "css" | "svg" => Self::Web,
            "cs" | "cpp" | "py" | "go" | "rs" | "diff" | "patch" => Self::Code,
            "ttf" | "otf" | "woff" | "woff2" => Self::Font,
            "cer" | "crt" | "pfx" | "der" | "pem" => Self::Certificate,
            "md" | "markdown" => Self::Markdown,
            _ if path.is_dir() => Self::Folder,
            _ => Self::Document,
        }
    }

    pub const fn icon_name(self) -> &'static str {
        match self {
            Self::Image => "image-x-generic",
            Self::Archive => "package-x-generic",
            Self::Video => "video-x-generic",
            Self::Audio => "audio-x-generic",
            Self::Pdf => "x-office-document",
            Self::Web => "text-html",
            Self::Code => "text-x-script",
            Self::Font => "font-x-generic",
            Self::Certificate => "application-certificate",
            Self::Markdown => "text-x-generic",
            Self::Folder => "folder",
            Self::Document => "text-x-generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extension_of_lowercases_and_handles_dotfiles() {
        assert_eq!(extension_of(Path::new("A/B/Photo.JPG")).as_deref(), Some("jpg"));
        assert_eq!(extension_of(Path::new("repo/.gitignore")).as_deref(), Some("gitignore"));
        assert_eq!(extension_of(Path::new("Makefile")), None);
        assert_eq!(extension_of(Path::new("trailing.")), None);
    }

    #[test]
    fn extension_set_matches_case_insensitively() {
        const SET: ExtensionSet = ExtensionSet::new(&["zip", "jar"]);
        assert!(SET.matches(Path::new("lib.JAR")));
        assert!(!SET.matches(Path::new("lib.jar.txt")));
        assert!(!SET.matches(Path::new("zip")));
    }

    #[test]
    fn loading_handle_hands_out_loader_once() {
        let mut handle = ContentHandle::loading("Loading", || PreviewContent::info("done"));
        assert!(handle.content().is_loading());
        assert!(handle.is_pending());

        let loader = handle.take_loader().expect("loader present");
        assert!(handle.take_loader().is_none());
        assert_eq!(loader.load(), PreviewContent::info("done"));
    }

    #[test]
    fn empty_size_hint_is_dropped() {
        let handle = ContentHandle::ready(PreviewContent::no_preview()).with_size_hint(Size::new(0, 9));
        assert_eq!(handle.size_hint(), None);
    }

    #[test]
    fn io_failure_message_names_access_denied() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(
            io_failure_message("reading file", &err),
            PreviewContent::error("Access denied.")
        );
    }

    #[test]
    fn file_kind_falls_back_to_folder_for_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(FileKind::for_path(dir.path()), FileKind::Folder);
        assert_eq!(FileKind::for_path(&PathBuf::from("a.flac")), FileKind::Audio);
        assert_eq!(FileKind::for_path(&PathBuf::from("notes")), FileKind::Document);
    }
}
