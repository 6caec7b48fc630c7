use std::path::PathBuf;

use crate::geometry::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPreview {
    pub body: String,
    /// Lower-case extension used for highlighting, if any.
    pub syntax: Option<String>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub summary: Vec<String>,
    pub entries: Vec<ListingEntry>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Markdown,
    Html,
}

/// Backend-agnostic display model produced by renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewContent {
    Loading {
        label: String,
    },
    Message {
        kind: MessageKind,
        text: String,
    },
    Text(TextPreview),
    Hex(TextPreview),
    Listing(Listing),
    Table(Table),
    Image {
        path: PathBuf,
        size: Size,
    },
    Media {
        path: PathBuf,
        kind: MediaKind,
    },
    Document {
        path: PathBuf,
        kind: DocumentKind,
        source: Option<TextPreview>,
    },
    Details {
        title: String,
        fields: Vec<(String, String)>,
    },
    /// Drawn by a system preview handler; `clsid` identifies its class.
    ShellProvider {
        path: PathBuf,
        provider: String,
        clsid: String,
    },
}

impl PreviewContent {
    pub fn loading(label: impl Into<String>) -> Self {
        Self::Loading {
            label: label.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Message {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::Message {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }

    pub fn no_preview() -> Self {
        Self::info("No preview available for this file type.")
    }

    pub fn failed() -> Self {
        Self::error("Preview failed.")
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Text(text) | Self::Hex(text) => text.truncated,
            Self::Listing(listing) => listing.truncated,
            Self::Table(table) => table.truncated,
            Self::Document {
                source: Some(source),
                ..
            } => source.truncated,
            _ => false,
        }
    }

    /// Plain-text form of the content for "copy content", when it has one.
    pub fn clipboard_text(&self) -> Option<String> {
        match self {
            Self::Text(text) | Self::Hex(text) => Some(text.body.clone()),
            Self::Document {
                source: Some(source),
                ..
            } => Some(source.body.clone()),
            Self::Message { text, .. } => Some(text.clone()),
            Self::Listing(listing) => {
                let mut lines = vec![listing.title.clone()];
                lines.extend(listing.summary.iter().cloned());
                lines.extend(listing.entries.iter().map(|entry| entry.name.clone()));
                Some(lines.join("\n"))
            }
            Self::Table(table) => {
                let mut lines = vec![table.headers.join("\t")];
                lines.extend(table.rows.iter().map(|row| row.join("\t")));
                Some(lines.join("\n"))
            }
            Self::Details { title, fields } => {
                let mut lines = vec![title.clone()];
                lines.extend(fields.iter().map(|(key, value)| format!("{key}: {value}")));
                Some(lines.join("\n"))
            }
            Self::Loading { .. }
            | Self::Image { .. }
            | Self::Media { .. }
            | Self::Document { source: None, .. }
            | Self::ShellProvider { .. } => None,
        }
    }
}
