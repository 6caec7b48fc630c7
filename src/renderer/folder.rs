use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use super::{
    file_title, io_failure_message, ContentHandle, ContentLayout, Listing, ListingEntry,
    PreviewContent, Renderer,
};

pub struct FolderRenderer {
    max_dirs: usize,
    max_files: usize,
}

impl FolderRenderer {
    pub fn new(max_dirs: usize, max_files: usize) -> Self {
        Self {
            max_dirs,
            max_files,
        }
    }
}

impl Renderer for FolderRenderer {
    fn name(&self) -> &'static str {
        "folder"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        let (max_dirs, max_files) = (self.max_dirs, self.max_files);
        ContentHandle::loading("Reading folder", move || {
            match list_folder(&path, max_dirs, max_files) {
                Ok(listing) => PreviewContent::Listing(listing),
                Err(err) => io_failure_message("reading folder", &err),
            }
        })
        .with_layout(ContentLayout::Wide)
    }
}

pub(crate) fn format_modified(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub(crate) fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

fn list_folder(path: &Path, max_dirs: usize, max_files: usize) -> std::io::Result<Listing> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "skipping unreadable folder entry");
                continue;
            }
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::debug!(?err, name = ?entry.file_name(), "skipping entry without metadata");
                continue;
            }
        };
        let is_dir = metadata.is_dir();
        let listing_entry = ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            size: (!is_dir).then_some(metadata.len()),
            modified: metadata.modified().ok().map(format_modified),
        };
        if is_dir {
            dirs.push(listing_entry);
        } else {
            files.push(listing_entry);
        }
    }
    dirs.sort_by_key(|entry| entry.name.to_lowercase());
    files.sort_by_key(|entry| entry.name.to_lowercase());

    let total_size: u64 = files.iter().filter_map(|entry| entry.size).sum();
    let mut summary = vec![
        format!("Path: {}", path.display()),
        format!("Contains: {} folders, {} files", dirs.len(), files.len()),
        format!("Top-level size: {}", format_size(total_size)),
    ];
    if let Some(modified) = fs::metadata(path).and_then(|meta| meta.modified()).ok() {
        summary.push(format!("Last modified: {}", format_modified(modified)));
    }

    let truncated = dirs.len() > max_dirs || files.len() > max_files;
    dirs.truncate(max_dirs);
    files.truncate(max_files);
    let mut entries = dirs;
    entries.append(&mut files);

    Ok(Listing {
        title: file_title(path),
        summary,
        entries,
        truncated,
    })
}
