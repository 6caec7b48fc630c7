use std::fs::File;
use std::path::Path;

use super::folder::format_size;
use super::{
    file_title, ContentHandle, ContentLayout, ExtensionSet, Listing, ListingEntry,
    PreviewContent, Renderer,
};

const ARCHIVE_EXTENSIONS: ExtensionSet =
    ExtensionSet::new(&["zip", "nupkg", "epub", "jar", "apk", "vsix", "xap"]);

/// Entry listing for zip-family containers.
pub struct ArchiveRenderer {
    max_entries: usize,
}

impl ArchiveRenderer {
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }
}

impl Renderer for ArchiveRenderer {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn can_handle(&self, path: &Path) -> bool {
        ARCHIVE_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        let max_entries = self.max_entries;
        ContentHandle::loading("Reading archive", move || {
            match list_archive(&path, max_entries) {
                Ok(listing) => PreviewContent::Listing(listing),
                Err(err) => PreviewContent::error(format!("Error reading zip: {err}")),
            }
        })
        .with_layout(ContentLayout::Wide)
    }
}

fn list_archive(path: &Path, max_entries: usize) -> zip::result::ZipResult<Listing> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let total = archive.len();

    let mut entries = Vec::with_capacity(total.min(max_entries));
    for index in 0..total.min(max_entries) {
        let entry = archive.by_index(index)?;
        let is_dir = entry.is_dir();
        entries.push(ListingEntry {
            name: entry.name().to_string(),
            is_dir,
            size: (!is_dir).then(|| entry.size()),
            modified: None,
        });
    }

    let compressed: u64 = std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    Ok(Listing {
        title: file_title(path),
        summary: vec![
            format!("Total entries: {total}"),
            format!("Archive size: {}", format_size(compressed)),
        ],
        entries,
        truncated: total > max_entries,
    })
}
