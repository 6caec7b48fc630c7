use std::path::Path;

use super::{ContentHandle, ExtensionSet, MediaKind, PreviewContent, Renderer};

const VIDEO_EXTENSIONS: ExtensionSet =
    ExtensionSet::new(&["mp4", "mkv", "avi", "mov", "wmv", "webm"]);
const AUDIO_EXTENSIONS: ExtensionSet =
    ExtensionSet::new(&["mp3", "wav", "flac", "ogg", "wma", "m4a", "aac"]);

/// Audio and video; playback is left to the surface's media widget.
pub struct MediaRenderer;

impl MediaRenderer {
    fn kind(path: &Path) -> Option<MediaKind> {
        if VIDEO_EXTENSIONS.matches(path) {
            Some(MediaKind::Video)
        } else if AUDIO_EXTENSIONS.matches(path) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }
}

impl Renderer for MediaRenderer {
    fn name(&self) -> &'static str {
        "media"
    }

    fn can_handle(&self, path: &Path) -> bool {
        Self::kind(path).is_some()
    }

    fn render(&self, path: &Path) -> ContentHandle {
        match Self::kind(path) {
            Some(kind) => ContentHandle::ready(PreviewContent::Media {
                path: path.to_path_buf(),
                kind,
            }),
            None => ContentHandle::ready(PreviewContent::no_preview()),
        }
    }
}
