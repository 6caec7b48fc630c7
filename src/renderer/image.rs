use std::path::Path;

use crate::geometry::Size;

use super::{ContentHandle, ExtensionSet, PreviewContent, Renderer};

const IMAGE_EXTENSIONS: ExtensionSet = ExtensionSet::new(&[
    "jpg", "jpeg", "png", "bmp", "gif", "ico", "webp", "tiff", "tif",
]);

/// Raster images. Only the header is decoded here so the window can be sized
/// to the picture before the surface loads the pixels.
pub struct ImageRenderer;

impl Renderer for ImageRenderer {
    fn name(&self) -> &'static str {
        "image"
    }

    fn can_handle(&self, path: &Path) -> bool {
        IMAGE_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        match image::image_dimensions(path) {
            Ok((width, height)) => {
                let size = Size::new(width, height);
                ContentHandle::ready(PreviewContent::Image {
                    path: path.to_path_buf(),
                    size,
                })
                .with_size_hint(size)
            }
            Err(err) => {
                tracing::debug!(?err, path = %path.display(), "image header unreadable");
                ContentHandle::ready(PreviewContent::error(format!("Error loading image: {err}")))
            }
        }
    }
}
