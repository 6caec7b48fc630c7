//! Ordered renderer dispatch.
//!
//! Resolution is a linear first-match scan; position in the list is the
//! priority. More specific renderers must be registered before general
//! ones that could claim the same path.

use std::path::Path;
use std::sync::Arc;

use crate::renderer::{
    ArchiveRenderer, CertificateRenderer, CsvRenderer, FolderRenderer, FontRenderer,
    HexRenderer, ImageRenderer, MarkdownRenderer, MediaRenderer, MeshRenderer, PdfRenderer,
    PreviewHandlerLookup, RenderLimits, Renderer, ShellRenderer, TextRenderer, WebRenderer,
};

#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: Vec<Arc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in renderer set in priority order.
    pub fn with_defaults(limits: RenderLimits, handlers: Box<dyn PreviewHandlerLookup>) -> Self {
        let mut registry = Self::new();
        registry
            .register(FolderRenderer::new(limits.folder_max_dirs, limits.folder_max_files))
            .register(MarkdownRenderer::new(limits.text_max_bytes))
            .register(PdfRenderer)
            .register(WebRenderer)
            .register(ArchiveRenderer::new(limits.archive_max_entries))
            .register(CsvRenderer::new(limits.table_max_rows))
            .register(TextRenderer::new(limits.text_max_bytes))
            .register(ImageRenderer)
            .register(FontRenderer)
            .register(CertificateRenderer)
            .register(MeshRenderer)
            .register(MediaRenderer)
            .register(HexRenderer::new(limits.hex_max_bytes))
            .register(ShellRenderer::new(handlers));
        registry
    }

    /// Appends at the lowest priority.
    pub fn register(&mut self, renderer: impl Renderer + 'static) -> &mut Self {
        self.renderers.push(Arc::new(renderer));
        self
    }

    pub fn resolve(&self, path: &Path) -> Option<Arc<dyn Renderer>> {
        let found = self
            .renderers
            .iter()
            .find(|renderer| renderer.can_handle(path))
            .cloned();
        match &found {
            Some(renderer) => {
                tracing::debug!(path = %path.display(), renderer = renderer.name(), "renderer resolved");
            }
            None => tracing::debug!(path = %path.display(), "no renderer claims path"),
        }
        found
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.renderers.iter().map(|renderer| renderer.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("renderers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{ContentHandle, NoPreviewHandlers, PreviewContent};
    use pretty_assertions::assert_eq;
    use std::fs;

    struct ClaimsSuffix {
        name: &'static str,
        suffix: &'static str,
    }

    impl Renderer for ClaimsSuffix {
        fn name(&self) -> &'static str {
            self.name
        }

        fn can_handle(&self, path: &Path) -> bool {
            path.to_string_lossy().ends_with(self.suffix)
        }

        fn render(&self, _path: &Path) -> ContentHandle {
            ContentHandle::ready(PreviewContent::info(self.name))
        }
    }

    fn registry_from(order: &[usize]) -> RendererRegistry {
        let candidates = [
            ("generic", ".bin"),
            ("specific", ".tar.bin"),
            ("other", ".txt"),
        ];
        let mut registry = RendererRegistry::new();
        for index in order {
            let (name, suffix) = candidates[*index];
            registry.register(ClaimsSuffix { name, suffix });
        }
        registry
    }

    #[test]
    fn earlier_registration_wins_for_every_order() {
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let registry = registry_from(&order);
            let expected = if order.iter().position(|i| *i == 0) < order.iter().position(|i| *i == 1) {
                "generic"
            } else {
                "specific"
            };
            let resolved = registry.resolve(Path::new("pack.tar.bin")).expect("claimed");
            assert_eq!(resolved.name(), expected, "order {order:?}");
        }
    }

    #[test]
    fn resolved_renderer_always_claims_the_path() {
        let registry = registry_from(&[2, 1, 0]);
        for path in ["a.txt", "b.bin", "c.tar.bin", "d.png"] {
            if let Some(renderer) = registry.resolve(Path::new(path)) {
                assert!(renderer.can_handle(Path::new(path)));
            }
        }
        assert!(registry.resolve(Path::new("d.png")).is_none());
    }

    #[test]
    fn default_order_puts_specific_renderers_first() {
        let registry =
            RendererRegistry::with_defaults(RenderLimits::default(), Box::new(NoPreviewHandlers));
        assert_eq!(
            registry.names(),
            vec![
                "folder",
                "markdown",
                "pdf",
                "web",
                "archive",
                "csv",
                "text",
                "image",
                "font",
                "certificate",
                "mesh",
                "media",
                "hex",
                "shell",
            ]
        );
    }

    #[test]
    fn default_registry_dispatches_by_kind() {
        let registry =
            RendererRegistry::with_defaults(RenderLimits::default(), Box::new(NoPreviewHandlers));
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("photos.zip");
        fs::create_dir(&folder).expect("dir");

        let name_of = |path: &Path| registry.resolve(path).map(|renderer| renderer.name());
        assert_eq!(name_of(&folder), Some("folder"));
        assert_eq!(name_of(Path::new("bundle.zip")), Some("archive"));
        assert_eq!(name_of(Path::new("notes.md")), Some("markdown"));
        assert_eq!(name_of(Path::new("table.csv")), Some("csv"));
        assert_eq!(name_of(Path::new("lib.so")), Some("hex"));
        assert_eq!(name_of(Path::new("song.mp3")), Some("media"));
        assert_eq!(name_of(Path::new("unknown.qqq")), None);
    }
}
