use std::path::Path;

use super::{extension_of, ContentHandle, PreviewContent, Renderer};

/// Shell extension key under which a file type registers its preview handler.
pub const PREVIEW_HANDLER_SHELLEX: &str = "{8895b1c6-b41f-4c1c-a562-0d564250836f}";

/// A system preview handler registered for a file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewProvider {
    /// Class id in registry form, braces included.
    pub clsid: String,
    /// Friendly name, or the class id when the class has none.
    pub name: String,
}

/// Resolves the system preview provider registered for a file type.
pub trait PreviewHandlerLookup: Send + Sync {
    /// Provider for `extension`, which is lower case and has no leading dot.
    fn provider_for(&self, extension: &str) -> Option<PreviewProvider>;
}

/// Lookup for platforms without system preview providers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreviewHandlers;

impl PreviewHandlerLookup for NoPreviewHandlers {
    fn provider_for(&self, _extension: &str) -> Option<PreviewProvider> {
        None
    }
}

#[cfg(windows)]
pub fn platform_preview_handlers() -> Box<dyn PreviewHandlerLookup> {
    Box::new(win32::RegistryPreviewHandlers)
}

#[cfg(not(windows))]
pub fn platform_preview_handlers() -> Box<dyn PreviewHandlerLookup> {
    Box::new(NoPreviewHandlers)
}

/// Last-resort renderer for types that have a registered system provider.
pub struct ShellRenderer {
    lookup: Box<dyn PreviewHandlerLookup>,
}

impl ShellRenderer {
    pub fn new(lookup: Box<dyn PreviewHandlerLookup>) -> Self {
        Self { lookup }
    }

    fn provider(&self, path: &Path) -> Option<PreviewProvider> {
        if path.is_dir() {
            return None;
        }
        self.lookup.provider_for(&extension_of(path)?)
    }
}

impl Renderer for ShellRenderer {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn can_handle(&self, path: &Path) -> bool {
        self.provider(path).is_some()
    }

    fn render(&self, path: &Path) -> ContentHandle {
        match self.provider(path) {
            Some(PreviewProvider { clsid, name }) => {
                ContentHandle::ready(PreviewContent::ShellProvider {
                    path: path.to_path_buf(),
                    provider: name,
                    clsid,
                })
            }
            None => ContentHandle::ready(PreviewContent::no_preview()),
        }
    }
}

#[cfg(windows)]
mod win32 {
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::Foundation::ERROR_SUCCESS;
    use windows::Win32::System::Registry::{RegGetValueW, HKEY_CLASSES_ROOT, RRF_RT_REG_SZ};

    use super::{PreviewHandlerLookup, PreviewProvider, PREVIEW_HANDLER_SHELLEX};

    pub(super) struct RegistryPreviewHandlers;

    impl PreviewHandlerLookup for RegistryPreviewHandlers {
        fn provider_for(&self, extension: &str) -> Option<PreviewProvider> {
            let clsid = read_default_value(&format!(".{extension}\\ShellEx\\{PREVIEW_HANDLER_SHELLEX}"))?;
            let name = read_default_value(&format!("CLSID\\{clsid}"))
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| clsid.clone());
            Some(PreviewProvider { clsid, name })
        }
    }

    fn read_default_value(subkey: &str) -> Option<String> {
        let subkey = HSTRING::from(subkey);
        let mut buffer = [0u16; 260];
        let mut len = std::mem::size_of_val(&buffer) as u32;
        // SAFETY: the buffer and its byte length describe the same allocation.
        let status = unsafe {
            RegGetValueW(
                HKEY_CLASSES_ROOT,
                &subkey,
                PCWSTR::null(),
                RRF_RT_REG_SZ,
                None,
                Some(buffer.as_mut_ptr().cast()),
                Some(&mut len as *mut u32),
            )
        };
        if status != ERROR_SUCCESS {
            return None;
        }
        let chars = (len as usize / 2).min(buffer.len());
        let value = String::from_utf16_lossy(&buffer[..chars]);
        Some(value.trim_end_matches('\0').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const WORD_CLSID: &str = "{84F66100-FF7C-4fb4-B0C0-02CD7FB668FE}";

    struct FixedHandlers(HashMap<&'static str, &'static str>);

    impl PreviewHandlerLookup for FixedHandlers {
        fn provider_for(&self, extension: &str) -> Option<PreviewProvider> {
            self.0.get(extension).map(|name| PreviewProvider {
                clsid: WORD_CLSID.to_string(),
                name: name.to_string(),
            })
        }
    }

    #[test]
    fn matches_only_types_with_a_registered_provider() {
        let renderer = ShellRenderer::new(Box::new(FixedHandlers(HashMap::from([(
            "docx",
            "Word previewer",
        )]))));
        assert!(renderer.can_handle(Path::new("report.DOCX")));
        assert!(!renderer.can_handle(Path::new("report.odt")));
        assert!(!renderer.can_handle(Path::new("Makefile")));

        let handle = renderer.render(Path::new("report.docx"));
        assert_eq!(
            handle.content(),
            &PreviewContent::ShellProvider {
                path: Path::new("report.docx").to_path_buf(),
                provider: "Word previewer".to_string(),
                clsid: WORD_CLSID.to_string(),
            }
        );
    }

    #[test]
    fn no_handlers_never_match() {
        let renderer = ShellRenderer::new(Box::new(NoPreviewHandlers));
        assert!(!renderer.can_handle(Path::new("anything.xyz")));
    }
}
