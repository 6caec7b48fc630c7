use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct StartupConfig {
    /// Previewed once the window is ready, as if the hotkey had picked it.
    pub(super) path: Option<PathBuf>,
    pub(super) hotkey_enabled: bool,
}

impl StartupConfig {
    pub(super) fn from_args() -> Self {
        Self::parse(std::env::args_os().skip(1).map(PathBuf::from))
    }

    fn parse(args: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut config = Self {
            path: None,
            hotkey_enabled: true,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.to_str() {
                Some("--no-hotkey") => config.hotkey_enabled = false,
                Some("--path") => match args.next() {
                    Some(path) => config.path = Some(path),
                    None => tracing::warn!("--path needs a file argument"),
                },
                _ => tracing::warn!(arg = %arg.display(), "ignoring unknown argument"),
            }
        }
        config
    }
}

/// GTK only sees argv[0]; app flags would fail its option parsing.
pub(super) fn gtk_launch_args() -> Vec<String> {
    std::env::args().take(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> StartupConfig {
        StartupConfig::parse(args.iter().map(PathBuf::from))
    }

    #[test]
    fn defaults_enable_the_hotkey_without_a_path() {
        assert_eq!(
            parse(&[]),
            StartupConfig {
                path: None,
                hotkey_enabled: true,
            }
        );
    }

    #[test]
    fn path_and_no_hotkey_flags_are_recognised_in_any_order() {
        let config = parse(&["--no-hotkey", "--path", "/tmp/notes.md"]);
        assert_eq!(config.path, Some(PathBuf::from("/tmp/notes.md")));
        assert!(!config.hotkey_enabled);

        let config = parse(&["--path", "a.txt", "--bogus"]);
        assert_eq!(config.path, Some(PathBuf::from("a.txt")));
        assert!(config.hotkey_enabled);
    }

    #[test]
    fn dangling_path_flag_is_ignored() {
        assert_eq!(parse(&["--path"]).path, None);
    }
}
