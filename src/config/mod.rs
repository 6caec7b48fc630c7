use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::hotkey::TriggerKey;
use crate::renderer::RenderLimits;
use crate::session::SessionOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "quickpeek";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub trigger_key: Option<String>,
    pub text_max_bytes: Option<u64>,
    pub hex_max_bytes: Option<u64>,
    pub archive_max_entries: Option<usize>,
    pub table_max_rows: Option<usize>,
    pub folder_max_dirs: Option<usize>,
    pub folder_max_files: Option<usize>,
    pub hide_on_deactivate: Option<bool>,
    pub stay_on_top: Option<bool>,
}

impl AppConfig {
    /// Configured trigger key; unknown names fall back to space.
    pub fn trigger_key(&self) -> TriggerKey {
        let Some(name) = self.trigger_key.as_deref() else {
            return TriggerKey::default();
        };
        TriggerKey::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "unknown trigger key in config.json; using space");
            TriggerKey::default()
        })
    }

    pub fn render_limits(&self) -> RenderLimits {
        let defaults = RenderLimits::default();
        RenderLimits {
            text_max_bytes: self.text_max_bytes.unwrap_or(defaults.text_max_bytes),
            hex_max_bytes: self.hex_max_bytes.unwrap_or(defaults.hex_max_bytes),
            archive_max_entries: self
                .archive_max_entries
                .unwrap_or(defaults.archive_max_entries),
            table_max_rows: self.table_max_rows.unwrap_or(defaults.table_max_rows),
            folder_max_dirs: self.folder_max_dirs.unwrap_or(defaults.folder_max_dirs),
            folder_max_files: self.folder_max_files.unwrap_or(defaults.folder_max_files),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        let defaults = SessionOptions::default();
        SessionOptions {
            hide_on_deactivate: self
                .hide_on_deactivate
                .unwrap_or(defaults.hide_on_deactivate),
            stay_on_top: self.stay_on_top.unwrap_or(defaults.stay_on_top),
            ..defaults
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (config_home, home) = config_env_dirs();
    load_app_config_with(config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        tracing::debug!(?path, "no config.json; using defaults");
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

/// Returns the per-user config root override and the home directory.
#[cfg(windows)]
pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("APPDATA").map(PathBuf::from),
        std::env::var_os("USERPROFILE").map(PathBuf::from),
    )
}

#[cfg(not(windows))]
pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(root) = config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(root.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn app_config_path_prefers_config_home() {
        let path = app_config_path(
            "quickpeek",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/quickpeek/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("quickpeek", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/quickpeek/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_root_unset() {
        let error = app_config_path("quickpeek", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    fn write_config(root: &Path, contents: &str) {
        let dir = root.join(APP_DIR);
        fs::create_dir_all(&dir).expect("config dir");
        fs::write(dir.join(APP_CONFIG_FILE), contents).expect("config file");
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let root = tempfile::tempdir().expect("tempdir");
        write_config(
            root.path(),
            r#"{ "trigger_key": "F3", "table_max_rows": 20, "stay_on_top": true }"#,
        );

        let config = load_app_config_with(Some(root.path()), None);
        assert_eq!(config.trigger_key(), TriggerKey::from_name("f3").expect("f3"));

        let limits = config.render_limits();
        assert_eq!(limits.table_max_rows, 20);
        assert_eq!(limits.text_max_bytes, RenderLimits::default().text_max_bytes);

        let options = config.session_options();
        assert!(options.stay_on_top);
        assert!(options.hide_on_deactivate);
    }

    #[test]
    fn malformed_or_missing_config_falls_back_to_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        assert_eq!(load_app_config_with(Some(root.path()), None), AppConfig::default());

        write_config(root.path(), "{ not json");
        let config = load_app_config_with(Some(root.path()), None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.render_limits(), RenderLimits::default());
    }

    #[test]
    fn unknown_trigger_key_name_uses_space() {
        let config = AppConfig {
            trigger_key: Some("hyper".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.trigger_key(), TriggerKey::SPACE);
    }
}
