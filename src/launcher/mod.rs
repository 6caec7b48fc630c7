//! Hands files to the platform's default application and file manager.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to run {command} for {path}: {source}")]
    CommandIo {
        command: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} has no parent folder")]
    NoParent { path: PathBuf },
}

pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

pub trait Launcher: Send + Sync {
    /// Opens `path` with the application registered for its type.
    fn open(&self, path: &Path) -> LaunchResult<()>;
    /// Shows `path` selected in the system file manager.
    fn reveal(&self, path: &Path) -> LaunchResult<()>;
}

/// One opener invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenerCommand {
    pub program: &'static str,
    pub args: Vec<String>,
}

#[cfg(windows)]
fn open_command(path: &Path) -> LaunchResult<OpenerCommand> {
    Ok(OpenerCommand {
        program: "explorer.exe",
        args: vec![path.display().to_string()],
    })
}

#[cfg(windows)]
fn reveal_command(path: &Path) -> LaunchResult<OpenerCommand> {
    Ok(OpenerCommand {
        program: "explorer.exe",
        args: vec![format!("/select,{}", path.display())],
    })
}

#[cfg(target_os = "macos")]
fn open_command(path: &Path) -> LaunchResult<OpenerCommand> {
    Ok(OpenerCommand {
        program: "open",
        args: vec![path.display().to_string()],
    })
}

#[cfg(target_os = "macos")]
fn reveal_command(path: &Path) -> LaunchResult<OpenerCommand> {
    Ok(OpenerCommand {
        program: "open",
        args: vec!["-R".to_string(), path.display().to_string()],
    })
}

#[cfg(not(any(windows, target_os = "macos")))]
fn open_command(path: &Path) -> LaunchResult<OpenerCommand> {
    Ok(OpenerCommand {
        program: "xdg-open",
        args: vec![path.display().to_string()],
    })
}

#[cfg(not(any(windows, target_os = "macos")))]
fn reveal_command(path: &Path) -> LaunchResult<OpenerCommand> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .ok_or_else(|| LaunchError::NoParent {
            path: path.to_path_buf(),
        })?;
    Ok(OpenerCommand {
        program: "xdg-open",
        args: vec![parent.display().to_string()],
    })
}

/// Spawns the platform opener and does not wait for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn spawn(command: OpenerCommand, path: &Path) -> LaunchResult<()> {
        tracing::debug!(program = command.program, args = ?command.args, "spawning opener");
        Command::new(command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| LaunchError::CommandIo {
                command: command.program,
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Launcher for SystemLauncher {
    fn open(&self, path: &Path) -> LaunchResult<()> {
        Self::spawn(open_command(path)?, path)
    }

    fn reveal(&self, path: &Path) -> LaunchResult<()> {
        Self::spawn(reveal_command(path)?, path)
    }
}
