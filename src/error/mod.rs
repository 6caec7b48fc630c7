use crate::hotkey::HookError;
use crate::instance::InstanceError;
use crate::launcher::LaunchError;
use crate::session::SurfaceError;
use crate::state::StateError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
