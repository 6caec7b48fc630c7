//! One running instance per user session.
//!
//! Backed by a named mutex on Windows and an abstract socket or lock file
//! elsewhere. The lock is held for as long as [`InstanceGuard`] lives.

use single_instance::SingleInstance;
use thiserror::Error;

pub const INSTANCE_NAME: &str = "quickpeek-single-instance";

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("another instance is already running")]
    AlreadyRunning,
    #[error("failed to create instance lock `{name}`: {message}")]
    Lock { name: String, message: String },
}

pub type InstanceResult<T> = std::result::Result<T, InstanceError>;

pub struct InstanceGuard {
    name: String,
    _lock: SingleInstance,
}

impl InstanceGuard {
    pub fn acquire() -> InstanceResult<Self> {
        Self::acquire_named(INSTANCE_NAME)
    }

    pub fn acquire_named(name: &str) -> InstanceResult<Self> {
        let lock = SingleInstance::new(name).map_err(|err| InstanceError::Lock {
            name: name.to_string(),
            message: err.to_string(),
        })?;
        if !lock.is_single() {
            tracing::info!(name, "instance lock is held elsewhere");
            return Err(InstanceError::AlreadyRunning);
        }
        tracing::debug!(name, "acquired instance lock");
        Ok(Self {
            name: name.to_string(),
            _lock: lock,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for InstanceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceGuard")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_guard_for_same_name_is_rejected_until_first_drops() {
        let name = format!("quickpeek-test-{}", std::process::id());
        let first = InstanceGuard::acquire_named(&name).expect("first instance");
        assert_eq!(first.name(), name);

        let second = InstanceGuard::acquire_named(&name);
        assert!(matches!(second, Err(InstanceError::AlreadyRunning)));

        drop(first);
        InstanceGuard::acquire_named(&name).expect("lock released on drop");
    }
}
