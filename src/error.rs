use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} is not available on this system")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Failed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    #[cfg(windows)]
    pub fn from_win32(prefix: &str) -> Self {
        use windows::Win32::Foundation::GetLastError;
        let code = unsafe { GetLastError().0 };
        CoreError::Failed(format!("{prefix} (code {code})"))
    }

    #[cfg(windows)]
    pub fn failed(prefix: &str, err: windows::core::Error) -> Self {
        CoreError::Failed(format!("{prefix}: {err}"))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, CoreError::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::NotFound(_) => true,
            CoreError::Io(err) => err.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_counts_as_missing() {
        let err = CoreError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn unavailable_is_distinct_from_failed() {
        assert!(CoreError::Unavailable("pinned list".into()).is_unavailable());
        assert!(!CoreError::Failed("modify".into()).is_unavailable());
    }

    #[cfg(windows)]
    #[test]
    fn last_error_code_is_reported() {
        use windows::Win32::Foundation::{SetLastError, ERROR_PROC_NOT_FOUND};

        unsafe { SetLastError(ERROR_PROC_NOT_FOUND) };
        let err = CoreError::from_win32("GetProcAddress(Missing)");
        assert_eq!(err.to_string(), "GetProcAddress(Missing) (code 127)");
    }
}
