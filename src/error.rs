use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{} is currently open elsewhere; close it and try again", .path.display())]
    LockedResource { path: PathBuf },
    #[error("unable to read {}: {reason}", .path.display())]
    UnreadableResource { path: PathBuf, reason: String },
    #[error("{} is not approved and does not match the naming convention", .path.display())]
    NamingPolicyRejection { path: PathBuf },
    #[error("unexpected error while processing {}: {detail}", .path.display())]
    UnknownResourceError { path: PathBuf, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    OpenFile,
    Unreadable,
    Unapproved,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenFile => "OPEN FILE",
            Self::Unreadable => "UNREADABLE",
            Self::Unapproved => "UNAPPROVED",
            Self::Unknown => "UNKNOWN ERROR",
        }
    }
}

impl LedgerError {
    pub fn locked(path: impl AsRef<Path>) -> Self {
        Self::LockedResource {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn unreadable(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::UnreadableResource {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn unknown(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        Self::UnknownResourceError {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    /// Classify an I/O failure the way the store and grid readers report it:
    /// permission problems mean the file is held open elsewhere, malformed
    /// content is unreadable, everything else is unknown.
    pub fn from_io(path: impl AsRef<Path>, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::WouldBlock => {
                Self::locked(path)
            }
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
                Self::unreadable(path, err.to_string())
            }
            _ => Self::unknown(path, err.to_string()),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::LockedResource { .. } => ErrorCode::OpenFile,
            Self::UnreadableResource { .. } => ErrorCode::Unreadable,
            Self::NamingPolicyRejection { .. } => ErrorCode::Unapproved,
            Self::UnknownResourceError { .. } => ErrorCode::Unknown,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::LockedResource { path }
            | Self::UnreadableResource { path, .. }
            | Self::NamingPolicyRejection { path }
            | Self::UnknownResourceError { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(
            LedgerError::from_io("a.json", &denied).code(),
            ErrorCode::OpenFile
        );

        let bad = std::io::Error::new(std::io::ErrorKind::InvalidData, "garbage");
        assert_eq!(
            LedgerError::from_io("a.json", &bad).code(),
            ErrorCode::Unreadable
        );

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(
            LedgerError::from_io("a.json", &missing).code(),
            ErrorCode::Unknown
        );
    }

    #[test]
    fn codes_render_report_tags() {
        let err = LedgerError::NamingPolicyRejection {
            path: PathBuf::from("x.csv"),
        };
        assert_eq!(err.code().as_str(), "UNAPPROVED");
        assert_eq!(err.path(), Path::new("x.csv"));
    }
}
