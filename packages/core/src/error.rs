use std::path::PathBuf;

use crate::access::AccessError;
use crate::area::SyncError;
use crate::path::PathError;
use crate::tree::TreeError;

/// Top-level error for parameter tree operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("invalid structure description {origin}: {source}")]
    Config {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err: Error = AccessError::TypeMismatch("boolean access on an integer".into()).into();
        assert_eq!(err.to_string(), "type mismatch: boolean access on an integer");

        let err: Error = TreeError::NotAParameter {
            path: "audio/mixer".into(),
        }
        .into();
        assert_eq!(err.to_string(), "'audio/mixer' is not a parameter");
    }

    #[test]
    fn io_error_names_the_file() {
        let err = Error::Io {
            path: PathBuf::from("/etc/structure.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(
            err.to_string(),
            "cannot read /etc/structure.json: No such file"
        );
    }
}
