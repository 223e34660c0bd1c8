use paramfs_wire::WireError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error(transparent)]
    Core(#[from] paramfs_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a failure.
    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("unexpected answer: {0}")]
    UnexpectedAnswer(String),
}

impl Error {
    /// True when the peer closed the connection between two frames.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::Wire(e) if e.is_disconnect())
    }
}
