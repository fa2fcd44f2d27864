/// Broad category of a failure.
///
/// Callers mostly just print the message, but the pipeline needs to tell a
/// missing prebuilt bundle apart from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid option or option combination.
    Config,
    /// A file (raw CSV or prebuilt bundle) does not exist.
    NotFound,
    /// Malformed or insufficient data.
    Data,
    /// Any other I/O failure.
    Io,
}

impl ErrorKind {
    fn default_exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::NotFound => 2,
            ErrorKind::Data => 3,
            ErrorKind::Io => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.default_exit_code(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    /// Map an `std::io::Error` raised while touching `what`, keeping
    /// "file not found" distinguishable.
    pub fn from_io(err: &std::io::Error, what: impl std::fmt::Display) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(format!("{what} does not exist: {err}")),
            _ => Self::io(format!("I/O error on {what}: {err}")),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let app = AppError::from_io(&err, "bundle 'x.json'");
        assert!(app.is_not_found());
        assert_eq!(app.exit_code(), 2);

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let app = AppError::from_io(&err, "bundle 'x.json'");
        assert_eq!(app.kind(), ErrorKind::Io);
        assert_eq!(app.exit_code(), 4);
    }
}
