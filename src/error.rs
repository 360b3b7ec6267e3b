/// Failure category. Each category maps to a stable process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before the core ran (bad selector, unsupported container, bad flags).
    Input,
    /// Filesystem or decode failure.
    Io,
    /// No disk could be located.
    Detection,
    /// Degenerate radial profile.
    Profile,
    /// Unknown model or solver failure.
    Fitting,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Input => "InputError",
            ErrorKind::Io => "IoError",
            ErrorKind::Detection => "DetectionError",
            ErrorKind::Profile => "ProfileError",
            ErrorKind::Fitting => "FittingError",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Input | ErrorKind::Io => 2,
            ErrorKind::Detection => 3,
            ErrorKind::Profile => 4,
            ErrorKind::Fitting => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn detection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Detection, message)
    }

    pub fn profile(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Profile, message)
    }

    pub fn fitting(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fitting, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
