//! Process-level error type.
//!
//! Every failure carries the exit code the binary should terminate with:
//!
//! - 2: missing/unreadable input (recoverable at the caller's discretion)
//! - 3: no usable data after parsing/filtering
//! - 4: fatal structural error (e.g., malformed raw header cardinality)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Missing or unreadable input file/directory.
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Inputs were readable but produced no usable data.
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Structural problem the pipeline cannot continue past.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
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
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
