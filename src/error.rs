/// Error carrying the process exit code the binary should return.
///
/// Exit codes:
/// - `2`: invalid input, arguments, or I/O
/// - `3`: insufficient data
/// - `4`: numeric failure
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
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

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
