//! Error types.
//!
//! - `UpliftError`: library-level failures (input shape, fit, predict, model files)
//! - `AppError`: what the `uplift` binary reports, carrying a process exit code

/// Errors raised by fitting, prediction and model loading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpliftError {
    #[error("length mismatch for {what}: expected {expected} rows, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("treatment must be 0 or 1, got {value} at row {row}")]
    NonBinaryTreatment { row: usize, value: u8 },

    #[error("outcome at row {row} is not a finite number")]
    NonFiniteOutcome { row: usize },

    #[error(
        "cannot estimate the root effect: need both treated and control rows \
         (treated={treated}, control={control})"
    )]
    DegenerateRoot { treated: usize, control: usize },

    #[error("model is not fitted")]
    NotFitted,

    #[error("feature count mismatch: model was fitted on {expected} features, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// Error surfaced by the CLI, mapped to a process exit code.
///
/// Exit codes:
/// - 2: usage, input files, I/O
/// - 3: data that cannot be trained on
/// - 4: model/internal errors
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

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<UpliftError> for AppError {
    fn from(err: UpliftError) -> Self {
        let exit_code = match err {
            UpliftError::InvalidConfig(_) => 2,
            UpliftError::LengthMismatch { .. }
            | UpliftError::NonBinaryTreatment { .. }
            | UpliftError::NonFiniteOutcome { .. }
            | UpliftError::DegenerateRoot { .. }
            | UpliftError::FeatureCountMismatch { .. } => 3,
            UpliftError::NotFitted | UpliftError::InvalidModel(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
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
