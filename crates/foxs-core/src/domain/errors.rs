use std::error::Error;
use std::fmt::{Display, Formatter};

pub type JobResult<T> = Result<T, FoxsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoxsErrorCategory {
    InputError,
    IoError,
    ToolError,
    InternalError,
}

impl FoxsErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputError => 2,
            Self::IoError => 3,
            Self::ToolError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InputError => "InputError",
            Self::IoError => "IoError",
            Self::ToolError => "ToolError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Error carried through every fallible job operation. The stable code
/// (`INPUT.*`, `IO.*`, `RUN.*`, `SYS.*`) identifies the failing step so
/// diagnostics written to the job log stay greppable across releases.
#[derive(Debug, Clone, PartialEq)]
pub struct FoxsError {
    category: FoxsErrorCategory,
    code: &'static str,
    message: String,
}

impl FoxsError {
    pub fn new(
        category: FoxsErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(FoxsErrorCategory::InputError, code, message)
    }

    pub fn io(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(FoxsErrorCategory::IoError, code, message)
    }

    pub fn tool(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(FoxsErrorCategory::ToolError, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(FoxsErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> FoxsErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    /// One-line rendering written to the job log when a job fails.
    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }
}

impl Display for FoxsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.code,
            self.message
        )
    }
}

impl Error for FoxsError {}
