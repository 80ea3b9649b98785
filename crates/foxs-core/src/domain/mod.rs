pub mod errors;

pub use errors::{FoxsError, FoxsErrorCategory, JobResult};

use std::fmt::{Display, Formatter};

/// How multi-model input structures are handled, matching the numeric
/// codes used on the job-parameter wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelReading {
    /// Read only the first MODEL of each file.
    FirstOnly,
    /// Split each MODEL into its own structure before profile computation.
    SeparateStructures,
    /// Hand the whole file to the profile tool unchanged.
    #[default]
    AllModels,
}

impl ModelReading {
    pub const fn as_code(self) -> u8 {
        match self {
            Self::FirstOnly => 1,
            Self::SeparateStructures => 2,
            Self::AllModels => 3,
        }
    }

    pub fn from_code(token: &str) -> JobResult<Self> {
        match token {
            "1" => Ok(Self::FirstOnly),
            "2" => Ok(Self::SeparateStructures),
            "3" => Ok(Self::AllModels),
            other => Err(FoxsError::input(
                "INPUT.MODEL_READING",
                format!("unknown model reading code '{}'", other),
            )),
        }
    }

    /// Mapping from the submission-form choice; anything unrecognized
    /// falls back to reading all models.
    pub fn from_form_choice(choice: &str) -> Self {
        match choice {
            "First MODEL only" => Self::FirstOnly,
            "MODELs into multiple structures" => Self::SeparateStructures,
            _ => Self::AllModels,
        }
    }
}

impl Display for ModelReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Units of the momentum transfer axis of an experimental profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProfileUnits {
    #[default]
    Unknown,
    Angstroms,
    Nanometers,
}

impl ProfileUnits {
    pub const fn as_code(self) -> u8 {
        match self {
            Self::Unknown => 1,
            Self::Angstroms => 2,
            Self::Nanometers => 3,
        }
    }

    pub fn from_code(token: &str) -> JobResult<Self> {
        match token {
            "1" => Ok(Self::Unknown),
            "2" => Ok(Self::Angstroms),
            "3" => Ok(Self::Nanometers),
            other => Err(FoxsError::input(
                "INPUT.PROFILE_UNITS",
                format!("unknown profile units code '{}'", other),
            )),
        }
    }

    pub fn from_form_choice(choice: &str) -> Self {
        match choice {
            "angstroms" => Self::Angstroms,
            "nanometers" => Self::Nanometers,
            _ => Self::Unknown,
        }
    }
}

impl Display for ProfileUnits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Lifecycle markers written to the `job-state` file for the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Started,
    Done,
}

impl JobState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Done => "DONE",
        }
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
