use thiserror::Error;

/// Malformed date text. Surfaced to the caller for re-entry, never coerced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("expected DD/MM/YYYY or D/M/YYYY, got '{0}'")]
    InvalidFormat(String),

    #[error("date component '{0}' is not a number")]
    NonNumeric(String),

    #[error("year {0} is outside 1900-2100")]
    YearOutOfRange(i32),

    #[error("month {0} is outside 1-12")]
    MonthOutOfRange(u32),

    #[error("day {0} is outside 1-31")]
    DayOutOfRange(u32),

    #[error("{day:02}/{month:02}/{year} does not exist")]
    DayOverflow { day: u32, month: u32, year: i32 },
}

/// A stored value outside the valid domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid category code '{0}'")]
    CategoryCode(String),

    #[error("invalid test date '{value}': {source}")]
    TestDate {
        value: String,
        #[source]
        source: DateError,
    },

    #[error("invalid age '{0}'")]
    Age(String),

    #[error("field {field} is not valid UTF-8")]
    Encoding { field: u64 },
}

/// Rejected questionnaire or profile input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("expected 1 (yes) or 0 (no), got '{0}'")]
    NotAFlag(String),

    #[error("age must be a number between 1 and 120, got '{0}'")]
    Age(String),

    #[error(transparent)]
    Date(#[from] DateError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("username '{0}' already exists")]
    UsernameTaken(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must not contain '|' or line breaks")]
    ForbiddenCharacter { field: &'static str },
}
