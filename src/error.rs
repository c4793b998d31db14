use derive_more::Display;

use crate::solver::Status;

/// Everything that can go wrong while loading data, building or solving the
/// capacity planning model.
#[derive(Debug, Display)]
pub enum Error {
    /// A source file exists but could not be read
    #[display(fmt = "failed to read {}: {}", path, source)]
    Io {
        path: String,
        source: std::io::Error,
    },
    /// A table is not valid CSV
    #[display(fmt = "malformed csv in table {}: {}", table, source)]
    Csv { table: String, source: csv::Error },
    /// A required table is absent
    #[display(fmt = "required table {} is missing", _0)]
    MissingTable(String),
    /// A declared key or value column is absent from a table
    #[display(fmt = "table {} has no column {}", table, column)]
    MissingColumn { table: String, column: String },
    /// A cell could not be parsed as the expected kind of number
    #[display(
        fmt = "table {} row {} column {}: cannot parse {:?}",
        table,
        row,
        column,
        value
    )]
    MalformedValue {
        table: String,
        column: String,
        row: usize,
        value: String,
    },
    /// A parameter lookup outside of the keys that were loaded
    #[display(fmt = "parameter {} has no value for ({})", table, key)]
    MissingKey { table: String, key: String },
    /// A scalar was not found in the configuration text, but something needs it
    #[display(fmt = "configuration text does not define {}", label)]
    MissingScalar { label: &'static str },
    /// A scalar was found but its value is not usable
    #[display(fmt = "configuration value for {} is invalid: {:?}", label, value)]
    MalformedScalar { label: &'static str, value: String },
    /// A brace-delimited list does not match the size of its index set
    #[display(
        fmt = "list {} has {} entries but its index set has {}",
        label,
        actual,
        expected
    )]
    ListLength {
        label: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A capacity coefficient would divide by a zero throughput, work hours or utilization
    #[display(fmt = "{} has no usable capacity at ({})", resource, key)]
    ZeroCapacity { resource: &'static str, key: String },
    /// A variable family was queried for a key it was never declared with
    #[display(fmt = "variable family {} has no index ({})", family, key)]
    IndexDomain { family: String, key: String },
    /// A variable family was asked to declare the same key twice
    #[display(fmt = "variable {}_({}) declared twice", family, key)]
    DuplicateVariable { family: String, key: String },
    /// Two constraints share a name
    #[display(fmt = "constraint {} added twice", _0)]
    DuplicateConstraint(String),
    /// The solver finished without an optimal or feasible solution
    #[display(fmt = "solver finished with status {}", _0)]
    SolverStatus(Status),
    /// Run configuration is inconsistent
    #[display(fmt = "invalid configuration: {}", _0)]
    InvalidConfig(String),
    /// Run configuration is not valid JSON
    #[display(fmt = "invalid configuration file: {}", _0)]
    Json(serde_json::Error),
}

/// Coarse classification of [`Error`], matching how callers are expected to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed source data. Aborts model construction.
    Data,
    /// A variable or parameter addressed outside its declared domain. A programming error.
    IndexDomain,
    /// The solver did not produce a usable solution. Reported as is, never retried.
    SolverStatus,
    /// The run configuration is unusable.
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. }
            | Error::Csv { .. }
            | Error::MissingTable(_)
            | Error::MissingColumn { .. }
            | Error::MalformedValue { .. }
            | Error::MissingKey { .. }
            | Error::MissingScalar { .. }
            | Error::MalformedScalar { .. }
            | Error::ListLength { .. }
            | Error::ZeroCapacity { .. } => ErrorKind::Data,
            Error::IndexDomain { .. }
            | Error::DuplicateVariable { .. }
            | Error::DuplicateConstraint(_) => ErrorKind::IndexDomain,
            Error::SolverStatus(_) => ErrorKind::SolverStatus,
            Error::InvalidConfig(_) | Error::Json(_) => ErrorKind::Config,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Csv { source, .. } => Some(source),
            Error::Json(source) => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
