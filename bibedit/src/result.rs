//! Common result type for methods/functions which may return a `Result`.
use std::fmt;

/// ```
/// use bibedit::result::*;
///
/// fn load() -> EditResult<()> {
///     Err("no such record")?;
///     Ok(())
/// }
///
/// let err = load().unwrap_err();
/// assert!(matches!(err, EditError::Message(_)));
/// assert_eq!(err.to_string(), "no such record");
/// ```
pub type EditResult<T> = std::result::Result<T, EditError>;

#[derive(Debug, Clone)]
pub enum EditError {
    /// General failure message, including record model errors.
    Message(String),
    /// The database rejected a query or could not be reached.
    Database(String),
    /// Reading input or writing output failed.
    Io(String),
}

impl std::error::Error for EditError {}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(m) => write!(f, "{m}"),
            Self::Database(m) => write!(f, "Database error: {m}"),
            Self::Io(m) => write!(f, "I/O error: {m}"),
        }
    }
}

/// Record model errors are plain strings.
impl From<String> for EditError {
    fn from(msg: String) -> Self {
        EditError::Message(msg)
    }
}

impl From<&str> for EditError {
    fn from(msg: &str) -> Self {
        EditError::Message(msg.to_string())
    }
}

/// Allows `?` on postgres calls.
///
/// ```
/// fn connect_to_a_nonexistant_db() -> bibedit::EditResult<()> {
///   postgres::Client::connect("bad-bad-connection-string", postgres::NoTls)?;
///   Ok(())
/// }
///
/// let result = connect_to_a_nonexistant_db();
/// assert!(result.err().unwrap().to_string().contains("invalid connection string"));
/// ```
impl From<postgres::Error> for EditError {
    fn from(original: postgres::Error) -> Self {
        EditError::Database(original.to_string())
    }
}

impl From<std::io::Error> for EditError {
    fn from(original: std::io::Error) -> Self {
        EditError::Io(original.to_string())
    }
}

impl From<serde_json::Error> for EditError {
    fn from(original: serde_json::Error) -> Self {
        EditError::Message(format!("Invalid JSON: {original}"))
    }
}

impl From<csv::Error> for EditError {
    fn from(original: csv::Error) -> Self {
        EditError::Io(format!("Error reading data file: {original}"))
    }
}

impl From<rustyline::error::ReadlineError> for EditError {
    fn from(original: rustyline::error::ReadlineError) -> Self {
        EditError::Io(format!("Error reading from terminal: {original}"))
    }
}
