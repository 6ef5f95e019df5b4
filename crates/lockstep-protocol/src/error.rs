use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// A register dump or echo line failed to match its grammar.
///
/// Always fatal to the run: the grammars are fixed per tool family, so a
/// parse failure means the target tool's output format drifted from the
/// configured dialect, not that retrying could help.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("register {name} missing from dump")]
    MissingRegister { name: &'static str },

    #[error("register {name} dumped twice with conflicting values {first:#06x} and {second:#06x}")]
    ConflictingRegister {
        name: &'static str,
        first: u16,
        second: u16,
    },

    #[error("invalid 16-bit hex value for {field}: {text:?}")]
    InvalidValue { field: String, text: String },

    #[error("echo line did not match grammar: {text:?}")]
    MalformedEcho { text: String },

    #[error("invalid grammar pattern: {0}")]
    BadPattern(#[from] regex::Error),
}
