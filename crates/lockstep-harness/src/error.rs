use lockstep_protocol::{Origin, ParseError};
use lockstep_session::SessionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Fatal harness failures. A detected divergence is not an error (it is the
/// tool's finding, reported through [`crate::Outcome::Diverged`]); these are
/// the abort paths.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{origin} session: {source}")]
    Session {
        origin: Origin,
        #[source]
        source: SessionError,
    },

    #[error("{origin} protocol drift: {source}")]
    Parse {
        origin: Origin,
        #[source]
        source: ParseError,
    },

    #[error("{origin} stopped at {reported:#06x} instead of the requested start {requested:#06x}")]
    Alignment {
        origin: Origin,
        reported: u16,
        requested: u16,
    },

    #[error("trace output: {0}")]
    Output(#[from] std::io::Error),
}
