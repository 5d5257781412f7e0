use std::io;
use std::path::Path;

use thiserror::Error;

use crate::parser::ParseError;
use crate::utils::path_lossy;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing required env var: {0}")]
    MissingEnv(String),

    #[error("{0}")]
    IO(io::Error),

    #[error("failed to get basedirs")]
    NoBaseDirs,

    #[error("invalid config {0}: {1}")]
    InvalidConfig(String, String),

    #[error("file {0} doesn't exist")]
    MissingFile(String),

    #[error("failed to parse {0}: {1}")]
    Parse(String, ParseError),

    #[error("{count} repositories starting at priority {base} overflow the priority range")]
    PriorityOverflow { base: u32, count: usize },
}

impl Error {
    pub fn new_cfg<S: ToString + ?Sized>(path: &Path, s: &S) -> Self {
        let as_str = path_lossy(path);
        Self::InvalidConfig(as_str.into(), s.to_string())
    }

    pub fn new_parse(source: &str, err: ParseError) -> Self {
        Self::Parse(source.into(), err)
    }

    /// Returns the structural grammar error if this error came from the parser
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::IO(err)
    }
}
