use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    #[error("invalid symbol '{symbol}' in '{pattern}'")]
    InvalidSymbol { pattern: String, symbol: char },

    #[error("cut offset {offset} appears more than once on the same strand")]
    DuplicateOffset { offset: isize },

    #[error("two cut symbols without a base between them in '{0}'")]
    AdjacentMarkers(String),

    #[error("unknown restriction enzyme '{0}'")]
    UnknownEnzyme(String),

    #[error("argument mismatch: {0}")]
    ArityMismatch(String),

    #[error("{0} is not supported by a run-length set")]
    UnsupportedMutation(&'static str),

    #[error("cut offsets given for an empty recognition sequence")]
    EmptyPattern,

    #[error("'{0}' cannot be used as a cut symbol")]
    InvalidCutSymbol(char),

    #[error("{size} mutually overlapping sites exceed the permutation limit of {limit}")]
    PermutationBudgetExceeded { size: usize, limit: usize },

    #[error("bad enzyme table: {0}")]
    EnzymeTable(String),
}

pub type Result<T> = std::result::Result<T, DigestError>;
