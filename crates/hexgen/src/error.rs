use thiserror::Error;

/// Generator errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("facts error: {0}")]
    Facts(#[from] hexgen_facts::FactsError),
    #[error("semantics error: {0}")]
    Sem(#[from] hexgen_sem::SemError),
    #[error("syntax error: {0}")]
    Syntax(#[from] hexgen_syntax::SyntaxError),
    #[error(transparent)]
    Emit(#[from] hexgen_emit::EmitError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown tag {0}")]
    UnknownTag(String),
}

pub type Result<T> = std::result::Result<T, Error>;
