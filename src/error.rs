use std::path::PathBuf;

use crate::lexer::Position;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{file}:{pos}: {message}")]
    Lex {
        file: String,
        pos: Position,
        message: String,
    },
    #[error("{file}:{pos}: expected {expected}, found {found}\n    near: {context}")]
    Syntax {
        file: String,
        pos: Position,
        expected: String,
        found: String,
        context: String,
    },
    #[error("{file}:{pos}: redefinition of type name `{name}`")]
    Redefinition {
        file: String,
        pos: Position,
        name: String,
    },
    #[error("{file}:{pos}: variable `{name}` cannot be marked `pub`")]
    PubVariable {
        file: String,
        pos: Position,
        name: String,
    },
    #[error("cannot resolve import \"{import}\" from {}; check that {env} points at the standard library", from.display())]
    ImportResolution {
        import: String,
        from: PathBuf,
        env: &'static str,
    },
    #[error("import cycle: {}", chain.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    ImportCycle { chain: Vec<PathBuf> },
    #[error("import \"{path}\" was never resolved")]
    UnresolvedImport { path: String },
    #[error("conflicting definitions of `{name}`:\n{first}\n{second}")]
    ConflictingDefinition {
        name: String,
        first: String,
        second: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read input: {0}")]
    Stdin(#[from] clap_stdin::StdinError),
    #[error("backend compiler exited with status {code}")]
    Backend { code: i32 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Status the binary should exit with; backend failures are relayed as-is.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Backend { code } => *code,
            _ => 1,
        }
    }
}
