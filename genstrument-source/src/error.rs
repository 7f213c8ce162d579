use std::path::PathBuf;

use genstrument_ir::Position;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors are boxed: the syntax variant carries the whole source text.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The text being parsed and the name it is reported under.
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// A syntax error covering `len` bytes from `position`, located as
    /// `<file>:<line>:<column>`.
    pub fn syntax_error(
        &self,
        message: impl Into<String>,
        position: Position,
        len: usize,
    ) -> Box<Error> {
        let location = format!("{}:{}:{}", self.filename, position.line, position.column);
        Box::new(Error::Syntax {
            src: NamedSource::new(&self.filename, self.src.clone()),
            span: (position.offset, len).into(),
            location,
            message: message.into(),
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(code(genstrument::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{location}: syntax error: {message}")]
    #[diagnostic(
        code(genstrument::syntax_error),
        help("genstrument reads declarations only; the file must be valid Go")
    )]
    Syntax {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        location: String,
        message: String,
    },
}
