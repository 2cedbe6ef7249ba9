use std::path::PathBuf;

use termcolor::Buffer;
use thiserror::Error;

use super::diagnostic::Diagnostic;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("could not load module `{name}`: {reason}")]
    Load {
        name: String,
        reason: String,
    },
    #[error("failed to parse source code")]
    Parse {
        path: PathBuf,
        src: String,
        diagnostics: Vec<Diagnostic>
    },
    #[error("semantic analysis failed")]
    Semantic {
        path: PathBuf,
        src: String,
        diagnostics: Vec<Diagnostic>
    },
    #[error("execution aborted")]
    Runtime {
        path: PathBuf,
        src: String,
        diagnostic: Diagnostic
    },
    #[error("IO operation failed")]
    Io {
        err: std::io::ErrorKind
    }
}

impl Error {
    pub fn pretty_string(&self) -> String {
        let mut nocolor = Buffer::no_color();
        self.pretty(&mut nocolor);
        String::from_utf8_lossy(&nocolor.into_inner()).into_owned()
    }

    pub fn pretty(&self, buf: &mut Buffer) {
        use std::io::Write;

        match self {
            Error::Parse { path, src, diagnostics }
            | Error::Semantic { path, src, diagnostics } => {
                for diagnostic in diagnostics {
                    diagnostic.write(path, src, buf);
                }
            },
            Error::Runtime { path, src, diagnostic } => diagnostic.write(path, src, buf),
            Error::Load { .. } | Error::Io { .. } => {
                let _ = writeln!(buf, "error: {self}");
            }
        }
    }

    /// The diagnostics carried by this error, in `[SEVERITY Lline:col]` form
    /// when rendered with `Display`.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Parse { diagnostics, .. } | Error::Semantic { diagnostics, .. } => diagnostics.clone(),
            Error::Runtime { diagnostic, .. } => vec![diagnostic.clone()],
            Error::Load { .. } | Error::Io { .. } => vec![],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io { err: err.kind() }
    }
}
