use std::{collections::HashMap, io::BufReader, path::{Path, PathBuf}};

use tracing::debug;
use utf8_chars::BufReadCharsExt;

use crate::utils::prelude::Error;
use super::SOURCE_EXTENSION;

/// Source text of a module together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    pub text: String,
}

/// Finds the source of an imported module by name.
pub trait SourceLoader {
    fn load(&self, name: &str) -> Result<Source, Error>;
}

/// Resolves `import "a.b"` against the file system.
#[derive(Debug, Clone, Default)]
pub struct FsSourceLoader {
    search_paths: Vec<PathBuf>,
}

impl FsSourceLoader {
    pub fn new(search_paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            search_paths: search_paths.into_iter().collect(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Paths tried for `name`, in order: `name.ouro` relative to the working
    /// directory, then `<path>/name.ouro` and `<path>/a/b.ouro` for every
    /// search path.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let file = with_extension(name);
        let stem = name.strip_suffix(&format!(".{SOURCE_EXTENSION}")).unwrap_or(name);
        let nested = with_extension(&stem.replace('.', "/"));

        let mut candidates = vec![PathBuf::from(&file)];

        for path in &self.search_paths {
            candidates.push(path.join(&file));

            if nested != file {
                candidates.push(path.join(&nested));
            }
        }

        candidates
    }

    /// Reads a whole UTF-8 source file.
    pub fn read(path: &Path) -> Result<String, Error> {
        let file = std::fs::File::open(path)?;
        let capacity = file.metadata()?.len() as usize;

        let mut reader = BufReader::new(file);
        let mut src = String::with_capacity(capacity);

        for c in reader.chars() {
            src.push(c.map_err(|err| Error::Load {
                name: path.display().to_string(),
                reason: err.to_string(),
            })?);
        }

        Ok(src)
    }
}

fn with_extension(name: &str) -> String {
    match name.ends_with(&format!(".{SOURCE_EXTENSION}")) {
        true => name.to_string(),
        false => format!("{name}.{SOURCE_EXTENSION}"),
    }
}

impl SourceLoader for FsSourceLoader {
    fn load(&self, name: &str) -> Result<Source, Error> {
        let candidates = self.candidates(name);

        let Some(path) = candidates.iter().find(|path| path.is_file()) else {
            return Err(Error::Load {
                name: name.to_string(),
                reason: format!("no file found, tried {}", display_paths(&candidates)),
            });
        };

        debug!(module = name, path = %path.display(), "loading module source");

        Ok(Source {
            path: path.clone(),
            text: Self::read(path)?,
        })
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<String>>()
        .join(", ")
}

/// Serves module sources from memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceLoader {
    sources: HashMap<String, String>,
}

impl MemorySourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let _ = self.sources.insert(name.into(), text.into());
    }
}

impl SourceLoader for MemorySourceLoader {
    fn load(&self, name: &str) -> Result<Source, Error> {
        match self.sources.get(name) {
            Some(text) => Ok(Source {
                path: PathBuf::from(with_extension(name)),
                text: text.clone(),
            }),
            None => Err(Error::Load {
                name: name.to_string(),
                reason: "no such module".to_string(),
            }),
        }
    }
}
