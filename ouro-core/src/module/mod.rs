pub mod loader;
pub mod resolver;

pub mod prelude {
    pub use super::{
        loader::*,
        resolver::*,
        SOURCE_EXTENSION
    };
}

#[cfg(test)]
mod tests;

/// Extension of source files looked up by `FsSourceLoader`.
pub const SOURCE_EXTENSION: &str = "ouro";
