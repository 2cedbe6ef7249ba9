pub mod error;
pub mod analyzer;
pub mod infer;
pub mod symbol_table;

pub mod prelude {
    pub use super::{
        analyzer::*,
        error::*,
        symbol_table::*
    };
}

#[cfg(test)]
mod tests;
