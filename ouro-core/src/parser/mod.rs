pub mod error;
pub mod parser;
pub mod ast;
pub mod types;
pub mod expression;
pub mod statement;
pub mod declaration;
pub mod printer;

pub mod prelude {
    pub use super::{
        error::*,
        parser::*,
        ast::*,
        types::*,
        printer::*
    };
}

#[cfg(test)]
mod tests;
