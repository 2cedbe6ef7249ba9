pub mod lexer;
pub mod parser;
pub mod analyzer;
pub mod optimizer;
pub mod module;
pub mod environment;
pub mod eval;
pub mod utils;
pub mod pipeline;
