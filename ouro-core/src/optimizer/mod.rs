pub mod folder;

pub mod prelude {
    pub use super::{
        folder::*,
        optimize_module
    };
}

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::parser::prelude::Module;
use self::folder::ConstantFolder;

/// Runs every optimization pass over `module` and returns the number of
/// rewritten nodes.
pub fn optimize_module(module: &mut Module) -> usize {
    let mut folder = ConstantFolder::new();
    folder.fold_program(&mut module.program);

    debug!(module = %module.name, folds = folder.folds(), "optimized module");

    folder.folds()
}
