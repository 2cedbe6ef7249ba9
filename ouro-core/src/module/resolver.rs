use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    analyzer::prelude::{AnalyzeOptions, ModuleAnalyzer, Outcome},
    parser::prelude::{parse_module, Module},
    utils::prelude::{DiagnosticEmitter, Error}
};
use super::loader::SourceLoader;

#[derive(Debug)]
enum State {
    /// Parsed, its own imports are still being resolved.
    Loading(Module),
    Loaded,
}

/// Loads, parses and analyzes everything a module imports, transitively.
///
/// Every module is read once. A module reached again while its own imports
/// are being resolved is a cycle: the second import sees the parsed but not
/// yet analyzed module and does not load it again.
pub struct ImportResolver<'a> {
    loader: &'a dyn SourceLoader,
    builtins: &'a HashSet<String>,
    warnings: &'a DiagnosticEmitter,
    states: HashMap<String, State>,
    modules: Vec<Module>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(
        loader: &'a dyn SourceLoader,
        builtins: &'a HashSet<String>,
        warnings: &'a DiagnosticEmitter
    ) -> Self {
        Self {
            loader,
            builtins,
            warnings,
            states: HashMap::new(),
            modules: vec![],
        }
    }

    /// The analyzed imports of `root`, dependencies before dependents.
    pub fn resolve(mut self, root: &Module) -> Result<Vec<Module>, Error> {
        let _ = self.states.insert(root.name.clone(), State::Loading(root.clone()));

        for import in root.program.imports() {
            self.import(&import.path)?;
        }

        Ok(self.modules)
    }

    fn import(&mut self, name: &str) -> Result<(), Error> {
        if self.states.contains_key(name) {
            debug!(module = name, "module already resolved");
            return Ok(());
        }

        let source = self.loader.load(name)?;
        let parsed = parse_module(name, &source.text);

        if parsed.has_errors() {
            return Err(Error::Parse {
                path: source.path,
                src: source.text,
                diagnostics: parsed.diagnostics,
            });
        }

        self.warnings.emit_all(parsed.diagnostics);

        let module = parsed.module;
        let _ = self.states.insert(name.to_string(), State::Loading(module.clone()));

        for import in module.program.imports() {
            self.import(&import.path)?;
        }

        let visible = self.visible(&module);
        let options = AnalyzeOptions {
            imports: &visible,
            builtins: self.builtins,
            predefined: &[],
        };

        let module = match ModuleAnalyzer::analyze(module, &options, self.warnings) {
            Outcome::Ok(module) => module,
            Outcome::PartialFailure(_, errors) => return Err(Error::Semantic {
                path: source.path,
                src: source.text,
                diagnostics: errors.iter().map(|error| error.to_diagnostic()).collect(),
            }),
        };

        debug!(module = name, path = %source.path.display(), "resolved import");

        let _ = self.states.insert(name.to_string(), State::Loaded);
        self.modules.push(module);

        Ok(())
    }

    /// Modules whose declarations `module` sees: every finished module plus
    /// the in-progress ones it imports back.
    fn visible(&self, module: &Module) -> Vec<Module> {
        let in_progress = module.program.imports()
            .filter(|import| import.path != module.name)
            .filter_map(|import| match self.states.get(&import.path) {
                Some(State::Loading(module)) => Some(module.clone()),
                _ => None,
            });

        self.modules.iter()
            .cloned()
            .chain(in_progress)
            .collect()
    }
}
