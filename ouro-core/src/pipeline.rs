use std::{
    path::{Path, PathBuf},
    rc::Rc
};

use tracing::debug;

use crate::{
    analyzer::prelude::{AnalyzeOptions, ModuleAnalyzer, Outcome},
    eval::prelude::{Builtins, Interpreter, Output, StdOutput},
    module::prelude::{FsSourceLoader, ImportResolver, SourceLoader},
    optimizer::prelude::optimize_module,
    parser::prelude::{parse_module, Module},
    utils::prelude::{DiagnosticEmitter, Error}
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Fold constant expressions before running.
    pub optimize: bool,
    /// Execute the program after analysis.
    pub run: bool,
    /// Directories searched for imported modules.
    pub search_paths: Vec<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            run: true,
            search_paths: vec![PathBuf::from(".")],
        }
    }
}

/// A parsed and analyzed program with everything it imports.
#[derive(Debug, Clone)]
pub struct Checked {
    pub path: PathBuf,
    pub src: String,
    pub module: Module,
    pub imports: Vec<Module>,
}

/// Parse, resolve imports, analyze, optimize and run, stopping at the first
/// phase that reports errors. Warnings and non-fatal runtime diagnostics go
/// to the diagnostic emitter, program output to the `Output` sink.
pub struct Pipeline {
    options: PipelineOptions,
    loader: Box<dyn SourceLoader>,
    builtins: Builtins,
    output: Rc<dyn Output>,
    diagnostics: DiagnosticEmitter,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        let loader = FsSourceLoader::new(options.search_paths.clone());

        Self {
            options,
            loader: Box::new(loader),
            builtins: Builtins::new(),
            output: Rc::new(StdOutput),
            diagnostics: DiagnosticEmitter::null(),
        }
    }

    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_builtins(mut self, builtins: Builtins) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn with_output(mut self, output: Rc<dyn Output>) -> Self {
        self.output = output;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticEmitter) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &DiagnosticEmitter {
        &self.diagnostics
    }

    /// Reads `path` and runs every enabled phase over it.
    pub fn execute_file(&self, path: &Path) -> Result<Checked, Error> {
        let src = FsSourceLoader::read(path)?;
        self.execute(path, src)
    }

    pub fn execute(&self, path: &Path, src: String) -> Result<Checked, Error> {
        let mut checked = self.check(path, src)?;

        if self.options.optimize {
            self.optimize(&mut checked);
        }

        if self.options.run {
            self.run(&checked)?;
        }

        Ok(checked)
    }

    /// Lexing, parsing, import resolution and semantic analysis.
    pub fn check(&self, path: &Path, src: String) -> Result<Checked, Error> {
        let name = module_name(path);
        let parsed = parse_module(&name, &src);

        if parsed.has_errors() {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                src,
                diagnostics: parsed.diagnostics,
            });
        }

        self.diagnostics.emit_all(parsed.diagnostics);

        let builtins = self.builtins.names();
        let imports = ImportResolver::new(self.loader.as_ref(), &builtins, &self.diagnostics)
            .resolve(&parsed.module)?;

        let options = AnalyzeOptions {
            imports: &imports,
            builtins: &builtins,
            predefined: &[],
        };

        let module = match ModuleAnalyzer::analyze(parsed.module, &options, &self.diagnostics) {
            Outcome::Ok(module) => module,
            Outcome::PartialFailure(_, errors) => return Err(Error::Semantic {
                path: path.to_path_buf(),
                src,
                diagnostics: errors.iter().map(|error| error.to_diagnostic()).collect(),
            }),
        };

        Ok(Checked {
            path: path.to_path_buf(),
            src,
            module,
            imports,
        })
    }

    /// Constant folding over the program and its imports.
    pub fn optimize(&self, checked: &mut Checked) -> usize {
        let folds = checked.imports.iter_mut()
            .chain(std::iter::once(&mut checked.module))
            .map(optimize_module)
            .sum();

        debug!(folds, "optimization finished");
        folds
    }

    pub fn run(&self, checked: &Checked) -> Result<(), Error> {
        let mut interpreter = Interpreter::new(self.output.clone(), self.diagnostics.clone())
            .with_builtins(self.builtins.clone());

        interpreter.run(&checked.module, &checked.imports)
            .map_err(|error| Error::Runtime {
                path: checked.path.clone(),
                src: checked.src.clone(),
                diagnostic: error.to_diagnostic(),
            })
    }
}

/// Module name of a source file: its file stem.
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}
