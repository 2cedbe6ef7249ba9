use std::{io::Write, rc::Rc};

use ouro_core::{
    analyzer::prelude::{AnalyzeOptions, ModuleAnalyzer, Outcome},
    eval::prelude::{Interpreter, StdOutput},
    module::prelude::{FsSourceLoader, ImportResolver},
    parser::prelude::parse_module,
    utils::prelude::DiagnosticEmitter
};
use tracing::debug;

use crate::cli::{print_error, ConsoleDiagnosticEmitter};

const PROMPT: &str = ">> ";

/// Every line is analyzed and executed against one interpreter, so
/// variables, functions and classes persist between lines.
pub fn start() -> std::io::Result<()> {
    if let Err(err) = ctrlc::set_handler(|| {
        println!();
        std::process::exit(0);
    }) {
        debug!(%err, "could not install the Ctrl-C handler");
    }

    let stdin = std::io::stdin();
    let diagnostics = DiagnosticEmitter::new(Rc::new(ConsoleDiagnosticEmitter));
    let loader = FsSourceLoader::new([std::path::PathBuf::from(".")]);

    let mut interpreter = Interpreter::new(Rc::new(StdOutput), diagnostics.clone());
    let builtins = interpreter.builtin_names();
    let mut line = 0;

    loop {
        let mut input = String::from("");

        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        if stdin.read_line(&mut input)? == 0 {
            return Ok(());
        }

        let input = input.trim_end_matches(['\n', '\r']);

        match input {
            "" => continue,
            ".exit" => return Ok(()),
            _ => {}
        }

        line += 1;
        let parsed = parse_module(&format!("repl_{line}"), input);

        if parsed.has_errors() {
            diagnostics.emit_all(parsed.diagnostics);
            continue;
        }

        let imports = match ImportResolver::new(&loader, &builtins, &diagnostics).resolve(&parsed.module) {
            Ok(imports) => imports,
            Err(error) => {
                print_error(&error);
                continue;
            }
        };

        let predefined = interpreter.global_names();
        let options = AnalyzeOptions {
            imports: &imports,
            builtins: &builtins,
            predefined: &predefined,
        };

        let module = match ModuleAnalyzer::analyze(parsed.module, &options, &diagnostics) {
            Outcome::Ok(module) => module,
            Outcome::PartialFailure(_, errors) => {
                diagnostics.emit_all(errors.iter().map(|error| error.to_diagnostic()));
                continue;
            }
        };

        for import in &imports {
            interpreter.load(&import.program);
        }

        if let Err(error) = interpreter.execute(&module) {
            diagnostics.emit(error.to_diagnostic());
        }
    }
}
