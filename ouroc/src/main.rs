mod cli;
mod repl;
mod rlpl;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
    time::Instant
};

use clap::Parser;
use cli::{
    init_tracing, print_analyzed, print_analyzing, print_error, print_finished, print_running,
    ConsoleDiagnosticEmitter
};
use ouro_core::{
    lexer::prelude::lex,
    module::prelude::FsSourceLoader,
    parser::prelude::dump_program,
    pipeline::{Pipeline, PipelineOptions},
    utils::prelude::{DiagnosticEmitter, Error}
};

#[derive(Parser)]
#[command(name = "ouro", version, about = "Interpreter for the Ouro scripting language")]
enum Command {
    /// Performs lexical, syntactical and semantical analysis, then runs the program
    Run {
        /// Path of source file
        path: PathBuf,
        /// Print every token before parsing
        #[arg(long, default_value_t = false)]
        print_tokens: bool,
        /// Print the analyzed syntax tree
        #[arg(long, default_value_t = false)]
        print_ast: bool,
        /// Skip constant folding
        #[arg(long, default_value_t = false)]
        no_optimize: bool,
        /// Stop after analysis
        #[arg(long, default_value_t = false)]
        no_run: bool,
        /// Directory searched for imported modules, may be repeated
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include: Vec<PathBuf>,
        /// Show debug logs
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Performs lexical, syntactical and semantical analysis only
    Check {
        /// Path of source file
        path: PathBuf,
        /// Directory searched for imported modules, may be repeated
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include: Vec<PathBuf>,
        /// Show debug logs
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Runs Read Lex Print Loop
    Tokens,
    /// Runs Read Eval Print Loop
    Repl {
        /// Show debug logs
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct RunFlags {
    print_tokens: bool,
    print_ast: bool,
    optimize: bool,
    run: bool,
}

fn main() -> ExitCode {
    let succeeded = match Command::parse() {
        Command::Run { path, print_tokens, print_ast, no_optimize, no_run, include, verbose } => {
            init_tracing(verbose);

            let flags = RunFlags {
                print_tokens,
                print_ast,
                optimize: !no_optimize,
                run: !no_run,
            };

            run(&path, include, flags)
        },
        Command::Check { path, include, verbose } => {
            init_tracing(verbose);

            let flags = RunFlags {
                print_tokens: false,
                print_ast: false,
                optimize: false,
                run: false,
            };

            run(&path, include, flags)
        },
        Command::Tokens => rlpl::start().is_ok(),
        Command::Repl { verbose } => {
            init_tracing(verbose);
            repl::start().is_ok()
        },
    };

    match succeeded {
        true => ExitCode::SUCCESS,
        false => ExitCode::FAILURE,
    }
}

/// Imports are searched next to the source file, then in every `-I`
/// directory, then in the working directory.
fn search_paths(path: &Path, include: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut paths = vec![];

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        paths.push(parent.to_path_buf());
    }

    paths.extend(include);
    paths.push(PathBuf::from("."));
    paths
}

fn run(path: &Path, include: Vec<PathBuf>, flags: RunFlags) -> bool {
    let src = match FsSourceLoader::read(path) {
        Ok(src) => src,
        Err(error) => {
            print_error(&error);
            return false;
        }
    };

    if flags.print_tokens {
        for token in lex(&src) {
            println!("{token}");
        }
    }

    let options = PipelineOptions {
        optimize: flags.optimize,
        run: flags.run,
        search_paths: search_paths(path, include),
    };

    let diagnostics = DiagnosticEmitter::new(Rc::new(ConsoleDiagnosticEmitter));
    let pipeline = Pipeline::new(options).with_diagnostics(diagnostics.clone());

    let display = path.display().to_string();
    print_analyzing(&display);
    let start = Instant::now();

    let mut checked = match pipeline.check(path, src) {
        Ok(checked) => checked,
        Err(error) => return fail(&error),
    };

    print_analyzed(start.elapsed());

    if flags.print_ast {
        print!("{}", dump_program(&checked.module.program));
    }

    if flags.optimize {
        pipeline.optimize(&mut checked);
    }

    if flags.run {
        print_running(&display);
        let start = Instant::now();

        if let Err(error) = pipeline.run(&checked) {
            return fail(&error);
        }

        print_finished(start.elapsed());
    }

    !diagnostics.has_errors()
}

fn fail(error: &Error) -> bool {
    print_error(error);
    false
}
