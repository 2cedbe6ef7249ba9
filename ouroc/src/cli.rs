use std::{
    io::{IsTerminal, Write},
    time::Duration,
};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};
use tracing_subscriber::EnvFilter;

use ouro_core::utils::prelude::{Diagnostic, DiagnosticEmitterIO, Error};

pub(crate) fn print_analyzing(text: &str) {
    print_colourful_prefix("Analyzing", Color::Magenta, text)
}

pub(crate) fn print_analyzed(duration: Duration) {
    print_colourful_prefix("Analyzed", Color::Green, &format!("in {}", seconds(duration)))
}

pub(crate) fn print_running(text: &str) {
    print_colourful_prefix("Running", Color::Green, text)
}

pub(crate) fn print_finished(duration: Duration) {
    print_colourful_prefix("Finished", Color::Green, &format!("in {}", seconds(duration)))
}

pub fn seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_millis() as f32 / 1000.)
}

pub fn print_colourful_prefix(prefix: &str, color: Color, text: &str) {
    let buffer_writer = stderr_buffer_writer();
    let mut buffer = buffer_writer.buffer();

    let _ = buffer.set_color(
        ColorSpec::new()
            .set_intense(true)
            .set_bold(true)
            .set_fg(Some(color)),
    );
    let _ = write!(buffer, "{prefix: >11}");
    let _ = buffer.set_color(&ColorSpec::new());
    let _ = writeln!(buffer, " {text}");
    let _ = buffer_writer.print(&buffer);
}

/// Source excerpts for every diagnostic an error carries.
pub fn print_error(error: &Error) {
    let buffer_writer = stderr_buffer_writer();
    let mut buffer = buffer_writer.buffer();

    error.pretty(&mut buffer);
    let _ = buffer_writer.print(&buffer);
}

/// Prints diagnostics to stderr as they are raised, in
/// `[severity Lline:col] message` form.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleDiagnosticEmitter;

impl DiagnosticEmitterIO for ConsoleDiagnosticEmitter {
    fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        let color = match diagnostic.is_error() {
            true => Color::Red,
            false => Color::Yellow,
        };

        let buffer_writer = stderr_buffer_writer();
        let mut buffer = buffer_writer.buffer();

        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)));
        let _ = writeln!(buffer, "{diagnostic}");
        let _ = buffer.set_color(&ColorSpec::new());
        let _ = buffer_writer.print(&buffer);
    }
}

/// Log events go to stderr. `RUST_LOG` selects what is shown, `--verbose`
/// raises everything to `debug`.
pub fn init_tracing(verbose: bool) {
    let filter = match verbose {
        true => EnvFilter::new("debug"),
        false => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(color_choice() != ColorChoice::Never)
        .try_init();
}

pub fn stderr_buffer_writer() -> BufferWriter {
    BufferWriter::stderr(color_choice())
}

fn colour_forced() -> bool {
    if let Ok(force) = std::env::var("FORCE_COLOR") {
        !force.is_empty()
    } else {
        false
    }
}

fn color_choice() -> ColorChoice {
    if colour_forced() {
        ColorChoice::Always
    } else if std::io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}
