use std::{rc::Rc, sync::{atomic::{AtomicUsize, Ordering}, Arc, RwLock}};

use super::diagnostic::Diagnostic;

/// Destination for diagnostics produced by any phase of the pipeline.
pub trait DiagnosticEmitterIO {
    fn emit_diagnostic(&self, diagnostic: Diagnostic);
}

#[derive(Debug, Clone, Copy)]
pub struct NullDiagnosticEmitterIO;

impl DiagnosticEmitterIO for NullDiagnosticEmitterIO {
    fn emit_diagnostic(&self, _diagnostic: Diagnostic) {}
}

#[derive(Debug, Default, Clone)]
pub struct VectorDiagnosticEmitterIO {
    pub diagnostics: Arc<RwLock<Vec<Diagnostic>>>
}

impl VectorDiagnosticEmitterIO {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.write_lock();
        std::mem::take(&mut *diagnostics)
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        match self.diagnostics.read() {
            Ok(diagnostics) => diagnostics.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn reset(&self) {
        let mut diagnostics = self.write_lock();
        diagnostics.clear();
    }

    pub fn pop(&self) -> Option<Diagnostic> {
        let mut diagnostics = self.write_lock();
        diagnostics.pop()
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Diagnostic>> {
        match self.diagnostics.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl DiagnosticEmitterIO for VectorDiagnosticEmitterIO {
    fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        let mut diagnostics = self.write_lock();

        diagnostics.push(diagnostic);
    }
}

/// Counts what passes through so the host can decide whether to run the
/// next phase.
#[derive(Clone)]
pub struct DiagnosticEmitter {
    errors: Arc<AtomicUsize>,
    warnings: Arc<AtomicUsize>,
    emitter: Rc<dyn DiagnosticEmitterIO>
}

impl DiagnosticEmitter {
    pub fn new(emitter: Rc<dyn DiagnosticEmitterIO>) -> Self {
        Self {
            errors: Arc::new(AtomicUsize::new(0)),
            warnings: Arc::new(AtomicUsize::new(0)),
            emitter,
        }
    }

    pub fn null() -> Self {
        Self::new(Rc::new(NullDiagnosticEmitterIO))
    }

    pub fn reset_count(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        let counter = if diagnostic.is_error() { &self.errors } else { &self.warnings };
        _ = counter.fetch_add(1, Ordering::Relaxed);
        self.emitter.emit_diagnostic(diagnostic);
    }

    pub fn emit_all(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        diagnostics.into_iter().for_each(|diagnostic| self.emit(diagnostic));
    }
}

impl std::fmt::Debug for DiagnosticEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticEmitter")
            .field("errors", &self.error_count())
            .field("warnings", &self.warning_count())
            .finish()
    }
}
