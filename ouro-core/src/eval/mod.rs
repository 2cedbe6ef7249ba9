pub mod builtins;
pub mod error;
pub mod operators;
pub mod output;
mod call;
mod expression;
mod statement;

pub mod prelude {
    pub use super::{
        builtins::*,
        error::*,
        output::*,
        Interpreter
    };
}

#[cfg(test)]
mod tests;

use std::{collections::{HashMap, HashSet}, rc::Rc};

use tracing::{debug, warn};

use crate::{
    environment::prelude::{Environment, Heap, Property, Value},
    parser::prelude::{
        Access, ClassDecl, ClassMember, Declaration, EnumDecl, Expression, ExpressionKind,
        FunctionDecl, Modifiers, Module, Mutability, Program, StatementKind, StructDecl, Type,
        VarDecl
    },
    utils::prelude::{Diagnostic, DiagnosticEmitter, Severity, SrcSpan}
};
use self::{builtins::Builtins, error::RuntimeError, output::Output};

pub const DEFAULT_CALL_LIMIT: usize = 10_000;

/// Free stack below which evaluation continues on a fresh segment.
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_SEGMENT: usize = 8 * 1024 * 1024;

/// Runs `f` with at least [`STACK_RED_ZONE`] bytes of stack available.
fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

type FunctionKey = (String, Option<String>);

/// How a statement completed.
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Tree-walking interpreter. Registries, heap and globals survive between
/// calls to [`Interpreter::execute`], which is what the REPL relies on.
pub struct Interpreter {
    functions: HashMap<FunctionKey, Rc<FunctionDecl>>,
    classes: HashMap<String, Rc<ClassDecl>>,
    heap: Heap,
    env: Environment,
    current_class: Option<String>,
    builtins: Builtins,
    output: Rc<dyn Output>,
    diagnostics: DiagnosticEmitter,
    loop_depth: usize,
    call_depth: usize,
    call_limit: usize,
}

impl Interpreter {
    pub fn new(output: Rc<dyn Output>, diagnostics: DiagnosticEmitter) -> Self {
        Self {
            functions: HashMap::new(),
            classes: HashMap::new(),
            heap: Heap::default(),
            env: Environment::new(),
            current_class: None,
            builtins: Builtins::new(),
            output,
            diagnostics,
            loop_depth: 0,
            call_depth: 0,
            call_limit: DEFAULT_CALL_LIMIT,
        }
    }

    pub fn with_builtins(mut self, builtins: Builtins) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn with_call_limit(mut self, limit: usize) -> Self {
        self.call_limit = limit;
        self
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn builtins_mut(&mut self) -> &mut Builtins {
        &mut self.builtins
    }

    pub fn builtin_names(&self) -> HashSet<String> {
        self.builtins.names()
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.env.globals().get(name).map(|binding| &binding.value)
    }

    /// Globals plus registered top-level functions and classes.
    pub fn global_names(&self) -> Vec<String> {
        let mut names = self.env.global_names();

        names.extend(self.functions.keys()
            .filter(|(_, class)| class.is_none())
            .map(|(name, _)| name.clone()));
        names.extend(self.classes.keys().cloned());

        names.sort();
        names.dedup();
        names
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&(name.to_string(), None))
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Registers imported modules, executes the top level of `module` and
    /// finally calls `main` when one is defined.
    pub fn run(&mut self, module: &Module, imports: &[Module]) -> Result<(), RuntimeError> {
        for import in imports {
            debug!(module = %import.name, "merging imported declarations");
            self.load(&import.program);
        }

        self.execute(module)?;

        if let Some(main) = self.find_function("main", None) {
            debug!("calling main");
            let _ = self.call_function(main, vec![], None, module.program.location)?;
        }

        Ok(())
    }

    /// Registers the declarations of `module` and runs its top-level
    /// statements against the global frame.
    pub fn execute(&mut self, module: &Module) -> Result<(), RuntimeError> {
        self.load(&module.program);

        for statement in &module.program.statements {
            if let StatementKind::Declaration(_) = statement.kind {
                continue;
            }

            if let Flow::Return(_) = self.exec_statement(statement)? {
                break;
            }
        }

        Ok(())
    }

    /// Fills the function and class registries from a program.
    pub fn load(&mut self, program: &Program) {
        for declaration in program.declarations() {
            self.register(declaration);
        }

        debug!(
            functions = self.functions.len(),
            classes = self.classes.len(),
            "registered declarations"
        );
    }

    fn register(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Function(function) => {
                self.register_function(function.clone(), None);
            },
            Declaration::Class(class) => {
                for method in class.methods() {
                    self.register_function(method.clone(), Some(&class.name));
                }

                let _ = self.classes.insert(class.name.clone(), Rc::new(class.clone()));
            },
            Declaration::Struct(structure) => {
                let class = struct_class(structure);
                let _ = self.classes.insert(class.name.clone(), Rc::new(class));
            },
            Declaration::Enum(enumeration) => {
                let class = enum_class(enumeration);
                let _ = self.classes.insert(class.name.clone(), Rc::new(class));
            },
            Declaration::Package { .. } | Declaration::Import(_) => {}
        }
    }

    fn register_function(&mut self, mut function: FunctionDecl, class: Option<&str>) {
        function.parent_class = class.map(str::to_string);

        let key = (function.name.clone(), function.parent_class.clone());
        let _ = self.functions.insert(key, Rc::new(function));
    }

    /// Exact match first, then the inheritance chain of `class`.
    fn find_function(&self, name: &str, class: Option<&str>) -> Option<Rc<FunctionDecl>> {
        let Some(class) = class else {
            return self.functions.get(&(name.to_string(), None)).cloned();
        };

        self.ancestry(class)
            .into_iter()
            .find_map(|class| self.functions.get(&(name.to_string(), Some(class))).cloned())
    }

    /// The constructor of `class` or of its nearest ancestor that has one.
    fn find_constructor(&self, class: &str) -> Option<Rc<FunctionDecl>> {
        self.ancestry(class)
            .into_iter()
            .find_map(|class| self.functions.get(&(class.clone(), Some(class))).cloned())
    }

    /// `class` followed by its superclasses, nearest first.
    fn ancestry(&self, class: &str) -> Vec<String> {
        let mut chain = vec![class.to_string()];

        while let Some(parent) = chain.last()
            .and_then(|name| self.classes.get(name))
            .and_then(|class| class.superclass.clone())
        {
            if chain.contains(&parent) {
                break;
            }

            chain.push(parent);
        }

        chain
    }

    fn is_subclass(&self, class: &str, ancestor: &str) -> bool {
        self.ancestry(class).iter().any(|name| name == ancestor)
    }

    /// Whether code running in the current class may touch `property`.
    fn can_access(&self, property: &Property) -> bool {
        match property.access {
            Access::Public | Access::Internal => true,
            Access::Private => self.current_class.as_deref() == Some(property.owner.as_str()),
            Access::Protected => self.current_class.as_deref()
                .is_some_and(|class| self.is_subclass(class, &property.owner)),
        }
    }

    /// Reports a recoverable runtime problem, execution continues.
    fn report(&self, location: SrcSpan, message: impl Into<String>) {
        let diagnostic = Diagnostic::error(Severity::Runtime, location, message);

        warn!(%diagnostic, "runtime diagnostic");
        self.diagnostics.emit(diagnostic);
    }
}

/// Initial value of a declaration without an initializer.
fn default_value(ty: Option<&Type>) -> Value {
    match ty {
        Some(ty) if ty.is_numeric() => Value::Number(0.0),
        Some(Type::Bool) => Value::Bool(false),
        Some(Type::String) => Value::string(""),
        _ => Value::Undefined,
    }
}

fn struct_class(structure: &StructDecl) -> ClassDecl {
    ClassDecl {
        name: structure.name.clone(),
        superclass: None,
        interfaces: vec![],
        members: structure.fields.iter().cloned().map(ClassMember::Field).collect(),
        modifiers: Modifiers::default(),
        is_interface: false,
        location: structure.location,
    }
}

/// Enum values become public static constants numbered from zero, an
/// explicit numeric value restarts the count.
fn enum_class(enumeration: &EnumDecl) -> ClassDecl {
    let mut next = 0.0;

    let members = enumeration.values.iter()
        .map(|value| {
            let initializer = match &value.value {
                Some(expression) => {
                    if let ExpressionKind::Number { value, .. } = expression.kind {
                        next = value;
                    }
                    expression.clone()
                },
                None => Expression::new(
                    ExpressionKind::Number { value: next, is_integer: true },
                    value.location
                ),
            };
            next += 1.0;

            ClassMember::Field(VarDecl {
                name: value.name.clone(),
                declared_type: Some(Type::Int),
                initializer: Some(initializer),
                mutability: Mutability::Const,
                modifiers: Modifiers {
                    access: Access::Public,
                    is_static: true,
                    is_const: true,
                    is_async: false,
                },
                location: value.location,
            })
        })
        .collect();

    ClassDecl {
        name: enumeration.name.clone(),
        superclass: None,
        interfaces: vec![],
        members,
        modifiers: Modifiers::default(),
        is_interface: false,
        location: enumeration.location,
    }
}
