use crate::{parser::prelude::Type, utils::prelude::{Diagnostic, Severity, SrcSpan}};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problems {
    errors: Vec<AnalyzeError>,
    warnings: Vec<Warning>,
}

impl Problems {
    pub fn error(&mut self, error: AnalyzeError) {
        self.errors.push(error)
    }

    pub fn take_errors(&mut self) -> Vec<AnalyzeError> {
        std::mem::take(&mut self.errors)
    }

    pub fn warning(&mut self, warning: Warning) {
        self.warnings.push(warning)
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn sort(&mut self) {
        self.errors.sort_by_key(|e| e.location().start);
        self.warnings.sort_by_key(|w| w.location().start);
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum AnalyzeError {
    /// Occurs when a name is used that no enclosing scope declares.
    ///
    /// Example:
    /// ```text
    /// let a = b + 1; <- undefined identifier 'b'
    /// ```
    UndefinedIdentifier {
        location: SrcSpan,
        name: String,
    },
    /// Occurs when a call names neither a user function, a method of the
    /// enclosing class nor a built-in.
    ///
    /// Example:
    /// ```text
    /// missing(1); <- undefined function 'missing'
    /// ```
    UndefinedFunction {
        location: SrcSpan,
        name: String,
    },
    /// Occurs when `new`, `extends` or a type annotation names an unknown class.
    ///
    /// Example:
    /// ```text
    /// let p = new Pointt(); <- unknown class 'Pointt'
    /// ```
    UndefinedClass {
        location: SrcSpan,
        name: String,
    },
    /// Occurs when a name is declared twice in the same scope.
    ///
    /// Example:
    /// ```text
    /// class C {}
    /// class C {} <- 'C' is already defined in this scope
    /// ```
    Redefinition {
        location: SrcSpan,
        previous: SrcSpan,
        name: String,
    },
    /// Occurs when a private member is used outside its declaring class, or
    /// a protected one outside the class hierarchy.
    ///
    /// Example:
    /// ```text
    /// class C { private secret = 42; }
    /// print(new C().secret); <- 'secret' is private to class 'C'
    /// ```
    AccessViolation {
        location: SrcSpan,
        member: String,
        class: String,
        is_private: bool,
    },
    /// Occurs when a `const` binding is assigned after its declaration.
    ///
    /// Example:
    /// ```text
    /// const limit = 10;
    /// limit = 11; <- cannot assign to constant 'limit'
    /// ```
    ConstAssignment {
        location: SrcSpan,
        name: String,
    },
    /// Occurs when a value of one type is stored where another is expected.
    ///
    /// Example:
    /// ```text
    /// int a = "text"; <- type mismatch: expected int, got string
    /// ```
    TypeMismatch {
        location: SrcSpan,
        expected: Type,
        got: Type,
    },
    /// Occurs when a `void` function returns a value.
    ///
    /// Example:
    /// ```text
    /// void log() { return 1; } <- function 'log' is void and cannot return a value
    /// ```
    ReturnValueFromVoid {
        location: SrcSpan,
        function: String,
    },
    /// Occurs when a function declared with a result type returns nothing.
    ///
    /// Example:
    /// ```text
    /// int f() { return; } <- function 'f' must return a value of type int
    /// ```
    MissingReturnValue {
        location: SrcSpan,
        function: String,
        expected: Type,
    },
    /// Occurs when the condition of `if`, `while` or `for` is not boolean.
    ///
    /// Example:
    /// ```text
    /// if ("yes") {} <- condition of 'if' must be bool, got string
    /// ```
    NonBooleanCondition {
        location: SrcSpan,
        construct: &'static str,
        got: Type,
    },
    /// Occurs when the operand types do not fit a binary operator.
    ///
    /// Example:
    /// ```text
    /// let a = true - 1; <- operator '-' cannot be applied to bool and int
    /// ```
    OperatorMismatch {
        location: SrcSpan,
        operator: &'static str,
        left: Type,
        right: Type,
    },
    /// Occurs when the operand type does not fit a unary operator.
    ///
    /// Example:
    /// ```text
    /// let a = -"text"; <- operator '-' cannot be applied to string
    /// ```
    InvalidUnaryOperation {
        location: SrcSpan,
        operator: &'static str,
        operand: Type,
    },
    /// Occurs when a member is read from a primitive type that has none.
    ///
    /// Example:
    /// ```text
    /// let n = 5;
    /// print(n.size); <- type int has no member 'size'
    /// ```
    UnknownMember {
        location: SrcSpan,
        ty: Type,
        member: String,
    },
    /// Occurs when `this` or `super` is used outside a class body.
    ///
    /// Example:
    /// ```text
    /// fn f() { return this; } <- 'this' used outside of a class
    /// ```
    OutsideClass {
        location: SrcSpan,
        keyword: &'static str,
    },
}

impl AnalyzeError {
    pub fn location(&self) -> SrcSpan {
        match self {
            AnalyzeError::UndefinedIdentifier { location, .. }
            | AnalyzeError::UndefinedFunction { location, .. }
            | AnalyzeError::UndefinedClass { location, .. }
            | AnalyzeError::Redefinition { location, .. }
            | AnalyzeError::AccessViolation { location, .. }
            | AnalyzeError::ConstAssignment { location, .. }
            | AnalyzeError::TypeMismatch { location, .. }
            | AnalyzeError::ReturnValueFromVoid { location, .. }
            | AnalyzeError::MissingReturnValue { location, .. }
            | AnalyzeError::NonBooleanCondition { location, .. }
            | AnalyzeError::OperatorMismatch { location, .. }
            | AnalyzeError::InvalidUnaryOperation { location, .. }
            | AnalyzeError::UnknownMember { location, .. }
            | AnalyzeError::OutsideClass { location, .. } => *location
        }
    }

    pub fn details(&self) -> String {
        match self {
            AnalyzeError::UndefinedIdentifier { name, .. } => format!("undefined identifier '{name}'"),
            AnalyzeError::UndefinedFunction { name, .. } => format!("undefined function '{name}'"),
            AnalyzeError::UndefinedClass { name, .. } => format!("unknown class '{name}'"),
            AnalyzeError::Redefinition { name, .. } => format!("'{name}' is already defined in this scope"),
            AnalyzeError::AccessViolation { member, class, is_private: true, .. } => {
                format!("'{member}' is private to class '{class}'")
            },
            AnalyzeError::AccessViolation { member, class, is_private: false, .. } => {
                format!("'{member}' is protected in class '{class}'")
            },
            AnalyzeError::ConstAssignment { name, .. } => format!("cannot assign to constant '{name}'"),
            AnalyzeError::TypeMismatch { expected, got, .. } => format!("type mismatch: expected {expected}, got {got}"),
            AnalyzeError::ReturnValueFromVoid { function, .. } => {
                format!("function '{function}' is void and cannot return a value")
            },
            AnalyzeError::MissingReturnValue { function, expected, .. } => {
                format!("function '{function}' must return a value of type {expected}")
            },
            AnalyzeError::NonBooleanCondition { construct, got, .. } => {
                format!("condition of '{construct}' must be bool, got {got}")
            },
            AnalyzeError::OperatorMismatch { operator, left, right, .. } => {
                format!("operator '{operator}' cannot be applied to {left} and {right}")
            },
            AnalyzeError::InvalidUnaryOperation { operator, operand, .. } => {
                format!("operator '{operator}' cannot be applied to {operand}")
            },
            AnalyzeError::UnknownMember { ty, member, .. } => format!("type {ty} has no member '{member}'"),
            AnalyzeError::OutsideClass { keyword, .. } => format!("'{keyword}' used outside of a class"),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(Severity::Semantic, self.location(), self.details());

        match self {
            AnalyzeError::Redefinition { previous, .. } => {
                diagnostic.with_extra_label(*previous, "first defined here")
            },
            _ => diagnostic
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Warning {
    UnreachableCode {
        location: SrcSpan
    },
    UnreachableIfClause {
        location: SrcSpan
    },
    UnreachableElseClause {
        location: SrcSpan
    },
    UnreachableWhileClause {
        location: SrcSpan
    },
}

impl Warning {
    pub fn location(&self) -> SrcSpan {
        match self {
            Warning::UnreachableCode { location }
            | Warning::UnreachableIfClause { location }
            | Warning::UnreachableElseClause { location }
            | Warning::UnreachableWhileClause { location } => *location
        }
    }

    pub fn details(&self) -> &'static str {
        match self {
            Warning::UnreachableCode { .. } => "unreachable code",
            Warning::UnreachableIfClause { .. } => "condition is always false, the branch never runs",
            Warning::UnreachableElseClause { .. } => "condition is always true, the else branch never runs",
            Warning::UnreachableWhileClause { .. } => "loop condition is always false, the body never runs",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(Severity::Semantic, self.location(), self.details())
    }
}
