use std::fmt::Display;

use crate::{lexer::prelude::TokenKind, utils::prelude::{Diagnostic, SrcSpan}};
use super::types::Type;

#[derive(Debug)]
pub struct Parsed {
    pub module: Module,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub program: Program
}

// program -> { <statement> } EOF
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub location: SrcSpan
}

impl Program {
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.statements.iter().filter_map(|statement| match &statement.kind {
            StatementKind::Declaration(declaration) => Some(declaration),
            _ => None
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.declarations().filter_map(|declaration| match declaration {
            Declaration::Import(import) => Some(import),
            _ => None
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Public,
    Private,
    Protected,
    Internal,
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let access = match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Internal => "internal",
        };

        write!(f, "{access}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
    pub is_async: bool,
}

impl Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.access)?;

        if self.is_static {
            write!(f, " static")?;
        }
        if self.is_const {
            write!(f, " const")?;
        }
        if self.is_async {
            write!(f, " async")?;
        }

        Ok(())
    }
}

// statement -> <block> | <var_decl> | <if> | <while> | <for> | <foreach> | <do_while>
//            | <return> | <break> | <continue> | <throw> | <try> | <print>
//            | <declaration> | <expression> ";"
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: SrcSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Block(Block),
    Expression(Expression),
    Var(VarDecl),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },
    ForEach {
        variable: String,
        variable_type: Option<Type>,
        collection: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    Return(Option<Expression>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try(TryStatement),
    Print(Expression),
    Declaration(Declaration),
}

impl Statement {
    pub fn new(kind: StatementKind, location: SrcSpan) -> Self {
        Self { kind, location }
    }

    /// Whether control never falls through to the next statement.
    pub fn is_terminator(&self) -> bool {
        matches!(self.kind,
            StatementKind::Return(_)
            | StatementKind::Break(_)
            | StatementKind::Continue(_)
            | StatementKind::Throw(_)
        )
    }
}

// block -> "{" { <statement> } "}"
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: SrcSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Var,
    Let,
    Const,
}

impl Display for Mutability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Var => write!(f, "var"),
            Self::Let => write!(f, "let"),
            Self::Const => write!(f, "const"),
        }
    }
}

// var_decl -> (let | var | const) <identifier> [ ":" <type> ] [ "=" <expression> ] ";"
//           | <type> <identifier> [ "=" <expression> ] ";"
//           | <identifier> ":" <type> [ "=" <expression> ] ";"
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub declared_type: Option<Type>,
    pub initializer: Option<Expression>,
    pub mutability: Mutability,
    pub modifiers: Modifiers,
    pub location: SrcSpan,
}

impl VarDecl {
    pub fn is_const(&self) -> bool {
        self.mutability == Mutability::Const || self.modifiers.is_const
    }
}

// try -> try <block> { catch [ "(" [<type>] <identifier> ")" ] <block> } [ finally <block> ]
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub exception_type: Option<String>,
    pub variable: Option<String>,
    pub body: Block,
    pub location: SrcSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Function(FunctionDecl),
    Class(ClassDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Package {
        name: String,
        location: SrcSpan,
    },
    Import(ImportDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Function(function) => &function.name,
            Self::Class(class) => &class.name,
            Self::Struct(structure) => &structure.name,
            Self::Enum(enumeration) => &enumeration.name,
            Self::Package { name, .. } => name,
            Self::Import(import) => &import.path,
        }
    }

    pub fn location(&self) -> SrcSpan {
        match self {
            Self::Function(function) => function.location,
            Self::Class(class) => class.location,
            Self::Struct(structure) => structure.location,
            Self::Enum(enumeration) => enumeration.location,
            Self::Package { location, .. } => *location,
            Self::Import(import) => import.location,
        }
    }
}

// function -> [<modifiers>] (fn | function | func) <identifier> <parameters> [ ("->" | ":") <type> ] <block>
//           | [<modifiers>] <type> <identifier> <parameters> <block>
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<Type>,
    pub body: Block,
    pub modifiers: Modifiers,
    pub parent_class: Option<String>,
    pub is_constructor: bool,
    pub location: SrcSpan,
}

impl FunctionDecl {
    pub fn is_anonymous(&self) -> bool {
        self.name.starts_with("<anon_")
    }
}

// parameter -> [&] <identifier> [ ":" <type> ] [ "=" <expression> ]
//            | <type> [&] <identifier> [ "=" <expression> ]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Option<Type>,
    pub by_ref: bool,
    pub default: Option<Expression>,
    pub location: SrcSpan,
}

// class -> [<modifiers>] (class | interface) <identifier> [ extends <identifier> ]
//          [ implements <identifier> {, <identifier> } ] "{" { <member> } "}"
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub members: Vec<ClassMember>,
    pub modifiers: Modifiers,
    pub is_interface: bool,
    pub location: SrcSpan,
}

impl ClassDecl {
    pub fn fields(&self) -> impl Iterator<Item = &VarDecl> {
        self.members.iter().filter_map(|member| match member {
            ClassMember::Field(field) => Some(field),
            _ => None
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.members.iter().filter_map(|member| match member {
            ClassMember::Method(method) | ClassMember::Constructor(method) => Some(method),
            ClassMember::Field(_) => None
        })
    }

    pub fn constructor(&self) -> Option<&FunctionDecl> {
        self.members.iter().find_map(|member| match member {
            ClassMember::Constructor(constructor) => Some(constructor),
            _ => None
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Field(VarDecl),
    Method(FunctionDecl),
    Constructor(FunctionDecl),
}

// struct -> struct <identifier> "{" { <field> } "}"
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<VarDecl>,
    pub location: SrcSpan,
}

// enum -> enum <identifier> "{" [ <variant> {, <variant> } ] "}"
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub location: SrcSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub value: Option<Expression>,
    pub location: SrcSpan,
}

// import -> import (<string> | <identifier> { "." <identifier> } [ ".*" ]) [ as <identifier> ] ";"
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    pub alias: Option<String>,
    pub is_wildcard: bool,
    pub location: SrcSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
}

impl BinaryOperator {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        let operator = match kind {
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Star => Self::Mul,
            TokenKind::Slash => Self::Div,
            TokenKind::Percent => Self::Mod,
            TokenKind::EqualEqual => Self::Eq,
            TokenKind::BangEqual => Self::NotEq,
            TokenKind::Less => Self::Less,
            TokenKind::LessEqual => Self::LessEq,
            TokenKind::Greater => Self::Greater,
            TokenKind::GreaterEqual => Self::GreaterEq,
            TokenKind::AndAnd => Self::And,
            TokenKind::OrOr => Self::Or,
            TokenKind::Ampersand => Self::BitAnd,
            TokenKind::Pipe => Self::BitOr,
            TokenKind::Caret => Self::BitXor,
            TokenKind::ShiftLeft => Self::ShiftLeft,
            TokenKind::ShiftRight => Self::ShiftRight,
            TokenKind::UnsignedShiftRight => Self::UnsignedShiftRight,
            _ => return None
        };

        Some(operator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::UnsignedShiftRight => ">>>",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Eq | Self::NotEq | Self::Less | Self::LessEq | Self::Greater | Self::GreaterEq)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self,
            Self::BitAnd | Self::BitOr | Self::BitXor
            | Self::ShiftLeft | Self::ShiftRight | Self::UnsignedShiftRight
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
    BitNot,
    Increment,
    Decrement,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::BitNot => "~",
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOperator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOperator {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        let operator = match kind {
            TokenKind::Assign => Self::Assign,
            TokenKind::PlusAssign => Self::Add,
            TokenKind::MinusAssign => Self::Sub,
            TokenKind::StarAssign => Self::Mul,
            TokenKind::SlashAssign => Self::Div,
            TokenKind::PercentAssign => Self::Mod,
            _ => return None
        };

        Some(operator)
    }

    /// The operator a compound assignment combines with, `None` for `=`.
    pub fn binary(&self) -> Option<BinaryOperator> {
        match self {
            Self::Assign => None,
            Self::Add => Some(BinaryOperator::Add),
            Self::Sub => Some(BinaryOperator::Sub),
            Self::Mul => Some(BinaryOperator::Mul),
            Self::Div => Some(BinaryOperator::Div),
            Self::Mod => Some(BinaryOperator::Mod),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Mod => "%=",
        }
    }
}

// expression -> <assignment> | <ternary> | <binary> | <unary> | <postfix> | <primary>
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub location: SrcSpan,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Number {
        value: f64,
        is_integer: bool,
    },
    String(String),
    Char(char),
    Bool(bool),
    Null,
    Identifier(String),
    This,
    Super,
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
        prefix: bool,
    },
    Assign {
        operator: AssignOperator,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Member {
        target: Box<Expression>,
        name: String,
    },
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    New {
        class_name: String,
        arguments: Vec<Expression>,
    },
    Cast {
        ty: Type,
        operand: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    Array(Vec<Expression>),
    Map(Vec<(Expression, Expression)>),
    Function(Box<FunctionDecl>),
    Await(Box<Expression>),
}

impl Expression {
    pub fn new(kind: ExpressionKind, location: SrcSpan) -> Self {
        Self { kind, location, ty: None }
    }

    pub fn is_assignable(&self) -> bool {
        matches!(self.kind,
            ExpressionKind::Identifier(_)
            | ExpressionKind::Member { .. }
            | ExpressionKind::Index { .. }
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind,
            ExpressionKind::Number { .. }
            | ExpressionKind::String(_)
            | ExpressionKind::Char(_)
            | ExpressionKind::Bool(_)
            | ExpressionKind::Null
        )
    }

    /// Short label used by the AST dump.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExpressionKind::Number { .. } => "Number",
            ExpressionKind::String(_) => "String",
            ExpressionKind::Char(_) => "Char",
            ExpressionKind::Bool(_) => "Bool",
            ExpressionKind::Null => "Null",
            ExpressionKind::Identifier(_) => "Identifier",
            ExpressionKind::This => "This",
            ExpressionKind::Super => "Super",
            ExpressionKind::Binary { .. } => "Binary",
            ExpressionKind::Unary { .. } => "Unary",
            ExpressionKind::Assign { .. } => "Assign",
            ExpressionKind::Call { .. } => "Call",
            ExpressionKind::Member { .. } => "MemberAccess",
            ExpressionKind::Index { .. } => "IndexAccess",
            ExpressionKind::New { .. } => "New",
            ExpressionKind::Cast { .. } => "Cast",
            ExpressionKind::Ternary { .. } => "Ternary",
            ExpressionKind::Array(_) => "ArrayLiteral",
            ExpressionKind::Map(_) => "MapLiteral",
            ExpressionKind::Function(_) => "FunctionLiteral",
            ExpressionKind::Await(_) => "Await",
        }
    }
}

fn join(expressions: &[Expression]) -> String {
    expressions.iter()
        .map(|expression| expression.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Fully parenthesised source form, compound nodes are wrapped so the
/// grouping chosen by the parser is visible.
impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExpressionKind::Number { value, .. } => write!(f, "{value}"),
            ExpressionKind::String(value) => write!(f, "{value:?}"),
            ExpressionKind::Char(value) => write!(f, "{value:?}"),
            ExpressionKind::Bool(value) => write!(f, "{value}"),
            ExpressionKind::Null => write!(f, "null"),
            ExpressionKind::Identifier(name) => write!(f, "{name}"),
            ExpressionKind::This => write!(f, "this"),
            ExpressionKind::Super => write!(f, "super"),
            ExpressionKind::Binary { operator, left, right } => {
                write!(f, "({left} {} {right})", operator.as_str())
            },
            ExpressionKind::Unary { operator, operand, prefix: true } => write!(f, "({}{operand})", operator.as_str()),
            ExpressionKind::Unary { operator, operand, prefix: false } => write!(f, "({operand}{})", operator.as_str()),
            ExpressionKind::Assign { operator, target, value } => {
                write!(f, "({target} {} {value})", operator.as_str())
            },
            ExpressionKind::Call { callee, arguments } => write!(f, "{callee}({})", join(arguments)),
            ExpressionKind::Member { target, name } => write!(f, "{target}.{name}"),
            ExpressionKind::Index { target, index } => write!(f, "{target}[{index}]"),
            ExpressionKind::New { class_name, arguments } => write!(f, "new {class_name}({})", join(arguments)),
            ExpressionKind::Cast { ty, operand } => write!(f, "(({ty}) {operand})"),
            ExpressionKind::Ternary { condition, then_branch, else_branch } => {
                write!(f, "({condition} ? {then_branch} : {else_branch})")
            },
            ExpressionKind::Array(elements) => write!(f, "[{}]", join(elements)),
            ExpressionKind::Map(entries) => {
                let entries = entries.iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect::<Vec<String>>();

                write!(f, "{{{}}}", entries.join(", "))
            },
            ExpressionKind::Function(function) => write!(f, "function {}(..)", function.name),
            ExpressionKind::Await(inner) => write!(f, "(await {inner})"),
        }
    }
}
