use tracing::debug;

use crate::{
    environment::prelude::Value,
    eval::operators::numeric,
    parser::prelude::{
        BinaryOperator, Block, ClassMember, Declaration, Expression, ExpressionKind, FunctionDecl,
        Program, Statement, StatementKind, Type, UnaryOperator
    }
};

/// Rewrites operations over literals into the literal they produce.
///
/// ```text
/// 10 + 5 * 2     ->  20
/// "a" + "b"      ->  "ab"
/// 1 < 2          ->  true
/// -5, !false     ->  -5, true
/// 1 / 0, x + 1   ->  unchanged
/// ```
#[derive(Debug, Default)]
pub struct ConstantFolder {
    folds: usize,
}

impl ConstantFolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes folded so far.
    pub fn folds(&self) -> usize {
        self.folds
    }

    pub fn fold_program(&mut self, program: &mut Program) {
        for statement in &mut program.statements {
            self.fold_statement(statement);
        }
    }

    fn fold_block(&mut self, block: &mut Block) {
        for statement in &mut block.statements {
            self.fold_statement(statement);
        }
    }

    fn fold_statement(&mut self, statement: &mut Statement) {
        match &mut statement.kind {
            StatementKind::Block(block) => self.fold_block(block),
            StatementKind::Expression(expression)
            | StatementKind::Throw(expression)
            | StatementKind::Print(expression)
            | StatementKind::Return(Some(expression)) => self.fold_expression(expression),
            StatementKind::Var(declaration) => {
                if let Some(initializer) = &mut declaration.initializer {
                    self.fold_expression(initializer);
                }
            },
            StatementKind::If { condition, then_branch, else_branch } => {
                self.fold_expression(condition);
                self.fold_statement(then_branch);

                if let Some(else_branch) = else_branch {
                    self.fold_statement(else_branch);
                }
            },
            StatementKind::While { condition, body }
            | StatementKind::DoWhile { body, condition } => {
                self.fold_expression(condition);
                self.fold_statement(body);
            },
            StatementKind::For { init, condition, update, body } => {
                if let Some(init) = init {
                    self.fold_statement(init);
                }
                if let Some(condition) = condition {
                    self.fold_expression(condition);
                }
                if let Some(update) = update {
                    self.fold_expression(update);
                }

                self.fold_statement(body);
            },
            StatementKind::ForEach { collection, body, .. } => {
                self.fold_expression(collection);
                self.fold_statement(body);
            },
            StatementKind::Try(statement) => {
                self.fold_block(&mut statement.body);

                for handler in &mut statement.catches {
                    self.fold_block(&mut handler.body);
                }

                if let Some(finally) = &mut statement.finally {
                    self.fold_block(finally);
                }
            },
            StatementKind::Declaration(declaration) => self.fold_declaration(declaration),
            StatementKind::Return(None) | StatementKind::Break(_) | StatementKind::Continue(_) => {}
        }
    }

    fn fold_declaration(&mut self, declaration: &mut Declaration) {
        match declaration {
            Declaration::Function(function) => self.fold_function(function),
            Declaration::Class(class) => {
                for member in &mut class.members {
                    match member {
                        ClassMember::Field(field) => {
                            if let Some(initializer) = &mut field.initializer {
                                self.fold_expression(initializer);
                            }
                        },
                        ClassMember::Method(method) | ClassMember::Constructor(method) => {
                            self.fold_function(method);
                        },
                    }
                }
            },
            Declaration::Struct(structure) => {
                for initializer in structure.fields.iter_mut().filter_map(|field| field.initializer.as_mut()) {
                    self.fold_expression(initializer);
                }
            },
            Declaration::Enum(enumeration) => {
                for value in enumeration.values.iter_mut().filter_map(|value| value.value.as_mut()) {
                    self.fold_expression(value);
                }
            },
            Declaration::Package { .. } | Declaration::Import(_) => {}
        }
    }

    fn fold_function(&mut self, function: &mut FunctionDecl) {
        for default in function.parameters.iter_mut().filter_map(|parameter| parameter.default.as_mut()) {
            self.fold_expression(default);
        }

        self.fold_block(&mut function.body);
    }

    /// Children first, so chains such as `1 + 2 + 3` collapse completely.
    fn fold_expression(&mut self, expression: &mut Expression) {
        match &mut expression.kind {
            ExpressionKind::Binary { left, right, .. } => {
                self.fold_expression(left);
                self.fold_expression(right);
            },
            ExpressionKind::Unary { operand, .. }
            | ExpressionKind::Cast { operand, .. }
            | ExpressionKind::Await(operand)
            | ExpressionKind::Member { target: operand, .. } => self.fold_expression(operand),
            ExpressionKind::Assign { target, value, .. } => {
                self.fold_expression(target);
                self.fold_expression(value);
            },
            ExpressionKind::Call { callee, arguments } => {
                self.fold_expression(callee);

                for argument in arguments {
                    self.fold_expression(argument);
                }
            },
            ExpressionKind::Index { target, index } => {
                self.fold_expression(target);
                self.fold_expression(index);
            },
            ExpressionKind::New { arguments: elements, .. } | ExpressionKind::Array(elements) => {
                for element in elements {
                    self.fold_expression(element);
                }
            },
            ExpressionKind::Ternary { condition, then_branch, else_branch } => {
                self.fold_expression(condition);
                self.fold_expression(then_branch);
                self.fold_expression(else_branch);
            },
            ExpressionKind::Map(entries) => {
                for (key, value) in entries {
                    self.fold_expression(key);
                    self.fold_expression(value);
                }
            },
            ExpressionKind::Function(function) => self.fold_function(function),
            _ => {}
        }

        if let Some(kind) = folded(expression) {
            debug!(
                line = expression.location.line,
                column = expression.location.column,
                before = %expression,
                "folded constant expression"
            );

            expression.ty = literal_type(&kind);
            expression.kind = kind;
            self.folds += 1;
        }
    }
}

/// The literal an expression over literals reduces to. The node keeps its
/// own span.
fn folded(expression: &Expression) -> Option<ExpressionKind> {
    match &expression.kind {
        ExpressionKind::Binary { operator, left, right } => {
            let kind = match (&left.kind, &right.kind) {
                (
                    ExpressionKind::Number { value: l, is_integer: l_int },
                    ExpressionKind::Number { value: r, is_integer: r_int }
                ) if is_foldable(*operator) => match numeric(*operator, *l, *r)? {
                    Value::Number(value) => ExpressionKind::Number {
                        value,
                        is_integer: *l_int && *r_int && value.is_finite() && value.fract() == 0.0,
                    },
                    Value::Bool(value) => ExpressionKind::Bool(value),
                    _ => return None
                },
                (ExpressionKind::String(l), ExpressionKind::String(r)) if *operator == BinaryOperator::Add => {
                    ExpressionKind::String(format!("{l}{r}"))
                },
                _ => return None
            };

            Some(kind)
        },
        ExpressionKind::Unary { operator: UnaryOperator::Negate, operand, .. } => match operand.kind {
            ExpressionKind::Number { value, is_integer } => Some(ExpressionKind::Number { value: -value, is_integer }),
            _ => None
        },
        ExpressionKind::Unary { operator: UnaryOperator::Not, operand, .. } => match operand.kind {
            ExpressionKind::Bool(value) => Some(ExpressionKind::Bool(!value)),
            _ => None
        },
        _ => None
    }
}

fn literal_type(kind: &ExpressionKind) -> Option<Type> {
    match kind {
        ExpressionKind::Number { is_integer: true, .. } => Some(Type::Int),
        ExpressionKind::Number { is_integer: false, .. } => Some(Type::Float),
        ExpressionKind::String(_) => Some(Type::String),
        ExpressionKind::Bool(_) => Some(Type::Bool),
        _ => None
    }
}

/// Arithmetic and comparisons. Bitwise operators are left to the runtime.
fn is_foldable(operator: BinaryOperator) -> bool {
    matches!(operator,
        BinaryOperator::Add
        | BinaryOperator::Sub
        | BinaryOperator::Mul
        | BinaryOperator::Div
        | BinaryOperator::Mod
    ) || operator.is_comparison()
}
