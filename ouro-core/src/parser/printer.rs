use std::fmt::Write;

use crate::utils::prelude::SrcSpan;
use super::ast::{
    Block, ClassMember, Declaration, Expression, ExpressionKind, FunctionDecl, Program,
    Statement, StatementKind, VarDecl
};

/// Renders a program as an indented tree, one node per line:
/// `Kind 'lexeme' (line,col) : type`.
pub fn dump_program(program: &Program) -> String {
    let mut printer = AstPrinter::default();
    printer.line("Program", None, program.location, None);

    printer.nested(|printer| {
        for statement in &program.statements {
            printer.statement(statement);
        }
    });

    printer.out
}

pub fn dump_expression(expression: &Expression) -> String {
    let mut printer = AstPrinter::default();
    printer.expression(expression);
    printer.out
}

#[derive(Default)]
struct AstPrinter {
    out: String,
    depth: usize,
}

impl AstPrinter {
    fn line(&mut self, kind: &str, lexeme: Option<&str>, location: SrcSpan, ty: Option<String>) {
        let _ = write!(self.out, "{}{kind}", "  ".repeat(self.depth));

        if let Some(lexeme) = lexeme {
            let _ = write!(self.out, " '{lexeme}'");
        }

        let _ = write!(self.out, " ({},{})", location.line, location.column);

        if let Some(ty) = ty {
            let _ = write!(self.out, " : {ty}");
        }

        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn block(&mut self, block: &Block) {
        self.line("Block", None, block.location, None);
        self.nested(|printer| {
            for statement in &block.statements {
                printer.statement(statement);
            }
        });
    }

    fn var(&mut self, var: &VarDecl) {
        let ty = var.declared_type.as_ref().map(|ty| ty.to_string());
        let label = format!("{} {}", var.mutability, var.name);

        self.line("VarDecl", Some(&label), var.location, ty);

        if let Some(initializer) = &var.initializer {
            self.nested(|printer| printer.expression(initializer));
        }
    }

    fn function(&mut self, function: &FunctionDecl) {
        let kind = match function.is_constructor {
            true => "Constructor",
            false => "Function",
        };
        let ty = function.return_type.as_ref().map(|ty| ty.to_string());

        self.line(kind, Some(&function.name), function.location, ty);

        self.nested(|printer| {
            for parameter in &function.parameters {
                let ty = parameter.ty.as_ref().map(|ty| ty.to_string());
                printer.line("Parameter", Some(&parameter.name), parameter.location, ty);
            }

            printer.block(&function.body);
        });
    }

    fn statement(&mut self, statement: &Statement) {
        let location = statement.location;

        match &statement.kind {
            StatementKind::Block(block) => self.block(block),
            StatementKind::Expression(expression) => {
                self.line("ExprStmt", None, location, None);
                self.nested(|printer| printer.expression(expression));
            },
            StatementKind::Var(var) => self.var(var),
            StatementKind::If { condition, then_branch, else_branch } => {
                self.line("If", None, location, None);
                self.nested(|printer| {
                    printer.expression(condition);
                    printer.statement(then_branch);

                    if let Some(else_branch) = else_branch {
                        printer.statement(else_branch);
                    }
                });
            },
            StatementKind::While { condition, body } => {
                self.line("While", None, location, None);
                self.nested(|printer| {
                    printer.expression(condition);
                    printer.statement(body);
                });
            },
            StatementKind::For { init, condition, update, body } => {
                self.line("For", None, location, None);
                self.nested(|printer| {
                    if let Some(init) = init {
                        printer.statement(init);
                    }
                    if let Some(condition) = condition {
                        printer.expression(condition);
                    }
                    if let Some(update) = update {
                        printer.expression(update);
                    }
                    printer.statement(body);
                });
            },
            StatementKind::ForEach { variable, variable_type, collection, body } => {
                let ty = variable_type.as_ref().map(|ty| ty.to_string());

                self.line("ForEach", Some(variable), location, ty);
                self.nested(|printer| {
                    printer.expression(collection);
                    printer.statement(body);
                });
            },
            StatementKind::DoWhile { body, condition } => {
                self.line("DoWhile", None, location, None);
                self.nested(|printer| {
                    printer.statement(body);
                    printer.expression(condition);
                });
            },
            StatementKind::Return(value) => {
                self.line("Return", None, location, None);

                if let Some(value) = value {
                    self.nested(|printer| printer.expression(value));
                }
            },
            StatementKind::Break(label) => self.line("Break", label.as_deref(), location, None),
            StatementKind::Continue(label) => self.line("Continue", label.as_deref(), location, None),
            StatementKind::Throw(value) => {
                self.line("Throw", None, location, None);
                self.nested(|printer| printer.expression(value));
            },
            StatementKind::Try(statement) => {
                self.line("TryCatchFinally", None, location, None);
                self.nested(|printer| {
                    printer.block(&statement.body);

                    for catch in &statement.catches {
                        printer.line("Catch", catch.variable.as_deref(), catch.location, catch.exception_type.clone());
                        printer.nested(|printer| printer.block(&catch.body));
                    }

                    if let Some(finally) = &statement.finally {
                        printer.block(finally);
                    }
                });
            },
            StatementKind::Print(value) => {
                self.line("Print", None, location, None);
                self.nested(|printer| printer.expression(value));
            },
            StatementKind::Declaration(declaration) => self.declaration(declaration),
        }
    }

    fn declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Function(function) => self.function(function),
            Declaration::Class(class) => {
                let kind = match class.is_interface {
                    true => "Interface",
                    false => "Class",
                };

                self.line(kind, Some(&class.name), class.location, class.superclass.clone());
                self.nested(|printer| {
                    for member in &class.members {
                        match member {
                            ClassMember::Field(field) => printer.var(field),
                            ClassMember::Method(method) | ClassMember::Constructor(method) => printer.function(method),
                        }
                    }
                });
            },
            Declaration::Struct(structure) => {
                self.line("Struct", Some(&structure.name), structure.location, None);
                self.nested(|printer| structure.fields.iter().for_each(|field| printer.var(field)));
            },
            Declaration::Enum(enumeration) => {
                self.line("Enum", Some(&enumeration.name), enumeration.location, None);
                self.nested(|printer| {
                    for value in &enumeration.values {
                        printer.line("EnumValue", Some(&value.name), value.location, None);
                    }
                });
            },
            Declaration::Package { name, location } => self.line("Package", Some(name), *location, None),
            Declaration::Import(import) => {
                let mut path = import.path.clone();
                if import.is_wildcard {
                    path.push_str(".*");
                }

                self.line("Import", Some(&path), import.location, import.alias.clone());
            },
        }
    }

    fn expression(&mut self, expression: &Expression) {
        let ty = expression.ty.as_ref().map(|ty| ty.to_string());
        let kind = expression.kind_name();
        let location = expression.location;

        match &expression.kind {
            ExpressionKind::Number { .. }
            | ExpressionKind::String(_)
            | ExpressionKind::Char(_)
            | ExpressionKind::Bool(_)
            | ExpressionKind::Null
            | ExpressionKind::This
            | ExpressionKind::Super => {
                self.line(kind, Some(&expression.to_string()), location, ty);
            },
            ExpressionKind::Identifier(name) => self.line(kind, Some(name), location, ty),
            ExpressionKind::Binary { operator, left, right } => {
                self.line(kind, Some(operator.as_str()), location, ty);
                self.nested(|printer| {
                    printer.expression(left);
                    printer.expression(right);
                });
            },
            ExpressionKind::Unary { operator, operand, .. } => {
                self.line(kind, Some(operator.as_str()), location, ty);
                self.nested(|printer| printer.expression(operand));
            },
            ExpressionKind::Assign { operator, target, value } => {
                self.line(kind, Some(operator.as_str()), location, ty);
                self.nested(|printer| {
                    printer.expression(target);
                    printer.expression(value);
                });
            },
            ExpressionKind::Call { callee, arguments } => {
                self.line(kind, None, location, ty);
                self.nested(|printer| {
                    printer.expression(callee);
                    arguments.iter().for_each(|argument| printer.expression(argument));
                });
            },
            ExpressionKind::Member { target, name } => {
                self.line(kind, Some(name), location, ty);
                self.nested(|printer| printer.expression(target));
            },
            ExpressionKind::Index { target, index } => {
                self.line(kind, None, location, ty);
                self.nested(|printer| {
                    printer.expression(target);
                    printer.expression(index);
                });
            },
            ExpressionKind::New { class_name, arguments } => {
                self.line(kind, Some(class_name), location, ty);
                self.nested(|printer| arguments.iter().for_each(|argument| printer.expression(argument)));
            },
            ExpressionKind::Cast { ty: target, operand } => {
                self.line(kind, Some(&target.to_string()), location, ty);
                self.nested(|printer| printer.expression(operand));
            },
            ExpressionKind::Ternary { condition, then_branch, else_branch } => {
                self.line(kind, None, location, ty);
                self.nested(|printer| {
                    printer.expression(condition);
                    printer.expression(then_branch);
                    printer.expression(else_branch);
                });
            },
            ExpressionKind::Array(elements) => {
                self.line(kind, None, location, ty);
                self.nested(|printer| elements.iter().for_each(|element| printer.expression(element)));
            },
            ExpressionKind::Map(entries) => {
                self.line(kind, None, location, ty);
                self.nested(|printer| {
                    for (key, value) in entries {
                        printer.expression(key);
                        printer.expression(value);
                    }
                });
            },
            ExpressionKind::Function(function) => {
                self.line(kind, Some(&function.name), location, ty);
                self.nested(|printer| printer.function(function));
            },
            ExpressionKind::Await(inner) => {
                self.line(kind, None, location, ty);
                self.nested(|printer| printer.expression(inner));
            },
        }
    }
}
