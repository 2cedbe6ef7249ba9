use tracing::trace;

use crate::{
    environment::prelude::Value,
    parser::prelude::{Block, CatchClause, Declaration, Expression, Statement, StatementKind, TryStatement}
};
use super::{default_value, error::RuntimeError, with_stack, Flow, Interpreter};

/// Type names in a `catch` clause that accept anything.
const CATCH_ALL: [&str; 5] = ["any", "object", "Exception", "Error", "Throwable"];

impl Interpreter {
    pub(super) fn exec_statement(&mut self, statement: &Statement) -> Result<Flow, RuntimeError> {
        trace!(line = statement.location.line, "executing statement");

        match &statement.kind {
            StatementKind::Block(block) => self.exec_block(block, "block"),
            StatementKind::Expression(expression) => {
                let _ = self.evaluate(expression)?;
                Ok(Flow::Normal)
            },
            StatementKind::Var(declaration) => {
                let value = match &declaration.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => default_value(declaration.declared_type.as_ref()),
                };

                self.env.declare(declaration.name.clone(), value, declaration.is_const());
                Ok(Flow::Normal)
            },
            StatementKind::If { condition, then_branch, else_branch } => {
                match self.evaluate(condition)?.is_truthy() {
                    true => self.exec_statement(then_branch),
                    false => match else_branch {
                        Some(else_branch) => self.exec_statement(else_branch),
                        None => Ok(Flow::Normal),
                    },
                }
            },
            StatementKind::While { condition, body } => self.in_loop(|this| {
                while this.evaluate(condition)?.is_truthy() {
                    match this.exec_statement(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }

                Ok(Flow::Normal)
            }),
            StatementKind::DoWhile { body, condition } => self.in_loop(|this| {
                loop {
                    match this.exec_statement(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }

                    if !this.evaluate(condition)?.is_truthy() {
                        break;
                    }
                }

                Ok(Flow::Normal)
            }),
            StatementKind::For { init, condition, update, body } => {
                self.env.push("for", false);
                let flow = self.exec_for(init.as_deref(), condition.as_ref(), update.as_ref(), body);
                let _ = self.env.pop();
                flow
            },
            StatementKind::ForEach { variable, collection, body, .. } => {
                let items = self.iteration_items(collection)?;

                self.in_loop(|this| {
                    for item in items {
                        this.env.push("foreach", false);
                        this.env.declare(variable.clone(), item, false);
                        let flow = this.exec_statement(body);
                        let _ = this.env.pop();

                        match flow? {
                            Flow::Break => break,
                            Flow::Return(value) => return Ok(Flow::Return(value)),
                            Flow::Normal | Flow::Continue => {}
                        }
                    }

                    Ok(Flow::Normal)
                })
            },
            StatementKind::Return(value) => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Undefined,
                };

                Ok(Flow::Return(value))
            },
            StatementKind::Break(_) => match self.loop_depth {
                0 => Err(RuntimeError::OutsideLoop { keyword: "break", location: statement.location }),
                _ => Ok(Flow::Break),
            },
            StatementKind::Continue(_) => match self.loop_depth {
                0 => Err(RuntimeError::OutsideLoop { keyword: "continue", location: statement.location }),
                _ => Ok(Flow::Continue),
            },
            StatementKind::Throw(value) => {
                let value = self.evaluate(value)?;
                Err(RuntimeError::Thrown { value, location: statement.location })
            },
            StatementKind::Try(statement) => self.exec_try(statement),
            StatementKind::Print(value) => {
                let value = self.evaluate(value)?;
                self.output.write(&format!("{value}\n"));
                Ok(Flow::Normal)
            },
            StatementKind::Declaration(declaration) => {
                // nested declarations become visible once reached
                if let Declaration::Function(function) = declaration {
                    if !self.has_function(&function.name) {
                        self.register_function(function.clone(), None);
                    }
                }

                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `block` in a frame of its own. The frame is dropped on every exit
    /// path, errors included.
    pub(super) fn exec_block(&mut self, block: &Block, name: &str) -> Result<Flow, RuntimeError> {
        self.env.push(name, false);
        let flow = with_stack(|| self.exec_statements(&block.statements));
        let _ = self.env.pop();

        flow
    }

    pub(super) fn exec_statements(&mut self, statements: &[Statement]) -> Result<Flow, RuntimeError> {
        for statement in statements {
            match self.exec_statement(statement)? {
                Flow::Normal => {},
                flow => return Ok(flow),
            }
        }

        Ok(Flow::Normal)
    }

    fn in_loop<F>(&mut self, run: F) -> Result<Flow, RuntimeError>
    where
        F: FnOnce(&mut Self) -> Result<Flow, RuntimeError>
    {
        self.loop_depth += 1;
        let flow = run(self);
        self.loop_depth -= 1;

        flow
    }

    fn exec_for(
        &mut self,
        init: Option<&Statement>,
        condition: Option<&Expression>,
        update: Option<&Expression>,
        body: &Statement
    ) -> Result<Flow, RuntimeError> {
        if let Some(init) = init {
            let _ = self.exec_statement(init)?;
        }

        self.in_loop(|this| {
            loop {
                if let Some(condition) = condition {
                    if !this.evaluate(condition)?.is_truthy() {
                        break;
                    }
                }

                match this.exec_statement(body)? {
                    Flow::Break => break,
                    Flow::Return(value) => return Ok(Flow::Return(value)),
                    Flow::Normal | Flow::Continue => {}
                }

                if let Some(update) = update {
                    let _ = this.evaluate(update)?;
                }
            }

            Ok(Flow::Normal)
        })
    }

    /// Snapshot of what a `for (x in c)` loop visits: array elements, map
    /// keys, characters of a string or property names of an object.
    fn iteration_items(&mut self, collection: &Expression) -> Result<Vec<Value>, RuntimeError> {
        let value = self.evaluate(collection)?;

        let items = match &value {
            Value::Array(elements) => elements.borrow().clone(),
            Value::Map(entries) => entries.borrow()
                .iter()
                .map(|(key, _)| Value::string(key.clone()))
                .collect(),
            Value::String(text) => text.chars()
                .map(|c| Value::String(c.to_string()))
                .collect(),
            Value::Object(id) => match self.heap.get(*id) {
                Some(object) => object.properties()
                    .iter()
                    .filter(|property| !property.is_static)
                    .map(|property| Value::string(property.name.clone()))
                    .collect(),
                None => vec![],
            },
            value => return Err(RuntimeError::NotIterable {
                ty: value.type_name(),
                location: collection.location,
            }),
        };

        Ok(items)
    }

    fn exec_try(&mut self, statement: &TryStatement) -> Result<Flow, RuntimeError> {
        let result = match self.exec_block(&statement.body, "try") {
            Err(error) => match self.find_handler(&statement.catches, &error) {
                Some(handler) => {
                    self.env.push("catch", false);

                    if let Some(variable) = &handler.variable {
                        self.env.declare(variable.clone(), error.caught_value(), false);
                    }

                    let flow = self.exec_statements(&handler.body.statements);
                    let _ = self.env.pop();
                    flow
                },
                None => Err(error),
            },
            result => result,
        };

        // an abrupt `finally` overrides whatever the try part produced
        if let Some(finally) = &statement.finally {
            match self.exec_block(finally, "finally")? {
                Flow::Normal => {},
                flow => return Ok(flow),
            }
        }

        result
    }

    /// First clause able to handle `error`. Untyped clauses and the catch-all
    /// names take anything, others only matching thrown values.
    fn find_handler<'a>(&self, catches: &'a [CatchClause], error: &RuntimeError) -> Option<&'a CatchClause> {
        catches.iter().find(|clause| match clause.exception_type.as_deref() {
            None => true,
            Some(ty) if CATCH_ALL.contains(&ty) => true,
            Some(ty) => match error {
                RuntimeError::Thrown { value, .. } => self.value_matches(value, ty),
                _ => false,
            },
        })
    }

    fn value_matches(&self, value: &Value, ty: &str) -> bool {
        match value {
            Value::Object(id) => self.heap.get(*id)
                .is_some_and(|object| self.is_subclass(&object.class_name, ty)),
            Value::Number(_) => matches!(ty, "number" | "int" | "long" | "float" | "double"),
            Value::String(_) => matches!(ty, "string" | "String"),
            Value::Bool(_) => ty == "bool",
            value => value.type_name() == ty,
        }
    }
}
