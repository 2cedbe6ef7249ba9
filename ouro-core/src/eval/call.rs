use std::rc::Rc;

use tracing::debug;

use crate::{
    environment::prelude::{ObjectId, Property, Value},
    parser::prelude::{Expression, ExpressionKind, FunctionDecl, VarDecl},
    utils::prelude::SrcSpan
};
use super::{default_value, error::RuntimeError, with_stack, Flow, Interpreter};

impl Interpreter {
    pub(super) fn call(
        &mut self,
        callee: &Expression,
        arguments: &[Expression],
        location: SrcSpan
    ) -> Result<Value, RuntimeError> {
        match &callee.kind {
            ExpressionKind::Super => self.call_super_constructor(arguments, location),
            ExpressionKind::Identifier(name) => self.call_named(name, arguments, location),
            ExpressionKind::Member { target, name } => self.call_member(target, name, arguments, location),
            _ => {
                let callee = self.evaluate(callee)?;
                let arguments = self.arguments(arguments)?;

                self.call_value(callee, arguments, location)
            }
        }
    }

    /// Arguments are evaluated left to right before the callee is entered.
    fn arguments(&mut self, arguments: &[Expression]) -> Result<Vec<Value>, RuntimeError> {
        arguments.iter()
            .map(|argument| self.evaluate(argument))
            .collect()
    }

    /// `name(..)`: a variable, a top-level function, a method of the current
    /// class, and finally a builtin.
    fn call_named(&mut self, name: &str, arguments: &[Expression], location: SrcSpan) -> Result<Value, RuntimeError> {
        // a variable shadows functions of the same name only when it holds one
        if let Some(value) = self.env.get(name).cloned() {
            let shadows = matches!(value, Value::Function(_))
                || !(self.has_function(name) || self.builtins.contains(name));

            if shadows {
                let arguments = self.arguments(arguments)?;
                return self.call_value(value, arguments, location);
            }
        }

        if let Some(function) = self.find_function(name, None) {
            let arguments = self.arguments(arguments)?;
            return self.call_function(function, arguments, None, location);
        }

        if let Some(class) = self.current_class.clone() {
            if let Some(method) = self.find_function(name, Some(class.as_str())) {
                let receiver = match (method.modifiers.is_static, self.env.get("this")) {
                    (false, Some(Value::Object(id))) => Some(*id),
                    _ => None,
                };

                let arguments = self.arguments(arguments)?;
                return self.call_function(method, arguments, receiver, location);
            }
        }

        if let Some(native) = self.builtins.get(name) {
            let arguments = self.arguments(arguments)?;
            debug!(builtin = name, arguments = arguments.len(), "calling builtin");

            return Ok(native(self.output.as_ref(), &arguments));
        }

        Err(RuntimeError::UndefinedFunction {
            name: name.to_string(),
            location,
        })
    }

    /// `target.name(..)` on objects, classes, `super` and maps holding
    /// functions.
    fn call_member(
        &mut self,
        target: &Expression,
        name: &str,
        arguments: &[Expression],
        location: SrcSpan
    ) -> Result<Value, RuntimeError> {
        if let ExpressionKind::Super = target.kind {
            return self.call_super_method(name, arguments, location);
        }

        let target = self.evaluate(target)?;

        match &target {
            Value::Object(id) => {
                let class = self.heap.get(*id)
                    .map(|object| object.class_name.clone())
                    .unwrap_or_default();

                if let Some(method) = self.find_function(name, Some(class.as_str())) {
                    let receiver = match method.modifiers.is_static {
                        true => None,
                        false => Some(*id),
                    };

                    let arguments = self.arguments(arguments)?;
                    return self.call_function(method, arguments, receiver, location);
                }

                match self.member(&target, name, location)? {
                    callee @ Value::Function(_) => {
                        let arguments = self.arguments(arguments)?;
                        self.call_value(callee, arguments, location)
                    },
                    _ => Err(RuntimeError::UndefinedMethod {
                        class,
                        name: name.to_string(),
                        location,
                    }),
                }
            },
            Value::Class(class) => match self.find_function(name, Some(class.as_str())) {
                Some(method) => {
                    let arguments = self.arguments(arguments)?;
                    self.call_function(method, arguments, None, location)
                },
                None => Err(RuntimeError::UndefinedMethod {
                    class: class.clone(),
                    name: name.to_string(),
                    location,
                }),
            },
            Value::Map(_) => match self.member(&target, name, location)? {
                callee @ Value::Function(_) => {
                    let arguments = self.arguments(arguments)?;
                    self.call_value(callee, arguments, location)
                },
                value => Err(RuntimeError::NotCallable {
                    ty: value.type_name(),
                    location,
                }),
            },
            target => Err(RuntimeError::BadMemberAccess {
                name: name.to_string(),
                ty: target.type_name(),
                location,
            }),
        }
    }

    /// `super.name(..)`: same receiver, method search starts at the parent
    /// of the current class.
    fn call_super_method(&mut self, name: &str, arguments: &[Expression], location: SrcSpan) -> Result<Value, RuntimeError> {
        let parent = self.parent_class();

        let method = parent.as_deref()
            .and_then(|parent| self.find_function(name, Some(parent)))
            .ok_or_else(|| RuntimeError::UndefinedMethod {
                class: parent.clone().unwrap_or_default(),
                name: name.to_string(),
                location,
            })?;

        let receiver = match self.env.get("this") {
            Some(Value::Object(id)) => Some(*id),
            _ => None,
        };

        let arguments = self.arguments(arguments)?;
        self.call_function(method, arguments, receiver, location)
    }

    /// `super(..)` inside a constructor runs the parent's constructor on the
    /// object being built.
    fn call_super_constructor(&mut self, arguments: &[Expression], location: SrcSpan) -> Result<Value, RuntimeError> {
        let arguments = self.arguments(arguments)?;

        let constructor = self.parent_class()
            .and_then(|parent| self.find_constructor(&parent));

        let receiver = match self.env.get("this") {
            Some(Value::Object(id)) => Some(*id),
            _ => None,
        };

        if let Some(constructor) = constructor {
            let _ = self.call_function(constructor, arguments, receiver, location)?;
        }

        Ok(Value::Undefined)
    }

    fn parent_class(&self) -> Option<String> {
        self.current_class.as_ref()
            .and_then(|class| self.classes.get(class))
            .and_then(|class| class.superclass.clone())
    }

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, location: SrcSpan) -> Result<Value, RuntimeError> {
        let Value::Function(function) = callee else {
            return Err(RuntimeError::NotCallable {
                ty: callee.type_name(),
                location,
            });
        };

        if let Some(declaration) = self.find_function(&function.name, function.class.as_deref()) {
            return self.call_function(declaration, arguments, None, location);
        }

        match self.builtins.get(&function.name) {
            Some(native) => Ok(native(self.output.as_ref(), &arguments)),
            None => Err(RuntimeError::UndefinedFunction {
                name: function.name,
                location,
            }),
        }
    }

    /// Runs a user function in a fresh call frame on top of the caller's.
    /// Missing arguments take their default or `undefined`, extra ones are
    /// dropped. Interpreter state is restored on every exit path.
    pub(super) fn call_function(
        &mut self,
        function: Rc<FunctionDecl>,
        arguments: Vec<Value>,
        receiver: Option<ObjectId>,
        location: SrcSpan
    ) -> Result<Value, RuntimeError> {
        if self.call_depth >= self.call_limit {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.call_limit,
                location,
            });
        }

        debug!(
            function = %function.name,
            class = function.parent_class.as_deref().unwrap_or("-"),
            depth = self.call_depth,
            "calling function"
        );

        self.env.push(function.name.clone(), true);
        let saved_class = std::mem::replace(&mut self.current_class, function.parent_class.clone());
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.call_depth += 1;

        let result = with_stack(|| self.invoke(&function, arguments, receiver));

        self.call_depth -= 1;
        self.loop_depth = saved_loops;
        self.current_class = saved_class;
        let _ = self.env.pop();

        result
    }

    fn invoke(
        &mut self,
        function: &FunctionDecl,
        arguments: Vec<Value>,
        receiver: Option<ObjectId>
    ) -> Result<Value, RuntimeError> {
        if let Some(id) = receiver {
            self.env.declare("this".to_string(), Value::Object(id), true);
        }

        let mut arguments = arguments.into_iter();

        for parameter in &function.parameters {
            let value = match (arguments.next(), &parameter.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.evaluate(default)?,
                (None, None) => Value::Undefined,
            };

            self.env.declare(parameter.name.clone(), value, false);
        }

        match self.exec_statements(&function.body.statements)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    /// `new C(..)`: fields are initialized from the root class down, then
    /// the nearest constructor runs with `this` bound to the new object.
    pub(super) fn instantiate(
        &mut self,
        class_name: &str,
        arguments: &[Expression],
        location: SrcSpan
    ) -> Result<Value, RuntimeError> {
        if !self.classes.contains_key(class_name) {
            return Err(RuntimeError::UndefinedClass {
                name: class_name.to_string(),
                location,
            });
        }

        let arguments = self.arguments(arguments)?;
        let id = self.heap.allocate(class_name);

        debug!(class = class_name, id, "allocated object");

        for class in self.ancestry(class_name).iter().rev() {
            let Some(declaration) = self.classes.get(class).cloned() else {
                continue;
            };

            for field in declaration.fields().filter(|field| !field.modifiers.is_static) {
                let property = self.field_property(field, class, false)?;

                if let Some(object) = self.heap.get_mut(id) {
                    object.set(property);
                }
            }
        }

        if let Some(constructor) = self.find_constructor(class_name) {
            let _ = self.call_function(constructor, arguments, Some(id), location)?;
        }

        Ok(Value::Object(id))
    }

    /// The static companion of `class`, created and initialized on first use.
    pub(super) fn companion(&mut self, class: &str) -> Result<ObjectId, RuntimeError> {
        if let Some(id) = self.heap.companion(class) {
            return Ok(id);
        }

        let id = self.heap.allocate_companion(class);
        debug!(class, id, "created static companion");

        if let Some(declaration) = self.classes.get(class).cloned() {
            for field in declaration.fields().filter(|field| field.modifiers.is_static) {
                let property = self.field_property(field, class, true)?;

                if let Some(object) = self.heap.get_mut(id) {
                    object.set(property);
                }
            }
        }

        Ok(id)
    }

    /// Builds a property from a field declaration. Initializers see only
    /// globals, with the owning class as the current class.
    fn field_property(&mut self, field: &VarDecl, owner: &str, is_static: bool) -> Result<Property, RuntimeError> {
        let value = match &field.initializer {
            Some(initializer) => {
                let frames = self.env.enter_global();
                let saved_class = self.current_class.replace(owner.to_string());

                let value = self.evaluate(initializer);

                self.current_class = saved_class;
                self.env.restore(frames);
                value?
            },
            None => default_value(field.declared_type.as_ref()),
        };

        Ok(Property {
            name: field.name.clone(),
            value,
            access: field.modifiers.access,
            is_static,
            is_const: field.is_const(),
            owner: owner.to_string(),
        })
    }
}
