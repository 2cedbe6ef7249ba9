use crate::{
    environment::prelude::{AssignError, FunctionRef, ObjectId, Property, Value},
    parser::prelude::{
        Access, BinaryOperator, Expression, ExpressionKind, FunctionDecl, Type, UnaryOperator
    },
    utils::prelude::SrcSpan
};
use super::{
    error::RuntimeError,
    operators::{self, OperatorFault},
    with_stack, Interpreter
};

impl Interpreter {
    pub(super) fn evaluate(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        with_stack(|| self.evaluate_kind(expression))
    }

    fn evaluate_kind(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        let location = expression.location;

        match &expression.kind {
            ExpressionKind::Number { value, .. } => Ok(Value::Number(*value)),
            ExpressionKind::String(value) => Ok(Value::String(value.clone())),
            ExpressionKind::Char(value) => Ok(Value::String(value.to_string())),
            ExpressionKind::Bool(value) => Ok(Value::Bool(*value)),
            ExpressionKind::Null => Ok(Value::Null),
            ExpressionKind::Identifier(name) => self.lookup(name, location),
            ExpressionKind::This | ExpressionKind::Super => Ok(self.env.get("this")
                .cloned()
                .unwrap_or(Value::Undefined)),
            ExpressionKind::Binary { operator: BinaryOperator::And, left, right } => {
                match self.evaluate(left)?.is_truthy() {
                    false => Ok(Value::Bool(false)),
                    true => Ok(Value::Bool(self.evaluate(right)?.is_truthy())),
                }
            },
            ExpressionKind::Binary { operator: BinaryOperator::Or, left, right } => {
                match self.evaluate(left)?.is_truthy() {
                    true => Ok(Value::Bool(true)),
                    false => Ok(Value::Bool(self.evaluate(right)?.is_truthy())),
                }
            },
            ExpressionKind::Binary { operator, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                self.apply_binary(*operator, &left, &right, location)
            },
            ExpressionKind::Unary { operator: operator @ (UnaryOperator::Increment | UnaryOperator::Decrement), operand, prefix } => {
                self.update(*operator, operand, *prefix)
            },
            ExpressionKind::Unary { operator, operand, .. } => {
                let value = self.evaluate(operand)?;

                operators::unary(*operator, &value).ok_or(RuntimeError::InvalidOperand {
                    operator: operator.as_str(),
                    operand: value.type_name(),
                    location,
                })
            },
            ExpressionKind::Assign { operator, target, value } => {
                let place = self.place(target)?;

                let value = match operator.binary() {
                    Some(operator) => {
                        let current = self.read_place(&place, target.location)?;
                        let value = self.evaluate(value)?;
                        self.apply_binary(operator, &current, &value, location)?
                    },
                    None => self.evaluate(value)?,
                };

                self.write_place(place, value.clone(), target.location)?;
                Ok(value)
            },
            ExpressionKind::Call { callee, arguments } => self.call(callee, arguments, location),
            ExpressionKind::Member { target, name } => {
                let target = self.evaluate(target)?;
                self.member(&target, name, location)
            },
            ExpressionKind::Index { target, index } => {
                let target = self.evaluate(target)?;
                let index = self.evaluate(index)?;

                Ok(self.index(&target, &index, location))
            },
            ExpressionKind::New { class_name, arguments } => self.instantiate(class_name, arguments, location),
            ExpressionKind::Cast { ty, operand } => {
                let value = self.evaluate(operand)?;
                Ok(cast(ty, value))
            },
            ExpressionKind::Ternary { condition, then_branch, else_branch } => {
                match self.evaluate(condition)?.is_truthy() {
                    true => self.evaluate(then_branch),
                    false => self.evaluate(else_branch),
                }
            },
            ExpressionKind::Array(elements) => {
                let elements = elements.iter()
                    .map(|element| self.evaluate(element))
                    .collect::<Result<Vec<Value>, RuntimeError>>()?;

                Ok(Value::array(elements))
            },
            ExpressionKind::Map(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());

                for (key, value) in entries {
                    let key = self.evaluate(key)?.to_string();
                    let value = self.evaluate(value)?;

                    set_entry(&mut pairs, key, value);
                }

                Ok(Value::map(pairs))
            },
            ExpressionKind::Function(function) => Ok(self.function_literal(function)),
            ExpressionKind::Await(inner) => self.evaluate(inner),
        }
    }

    /// Binary operation with the recoverable faults turned into diagnostics.
    fn apply_binary(
        &self,
        operator: BinaryOperator,
        left: &Value,
        right: &Value,
        location: SrcSpan
    ) -> Result<Value, RuntimeError> {
        match operators::binary(operator, left, right) {
            Ok(value) => Ok(value),
            Err(OperatorFault::DivisionByZero) => {
                let what = match operator {
                    BinaryOperator::Mod => "modulus",
                    _ => "division",
                };

                self.report(location, format!("{what} by zero"));
                Ok(Value::Number(f64::NAN))
            },
            Err(OperatorFault::InvalidOperands) => Err(RuntimeError::InvalidOperands {
                operator: operator.as_str(),
                left: left.type_name(),
                right: right.type_name(),
                location,
            }),
        }
    }

    /// `++` and `--`, prefix forms yield the new value and postfix forms
    /// the old one.
    fn update(&mut self, operator: UnaryOperator, operand: &Expression, prefix: bool) -> Result<Value, RuntimeError> {
        let place = self.place(operand)?;
        let old = self.read_place(&place, operand.location)?;

        let new = operators::unary(operator, &old).ok_or(RuntimeError::InvalidOperand {
            operator: operator.as_str(),
            operand: old.type_name(),
            location: operand.location,
        })?;

        self.write_place(place, new.clone(), operand.location)?;

        match prefix {
            true => Ok(new),
            false => Ok(old),
        }
    }

    /// Frames first, then the receiver and the static fields of the current
    /// class, then class and function names.
    fn lookup(&mut self, name: &str, location: SrcSpan) -> Result<Value, RuntimeError> {
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }

        if let Some(Value::Object(id)) = self.env.get("this").cloned() {
            if let Some(value) = self.instance_property(id, name, location) {
                return Ok(value);
            }
        }

        if let Some(class) = self.current_class.clone() {
            if let Some(value) = self.static_property(&class, name, location)? {
                return Ok(value);
            }
        }

        if self.classes.contains_key(name) {
            return Ok(Value::Class(name.to_string()));
        }

        if self.has_function(name) {
            return Ok(Value::Function(FunctionRef { name: name.to_string(), class: None }));
        }

        self.report(location, RuntimeError::UndefinedVariable {
            name: name.to_string(),
            location,
        }.to_string());

        Ok(Value::Undefined)
    }

    /// Reads an instance property. A property hidden by its access modifier
    /// reads as `undefined` and is reported.
    fn instance_property(&self, id: ObjectId, name: &str, location: SrcSpan) -> Option<Value> {
        let property = self.heap.get(id)?.get(name)?;
        Some(self.checked_read(property, location))
    }

    /// Reads a static field of `class` or one of its ancestors.
    fn static_property(&mut self, class: &str, name: &str, location: SrcSpan) -> Result<Option<Value>, RuntimeError> {
        let Some(companion) = self.static_owner(class, name)? else {
            return Ok(None);
        };

        let value = self.heap.get(companion)
            .and_then(|object| object.get(name))
            .map(|property| self.checked_read(property, location));

        Ok(value)
    }

    fn checked_read(&self, property: &Property, location: SrcSpan) -> Value {
        if self.can_access(property) {
            return property.value.clone();
        }

        self.report(location, access_message(property));
        Value::Undefined
    }

    pub(super) fn member(&mut self, target: &Value, name: &str, location: SrcSpan) -> Result<Value, RuntimeError> {
        match target {
            Value::Object(id) => {
                if let Some(value) = self.instance_property(*id, name, location) {
                    return Ok(value);
                }

                let class = self.heap.get(*id)
                    .map(|object| object.class_name.clone())
                    .unwrap_or_default();

                if let Some(value) = self.static_property(&class, name, location)? {
                    return Ok(value);
                }

                Ok(self.method_ref(name, &class))
            },
            Value::Class(class) => {
                if let Some(value) = self.static_property(class, name, location)? {
                    return Ok(value);
                }

                Ok(self.method_ref(name, class))
            },
            Value::Map(entries) => {
                let entry = entries.borrow()
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value.clone());

                match (entry, name) {
                    (Some(value), _) => Ok(value),
                    (None, "length" | "size") => Ok(Value::Number(entries.borrow().len() as f64)),
                    (None, _) => Ok(Value::Undefined),
                }
            },
            Value::String(_) | Value::Array(_) if name == "length" => Ok(target.length()
                .map(|length| Value::Number(length as f64))
                .unwrap_or(Value::Undefined)),
            target => Err(RuntimeError::BadMemberAccess {
                name: name.to_string(),
                ty: target.type_name(),
                location,
            }),
        }
    }

    fn method_ref(&self, name: &str, class: &str) -> Value {
        match self.find_function(name, Some(class)) {
            Some(method) => Value::Function(FunctionRef {
                name: name.to_string(),
                class: method.parent_class.clone(),
            }),
            None => Value::Undefined,
        }
    }

    pub(super) fn index(&self, target: &Value, index: &Value, location: SrcSpan) -> Value {
        match target {
            Value::String(text) => {
                let found = position(index, text.chars().count())
                    .and_then(|idx| text.chars().nth(idx));

                match found {
                    Some(c) => Value::String(c.to_string()),
                    None => {
                        self.report(location, format!(
                            "index {index} is out of bounds for a string of length {}",
                            text.chars().count()
                        ));
                        Value::Undefined
                    }
                }
            },
            Value::Array(elements) => {
                let elements = elements.borrow();

                match position(index, elements.len()) {
                    Some(idx) => elements[idx].clone(),
                    None => {
                        self.report(location, format!(
                            "index {index} is out of bounds for an array of length {}",
                            elements.len()
                        ));
                        Value::Undefined
                    }
                }
            },
            Value::Map(entries) => {
                let key = index.to_string();

                entries.borrow()
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| value.clone())
                    .unwrap_or(Value::Undefined)
            },
            _ => Value::Undefined,
        }
    }

    /// Evaluates the object and index of an assignment target, left to right
    /// and exactly once.
    fn place(&mut self, target: &Expression) -> Result<Place, RuntimeError> {
        match &target.kind {
            ExpressionKind::Identifier(name) => Ok(Place::Name(name.clone())),
            ExpressionKind::Member { target, name } => {
                let target = self.evaluate(target)?;
                Ok(Place::Member(target, name.clone()))
            },
            ExpressionKind::Index { target, index } => {
                let target = self.evaluate(target)?;
                let index = self.evaluate(index)?;

                Ok(Place::Index(target, index))
            },
            _ => Err(RuntimeError::InvalidTarget { location: target.location }),
        }
    }

    fn read_place(&mut self, place: &Place, location: SrcSpan) -> Result<Value, RuntimeError> {
        match place {
            Place::Name(name) => self.lookup(name, location),
            Place::Member(target, name) => self.member(target, name, location),
            Place::Index(target, index) => Ok(self.index(target, index, location)),
        }
    }

    fn write_place(&mut self, place: Place, value: Value, location: SrcSpan) -> Result<(), RuntimeError> {
        match place {
            Place::Name(name) => match self.env.set(&name, value.clone()) {
                Ok(()) => Ok(()),
                Err(AssignError::Constant) => Err(RuntimeError::ConstAssignment {
                    name,
                    location,
                }),
                Err(AssignError::Undefined) => self.assign_implicit(&name, value, location),
            },
            Place::Member(target, name) => match target {
                Value::Object(id) => self.set_property(id, &name, value, location),
                Value::Class(class) => {
                    let companion = self.companion(&class)?;
                    self.set_property(companion, &name, value, location)
                },
                Value::Map(entries) => {
                    set_entry(&mut entries.borrow_mut(), name, value);
                    Ok(())
                },
                target => Err(RuntimeError::BadMemberAccess {
                    name,
                    ty: target.type_name(),
                    location,
                }),
            },
            Place::Index(target, index) => match target {
                Value::Array(elements) => {
                    let mut elements = elements.borrow_mut();

                    match position(&index, elements.len()) {
                        Some(idx) => elements[idx] = value,
                        None => self.report(location, format!(
                            "index {index} is out of bounds for an array of length {}",
                            elements.len()
                        )),
                    }

                    Ok(())
                },
                Value::Map(entries) => {
                    set_entry(&mut entries.borrow_mut(), index.to_string(), value);
                    Ok(())
                },
                _ => Err(RuntimeError::InvalidTarget { location }),
            },
        }
    }

    /// A bare name that no frame binds: a field of the receiver or a static
    /// field of the current class.
    fn assign_implicit(&mut self, name: &str, value: Value, location: SrcSpan) -> Result<(), RuntimeError> {
        if let Some(Value::Object(id)) = self.env.get("this").cloned() {
            let owns = self.heap.get(id).is_some_and(|object| object.get(name).is_some());

            if owns {
                return self.set_property(id, name, value, location);
            }
        }

        if let Some(class) = self.current_class.clone() {
            if let Some(companion) = self.static_owner(&class, name)? {
                return self.set_property(companion, name, value, location);
            }
        }

        Err(RuntimeError::UndefinedVariable {
            name: name.to_string(),
            location,
        })
    }

    /// Companion of the nearest class in the chain that declares static `name`.
    fn static_owner(&mut self, class: &str, name: &str) -> Result<Option<ObjectId>, RuntimeError> {
        for class in self.ancestry(class) {
            if !self.classes.contains_key(&class) {
                break;
            }

            let companion = self.companion(&class)?;

            if self.heap.get(companion).is_some_and(|object| object.get(name).is_some()) {
                return Ok(Some(companion));
            }
        }

        Ok(None)
    }

    /// Writes a property, honoring access modifiers and constness. Unknown
    /// names that are not static fields become public instance properties.
    pub(super) fn set_property(
        &mut self,
        id: ObjectId,
        name: &str,
        value: Value,
        location: SrcSpan
    ) -> Result<(), RuntimeError> {
        let Some(object) = self.heap.get(id) else {
            return Err(RuntimeError::InvalidTarget { location });
        };

        let class = object.class_name.clone();

        match object.get(name) {
            Some(property) => {
                if !self.can_access(property) {
                    self.report(location, access_message(property));
                    return Ok(());
                }

                if property.is_const {
                    return Err(RuntimeError::ConstAssignment {
                        name: name.to_string(),
                        location,
                    });
                }
            },
            None => {
                let is_companion = self.heap.companion(&class) == Some(id);

                if !is_companion {
                    if let Some(companion) = self.static_owner(&class, name)? {
                        return self.set_property(companion, name, value, location);
                    }
                }

                if let Some(object) = self.heap.get_mut(id) {
                    object.set(Property {
                        name: name.to_string(),
                        value,
                        access: Access::Public,
                        is_static: is_companion,
                        is_const: false,
                        owner: class,
                    });
                }

                return Ok(());
            }
        }

        if let Some(property) = self.heap.get_mut(id).and_then(|object| object.get_mut(name)) {
            property.value = value;
        }

        Ok(())
    }

    /// Registers a function literal on first evaluation.
    fn function_literal(&mut self, function: &FunctionDecl) -> Value {
        if !self.has_function(&function.name) {
            self.register_function(function.clone(), None);
        }

        Value::Function(FunctionRef {
            name: function.name.clone(),
            class: None,
        })
    }
}

/// An assignment target with its object and index already evaluated.
enum Place {
    Name(String),
    Member(Value, String),
    Index(Value, Value),
}

fn access_message(property: &Property) -> String {
    match property.access {
        Access::Private => format!("'{}' is private to class '{}'", property.name, property.owner),
        _ => format!("'{}' is protected in class '{}'", property.name, property.owner),
    }
}

/// In-bounds integral index.
fn position(index: &Value, length: usize) -> Option<usize> {
    let index = index.as_number()?;

    match index.fract() == 0.0 && index >= 0.0 && (index as usize) < length {
        true => Some(index as usize),
        false => None,
    }
}

fn set_entry(entries: &mut Vec<(String, Value)>, key: String, value: Value) {
    match entries.iter_mut().find(|(name, _)| *name == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

fn cast(ty: &Type, value: Value) -> Value {
    match ty {
        Type::Int | Type::Long => Value::Number(value.as_number().map(f64::trunc).unwrap_or(f64::NAN)),
        Type::Float | Type::Double => Value::Number(value.as_number().unwrap_or(f64::NAN)),
        Type::String => Value::String(value.to_string()),
        Type::Bool => Value::Bool(value.is_truthy()),
        _ => value,
    }
}
