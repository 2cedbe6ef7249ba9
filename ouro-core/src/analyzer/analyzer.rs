use std::collections::HashSet;

use tracing::debug;

use crate::{
    analyzer::prelude::{AnalyzeError, Problems, Warning},
    parser::prelude::{
        Access, AssignOperator, Block, ClassDecl, ClassMember, Declaration, Expression, ExpressionKind,
        FunctionDecl, Module, Program, Statement, StatementKind, StructDecl, Type, UnaryOperator, VarDecl
    },
    utils::prelude::{DiagnosticEmitter, SrcSpan}
};
use super::{
    infer::{binary_type, builtin_type, common_type, is_assignable, is_condition, unary_type},
    symbol_table::{ClassInfo, ClassTable, MemberInfo, Symbol, SymbolKind, SymbolTable}
};

pub enum Outcome<T, E> {
    Ok(T),
    PartialFailure(T, E)
}

/// What the host knows beyond the module being analyzed.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions<'a> {
    /// Already analyzed modules whose functions and classes are merged in.
    pub imports: &'a [Module],
    pub builtins: &'a HashSet<String>,
    /// Names the host already bound, for example by earlier REPL lines.
    pub predefined: &'a [String],
}

#[derive(Debug)]
struct FunctionContext {
    name: String,
    return_type: Option<Type>,
}

#[derive(Debug)]
pub struct ModuleAnalyzer<'a> {
    problems: Problems,
    symbols: SymbolTable,
    classes: ClassTable,
    builtins: &'a HashSet<String>,
    functions: Vec<FunctionContext>,
}

impl<'a> ModuleAnalyzer<'a> {
    pub fn analyze(
        mut module: Module,
        options: &AnalyzeOptions<'a>,
        warnings: &DiagnosticEmitter
    ) -> Outcome<Module, Vec<AnalyzeError>> {
        let mut analyzer = ModuleAnalyzer {
            problems: Default::default(),
            symbols: SymbolTable::new(),
            classes: ClassTable::default(),
            builtins: options.builtins,
            functions: vec![],
        };

        for import in options.imports {
            analyzer.predeclare(&import.program);
        }
        analyzer.predeclare(&module.program);

        for name in options.predefined {
            if analyzer.symbols.lookup(name).is_none() {
                let symbol = Symbol::new(name.clone(), SymbolKind::Variable, Type::Any, SrcSpan::default());
                let _ = analyzer.symbols.define(symbol);
            }
        }

        analyzer.statements(&mut module.program.statements);

        analyzer.problems.sort();

        for warning in analyzer.problems.take_warnings() {
            warnings.emit(warning.to_diagnostic());
        }

        let errors = analyzer.problems.take_errors();
        debug!(module = %module.name, errors = errors.len(), "analyzed module");

        match errors.is_empty() {
            true => Outcome::Ok(module),
            false => Outcome::PartialFailure(module, errors)
        }
    }

    /// Registers top-level functions and types so bodies may refer to
    /// declarations further down the file.
    fn predeclare(&mut self, program: &Program) {
        for declaration in program.declarations() {
            match declaration {
                Declaration::Function(function) => self.declare_function(function),
                Declaration::Class(class) => self.declare_class(class),
                Declaration::Struct(structure) => self.declare_struct(structure),
                Declaration::Enum(enumeration) => {
                    let symbol = Symbol::new(
                        enumeration.name.clone(),
                        SymbolKind::Type,
                        Type::Named(enumeration.name.clone()),
                        enumeration.location
                    );

                    if self.define(symbol) {
                        self.classes.insert(ClassInfo::from_enum(enumeration));
                    }
                },
                Declaration::Package { .. } | Declaration::Import(_) => {}
            }
        }
    }

    fn declare_function(&mut self, function: &FunctionDecl) {
        let ty = function.return_type.clone().unwrap_or(Type::Any);
        let mut symbol = Symbol::new(function.name.clone(), SymbolKind::Function, ty, function.location)
            .with_modifiers(function.modifiers);

        if let Some(class) = &function.parent_class {
            symbol = symbol.owned_by(class.clone());
        }

        let _ = self.define(symbol);
    }

    fn declare_class(&mut self, class: &ClassDecl) {
        let symbol = Symbol::new(class.name.clone(), SymbolKind::Class, Type::Named(class.name.clone()), class.location)
            .with_modifiers(class.modifiers);

        if self.define(symbol) {
            self.classes.insert(ClassInfo::from_class(class));
        }
    }

    fn declare_struct(&mut self, structure: &StructDecl) {
        let symbol = Symbol::new(
            structure.name.clone(),
            SymbolKind::Struct,
            Type::Named(structure.name.clone()),
            structure.location
        );

        if self.define(symbol) {
            self.classes.insert(ClassInfo::from_struct(structure));
        }
    }

    /// Defines in the innermost scope, reporting a clash. Returns whether
    /// the symbol was added.
    fn define(&mut self, symbol: Symbol) -> bool {
        let location = symbol.location;
        let name = symbol.name.clone();

        match self.symbols.define(symbol) {
            Ok(()) => true,
            Err(existing) => {
                self.problems.error(AnalyzeError::Redefinition {
                    location,
                    previous: existing.location,
                    name,
                });
                false
            }
        }
    }

    fn statements(&mut self, statements: &mut [Statement]) {
        let mut terminated = false;
        let mut reported = false;

        for statement in statements {
            if terminated && !reported {
                self.problems.warning(Warning::UnreachableCode { location: statement.location });
                reported = true;
            }

            self.analyze_statement(statement);
            terminated |= statement.is_terminator();
        }
    }

    fn block(&mut self, block: &mut Block) {
        self.symbols.enter(format!("block_L{}", block.location.line));
        self.statements(&mut block.statements);
        let _ = self.symbols.exit();
    }

    fn analyze_statement(&mut self, statement: &mut Statement) {
        let location = statement.location;

        match &mut statement.kind {
            StatementKind::Block(block) => self.block(block),
            StatementKind::Expression(expression) => {
                let _ = self.expression(expression);
            },
            StatementKind::Var(var) => {
                let symbol = self.var_decl(var);
                let _ = self.define(symbol);
            },
            StatementKind::If { condition, then_branch, else_branch } => {
                self.condition(condition, "if");

                match (&condition.kind, &else_branch) {
                    (ExpressionKind::Bool(false), _) => {
                        self.problems.warning(Warning::UnreachableIfClause { location: then_branch.location });
                    },
                    (ExpressionKind::Bool(true), Some(else_branch)) => {
                        self.problems.warning(Warning::UnreachableElseClause { location: else_branch.location });
                    },
                    _ => {}
                }

                self.analyze_statement(then_branch);

                if let Some(else_branch) = else_branch {
                    self.analyze_statement(else_branch);
                }
            },
            StatementKind::While { condition, body } => {
                self.condition(condition, "while");

                if let ExpressionKind::Bool(false) = condition.kind {
                    self.problems.warning(Warning::UnreachableWhileClause { location: body.location });
                }

                self.analyze_statement(body);
            },
            StatementKind::For { init, condition, update, body } => {
                self.symbols.enter(format!("for_loop_L{}", location.line));

                if let Some(init) = init {
                    self.analyze_statement(init);
                }
                if let Some(condition) = condition {
                    self.condition(condition, "for");
                }
                if let Some(update) = update {
                    let _ = self.expression(update);
                }

                self.analyze_statement(body);

                let _ = self.symbols.exit();
            },
            StatementKind::ForEach { variable, variable_type, collection, body } => {
                let collection_type = self.expression(collection);

                self.symbols.enter(format!("for_loop_L{}", location.line));

                let ty = match variable_type {
                    Some(ty) => {
                        self.check_type_exists(ty, location);
                        ty.clone()
                    },
                    None if collection_type.is_map() => Type::String,
                    None => collection_type.element_type(),
                };

                let _ = self.define(Symbol::new(variable.clone(), SymbolKind::Variable, ty, location));
                self.analyze_statement(body);

                let _ = self.symbols.exit();
            },
            StatementKind::DoWhile { body, condition } => {
                self.analyze_statement(body);
                self.condition(condition, "do-while");
            },
            StatementKind::Return(value) => self.return_statement(value.as_mut(), location),
            StatementKind::Break(_) | StatementKind::Continue(_) => {},
            StatementKind::Throw(value) | StatementKind::Print(value) => {
                let _ = self.expression(value);
            },
            StatementKind::Try(statement) => {
                self.block(&mut statement.body);

                for catch in &mut statement.catches {
                    self.symbols.enter(format!("block_L{}", catch.location.line));

                    if let Some(variable) = &catch.variable {
                        let ty = match &catch.exception_type {
                            Some(name) if self.classes.contains(name) => Type::Named(name.clone()),
                            _ => Type::Any,
                        };

                        let _ = self.define(Symbol::new(variable.clone(), SymbolKind::Variable, ty, catch.location));
                    }

                    self.statements(&mut catch.body.statements);
                    let _ = self.symbols.exit();
                }

                if let Some(finally) = &mut statement.finally {
                    self.block(finally);
                }
            },
            StatementKind::Declaration(declaration) => self.declaration(declaration),
        }
    }

    fn condition(&mut self, condition: &mut Expression, construct: &'static str) {
        let ty = self.expression(condition);

        if !is_condition(&ty) {
            self.problems.error(AnalyzeError::NonBooleanCondition {
                location: condition.location,
                construct,
                got: ty,
            });
        }
    }

    /// Checks a variable or field declaration and returns the symbol it
    /// introduces, leaving the definition to the caller.
    fn var_decl(&mut self, var: &mut VarDecl) -> Symbol {
        let got = var.initializer.as_mut().map(|initializer| {
            let ty = self.expression(initializer);
            (ty, initializer.location)
        });

        if let Some(declared) = &var.declared_type {
            self.check_type_exists(declared, var.location);
        }

        let ty = match (&var.declared_type, got) {
            (Some(declared), Some((got, location))) => {
                if !is_assignable(declared, &got, &self.classes) {
                    self.problems.error(AnalyzeError::TypeMismatch {
                        location,
                        expected: declared.clone(),
                        got,
                    });
                }

                declared.clone()
            },
            (Some(declared), None) => declared.clone(),
            (None, Some((Type::Null | Type::Void, _))) | (None, None) => Type::Any,
            (None, Some((got, _))) => got,
        };

        let mut modifiers = var.modifiers;
        modifiers.is_const |= var.is_const();

        Symbol::new(var.name.clone(), SymbolKind::Variable, ty, var.location).with_modifiers(modifiers)
    }

    fn check_type_exists(&mut self, ty: &Type, location: SrcSpan) {
        match ty {
            Type::Named(name) => {
                if !self.classes.contains(name) && self.symbols.lookup(name).is_none() {
                    self.problems.error(AnalyzeError::UndefinedClass { location, name: name.clone() });
                }
            },
            Type::Array(element) => self.check_type_exists(element, location),
            Type::Generic { arguments, .. } => {
                for argument in arguments {
                    self.check_type_exists(argument, location);
                }
            },
            _ => {}
        }
    }

    fn return_statement(&mut self, value: Option<&mut Expression>, location: SrcSpan) {
        let got = value.map(|value| (self.expression(value), value.location));

        let Some(context) = self.functions.last() else {
            return;
        };
        let Some(expected) = context.return_type.clone() else {
            return;
        };
        let function = context.name.clone();

        match (expected, got) {
            (Type::Void, Some(_)) => {
                self.problems.error(AnalyzeError::ReturnValueFromVoid { location, function });
            },
            (Type::Void, None) => {},
            (expected, _) if expected.is_permissive() => {},
            (expected, None) => {
                self.problems.error(AnalyzeError::MissingReturnValue { location, function, expected });
            },
            (expected, Some((got, location))) => {
                if !is_assignable(&expected, &got, &self.classes) {
                    self.problems.error(AnalyzeError::TypeMismatch { location, expected, got });
                }
            },
        }
    }

    fn declaration(&mut self, declaration: &mut Declaration) {
        let nested = self.symbols.level() > 0;

        match declaration {
            Declaration::Function(function) => {
                if nested {
                    self.declare_function(function);
                }

                let scope = format!("function_{}", function.name);
                self.function(function, scope);
            },
            Declaration::Class(class) => {
                if nested {
                    self.declare_class(class);
                }

                self.class(class);
            },
            Declaration::Struct(structure) => {
                if nested {
                    self.declare_struct(structure);
                }

                self.symbols.enter(format!("struct_{}", structure.name));

                for field in &mut structure.fields {
                    let symbol = self.var_decl(field).owned_by(structure.name.clone());
                    let _ = self.define(symbol);
                }

                let _ = self.symbols.exit();
            },
            Declaration::Enum(enumeration) => {
                for value in &mut enumeration.values {
                    if let Some(value) = &mut value.value {
                        let _ = self.expression(value);
                    }
                }
            },
            Declaration::Package { .. } | Declaration::Import(_) => {}
        }
    }

    fn class(&mut self, class: &mut ClassDecl) {
        let parents = class.superclass.iter().chain(class.interfaces.iter());

        for parent in parents.cloned().collect::<Vec<String>>() {
            if !self.classes.contains(&parent) {
                self.problems.error(AnalyzeError::UndefinedClass { location: class.location, name: parent });
            }
        }

        self.symbols.enter(format!("class_{}", class.name));

        // members are visible to every method regardless of order
        for member in &mut class.members {
            match member {
                ClassMember::Field(field) => {
                    let symbol = self.var_decl(field).owned_by(class.name.clone());
                    let _ = self.define(symbol);
                },
                ClassMember::Method(method) | ClassMember::Constructor(method) => {
                    self.declare_function(method);
                },
            }
        }

        for member in &mut class.members {
            if let ClassMember::Method(method) | ClassMember::Constructor(method) = member {
                let scope = format!("method_{}.{}", class.name, method.name);
                self.function(method, scope);
            }
        }

        let _ = self.symbols.exit();
    }

    fn function(&mut self, function: &mut FunctionDecl, scope: String) {
        self.symbols.enter(scope);

        if let Some(class) = &function.parent_class {
            let this = Symbol::new("this", SymbolKind::Variable, Type::Named(class.clone()), function.location);
            let _ = self.define(this);
        }

        for parameter in &mut function.parameters {
            if let Some(ty) = &parameter.ty {
                self.check_type_exists(ty, parameter.location);
            }

            if let Some(default) = &mut parameter.default {
                let got = self.expression(default);

                if let Some(expected) = &parameter.ty {
                    if !is_assignable(expected, &got, &self.classes) {
                        self.problems.error(AnalyzeError::TypeMismatch {
                            location: default.location,
                            expected: expected.clone(),
                            got,
                        });
                    }
                }
            }

            let ty = parameter.ty.clone().unwrap_or(Type::Any);
            let _ = self.define(Symbol::new(parameter.name.clone(), SymbolKind::Parameter, ty, parameter.location));
        }

        self.functions.push(FunctionContext {
            name: function.name.clone(),
            return_type: function.return_type.clone(),
        });

        self.block(&mut function.body);

        let _ = self.functions.pop();
        let _ = self.symbols.exit();
    }

    /// Infers the type of an expression and stores it on the node.
    fn expression(&mut self, expression: &mut Expression) -> Type {
        let ty = self.infer(expression);
        expression.ty = Some(ty.clone());
        ty
    }

    fn infer(&mut self, expression: &mut Expression) -> Type {
        let location = expression.location;

        match &mut expression.kind {
            ExpressionKind::Number { is_integer: true, .. } => Type::Int,
            ExpressionKind::Number { is_integer: false, .. } => Type::Float,
            ExpressionKind::String(_) => Type::String,
            ExpressionKind::Char(_) => Type::Char,
            ExpressionKind::Bool(_) => Type::Bool,
            ExpressionKind::Null => Type::Null,
            ExpressionKind::Identifier(name) => {
                let name = name.clone();
                self.identifier(&name, location)
            },
            ExpressionKind::This => match self.symbols.lookup("this") {
                Some(symbol) => symbol.ty.clone(),
                None => {
                    self.problems.error(AnalyzeError::OutsideClass { location, keyword: "this" });
                    Type::Error
                }
            },
            ExpressionKind::Super => {
                let parent = self.symbols.current_class()
                    .map(|class| self.classes.get(class).and_then(|info| info.superclass.clone()));

                match parent {
                    Some(Some(parent)) => Type::Named(parent),
                    Some(None) => Type::Any,
                    None => {
                        self.problems.error(AnalyzeError::OutsideClass { location, keyword: "super" });
                        Type::Error
                    }
                }
            },
            ExpressionKind::Binary { operator, left, right } => {
                let left = self.expression(left);
                let right = self.expression(right);

                match binary_type(*operator, &left, &right) {
                    Some(ty) => ty,
                    None => {
                        let ty = match operator.is_comparison() {
                            true => Type::Bool,
                            false => Type::Error,
                        };

                        self.problems.error(AnalyzeError::OperatorMismatch {
                            location,
                            operator: operator.as_str(),
                            left,
                            right,
                        });

                        ty
                    }
                }
            },
            ExpressionKind::Unary { operator, operand, .. } => {
                let ty = self.expression(operand);

                if matches!(operator, UnaryOperator::Increment | UnaryOperator::Decrement) {
                    self.check_writable(operand);
                }

                match unary_type(*operator, &ty) {
                    Some(ty) => ty,
                    None => {
                        self.problems.error(AnalyzeError::InvalidUnaryOperation {
                            location,
                            operator: operator.as_str(),
                            operand: ty,
                        });
                        Type::Error
                    }
                }
            },
            ExpressionKind::Assign { operator, target, value } => self.assignment(*operator, target, value, location),
            ExpressionKind::Call { callee, arguments } => {
                for argument in arguments.iter_mut() {
                    let _ = self.expression(argument);
                }

                self.call(callee)
            },
            ExpressionKind::Member { target, name } => {
                let target = self.expression(target);
                let name = name.clone();
                self.member(&target, &name, location)
            },
            ExpressionKind::Index { target, index } => {
                let target = self.expression(target);
                let _ = self.expression(index);

                match target {
                    Type::String => Type::String,
                    ty if ty.is_array() || ty.is_map() => ty.element_type(),
                    Type::Error => Type::Error,
                    _ => Type::Any,
                }
            },
            ExpressionKind::New { class_name, arguments } => {
                for argument in arguments.iter_mut() {
                    let _ = self.expression(argument);
                }

                match self.classes.contains(class_name) {
                    true => Type::Named(class_name.clone()),
                    false => {
                        self.problems.error(AnalyzeError::UndefinedClass { location, name: class_name.clone() });
                        Type::Error
                    }
                }
            },
            ExpressionKind::Cast { ty, operand } => {
                let _ = self.expression(operand);
                ty.clone()
            },
            ExpressionKind::Ternary { condition, then_branch, else_branch } => {
                let _ = self.expression(condition);
                let then_type = self.expression(then_branch);
                let else_type = self.expression(else_branch);

                common_type(&then_type, &else_type, &self.classes)
            },
            ExpressionKind::Array(elements) => {
                let mut element: Option<Type> = None;

                for item in elements.iter_mut() {
                    let ty = self.expression(item);

                    element = Some(match element {
                        None => ty,
                        Some(previous) => common_type(&previous, &ty, &self.classes),
                    });
                }

                match element {
                    Some(Type::Null) | None => Type::Array(Box::new(Type::Any)),
                    Some(element) => Type::Array(Box::new(element)),
                }
            },
            ExpressionKind::Map(entries) => {
                let mut value_type: Option<Type> = None;

                for (key, value) in entries.iter_mut() {
                    let _ = self.expression(key);
                    let ty = self.expression(value);

                    value_type = Some(match value_type {
                        None => ty,
                        Some(previous) => common_type(&previous, &ty, &self.classes),
                    });
                }

                Type::Generic {
                    name: "map".to_string(),
                    arguments: vec![Type::String, value_type.unwrap_or(Type::Any)],
                }
            },
            ExpressionKind::Function(function) => {
                let scope = format!("function_{}", function.name);
                self.function(function, scope);
                Type::Any
            },
            ExpressionKind::Await(inner) => self.expression(inner),
        }
    }

    fn identifier(&mut self, name: &str, location: SrcSpan) -> Type {
        if let Some(symbol) = self.symbols.lookup(name) {
            return match symbol.kind {
                SymbolKind::Function => Type::Any,
                SymbolKind::Class | SymbolKind::Struct | SymbolKind::Type => Type::Named(name.to_string()),
                SymbolKind::Variable | SymbolKind::Parameter => symbol.ty.clone(),
            };
        }

        if let Some(class) = self.symbols.current_class().map(str::to_string) {
            if let Some(field) = self.classes.field(&class, name).cloned() {
                self.check_access(&field, name, location);
                return field.ty.unwrap_or(Type::Any);
            }

            if self.classes.method(&class, name).is_some() {
                return Type::Any;
            }
        }

        if self.builtins.contains(name) {
            return Type::Any;
        }

        self.problems.error(AnalyzeError::UndefinedIdentifier { location, name: name.to_string() });
        Type::Error
    }

    fn call(&mut self, callee: &mut Expression) -> Type {
        let ty = if let ExpressionKind::Identifier(name) = &callee.kind {
            let name = name.clone();
            self.call_target(&name, callee.location)
        } else if let ExpressionKind::Member { target, name } = &mut callee.kind {
            let target = self.expression(target);
            let name = name.clone();
            self.method_call(&target, &name, callee.location)
        } else {
            let ty = self.expression(callee);

            match callee.kind {
                // super(...) runs the parent constructor
                ExpressionKind::Super => Type::Void,
                _ if ty == Type::Error => Type::Error,
                _ => Type::Any,
            }
        };

        callee.ty = Some(ty.clone());
        ty
    }

    fn call_target(&mut self, name: &str, location: SrcSpan) -> Type {
        if let Some(symbol) = self.symbols.lookup(name) {
            return match symbol.kind {
                SymbolKind::Function => symbol.ty.clone(),
                SymbolKind::Class | SymbolKind::Struct | SymbolKind::Type => Type::Named(name.to_string()),
                SymbolKind::Variable | SymbolKind::Parameter => Type::Any,
            };
        }

        if let Some(class) = self.symbols.current_class().map(str::to_string) {
            if let Some(method) = self.classes.method(&class, name).cloned() {
                self.check_access(&method, name, location);
                return method.ty.unwrap_or(Type::Any);
            }
        }

        if self.builtins.contains(name) {
            return builtin_type(name);
        }

        self.problems.error(AnalyzeError::UndefinedFunction { location, name: name.to_string() });
        Type::Error
    }

    fn method_call(&mut self, target: &Type, name: &str, location: SrcSpan) -> Type {
        match target {
            Type::Error => Type::Error,
            Type::Named(class) => match self.classes.method(class, name).cloned() {
                Some(method) => {
                    self.check_access(&method, name, location);
                    method.ty.unwrap_or(Type::Any)
                },
                None => Type::Any,
            },
            ty if ty.is_permissive() || ty.is_array() || ty.is_map() || *ty == Type::Object => Type::Any,
            ty => {
                self.problems.error(AnalyzeError::UnknownMember {
                    location,
                    ty: ty.clone(),
                    member: name.to_string(),
                });
                Type::Error
            }
        }
    }

    fn member(&mut self, target: &Type, name: &str, location: SrcSpan) -> Type {
        match target {
            Type::Error => Type::Error,
            ty if name == "length" && (*ty == Type::String || ty.is_array()) => Type::Int,
            Type::Named(class) => {
                if let Some(field) = self.classes.field(class, name).cloned() {
                    self.check_access(&field, name, location);
                    return field.ty.unwrap_or(Type::Any);
                }

                if let Some(method) = self.classes.method(class, name).cloned() {
                    self.check_access(&method, name, location);
                }

                Type::Any
            },
            ty if ty.is_permissive() || ty.is_array() || ty.is_map() || *ty == Type::Object => Type::Any,
            ty => {
                self.problems.error(AnalyzeError::UnknownMember {
                    location,
                    ty: ty.clone(),
                    member: name.to_string(),
                });
                Type::Error
            }
        }
    }

    fn check_access(&mut self, member: &MemberInfo, name: &str, location: SrcSpan) {
        let current = self.symbols.current_class();

        let allowed = match member.modifiers.access {
            Access::Private => current == Some(member.owner.as_str()),
            Access::Protected => current.is_some_and(|class| self.classes.is_subtype(class, &member.owner)),
            Access::Public | Access::Internal => true,
        };

        if !allowed {
            self.problems.error(AnalyzeError::AccessViolation {
                location,
                member: name.to_string(),
                class: member.owner.clone(),
                is_private: member.modifiers.access == Access::Private,
            });
        }
    }

    fn assignment(
        &mut self,
        operator: AssignOperator,
        target: &mut Expression,
        value: &mut Expression,
        location: SrcSpan
    ) -> Type {
        let value_type = self.expression(value);
        let target_type = self.expression(target);

        self.check_writable(target);

        let got = match operator.binary() {
            None => value_type,
            Some(binary) => match binary_type(binary, &target_type, &value_type) {
                Some(ty) => ty,
                None => {
                    self.problems.error(AnalyzeError::OperatorMismatch {
                        location,
                        operator: operator.as_str(),
                        left: target_type.clone(),
                        right: value_type,
                    });
                    Type::Error
                }
            }
        };

        if !is_assignable(&target_type, &got, &self.classes) {
            self.problems.error(AnalyzeError::TypeMismatch {
                location: value.location,
                expected: target_type.clone(),
                got,
            });
        }

        target_type
    }

    fn check_writable(&mut self, target: &Expression) {
        let is_const = match &target.kind {
            ExpressionKind::Identifier(name) => match self.symbols.lookup(name) {
                Some(symbol) => symbol.is_const(),
                None => self.symbols.current_class()
                    .and_then(|class| self.classes.field(class, name))
                    .is_some_and(|field| field.modifiers.is_const),
            },
            ExpressionKind::Member { target: object, name } => match &object.ty {
                Some(Type::Named(class)) => self.classes.field(class, name)
                    .is_some_and(|field| field.modifiers.is_const),
                _ => false,
            },
            _ => false,
        };

        if is_const {
            let name = match &target.kind {
                ExpressionKind::Member { name, .. } => name.clone(),
                _ => target.to_string(),
            };

            self.problems.error(AnalyzeError::ConstAssignment { location: target.location, name });
        }
    }
}
