use std::collections::HashMap;

use crate::{
    parser::prelude::{Access, ClassDecl, EnumDecl, ExpressionKind, Modifiers, StructDecl, Type, VarDecl},
    utils::prelude::SrcSpan
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
    Struct,
    Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared or inferred type; for functions the return type.
    pub ty: Type,
    pub modifiers: Modifiers,
    pub owner_class: Option<String>,
    pub location: SrcSpan,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, location: SrcSpan) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            modifiers: Modifiers::default(),
            owner_class: None,
            location,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn owned_by(mut self, class: impl Into<String>) -> Self {
        self.owner_class = Some(class.into());
        self
    }

    pub fn is_const(&self) -> bool {
        self.modifiers.is_const
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub name: String,
    pub level: usize,
    pub parent: Option<usize>,
    symbols: HashMap<String, Symbol>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Lexical scopes as a growable stack. The global scope sits at index 0
/// and is never popped.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: "global".to_string(),
                level: 0,
                parent: None,
                symbols: HashMap::new(),
            }],
        }
    }

    pub fn enter(&mut self, name: impl Into<String>) {
        let parent = self.scopes.len() - 1;

        self.scopes.push(Scope {
            name: name.into(),
            level: parent + 1,
            parent: Some(parent),
            symbols: HashMap::new(),
        });
    }

    pub fn exit(&mut self) -> Option<Scope> {
        match self.scopes.len() {
            1 => None,
            _ => self.scopes.pop()
        }
    }

    pub fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn level(&self) -> usize {
        self.current().level
    }

    /// Adds a symbol to the innermost scope. A clash hands back the
    /// symbol that was there first.
    pub fn define(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        let idx = self.scopes.len() - 1;
        let scope = &mut self.scopes[idx];

        match scope.symbols.get(&symbol.name) {
            Some(existing) => Err(existing.clone()),
            None => {
                let _ = scope.symbols.insert(symbol.name.clone(), symbol);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut idx = Some(self.scopes.len() - 1);

        while let Some(current) = idx {
            let scope = &self.scopes[current];

            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }

            idx = scope.parent;
        }

        None
    }

    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.current().symbols.get(name)
    }

    /// Class whose body encloses the current position, taken from the
    /// nearest `class_C`, `struct_C` or `method_C.m` scope.
    pub fn current_class(&self) -> Option<&str> {
        self.scopes.iter().rev().find_map(|scope| {
            let name = scope.name.as_str();

            if let Some(method) = name.strip_prefix("method_") {
                return method.split('.').next();
            }

            name.strip_prefix("class_").or_else(|| name.strip_prefix("struct_"))
        })
    }

    pub fn scope_names(&self) -> Vec<&str> {
        self.scopes.iter().map(|scope| scope.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub ty: Option<Type>,
    pub modifiers: Modifiers,
    pub owner: String,
    pub location: SrcSpan,
}

/// Shape of a class, struct or enum as seen by member lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: HashMap<String, MemberInfo>,
    pub methods: HashMap<String, MemberInfo>,
    pub location: SrcSpan,
}

impl ClassInfo {
    pub fn from_class(class: &ClassDecl) -> Self {
        let fields = class.fields()
            .map(|field| (field.name.clone(), field_info(field, &class.name)))
            .collect();

        let methods = class.methods()
            .map(|method| {
                let info = MemberInfo {
                    ty: method.return_type.clone(),
                    modifiers: method.modifiers,
                    owner: class.name.clone(),
                    location: method.location,
                };

                (method.name.clone(), info)
            })
            .collect();

        Self {
            name: class.name.clone(),
            superclass: class.superclass.clone(),
            interfaces: class.interfaces.clone(),
            fields,
            methods,
            location: class.location,
        }
    }

    pub fn from_struct(structure: &StructDecl) -> Self {
        Self {
            name: structure.name.clone(),
            superclass: None,
            interfaces: vec![],
            fields: structure.fields.iter()
                .map(|field| (field.name.clone(), field_info(field, &structure.name)))
                .collect(),
            methods: HashMap::new(),
            location: structure.location,
        }
    }

    /// Enum values are static integer constants of the enum.
    pub fn from_enum(enumeration: &EnumDecl) -> Self {
        let modifiers = Modifiers { access: Access::Public, is_static: true, is_const: true, is_async: false };

        Self {
            name: enumeration.name.clone(),
            superclass: None,
            interfaces: vec![],
            fields: enumeration.values.iter()
                .map(|value| {
                    let info = MemberInfo {
                        ty: Some(Type::Int),
                        modifiers,
                        owner: enumeration.name.clone(),
                        location: value.location,
                    };

                    (value.name.clone(), info)
                })
                .collect(),
            methods: HashMap::new(),
            location: enumeration.location,
        }
    }
}

fn field_info(field: &VarDecl, owner: &str) -> MemberInfo {
    let mut modifiers = field.modifiers;
    modifiers.is_const |= field.is_const();

    MemberInfo {
        ty: field.declared_type.clone().or_else(|| {
            field.initializer.as_ref().and_then(|initializer| literal_type(&initializer.kind))
        }),
        modifiers,
        owner: owner.to_string(),
        location: field.location,
    }
}

fn literal_type(kind: &ExpressionKind) -> Option<Type> {
    match kind {
        ExpressionKind::Number { is_integer: true, .. } => Some(Type::Int),
        ExpressionKind::Number { is_integer: false, .. } => Some(Type::Float),
        ExpressionKind::String(_) => Some(Type::String),
        ExpressionKind::Char(_) => Some(Type::Char),
        ExpressionKind::Bool(_) => Some(Type::Bool),
        _ => None
    }
}

/// Every class, struct and enum known to one analysis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassTable {
    classes: HashMap<String, ClassInfo>,
}

impl ClassTable {
    pub fn insert(&mut self, info: ClassInfo) {
        let _ = self.classes.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// The class followed by its ancestors. Stops on unknown parents and
    /// on inheritance cycles.
    pub fn ancestry<'a>(&'a self, name: &str) -> Vec<&'a ClassInfo> {
        let mut chain: Vec<&ClassInfo> = vec![];
        let mut next = self.classes.get(name);

        while let Some(info) = next {
            if chain.iter().any(|seen| seen.name == info.name) {
                break;
            }

            chain.push(info);
            next = info.superclass.as_deref().and_then(|parent| self.classes.get(parent));
        }

        chain
    }

    pub fn field(&self, class: &str, member: &str) -> Option<&MemberInfo> {
        self.ancestry(class).into_iter().find_map(|info| info.fields.get(member))
    }

    pub fn method(&self, class: &str, member: &str) -> Option<&MemberInfo> {
        self.ancestry(class).into_iter().find_map(|info| info.methods.get(member))
    }

    /// Whether `class` is `ancestor`, derives from it or implements it.
    pub fn is_subtype(&self, class: &str, ancestor: &str) -> bool {
        self.ancestry(class).iter().any(|info| {
            info.name == ancestor || info.interfaces.iter().any(|interface| interface == ancestor)
        })
    }
}
