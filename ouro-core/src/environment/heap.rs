use std::collections::HashMap;

use crate::parser::prelude::Access;
use super::value::{ObjectId, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Value,
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
    /// Class that declared the property, used for access checks.
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub id: ObjectId,
    pub class_name: String,
    properties: Vec<Property>,
}

impl Object {
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|property| property.name == name)
    }

    /// Replaces the value of an existing property in place, keeping its
    /// position, or appends a new one.
    pub fn set(&mut self, property: Property) {
        match self.get_mut(&property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }
}

/// Owns every object for the lifetime of the interpreter. Ids are handed
/// out from 1 and never reused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heap {
    objects: Vec<Object>,
    companions: HashMap<String, ObjectId>,
}

impl Heap {
    pub fn allocate(&mut self, class_name: impl Into<String>) -> ObjectId {
        let id = self.objects.len() as ObjectId + 1;

        self.objects.push(Object {
            id,
            class_name: class_name.into(),
            properties: vec![],
        });

        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        let idx = (id as usize).checked_sub(1)?;
        self.objects.get(idx)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        let idx = (id as usize).checked_sub(1)?;
        self.objects.get_mut(idx)
    }

    /// The object holding the static fields of `class`, if already created.
    pub fn companion(&self, class: &str) -> Option<ObjectId> {
        self.companions.get(class).copied()
    }

    pub fn allocate_companion(&mut self, class: &str) -> ObjectId {
        let id = self.allocate(class);
        let _ = self.companions.insert(class.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
