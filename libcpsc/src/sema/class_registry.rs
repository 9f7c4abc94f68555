// Copyright 2025-2026 Neil Henderson
//
//! The `class_registry` module defines the flat registry of class definitions.
//!
//! Classes are held by name in a single program-wide registry, and refer to their superclass by
//! name rather than by pointer, which breaks the class/method/class reference cycle. Member
//! resolution walks the inheritance chain through the registry.

use std::collections::HashMap;

use super::types::Type;

/// A field of a class, with its word offset into the object's heap block.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub ty: Type,
    pub offset: usize,
}

/// A method of a class.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,

    /// Index of the method body's function context (see `sema::ContextInfo`).
    pub ctx: usize,
}

/// A class definition.
///
/// `fields` holds only the fields the class itself declares; inherited fields come first in the
/// object layout, so the declared fields' offsets start at the superclass's size.
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: HashMap<String, MethodInfo>,
}

/// A resolved field reference: the class that declares the field, and the field itself.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub owner: String,
    pub ty: Type,
    pub offset: usize,
}

/// A resolved method reference: the class that declares the method, and its signature.
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub owner: String,
    pub params: Vec<Type>,
    pub ret: Type,
    pub ctx: usize,
}

/// The program-wide class registry.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassInfo>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class. Returns false if the name is already registered.
    pub fn register(&mut self, class: ClassInfo) -> bool {
        if self.classes.contains_key(&class.name) {
            return false;
        }
        self.classes.insert(class.name.clone(), class);
        true
    }

    /// Looks up a class by name.
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Looks up a class by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassInfo> {
        self.classes.get_mut(name)
    }

    /// Is the class registered?
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// The object size of a class in words: inherited fields plus declared fields.
    pub fn size_in_words(&self, name: &str) -> usize {
        let mut size = 0;
        let mut current = self.get(name);

        while let Some(class) = current {
            size += class.fields.len();
            current = class.superclass.as_deref().and_then(|s| self.get(s));
        }

        size
    }

    /// Resolves a field against a class, walking the inheritance chain.
    pub fn resolve_field(&self, class_name: &str, field: &str) -> Option<ResolvedField> {
        let mut current = self.get(class_name);

        while let Some(class) = current {
            if let Some(info) = class.fields.iter().find(|f| f.name == field) {
                return Some(ResolvedField { owner: class.name.clone(), ty: info.ty.clone(), offset: info.offset });
            }
            current = class.superclass.as_deref().and_then(|s| self.get(s));
        }

        None
    }

    /// Resolves a method against a class, walking the inheritance chain.
    ///
    /// Dispatch is static: resolution starts at the receiver's declared class, so an override
    /// in a subclass is found before the superclass's definition.
    pub fn resolve_method(&self, class_name: &str, method: &str) -> Option<ResolvedMethod> {
        let mut current = self.get(class_name);

        while let Some(class) = current {
            if let Some(info) = class.methods.get(method) {
                return Some(ResolvedMethod {
                    owner: class.name.clone(),
                    params: info.params.clone(),
                    ret: info.ret.clone(),
                    ctx: info.ctx,
                });
            }
            current = class.superclass.as_deref().and_then(|s| self.get(s));
        }

        None
    }

    /// Walks the superclass chain from `name`, returning true if it reaches `ancestor`.
    pub fn inherits_from(&self, name: &str, ancestor: &str) -> bool {
        let mut current = self.get(name).and_then(|c| c.superclass.as_deref());

        while let Some(super_name) = current {
            if super_name == ancestor {
                return true;
            }
            current = self.get(super_name).and_then(|c| c.superclass.as_deref());
        }

        false
    }

    /// Detects a cycle on the superclass chain starting at `name`.
    pub fn has_inheritance_cycle(&self, name: &str) -> bool {
        self.inherits_from(name, name)
    }

    /// All field tokens (`Class.field`) with their word offsets, for the backend.
    pub fn field_offsets(&self) -> HashMap<String, usize> {
        let mut offsets = HashMap::new();

        for class in self.classes.values() {
            for field in &class.fields {
                offsets.insert(format!("{}.{}", class.name, field.name), field.offset);
            }
        }

        offsets
    }

    /// All class sizes in words, for the backend's `NEW` translation.
    pub fn class_sizes(&self) -> HashMap<String, usize> {
        self.classes.keys().map(|name| (name.clone(), self.size_in_words(name))).collect()
    }
}
