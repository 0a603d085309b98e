//! Field Registry - process-wide, per-type metadata of persisted fields.
//!
//! Each model type owns an ordered list of field names, each optionally linked
//! to a nested model type ("codable"). Entries are append-only and live for the
//! whole process. A type's own declarations run lazily, exactly once, the first
//! time the registry is asked about it. Inherited fields come first.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::codec::{self, ConversionOptions};
use crate::error::OdmError;
use crate::model::Model;
use crate::value::Map;

type DecodeFn = fn(Map, &ConversionOptions) -> Result<Box<dyn Any + Send>, OdmError>;

/// Link from a field to the nested model type it holds.
#[derive(Clone, Copy)]
pub struct CodableType {
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
}

impl CodableType {
    pub fn of<T: Model>() -> Self {
        CodableType {
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            decode: decode_erased::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Decode a nested plain map into a boxed instance of the linked type.
    pub fn decode(
        &self,
        data: Map,
        options: &ConversionOptions,
    ) -> Result<Box<dyn Any + Send>, OdmError> {
        (self.decode)(data, options)
    }
}

impl fmt::Debug for CodableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CodableType").field(&self.type_name).finish()
    }
}

impl PartialEq for CodableType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CodableType {}

fn decode_erased<T: Model>(
    data: Map,
    options: &ConversionOptions,
) -> Result<Box<dyn Any + Send>, OdmError> {
    let model: T = codec::decode(data, None, options)?;
    Ok(Box::new(model))
}

/// One registered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    name: &'static str,
    codable: Option<CodableType>,
}

impl FieldEntry {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn codable(&self) -> Option<&CodableType> {
        self.codable.as_ref()
    }
}

#[derive(Clone, Copy)]
struct ParentLink {
    type_id: TypeId,
    ensure: fn(),
}

struct ClassEntry {
    parent: Option<ParentLink>,
    fields: Vec<FieldEntry>,
}

fn upsert(fields: &mut Vec<FieldEntry>, name: &'static str, codable: Option<CodableType>) {
    match fields.iter_mut().find(|entry| entry.name == name) {
        Some(existing) => {
            if codable.is_some() {
                existing.codable = codable;
            }
        }
        None => fields.push(FieldEntry { name, codable }),
    }
}

/// Collects a type's declarations before they are written to the registry.
#[derive(Default)]
pub struct FieldDeclarations {
    parent: Option<ParentLink>,
    fields: Vec<FieldEntry>,
}

impl FieldDeclarations {
    /// Declare a plain persisted field.
    pub fn field(&mut self, name: &'static str) -> &mut Self {
        self.push(name, None)
    }

    /// Declare a field holding a nested model of type `T`.
    pub fn codable<T: Model>(&mut self, name: &'static str) -> &mut Self {
        self.push(name, Some(CodableType::of::<T>()))
    }

    /// Inherit the fields of `P`. They are listed before this type's own.
    pub fn extends<P: Model>(&mut self) -> &mut Self {
        self.parent = Some(ParentLink {
            type_id: TypeId::of::<P>(),
            ensure: ensure::<P>,
        });
        self
    }

    fn push(&mut self, name: &'static str, codable: Option<CodableType>) -> &mut Self {
        upsert(&mut self.fields, name, codable);
        self
    }
}

fn classes() -> &'static RwLock<HashMap<TypeId, ClassEntry>> {
    static CLASSES: OnceLock<RwLock<HashMap<TypeId, ClassEntry>>> = OnceLock::new();
    CLASSES.get_or_init(|| RwLock::new(HashMap::new()))
}

// Entries are append-only, so state behind a poisoned lock is still consistent.
fn read() -> RwLockReadGuard<'static, HashMap<TypeId, ClassEntry>> {
    classes().read().unwrap_or_else(PoisonError::into_inner)
}

fn write() -> RwLockWriteGuard<'static, HashMap<TypeId, ClassEntry>> {
    classes().write().unwrap_or_else(PoisonError::into_inner)
}

/// Run `T`'s declarations if they have not run yet.
fn ensure<T: Model>() {
    let type_id = TypeId::of::<T>();
    if read().contains_key(&type_id) {
        return;
    }

    let mut declarations = FieldDeclarations::default();
    T::declare_fields(&mut declarations);
    if let Some(parent) = declarations.parent {
        (parent.ensure)();
    }

    let mut classes = write();
    classes.entry(type_id).or_insert_with(|| {
        tracing::trace!(
            model = any::type_name::<T>(),
            fields = declarations.fields.len(),
            "registered model fields"
        );
        ClassEntry {
            parent: declarations.parent,
            fields: declarations.fields,
        }
    });
}

/// Append `name` to `T`'s field list if absent, recording `codable` when given.
pub fn register<T: Model>(name: &'static str, codable: Option<CodableType>) {
    ensure::<T>();
    if let Some(entry) = write().get_mut(&TypeId::of::<T>()) {
        upsert(&mut entry.fields, name, codable);
    }
}

/// Ordered persisted fields of `T`, ancestors first.
pub fn fields_of<T: Model>() -> Vec<FieldEntry> {
    ensure::<T>();
    let classes = read();

    let mut chain = Vec::new();
    let mut next = Some(TypeId::of::<T>());
    while let Some(type_id) = next {
        match classes.get(&type_id) {
            Some(entry) => {
                chain.push(entry);
                next = entry.parent.map(|parent| parent.type_id);
            }
            None => next = None,
        }
    }

    let mut fields: Vec<FieldEntry> = Vec::new();
    for entry in chain.into_iter().rev() {
        for field in &entry.fields {
            upsert(&mut fields, field.name, field.codable);
        }
    }
    fields
}

/// The nested model type linked to `T.name`, if any.
pub fn codable_type_of<T: Model>(name: &str) -> Option<CodableType> {
    fields_of::<T>()
        .into_iter()
        .find(|entry| entry.name == name)
        .and_then(|entry| entry.codable)
}
