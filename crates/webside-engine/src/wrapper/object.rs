//! Plain object view

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::{Reflective, SpeciesWrapper, Wrapped};
use crate::error::{ReflectError, ReflectResult};
use crate::runtime::{Oop, Runtime};

/// A runtime value together with the runtime that owns it
#[derive(Clone)]
pub struct ObjectWrapper {
    oop: Oop,
    runtime: Arc<dyn Runtime>,
}

impl ObjectWrapper {
    /// Wrap `oop` without classifying it
    pub fn on(oop: Oop, runtime: &Arc<dyn Runtime>) -> Self {
        Self {
            oop,
            runtime: Arc::clone(runtime),
        }
    }

    /// Wrapped runtime handle
    pub fn oop(&self) -> Oop {
        self.oop
    }

    /// Runtime owning the value
    pub fn runtime(&self) -> &Arc<dyn Runtime> {
        &self.runtime
    }

    /// Wrap another value of the same runtime
    pub fn wrap(&self, oop: Oop) -> Wrapped {
        Wrapped::on(oop, &self.runtime)
    }

    /// Whether this is the runtime's nil
    pub fn is_nil(&self) -> bool {
        self.oop == self.runtime.nil()
    }

    /// Class of the value
    pub fn object_class(&self) -> SpeciesWrapper {
        let class = self.runtime.class_of(self.oop);
        SpeciesWrapper::from(ObjectWrapper::on(class, &self.runtime))
    }

    /// Whether the value carries indexed elements
    pub fn has_indexed_slots(&self) -> bool {
        self.object_class().instances_are_arrayed()
    }

    /// Number of indexed elements
    pub fn size(&self) -> usize {
        if self.has_indexed_slots() {
            self.runtime.indexed_size(self.oop)
        } else {
            0
        }
    }

    /// Named slot at a 1-based position of the class layout
    pub fn slot_at(&self, index: usize) -> ReflectResult<Wrapped> {
        self.runtime
            .named_slot_at(self.oop, index)
            .map(|slot| self.wrap(slot))
            .ok_or(ReflectError::OutOfRange {
                index,
                size: self.named_size(),
            })
    }

    /// Indexed element at a 1-based position
    pub fn at(&self, index: usize) -> ReflectResult<Wrapped> {
        let size = self.size();
        if index < 1 || index > size {
            return Err(ReflectError::OutOfRange { index, size });
        }
        self.runtime
            .indexed_slot_at(self.oop, index)
            .map(|element| self.wrap(element))
            .ok_or(ReflectError::OutOfRange { index, size })
    }

    /// Printable rendering of the value
    pub fn print_string(&self) -> String {
        self.runtime.print_string(self.oop)
    }

    fn named_size(&self) -> usize {
        self.object_class()
            .all_instance_variable_names()
            .map(|names| names.len())
            .unwrap_or(0)
    }

    /// JSON fields shared by every variant
    pub(crate) fn base_json(&self) -> Map<String, Value> {
        let mut json = Map::new();
        json.insert("objectClass".into(), json!(self.object_class().name()));
        json.insert("printString".into(), json!(self.print_string()));
        let indexable = self.has_indexed_slots();
        json.insert("indexable".into(), json!(indexable));
        if indexable {
            json.insert("size".into(), json!(self.size()));
        }
        json
    }
}

impl Reflective for ObjectWrapper {
    fn object(&self) -> &ObjectWrapper {
        self
    }

    fn to_json(&self) -> Value {
        Value::Object(self.base_json())
    }
}

impl PartialEq for ObjectWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.oop == other.oop
    }
}

impl Eq for ObjectWrapper {}

impl fmt::Debug for ObjectWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectWrapper")
            .field("oop", &self.oop)
            .finish_non_exhaustive()
    }
}
