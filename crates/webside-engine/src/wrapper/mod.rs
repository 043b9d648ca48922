//! Wrappers over runtime values
//!
//! A wrapper pairs an [`Oop`] with the runtime that owns it and presents the value in
//! a uniform, navigable and serializable shape. [`Wrapped`] is the variant type the
//! rest of the engine passes around; each variant contributes its own JSON fields on
//! top of the plain object shape.
//!
//! Wrappers compare by wrapped handle only: two wrappers around the same value are
//! equal even when created independently.

mod method;
mod object;
mod species;

pub use method::{MethodWrapper, NO_SOURCE};
pub use object::ObjectWrapper;
pub use species::{SpeciesWrapper, VariableInfo, VariableKind};

use std::sync::Arc;

use serde_json::Value;

use crate::error::ReflectResult;
use crate::runtime::{ObjectKind, Oop, Runtime};

/// Capability shared by every wrapper variant
pub trait Reflective {
    /// The underlying plain view
    fn object(&self) -> &ObjectWrapper;

    /// Protocol JSON shape of the value
    fn to_json(&self) -> Value;

    /// Wrapped runtime handle
    fn oop(&self) -> Oop {
        self.object().oop()
    }

    /// Class of the value
    fn object_class(&self) -> SpeciesWrapper {
        self.object().object_class()
    }

    /// Named slot at a 1-based position
    fn slot_at(&self, index: usize) -> ReflectResult<Wrapped> {
        self.object().slot_at(index)
    }

    /// Indexed element at a 1-based position
    fn at(&self, index: usize) -> ReflectResult<Wrapped> {
        self.object().at(index)
    }
}

/// A runtime value wrapped in the variant matching its kind
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapped {
    /// Any other value
    Object(ObjectWrapper),
    /// A class or metaclass
    Species(SpeciesWrapper),
    /// A compiled method
    Method(MethodWrapper),
}

impl Wrapped {
    /// Wrap `oop`, choosing the variant from the runtime's classification
    pub fn on(oop: Oop, runtime: &Arc<dyn Runtime>) -> Self {
        let object = ObjectWrapper::on(oop, runtime);
        match runtime.kind_of(oop) {
            ObjectKind::Plain => Wrapped::Object(object),
            ObjectKind::Species => Wrapped::Species(SpeciesWrapper::from(object)),
            ObjectKind::Method => Wrapped::Method(MethodWrapper::from(object)),
        }
    }

    /// The species view, if this value is a class or metaclass
    pub fn as_species(&self) -> Option<&SpeciesWrapper> {
        match self {
            Wrapped::Species(species) => Some(species),
            _ => None,
        }
    }

    /// The method view, if this value is a compiled method
    pub fn as_method(&self) -> Option<&MethodWrapper> {
        match self {
            Wrapped::Method(method) => Some(method),
            _ => None,
        }
    }
}

impl Reflective for Wrapped {
    fn object(&self) -> &ObjectWrapper {
        match self {
            Wrapped::Object(object) => object,
            Wrapped::Species(species) => species.object(),
            Wrapped::Method(method) => method.object(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Wrapped::Object(object) => object.to_json(),
            Wrapped::Species(species) => species.to_json(),
            Wrapped::Method(method) => method.to_json(),
        }
    }
}

impl From<SpeciesWrapper> for Wrapped {
    fn from(species: SpeciesWrapper) -> Self {
        Wrapped::Species(species)
    }
}

impl From<MethodWrapper> for Wrapped {
    fn from(method: MethodWrapper) -> Self {
        Wrapped::Method(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::bootstrap;

    fn runtime() -> Arc<dyn Runtime> {
        Arc::new(bootstrap::kernel_image().unwrap())
    }

    #[test]
    fn test_variant_follows_kind() {
        let runtime = runtime();
        let nil = Wrapped::on(runtime.nil(), &runtime);
        assert!(matches!(nil, Wrapped::Object(_)));

        let class = nil.object_class();
        assert!(matches!(Wrapped::on(class.oop(), &runtime), Wrapped::Species(_)));

        let method = runtime.methods_of(class.oop())[0];
        assert!(Wrapped::on(method, &runtime).as_method().is_some());
    }

    #[test]
    fn test_wrappers_compare_by_handle() {
        let runtime = runtime();
        let a = Wrapped::on(runtime.true_object(), &runtime);
        let b = Wrapped::on(runtime.true_object(), &runtime);
        let c = Wrapped::on(runtime.false_object(), &runtime);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
