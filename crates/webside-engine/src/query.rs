//! Method queries
//!
//! A `/methods` query combines independent filters. The positive filters (implementors
//! of a selector, senders of a selector, references to a global) each produce a method
//! set and are intersected in that order. The result is then narrowed by owning class,
//! category and accessed variable. Without any positive filter the base set is every
//! method of the requested class, or of the default root.
//!
//! Filters never fail: an empty result is an ordinary answer. Only a route-bound class
//! that does not exist is `NotFound`.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ReflectError, ReflectResult};
use crate::hierarchy::{class_named, default_root_class};
use crate::runtime::{Oop, Runtime};
use crate::wrapper::{MethodWrapper, ObjectWrapper, Reflective, SpeciesWrapper};

/// Filters of a method query
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodQuery {
    /// Implementors of this selector
    pub selector: Option<String>,
    /// Senders of this selector
    pub sending: Option<String>,
    /// Methods referring to this global
    pub referencing_class: Option<String>,
    /// Methods defined by this class
    pub class: Option<String>,
    /// Methods filed under this category
    pub category: Option<String>,
    /// Methods reading or writing this variable
    pub accessing: Option<String>,
    /// Class whose lookup chain bounds the implementors search
    pub scope: Option<String>,
}

impl MethodQuery {
    /// Whether any of the set-producing filters is present
    pub fn has_positive_filter(&self) -> bool {
        self.selector.is_some() || self.sending.is_some() || self.referencing_class.is_some()
    }
}

/// Every class below the default root together with its metaclass
pub fn all_species(runtime: &Arc<dyn Runtime>) -> ReflectResult<Vec<SpeciesWrapper>> {
    let root = default_root_class(runtime)?;
    Ok(root
        .with_all_subclasses()?
        .into_iter()
        .flat_map(|class| {
            let metaclass = class.metaclass();
            [class, metaclass]
        })
        .collect())
}

/// Methods bound to `selector`, searched over every species or along `scope`'s chain
pub fn implementors_of(
    runtime: &Arc<dyn Runtime>,
    selector: &str,
    scope: Option<&SpeciesWrapper>,
) -> ReflectResult<Vec<MethodWrapper>> {
    let universe = match scope {
        Some(scope) => scope.with_all_superclasses()?,
        None => all_species(runtime)?,
    };
    let mut implementors = Vec::new();
    for species in universe
        .iter()
        .filter(|species| species.includes_selector(selector))
    {
        implementors.push(species.method_for(selector)?);
    }
    Ok(implementors)
}

/// Methods sending `selector`
pub fn senders_of(runtime: &Arc<dyn Runtime>, selector: &str) -> Vec<MethodWrapper> {
    wrap_methods(runtime, runtime.senders_of(selector))
}

/// Methods referring to the global `name`
pub fn references_to(runtime: &Arc<dyn Runtime>, name: &str) -> Vec<MethodWrapper> {
    wrap_methods(runtime, runtime.references_to(name))
}

fn wrap_methods(runtime: &Arc<dyn Runtime>, methods: Vec<Oop>) -> Vec<MethodWrapper> {
    methods
        .into_iter()
        .map(|oop| MethodWrapper::from(ObjectWrapper::on(oop, runtime)))
        .collect()
}

/// Members of `left` also in `right`, in `left` order
fn intersect(left: Vec<MethodWrapper>, right: &[MethodWrapper]) -> Vec<MethodWrapper> {
    let keep: FxHashSet<Oop> = right.iter().map(|m| m.oop()).collect();
    left.into_iter().filter(|m| keep.contains(&m.oop())).collect()
}

fn narrow(current: Option<Vec<MethodWrapper>>, next: Vec<MethodWrapper>) -> Vec<MethodWrapper> {
    match current {
        Some(current) => intersect(current, &next),
        None => next,
    }
}

/// Whether `method` reads or writes the instance variable `variable`, or refers to a
/// class variable of that name declared along its class's chain
pub fn accesses_variable(method: &MethodWrapper, variable: &str) -> ReflectResult<bool> {
    let species = method.method_class();
    if species.has_slot_named(variable)? && method.accesses(variable) {
        return Ok(true);
    }
    let declared = species
        .instance_class()
        .with_all_superclasses()?
        .iter()
        .any(|class| class.class_variable_names().iter().any(|v| v == variable));
    Ok(declared && method.references_class_variable(variable))
}

/// Class named by a query parameter, `None` when there is no such class
fn known_class(runtime: &Arc<dyn Runtime>, name: &str) -> ReflectResult<Option<SpeciesWrapper>> {
    match class_named(runtime, name) {
        Ok(species) => Ok(Some(species)),
        Err(ReflectError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Evaluate `query`
///
/// `bound_class` is a class named by the route itself; it takes precedence over the
/// `class` parameter and must exist. An unknown `class` parameter matches no method and
/// an unknown `scope` is ignored.
pub fn methods(
    runtime: &Arc<dyn Runtime>,
    query: &MethodQuery,
    bound_class: Option<&str>,
) -> ReflectResult<Vec<MethodWrapper>> {
    let mut methods: Option<Vec<MethodWrapper>> = None;

    if let Some(selector) = &query.selector {
        let scope = match &query.scope {
            Some(name) => known_class(runtime, name)?,
            None => None,
        };
        methods = Some(implementors_of(runtime, selector, scope.as_ref())?);
    }
    if let Some(selector) = &query.sending {
        methods = Some(narrow(methods, senders_of(runtime, selector)));
    }
    if let Some(global) = &query.referencing_class {
        methods = Some(narrow(methods, references_to(runtime, global)));
    }

    let species = match (bound_class, query.class.as_deref()) {
        (Some(name), _) => Some(class_named(runtime, name)?),
        (None, Some(name)) => match known_class(runtime, name)? {
            Some(species) => Some(species),
            None => {
                debug!(class = %name, "method query on unknown class");
                return Ok(Vec::new());
            }
        },
        (None, None) => None,
    };
    let mut methods = match (methods, species) {
        (Some(methods), Some(species)) => methods
            .into_iter()
            .filter(|m| m.method_class() == species)
            .collect(),
        (Some(methods), None) => methods,
        (None, Some(species)) => species.methods(),
        (None, None) => default_root_class(runtime)?.methods(),
    };

    if let Some(category) = &query.category {
        methods.retain(|m| m.category().as_deref() == Some(category.as_str()));
    }
    if let Some(variable) = &query.accessing {
        let mut accessing = Vec::with_capacity(methods.len());
        for method in methods {
            if accesses_variable(&method, variable)? {
                accessing.push(method);
            }
        }
        methods = accessing;
    }

    debug!(count = methods.len(), "method query");
    Ok(methods)
}
