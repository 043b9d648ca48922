//! Class lookup and class trees
//!
//! Lookups scan the universe of classes reachable from the default root, which is the
//! root of the superclass chain of nil's class. Names are matched exactly; a trailing
//! `" class"` selects the metaclass of the matched class.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ReflectError, ReflectResult};
use crate::runtime::{Oop, Runtime};
use crate::wrapper::{ObjectWrapper, Reflective, SpeciesWrapper};

const METACLASS_SUFFIX: &str = " class";

/// Node shape produced by [`class_tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeShape {
    /// `{name, superclass}` nodes
    Names,
    /// Full class JSON nodes
    Full,
}

/// The root of the class hierarchy
///
/// Walks up from the class of nil until the superclass is nil.
pub fn default_root_class(runtime: &Arc<dyn Runtime>) -> ReflectResult<SpeciesWrapper> {
    let nil = ObjectWrapper::on(runtime.nil(), runtime);
    nil.object_class()
        .with_all_superclasses()?
        .pop()
        .ok_or_else(|| ReflectError::fatal("nil has no class"))
}

/// Class or metaclass with exactly the given name
pub fn class_named(runtime: &Arc<dyn Runtime>, name: &str) -> ReflectResult<SpeciesWrapper> {
    let (identifier, metaclass) = match name.strip_suffix(METACLASS_SUFFIX) {
        Some(base) => (base, true),
        None => (name, false),
    };
    if identifier.is_empty() {
        return Err(ReflectError::not_found(name));
    }
    let root = default_root_class(runtime)?;
    let class = root
        .with_all_subclasses()?
        .into_iter()
        .find(|class| class.name() == identifier)
        .ok_or_else(|| ReflectError::not_found(format!("class {}", name)))?;
    debug!(class = %name, "resolved class");
    Ok(if metaclass { class.metaclass() } else { class })
}

/// Nested class tree rooted at `species`
///
/// `depth` of `None` expands every level; `Some(0)` answers the root node alone.
pub fn class_tree(
    species: &SpeciesWrapper,
    depth: Option<u32>,
    shape: TreeShape,
) -> ReflectResult<Value> {
    let mut visited = FxHashSet::default();
    tree_node(species, depth, shape, &mut visited)
}

fn tree_node(
    species: &SpeciesWrapper,
    depth: Option<u32>,
    shape: TreeShape,
    visited: &mut FxHashSet<Oop>,
) -> ReflectResult<Value> {
    if !visited.insert(species.oop()) {
        return Err(ReflectError::fatal(format!(
            "{} appears twice in its class tree",
            species.name()
        )));
    }
    let mut node = match shape {
        TreeShape::Names => json!({
            "name": species.name(),
            "superclass": species.superclass().map(|s| s.name()),
        }),
        TreeShape::Full => species.to_json(),
    };
    if depth == Some(0) {
        return Ok(node);
    }
    let next = depth.map(|d| d - 1);
    let subclasses = species
        .subclasses()
        .iter()
        .map(|subclass| tree_node(subclass, next, shape, visited))
        .collect::<ReflectResult<Vec<_>>>()?;
    if let Value::Object(fields) = &mut node {
        fields.insert("subclasses".into(), Value::Array(subclasses));
    }
    Ok(node)
}
