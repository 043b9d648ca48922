//! Class and metaclass view

use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{json, Value};

use super::{MethodWrapper, ObjectWrapper, Reflective};
use crate::error::{ReflectError, ReflectResult};
use crate::runtime::Oop;

/// Whether a variable belongs to instances or to the class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Instance variable
    Instance,
    /// Class variable
    Class,
}

/// One variable declared somewhere along a superclass chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableInfo {
    /// Variable name
    pub name: String,
    /// Name of the declaring class
    pub class: String,
    /// Variable kind
    #[serde(rename = "type")]
    pub kind: VariableKind,
}

/// A class or metaclass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesWrapper(ObjectWrapper);

impl From<ObjectWrapper> for SpeciesWrapper {
    fn from(object: ObjectWrapper) -> Self {
        SpeciesWrapper(object)
    }
}

impl SpeciesWrapper {
    fn species(&self, oop: Oop) -> SpeciesWrapper {
        SpeciesWrapper(ObjectWrapper::on(oop, self.0.runtime()))
    }

    /// Class name (`"Point"`, `"Point class"`)
    pub fn name(&self) -> String {
        self.0.runtime().species_name(self.oop())
    }

    /// Direct superclass; `None` at the root
    pub fn superclass(&self) -> Option<SpeciesWrapper> {
        let runtime = self.0.runtime();
        let superclass = runtime.superclass_of(self.oop());
        (superclass != runtime.nil()).then(|| self.species(superclass))
    }

    /// Direct subclasses
    pub fn subclasses(&self) -> Vec<SpeciesWrapper> {
        self.0
            .runtime()
            .subclasses_of(self.oop())
            .into_iter()
            .map(|oop| self.species(oop))
            .collect()
    }

    /// This species followed by its superclasses up to the root
    ///
    /// Fails with `Fatal` if the chain revisits a species.
    pub fn with_all_superclasses(&self) -> ReflectResult<Vec<SpeciesWrapper>> {
        let mut visited = FxHashSet::default();
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(species) = current {
            if !visited.insert(species.oop()) {
                return Err(ReflectError::fatal(format!(
                    "superclass chain of {} revisits {}",
                    self.name(),
                    species.name()
                )));
            }
            current = species.superclass();
            chain.push(species);
        }
        Ok(chain)
    }

    /// Superclasses up to the root, excluding this species
    pub fn all_superclasses(&self) -> ReflectResult<Vec<SpeciesWrapper>> {
        let mut chain = self.with_all_superclasses()?;
        chain.remove(0);
        Ok(chain)
    }

    /// This species followed by every transitive subclass, depth first
    ///
    /// Fails with `Fatal` if a species is reachable twice.
    pub fn with_all_subclasses(&self) -> ReflectResult<Vec<SpeciesWrapper>> {
        let mut visited = FxHashSet::default();
        let mut all = Vec::new();
        let mut pending = vec![self.clone()];
        while let Some(species) = pending.pop() {
            if !visited.insert(species.oop()) {
                return Err(ReflectError::fatal(format!(
                    "{} is reachable twice below {}",
                    species.name(),
                    self.name()
                )));
            }
            let mut subclasses = species.subclasses();
            subclasses.reverse();
            pending.extend(subclasses);
            all.push(species);
        }
        Ok(all)
    }

    /// Every transitive subclass, excluding this species
    pub fn all_subclasses(&self) -> ReflectResult<Vec<SpeciesWrapper>> {
        let mut all = self.with_all_subclasses()?;
        all.remove(0);
        Ok(all)
    }

    /// Whether this species is a metaclass
    pub fn is_metaclass(&self) -> bool {
        self.0.runtime().is_metaclass(self.oop())
    }

    /// The metaclass of a class; a metaclass answers its own class
    pub fn metaclass(&self) -> SpeciesWrapper {
        self.object_class()
    }

    /// The class a metaclass describes; a class answers itself
    pub fn instance_class(&self) -> SpeciesWrapper {
        self.species(self.0.runtime().instance_class_of(self.oop()))
    }

    /// Instance variables declared by this species
    pub fn instance_variable_names(&self) -> Vec<String> {
        self.0.runtime().instance_variable_names(self.oop())
    }

    /// Full instance layout, root-most names first
    pub fn all_instance_variable_names(&self) -> ReflectResult<Vec<String>> {
        let chain = self.with_all_superclasses()?;
        Ok(chain
            .iter()
            .rev()
            .flat_map(|species| species.instance_variable_names())
            .collect())
    }

    /// Class variables declared by this species
    pub fn class_variable_names(&self) -> Vec<String> {
        self.0.runtime().class_variable_names(self.oop())
    }

    /// Method categories of this species
    pub fn categories(&self) -> Vec<String> {
        self.0.runtime().categories(self.oop())
    }

    /// Distinct categories of the species' own methods, in method order
    pub fn used_categories(&self) -> Vec<String> {
        let mut used: Vec<String> = Vec::new();
        for category in self.methods().iter().filter_map(|m| m.category()) {
            if !used.contains(&category) {
                used.push(category);
            }
        }
        used
    }

    /// Whether instances carry indexed elements
    pub fn instances_are_arrayed(&self) -> bool {
        self.0.runtime().instances_are_arrayed(self.oop())
    }

    /// Whether the full instance layout declares `name`
    pub fn has_slot_named(&self, name: &str) -> ReflectResult<bool> {
        Ok(self
            .all_instance_variable_names()?
            .iter()
            .any(|slot| slot == name))
    }

    /// Methods defined by this species itself
    pub fn methods(&self) -> Vec<MethodWrapper> {
        self.0
            .runtime()
            .methods_of(self.oop())
            .into_iter()
            .map(|oop| MethodWrapper::from(ObjectWrapper::on(oop, self.0.runtime())))
            .collect()
    }

    /// Method bound to exactly `selector` in this species (inherited ones excluded)
    pub fn method_for(&self, selector: &str) -> ReflectResult<MethodWrapper> {
        self.0
            .runtime()
            .lookup_selector(self.oop(), selector)
            .map(|oop| MethodWrapper::from(ObjectWrapper::on(oop, self.0.runtime())))
            .ok_or_else(|| ReflectError::not_found(format!("{}>>#{}", self.name(), selector)))
    }

    /// Own-selector membership test
    pub fn includes_selector(&self, selector: &str) -> bool {
        self.0.runtime().includes_selector(self.oop(), selector)
    }

    /// Instance and class variables along the superclass chain, root-most first
    pub fn variables(&self) -> ReflectResult<Vec<VariableInfo>> {
        let mut chain = self.with_all_superclasses()?;
        chain.reverse();
        Ok(chain
            .iter()
            .flat_map(|species| {
                let class = species.name();
                let instance = species.instance_variable_names().into_iter().map({
                    let class = class.clone();
                    move |name| VariableInfo {
                        name,
                        class: class.clone(),
                        kind: VariableKind::Instance,
                    }
                });
                let shared = species
                    .class_variable_names()
                    .into_iter()
                    .map(move |name| VariableInfo {
                        name,
                        class: class.clone(),
                        kind: VariableKind::Class,
                    });
                instance.chain(shared).collect::<Vec<_>>()
            })
            .collect())
    }
}

impl Reflective for SpeciesWrapper {
    fn object(&self) -> &ObjectWrapper {
        &self.0
    }

    fn to_json(&self) -> Value {
        let mut json = self.0.base_json();
        json.insert("name".into(), json!(self.name()));
        json.insert(
            "superclass".into(),
            json!(self.superclass().map(|s| s.name())),
        );
        json.insert(
            "instanceVariableNames".into(),
            json!(self.instance_variable_names()),
        );
        json.insert(
            "classVariableNames".into(),
            json!(self.class_variable_names()),
        );
        json.insert("categories".into(), json!(self.categories()));
        json.insert("variable".into(), json!(self.instances_are_arrayed()));
        json.insert("metaclass".into(), json!(self.is_metaclass()));
        Value::Object(json)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::bootstrap;
    use crate::runtime::Runtime;

    fn class(name: &str) -> SpeciesWrapper {
        let memory = bootstrap::kernel_image().unwrap();
        let oop = memory.species_named(name).unwrap();
        let runtime: Arc<dyn Runtime> = Arc::new(memory);
        SpeciesWrapper::from(ObjectWrapper::on(oop, &runtime))
    }

    #[test]
    fn test_superclass_chain_ends_at_root() {
        let names: Vec<String> = class("SmallInteger")
            .with_all_superclasses()
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(
            names,
            vec!["SmallInteger", "Integer", "Number", "Magnitude", "Object"]
        );
    }

    #[test]
    fn test_metaclass_chain_passes_through_class() {
        let names: Vec<String> = class("Point class")
            .all_superclasses()
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(
            names,
            vec!["Object class", "Class", "ClassDescription", "Behavior", "Object"]
        );
    }

    #[test]
    fn test_all_subclasses_excludes_receiver() {
        let boolean = class("Boolean");
        let names: Vec<String> = boolean
            .all_subclasses()
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["True", "False"]);
        assert_eq!(boolean.with_all_subclasses().unwrap()[0], boolean);
    }

    #[test]
    fn test_method_for_is_own_only() {
        let point = class("Point");
        assert_eq!(point.method_for("x").unwrap().selector().as_deref(), Some("x"));
        assert!(point.includes_selector("x"));
        // `yourself` is inherited from Object
        assert!(!point.includes_selector("yourself"));
        assert!(matches!(
            point.method_for("yourself"),
            Err(ReflectError::NotFound(_))
        ));
    }

    #[test]
    fn test_metaclass_and_instance_class() {
        let point = class("Point");
        let meta = point.metaclass();
        assert!(meta.is_metaclass());
        assert_eq!(meta.name(), "Point class");
        assert_eq!(meta.instance_class(), point);
    }

    #[test]
    fn test_variables_are_root_first() {
        let variables = class("Metaclass").variables().unwrap();
        let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "DependentsFields",
                "superclass",
                "methodDictionary",
                "format",
                "instanceVariables",
                "organization",
                "thisClass"
            ]
        );
        assert_eq!(variables[0].kind, VariableKind::Class);
        assert_eq!(variables[0].class, "Object");
        assert_eq!(variables[1].kind, VariableKind::Instance);
    }

    #[test]
    fn test_species_json_shape() {
        let json = class("Point").to_json();
        assert_eq!(json["name"], "Point");
        assert_eq!(json["superclass"], "Object");
        assert_eq!(json["instanceVariableNames"], json!(["x", "y"]));
        assert_eq!(json["classVariableNames"], json!([]));
        assert_eq!(json["objectClass"], "Point class");
        assert!(json["categories"]
            .as_array()
            .unwrap()
            .contains(&json!("accessing")));

        let root = class("Object").to_json();
        assert!(root["superclass"].is_null());
    }

    #[test]
    fn test_used_categories() {
        let used = class("Point class").used_categories();
        assert_eq!(used, vec!["instance creation".to_string()]);
        assert!(class("Boolean class").used_categories().is_empty());
    }
}
