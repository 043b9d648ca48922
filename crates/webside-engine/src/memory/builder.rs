//! Image construction
//!
//! Classes are declared by name and linked in a single pass by [`ImageBuilder::build`],
//! which allocates a class object and a metaclass for every declaration, wires the
//! superclass/subclass links on both sides of the hierarchy and compiles the declared
//! methods into `CompiledMethod` instances.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    Body, ImageError, KernelClasses, MethodRecord, ObjectMemory, ObjectRecord, SpeciesRecord,
};
use crate::runtime::{Oop, Runtime};

/// Declaration of one class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSpec {
    /// Class name (a global)
    pub name: String,
    /// Superclass name; `None` declares a root
    pub superclass: Option<String>,
    /// Instance variables declared by the class itself
    pub instance_variables: Vec<String>,
    /// Class variables declared by the class itself
    pub class_variables: Vec<String>,
    /// Package the class belongs to
    pub package: Option<String>,
    /// Whether instances carry indexed elements
    pub arrayed: bool,
}

impl ClassSpec {
    /// Declare a class with the given name and no superclass
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set the superclass
    pub fn superclass(mut self, name: &str) -> Self {
        self.superclass = Some(name.to_string());
        self
    }

    /// Set the instance variables
    pub fn instance_variables(mut self, names: &[&str]) -> Self {
        self.instance_variables = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Set the class variables
    pub fn class_variables(mut self, names: &[&str]) -> Self {
        self.class_variables = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Set the package
    pub fn package(mut self, name: &str) -> Self {
        self.package = Some(name.to_string());
        self
    }

    /// Mark instances as arrayed
    pub fn arrayed(mut self) -> Self {
        self.arrayed = true;
        self
    }
}

/// Declaration of one compiled method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSpec {
    /// Selector the method is bound to
    pub selector: String,
    /// Category the method is filed under
    pub category: Option<String>,
    /// Source text; `None` leaves the source slot nil
    pub source: Option<String>,
    /// Instance variables read by the method
    pub reads: Vec<String>,
    /// Instance variables assigned by the method
    pub writes: Vec<String>,
    /// Class variables referenced by the method
    pub class_variables: Vec<String>,
    /// Selectors sent by the method
    pub sends: Vec<String>,
    /// Globals referenced by the method
    pub globals: Vec<String>,
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl MethodSpec {
    /// Declare a method bound to `selector`
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            ..Default::default()
        }
    }

    /// Set the category
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Set the source text
    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Set the instance variables read
    pub fn reads(mut self, names: &[&str]) -> Self {
        self.reads = strings(names);
        self
    }

    /// Set the instance variables assigned
    pub fn writes(mut self, names: &[&str]) -> Self {
        self.writes = strings(names);
        self
    }

    /// Set the class variables referenced
    pub fn class_variables(mut self, names: &[&str]) -> Self {
        self.class_variables = strings(names);
        self
    }

    /// Set the selectors sent
    pub fn sends(mut self, selectors: &[&str]) -> Self {
        self.sends = strings(selectors);
        self
    }

    /// Set the globals referenced
    pub fn globals(mut self, names: &[&str]) -> Self {
        self.globals = strings(names);
        self
    }
}

/// Collects class and method declarations and links them into an [`ObjectMemory`]
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    dialect: String,
    classes: Vec<ClassSpec>,
    methods: Vec<(String, MethodSpec)>,
}

impl ImageBuilder {
    /// Create an empty builder for the named dialect
    pub fn new(dialect: &str) -> Self {
        Self {
            dialect: dialect.to_string(),
            classes: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Declare a class
    pub fn define_class(&mut self, spec: ClassSpec) -> &mut Self {
        self.classes.push(spec);
        self
    }

    /// Declare a method on a class (`"Point"`) or metaclass (`"Point class"`)
    pub fn define_method(&mut self, species: &str, spec: MethodSpec) -> &mut Self {
        self.methods.push((species.to_string(), spec));
        self
    }

    /// Link all declarations into a memory
    pub fn build(self) -> Result<ObjectMemory, ImageError> {
        let mut memory = ObjectMemory::empty(self.dialect);

        let mut seen = FxHashSet::default();
        for spec in &self.classes {
            if !seen.insert(spec.name.as_str()) {
                return Err(ImageError::DuplicateClass(spec.name.clone()));
            }
        }

        // nil, true and false get their classes once the kernel is linked
        let nil = memory.push(ObjectRecord::empty(Oop::from_index(0)));
        memory.nil = nil;
        memory.true_object = memory.push(ObjectRecord::empty(nil));
        memory.false_object = memory.push(ObjectRecord::empty(nil));

        let mut metaclass_of = FxHashMap::default();
        for spec in &self.classes {
            let class = memory.push(ObjectRecord::empty(nil));
            let meta = memory.push(ObjectRecord::empty(nil));
            memory.globals.insert(spec.name.clone(), class);
            metaclass_of.insert(class, meta);
        }

        for spec in &self.classes {
            let class = memory.globals[&spec.name];
            let superclass = match &spec.superclass {
                Some(name) => memory.globals.get(name).copied().ok_or_else(|| {
                    ImageError::UnknownSuperclass {
                        class: spec.name.clone(),
                        superclass: name.clone(),
                    }
                })?,
                None => nil,
            };
            memory.species.insert(
                class,
                SpeciesRecord {
                    name: spec.name.clone(),
                    superclass,
                    subclasses: Vec::new(),
                    is_metaclass: false,
                    instance_class: class,
                    instance_variables: spec.instance_variables.clone(),
                    class_variables: spec.class_variables.clone(),
                    categories: Vec::new(),
                    package: spec.package.clone(),
                    arrayed: spec.arrayed,
                    methods: Vec::new(),
                    method_dictionary: FxHashMap::default(),
                },
            );
            memory.species.insert(
                metaclass_of[&class],
                SpeciesRecord {
                    name: format!("{} class", spec.name),
                    superclass: nil,
                    subclasses: Vec::new(),
                    is_metaclass: true,
                    instance_class: class,
                    instance_variables: Vec::new(),
                    class_variables: Vec::new(),
                    categories: Vec::new(),
                    package: spec.package.clone(),
                    arrayed: false,
                    methods: Vec::new(),
                    method_dictionary: FxHashMap::default(),
                },
            );
        }

        let kernel = KernelClasses::resolve(&memory.globals)?;
        memory.kernel = Some(kernel);

        for spec in &self.classes {
            let class = memory.globals[&spec.name];
            check_acyclic(&memory, class, &spec.name)?;
            let meta = metaclass_of[&class];
            let superclass = memory.species[&class].superclass;
            // The root metaclass inherits from Class and is not listed among its subclasses
            let meta_superclass = if superclass == nil {
                kernel.class
            } else {
                metaclass_of[&superclass]
            };
            if let Some(record) = memory.species.get_mut(&meta) {
                record.superclass = meta_superclass;
            }
            if superclass != nil {
                if let Some(record) = memory.species.get_mut(&superclass) {
                    record.subclasses.push(class);
                }
                if let Some(record) = memory.species.get_mut(&meta_superclass) {
                    record.subclasses.push(meta);
                }
            }
            if let Some(record) = memory.record_mut(class) {
                record.class = meta;
            }
            if let Some(record) = memory.record_mut(meta) {
                record.class = kernel.metaclass;
            }
        }

        for (object, class) in [
            (memory.nil, kernel.undefined_object),
            (memory.true_object, kernel.true_class),
            (memory.false_object, kernel.false_class),
        ] {
            if let Some(record) = memory.record_mut(object) {
                record.class = class;
            }
        }

        for (species_name, spec) in self.methods {
            install_method(&mut memory, &kernel, &species_name, spec)?;
        }

        fill_species_slots(&mut memory);
        fill_method_slots(&mut memory);

        Ok(memory)
    }
}

fn check_acyclic(memory: &ObjectMemory, class: Oop, name: &str) -> Result<(), ImageError> {
    let mut current = class;
    for _ in 0..=memory.species.len() {
        match memory.species.get(&current) {
            Some(record) if record.superclass != memory.nil => current = record.superclass,
            _ => return Ok(()),
        }
    }
    Err(ImageError::CyclicHierarchy(name.to_string()))
}

fn install_method(
    memory: &mut ObjectMemory,
    kernel: &KernelClasses,
    species_name: &str,
    spec: MethodSpec,
) -> Result<(), ImageError> {
    let owner = memory
        .species_named(species_name)
        .ok_or_else(|| ImageError::UnknownClass(species_name.to_string()))?;
    let selector = memory.symbol(&spec.selector);
    let source = match &spec.source {
        Some(text) => memory.new_string(text),
        None => memory.nil,
    };
    let method = memory.push(ObjectRecord::empty(kernel.compiled_method));
    memory.methods.insert(
        method,
        MethodRecord {
            selector,
            owner,
            source,
            category: spec.category.clone(),
            reads: spec.reads,
            writes: spec.writes,
            class_variables: spec.class_variables,
            sends: spec.sends,
            globals: spec.globals,
        },
    );

    if let Some(record) = memory.species.get_mut(&owner) {
        if let Some(previous) = record.method_dictionary.insert(spec.selector, method) {
            record.methods.retain(|&m| m != previous);
        }
        record.methods.push(method);
        if let Some(category) = spec.category {
            if !record.categories.contains(&category) {
                record.categories.push(category);
            }
        }
    }
    Ok(())
}

/// Lay out the named slots of class and metaclass objects by instance-variable name
fn fill_species_slots(memory: &mut ObjectMemory) {
    let mut all: Vec<Oop> = memory.species.keys().copied().collect();
    all.sort();
    for species in all {
        let layout = memory.all_instance_variable_names(memory.class_of(species));
        let record = memory.species[&species].clone();
        let mut named = Vec::with_capacity(layout.len());
        for slot in &layout {
            let value = match slot.as_str() {
                "superclass" => record.superclass,
                "name" if !record.is_metaclass => memory.symbol(&record.name),
                "category" if !record.is_metaclass => match &record.package {
                    Some(package) => memory.new_string(package),
                    None => memory.nil,
                },
                "thisClass" if record.is_metaclass => record.instance_class,
                "subclasses" => memory.new_array(record.subclasses.clone()),
                "instanceVariables" => {
                    let names: Vec<Oop> = record
                        .instance_variables
                        .iter()
                        .map(|n| memory.new_string(n))
                        .collect();
                    memory.new_array(names)
                }
                _ => memory.nil,
            };
            named.push(value);
        }
        if let Some(object) = memory.record_mut(species) {
            object.body = Body::Slots {
                named,
                indexed: Vec::new(),
            };
        }
    }
}

/// Lay out the named slots of compiled methods by instance-variable name
fn fill_method_slots(memory: &mut ObjectMemory) {
    let mut all: Vec<Oop> = memory.methods.keys().copied().collect();
    all.sort();
    for method in all {
        let layout = memory.all_instance_variable_names(memory.class_of(method));
        let record = memory.methods[&method].clone();
        let named = layout
            .iter()
            .map(|slot| match slot.as_str() {
                "selector" => record.selector,
                "methodClass" => record.owner,
                "source" => record.source,
                _ => memory.nil,
            })
            .collect();
        if let Some(object) = memory.record_mut(method) {
            object.body = Body::Slots {
                named,
                indexed: Vec::new(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    fn kernel_builder() -> ImageBuilder {
        let mut image = ImageBuilder::new("Test");
        image
            .define_class(ClassSpec::new("Object"))
            .define_class(ClassSpec::new("UndefinedObject").superclass("Object"))
            .define_class(ClassSpec::new("True").superclass("Object"))
            .define_class(ClassSpec::new("False").superclass("Object"))
            .define_class(ClassSpec::new("SmallInteger").superclass("Object"))
            .define_class(ClassSpec::new("String").superclass("Object"))
            .define_class(ClassSpec::new("Symbol").superclass("String"))
            .define_class(ClassSpec::new("Array").superclass("Object").arrayed())
            .define_class(
                ClassSpec::new("CompiledMethod")
                    .superclass("Object")
                    .instance_variables(&["selector", "methodClass", "source"]),
            )
            .define_class(ClassSpec::new("Class").superclass("Object"))
            .define_class(ClassSpec::new("Metaclass").superclass("Object"));
        image
    }

    #[test]
    fn test_minimal_image_builds() {
        let memory = kernel_builder().build().unwrap();
        let object = memory.global("Object").unwrap();
        assert_eq!(memory.superclass_of(object), memory.nil());
        let meta = memory.class_of(object);
        assert_eq!(memory.superclass_of(meta), memory.global("Class").unwrap());
        // The root metaclass is not a subclass of Class
        assert!(!memory
            .subclasses_of(memory.global("Class").unwrap())
            .contains(&meta));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut image = kernel_builder();
        image.define_class(ClassSpec::new("Object"));
        assert_eq!(
            image.build().unwrap_err(),
            ImageError::DuplicateClass("Object".to_string())
        );
    }

    #[test]
    fn test_unknown_superclass_rejected() {
        let mut image = kernel_builder();
        image.define_class(ClassSpec::new("Orphan").superclass("Nowhere"));
        assert!(matches!(
            image.build().unwrap_err(),
            ImageError::UnknownSuperclass { .. }
        ));
    }

    #[test]
    fn test_cyclic_hierarchy_rejected() {
        let mut image = kernel_builder();
        image
            .define_class(ClassSpec::new("A").superclass("B"))
            .define_class(ClassSpec::new("B").superclass("A"));
        assert!(matches!(
            image.build().unwrap_err(),
            ImageError::CyclicHierarchy(_)
        ));
    }

    #[test]
    fn test_missing_kernel_class_rejected() {
        let mut image = ImageBuilder::new("Test");
        image.define_class(ClassSpec::new("Object"));
        assert!(matches!(
            image.build().unwrap_err(),
            ImageError::MissingKernelClass(_)
        ));
    }

    #[test]
    fn test_redefined_method_replaces_previous() {
        let mut image = kernel_builder();
        image
            .define_method("Object", MethodSpec::new("foo").source("foo ^1"))
            .define_method("Object", MethodSpec::new("foo").source("foo ^2"));
        let memory = image.build().unwrap();
        let object = memory.global("Object").unwrap();
        assert_eq!(memory.methods_of(object).len(), 1);
        let method = memory.lookup_selector(object, "foo").unwrap();
        let source = memory.method_source(method);
        assert_eq!(memory.string_value(source).as_deref(), Some("foo ^2"));
    }

    #[test]
    fn test_method_without_source_has_nil_source() {
        let mut image = kernel_builder();
        image.define_method("Object", MethodSpec::new("bar"));
        let memory = image.build().unwrap();
        let object = memory.global("Object").unwrap();
        let method = memory.lookup_selector(object, "bar").unwrap();
        assert_eq!(memory.method_source(method), memory.nil());
        // CompiledMethod layout: selector, methodClass, source
        assert_eq!(memory.named_slot_at(method, 2), Some(object));
    }

    #[test]
    fn test_metaclass_methods() {
        let mut image = kernel_builder();
        image.define_method("Object class", MethodSpec::new("new").category("instance creation"));
        let memory = image.build().unwrap();
        let meta = memory.species_named("Object class").unwrap();
        assert!(memory.includes_selector(meta, "new"));
        assert_eq!(memory.categories(meta), vec!["instance creation".to_string()]);
    }
}
