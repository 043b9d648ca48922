//! In-process object memory
//!
//! [`ObjectMemory`] is a flat object table implementing [`Runtime`]. Every value
//! (including classes, metaclasses and compiled methods) is a record in the table and
//! is addressed by its [`Oop`]. Species and methods carry side records with the
//! reflective metadata the engine queries.
//!
//! Memories are produced by [`ImageBuilder`]; [`bootstrap::kernel_image`] builds the
//! default kernel. After construction values can still be allocated (for sample objects
//! or fixtures) until the memory is shared behind an `Arc`.

mod builder;
pub mod bootstrap;

pub use builder::{ClassSpec, ImageBuilder, MethodSpec};

use rustc_hash::FxHashMap;

use crate::runtime::{ObjectKind, Oop, Runtime};

/// Errors raised while constructing an image or allocating into it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// Two classes share a name
    #[error("Duplicate class: {0}")]
    DuplicateClass(String),

    /// A class names a superclass that is not defined
    #[error("Unknown superclass {superclass} of {class}")]
    UnknownSuperclass {
        /// Class being defined
        class: String,
        /// Missing superclass name
        superclass: String,
    },

    /// A method or instance refers to an undefined class
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// A class the memory itself depends on is missing
    #[error("Missing kernel class: {0}")]
    MissingKernelClass(&'static str),

    /// The superclass chain of a class does not terminate
    #[error("Cyclic hierarchy through {0}")]
    CyclicHierarchy(String),

    /// An instance was allocated with the wrong number of slots
    #[error("{class} expects {expected} named slots, got {got}")]
    SlotCountMismatch {
        /// Class of the instance
        class: String,
        /// Declared layout size
        expected: usize,
        /// Supplied slot count
        got: usize,
    },

    /// Indexed elements were supplied for a non-arrayed class
    #[error("{0} instances are not arrayed")]
    NotArrayed(String),
}

/// Payload of one object-table record
#[derive(Debug, Clone)]
enum Body {
    /// Named slots followed by indexed elements
    Slots { named: Vec<Oop>, indexed: Vec<Oop> },
    /// Immediate integer
    Integer(i64),
    /// String or symbol characters
    Bytes(String),
}

#[derive(Debug, Clone)]
struct ObjectRecord {
    class: Oop,
    body: Body,
}

impl ObjectRecord {
    fn empty(class: Oop) -> Self {
        Self {
            class,
            body: Body::Slots {
                named: Vec::new(),
                indexed: Vec::new(),
            },
        }
    }
}

/// Reflective metadata of a class or metaclass
#[derive(Debug, Clone)]
struct SpeciesRecord {
    name: String,
    superclass: Oop,
    subclasses: Vec<Oop>,
    is_metaclass: bool,
    instance_class: Oop,
    instance_variables: Vec<String>,
    class_variables: Vec<String>,
    categories: Vec<String>,
    package: Option<String>,
    arrayed: bool,
    methods: Vec<Oop>,
    method_dictionary: FxHashMap<String, Oop>,
}

/// Reflective metadata of a compiled method
#[derive(Debug, Clone)]
struct MethodRecord {
    selector: Oop,
    owner: Oop,
    source: Oop,
    category: Option<String>,
    reads: Vec<String>,
    writes: Vec<String>,
    class_variables: Vec<String>,
    sends: Vec<String>,
    globals: Vec<String>,
}

/// Classes the memory needs to allocate and classify values
#[derive(Debug, Clone, Copy)]
struct KernelClasses {
    undefined_object: Oop,
    true_class: Oop,
    false_class: Oop,
    small_integer: Oop,
    string: Oop,
    symbol: Oop,
    array: Oop,
    compiled_method: Oop,
    class: Oop,
    metaclass: Oop,
}

impl KernelClasses {
    fn resolve(globals: &FxHashMap<String, Oop>) -> Result<Self, ImageError> {
        let find = |name: &'static str| {
            globals
                .get(name)
                .copied()
                .ok_or(ImageError::MissingKernelClass(name))
        };
        Ok(Self {
            undefined_object: find("UndefinedObject")?,
            true_class: find("True")?,
            false_class: find("False")?,
            small_integer: find("SmallInteger")?,
            string: find("String")?,
            symbol: find("Symbol")?,
            array: find("Array")?,
            compiled_method: find("CompiledMethod")?,
            class: find("Class")?,
            metaclass: find("Metaclass")?,
        })
    }
}

/// Flat object table implementing the runtime capability
#[derive(Debug, Clone)]
pub struct ObjectMemory {
    dialect: String,
    objects: Vec<ObjectRecord>,
    species: FxHashMap<Oop, SpeciesRecord>,
    methods: FxHashMap<Oop, MethodRecord>,
    symbols: FxHashMap<String, Oop>,
    globals: FxHashMap<String, Oop>,
    nil: Oop,
    true_object: Oop,
    false_object: Oop,
    kernel: Option<KernelClasses>,
}

impl ObjectMemory {
    fn empty(dialect: String) -> Self {
        let nil = Oop::from_index(0);
        Self {
            dialect,
            objects: Vec::new(),
            species: FxHashMap::default(),
            methods: FxHashMap::default(),
            symbols: FxHashMap::default(),
            globals: FxHashMap::default(),
            nil,
            true_object: nil,
            false_object: nil,
            kernel: None,
        }
    }

    fn push(&mut self, record: ObjectRecord) -> Oop {
        let oop = Oop::from_index(self.objects.len() as u32);
        self.objects.push(record);
        oop
    }

    fn record(&self, oop: Oop) -> Option<&ObjectRecord> {
        self.objects.get(oop.index() as usize)
    }

    fn record_mut(&mut self, oop: Oop) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(oop.index() as usize)
    }

    fn kernel(&self) -> KernelClasses {
        // Unset only while `ImageBuilder::build` is running
        self.kernel.unwrap_or(KernelClasses {
            undefined_object: self.nil,
            true_class: self.nil,
            false_class: self.nil,
            small_integer: self.nil,
            string: self.nil,
            symbol: self.nil,
            array: self.nil,
            compiled_method: self.nil,
            class: self.nil,
            metaclass: self.nil,
        })
    }

    /// Number of values in the object table
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the object table is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Class bound to a global name
    pub fn global(&self, name: &str) -> Option<Oop> {
        self.globals.get(name).copied()
    }

    /// Class or metaclass by name (`"Point"` or `"Point class"`)
    pub fn species_named(&self, name: &str) -> Option<Oop> {
        match name.strip_suffix(" class") {
            Some(base) => self.global(base).map(|class| self.class_of(class)),
            None => self.global(name),
        }
    }

    /// Integer payload of a small integer
    pub fn integer_value(&self, object: Oop) -> Option<i64> {
        match self.record(object)?.body {
            Body::Integer(value) => Some(value),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------------

    /// Allocate a small integer
    pub fn new_integer(&mut self, value: i64) -> Oop {
        let class = self.kernel().small_integer;
        self.push(ObjectRecord {
            class,
            body: Body::Integer(value),
        })
    }

    /// Allocate a string
    pub fn new_string(&mut self, value: &str) -> Oop {
        let class = self.kernel().string;
        self.push(ObjectRecord {
            class,
            body: Body::Bytes(value.to_string()),
        })
    }

    /// Intern a symbol
    pub fn symbol(&mut self, value: &str) -> Oop {
        if let Some(&oop) = self.symbols.get(value) {
            return oop;
        }
        let class = self.kernel().symbol;
        let oop = self.push(ObjectRecord {
            class,
            body: Body::Bytes(value.to_string()),
        });
        self.symbols.insert(value.to_string(), oop);
        oop
    }

    /// Allocate an array holding `elements`
    pub fn new_array(&mut self, elements: Vec<Oop>) -> Oop {
        let class = self.kernel().array;
        self.push(ObjectRecord {
            class,
            body: Body::Slots {
                named: Vec::new(),
                indexed: elements,
            },
        })
    }

    /// Allocate an instance of a named class
    ///
    /// `named` must match the class's full instance-variable layout; `indexed` must be
    /// empty unless the class is arrayed.
    pub fn new_instance(
        &mut self,
        class_name: &str,
        named: Vec<Oop>,
        indexed: Vec<Oop>,
    ) -> Result<Oop, ImageError> {
        let class = self
            .species_named(class_name)
            .ok_or_else(|| ImageError::UnknownClass(class_name.to_string()))?;
        let expected = self.all_instance_variable_names(class).len();
        if named.len() != expected {
            return Err(ImageError::SlotCountMismatch {
                class: class_name.to_string(),
                expected,
                got: named.len(),
            });
        }
        if !indexed.is_empty() && !self.instances_are_arrayed(class) {
            return Err(ImageError::NotArrayed(class_name.to_string()));
        }
        Ok(self.push(ObjectRecord {
            class,
            body: Body::Slots { named, indexed },
        }))
    }

    /// Full instance-variable layout of a species, root-most names first
    fn all_instance_variable_names(&self, species: Oop) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = species;
        while let Some(record) = self.species.get(&current) {
            chain.push(record);
            if chain.len() > self.species.len() {
                break;
            }
            current = record.superclass;
        }
        chain
            .iter()
            .rev()
            .flat_map(|record| record.instance_variables.iter().cloned())
            .collect()
    }

    fn print_depth(&self, object: Oop, depth: usize) -> String {
        if object == self.nil {
            return "nil".to_string();
        }
        if object == self.true_object {
            return "true".to_string();
        }
        if object == self.false_object {
            return "false".to_string();
        }
        if let Some(species) = self.species.get(&object) {
            return species.name.clone();
        }
        if self.methods.contains_key(&object) {
            let owner = self.method_class(object);
            let selector = self
                .method_selector(object)
                .and_then(|s| self.string_value(s))
                .unwrap_or_default();
            return format!("{}>>#{}", self.species_name(owner), selector);
        }
        let Some(record) = self.record(object) else {
            return "an invalid object".to_string();
        };
        match &record.body {
            Body::Integer(value) => value.to_string(),
            Body::Bytes(text) if record.class == self.kernel().symbol => format!("#{}", text),
            Body::Bytes(text) => format!("'{}'", text.replace('\'', "''")),
            Body::Slots { indexed, .. } if record.class == self.kernel().array && depth > 0 => {
                let elements: Vec<String> = indexed
                    .iter()
                    .map(|&element| self.print_depth(element, depth - 1))
                    .collect();
                format!("#({})", elements.join(" "))
            }
            Body::Slots { .. } => {
                let name = self.species_name(record.class);
                let article = match name.chars().next() {
                    Some(c) if "AEIOU".contains(c) => "an",
                    _ => "a",
                };
                format!("{} {}", article, name)
            }
        }
    }
}

impl Runtime for ObjectMemory {
    fn dialect(&self) -> &str {
        &self.dialect
    }

    fn nil(&self) -> Oop {
        self.nil
    }

    fn true_object(&self) -> Oop {
        self.true_object
    }

    fn false_object(&self) -> Oop {
        self.false_object
    }

    fn kind_of(&self, object: Oop) -> ObjectKind {
        if self.species.contains_key(&object) {
            ObjectKind::Species
        } else if self.methods.contains_key(&object) {
            ObjectKind::Method
        } else {
            ObjectKind::Plain
        }
    }

    fn class_of(&self, object: Oop) -> Oop {
        self.record(object).map(|r| r.class).unwrap_or(self.nil)
    }

    fn named_slot_at(&self, object: Oop, index: usize) -> Option<Oop> {
        match &self.record(object)?.body {
            Body::Slots { named, .. } => named.get(index.checked_sub(1)?).copied(),
            _ => None,
        }
    }

    fn indexed_size(&self, object: Oop) -> usize {
        match self.record(object).map(|r| &r.body) {
            Some(Body::Slots { indexed, .. }) => indexed.len(),
            _ => 0,
        }
    }

    fn indexed_slot_at(&self, object: Oop, index: usize) -> Option<Oop> {
        match &self.record(object)?.body {
            Body::Slots { indexed, .. } => indexed.get(index.checked_sub(1)?).copied(),
            _ => None,
        }
    }

    fn print_string(&self, object: Oop) -> String {
        self.print_depth(object, 2)
    }

    fn string_value(&self, object: Oop) -> Option<String> {
        match &self.record(object)?.body {
            Body::Bytes(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn superclass_of(&self, species: Oop) -> Oop {
        self.species
            .get(&species)
            .map(|s| s.superclass)
            .unwrap_or(self.nil)
    }

    fn subclasses_of(&self, species: Oop) -> Vec<Oop> {
        self.species
            .get(&species)
            .map(|s| s.subclasses.clone())
            .unwrap_or_default()
    }

    fn species_name(&self, species: Oop) -> String {
        self.species
            .get(&species)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    fn is_metaclass(&self, species: Oop) -> bool {
        self.species.get(&species).is_some_and(|s| s.is_metaclass)
    }

    fn instance_class_of(&self, species: Oop) -> Oop {
        self.species
            .get(&species)
            .map(|s| s.instance_class)
            .unwrap_or(self.nil)
    }

    fn instance_variable_names(&self, species: Oop) -> Vec<String> {
        self.species
            .get(&species)
            .map(|s| s.instance_variables.clone())
            .unwrap_or_default()
    }

    fn class_variable_names(&self, species: Oop) -> Vec<String> {
        self.species
            .get(&species)
            .map(|s| s.class_variables.clone())
            .unwrap_or_default()
    }

    fn categories(&self, species: Oop) -> Vec<String> {
        self.species
            .get(&species)
            .map(|s| s.categories.clone())
            .unwrap_or_default()
    }

    fn instances_are_arrayed(&self, species: Oop) -> bool {
        self.species.get(&species).is_some_and(|s| s.arrayed)
    }

    fn methods_of(&self, species: Oop) -> Vec<Oop> {
        self.species
            .get(&species)
            .map(|s| s.methods.clone())
            .unwrap_or_default()
    }

    fn lookup_selector(&self, species: Oop, selector: &str) -> Option<Oop> {
        self.species
            .get(&species)?
            .method_dictionary
            .get(selector)
            .copied()
    }

    fn method_selector(&self, method: Oop) -> Option<Oop> {
        self.methods
            .get(&method)
            .map(|m| m.selector)
            .filter(|&s| s != self.nil)
    }

    fn method_class(&self, method: Oop) -> Oop {
        self.methods.get(&method).map(|m| m.owner).unwrap_or(self.nil)
    }

    fn method_source(&self, method: Oop) -> Oop {
        self.methods.get(&method).map(|m| m.source).unwrap_or(self.nil)
    }

    fn method_category(&self, method: Oop) -> Option<String> {
        self.methods.get(&method)?.category.clone()
    }

    fn method_reads_slot(&self, method: Oop, name: &str) -> bool {
        self.methods
            .get(&method)
            .is_some_and(|m| m.reads.iter().any(|n| n == name))
    }

    fn method_writes_slot(&self, method: Oop, name: &str) -> bool {
        self.methods
            .get(&method)
            .is_some_and(|m| m.writes.iter().any(|n| n == name))
    }

    fn method_references_class_variable(&self, method: Oop, name: &str) -> bool {
        self.methods
            .get(&method)
            .is_some_and(|m| m.class_variables.iter().any(|n| n == name))
    }

    fn senders_of(&self, selector: &str) -> Vec<Oop> {
        let mut senders: Vec<Oop> = self
            .methods
            .iter()
            .filter(|(_, m)| m.sends.iter().any(|s| s == selector))
            .map(|(&oop, _)| oop)
            .collect();
        senders.sort();
        senders
    }

    fn references_to(&self, name: &str) -> Vec<Oop> {
        let mut references: Vec<Oop> = self
            .methods
            .iter()
            .filter(|(_, m)| m.globals.iter().any(|g| g == name))
            .map(|(&oop, _)| oop)
            .collect();
        references.sort();
        references
    }
}
