//! Runtime capability
//!
//! The engine never owns the object graph it presents. Everything it knows about a
//! value is obtained through the [`Runtime`] trait, keyed by an opaque [`Oop`] handle.
//! Two handles compare equal exactly when they denote the same runtime value.

use std::fmt;

/// Opaque handle to a value living inside the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oop(u32);

impl Oop {
    /// Create a handle from a raw object-table index
    pub const fn from_index(index: u32) -> Self {
        Oop(index)
    }

    /// Raw object-table index of this handle
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Oop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Coarse classification used to choose a wrapper variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Any value that is neither a species nor a compiled method
    Plain,
    /// A class or metaclass
    Species,
    /// A compiled method
    Method,
}

/// The consumed capability surface of a live object runtime
///
/// Implementations answer synchronous, side-effect free queries. Handles passed in are
/// expected to come from the same runtime; implementations answer `nil`, an empty
/// collection or `None` for handles they do not know rather than panicking.
pub trait Runtime: Send + Sync {
    /// Name of the dialect served by this runtime
    fn dialect(&self) -> &str;

    // ------------------------------------------------------------------------
    // Singletons
    // ------------------------------------------------------------------------

    /// The nil value
    fn nil(&self) -> Oop;

    /// The true value
    fn true_object(&self) -> Oop;

    /// The false value
    fn false_object(&self) -> Oop;

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    /// Classify a value
    fn kind_of(&self, object: Oop) -> ObjectKind;

    /// The class of a value (a metaclass when the value is a class)
    fn class_of(&self, object: Oop) -> Oop;

    /// Named slot at a 1-based position of the class's full instance-variable layout
    fn named_slot_at(&self, object: Oop, index: usize) -> Option<Oop>;

    /// Number of indexed elements (0 for non-arrayed values)
    fn indexed_size(&self, object: Oop) -> usize;

    /// Indexed element at a 1-based position
    fn indexed_slot_at(&self, object: Oop, index: usize) -> Option<Oop>;

    /// Human-readable rendering of a value
    fn print_string(&self, object: Oop) -> String;

    /// Local string of a string or symbol value
    fn string_value(&self, object: Oop) -> Option<String>;

    // ------------------------------------------------------------------------
    // Species
    // ------------------------------------------------------------------------

    /// Direct superclass, or nil at the root
    fn superclass_of(&self, species: Oop) -> Oop;

    /// Direct subclasses in definition order
    fn subclasses_of(&self, species: Oop) -> Vec<Oop>;

    /// Name of a class (`"Point"`) or metaclass (`"Point class"`)
    fn species_name(&self, species: Oop) -> String;

    /// Whether the species is a metaclass
    fn is_metaclass(&self, species: Oop) -> bool;

    /// The sole instance of a metaclass; a class answers itself
    fn instance_class_of(&self, species: Oop) -> Oop;

    /// Instance variables declared by this species (not inherited ones)
    fn instance_variable_names(&self, species: Oop) -> Vec<String>;

    /// Class variables declared by this species
    fn class_variable_names(&self, species: Oop) -> Vec<String>;

    /// Method categories of this species
    fn categories(&self, species: Oop) -> Vec<String>;

    /// Whether instances carry indexed elements
    fn instances_are_arrayed(&self, species: Oop) -> bool;

    /// Methods defined by this species itself
    fn methods_of(&self, species: Oop) -> Vec<Oop>;

    /// Method bound to `selector` in this species' own method dictionary
    fn lookup_selector(&self, species: Oop, selector: &str) -> Option<Oop>;

    /// Own-selector membership test
    fn includes_selector(&self, species: Oop, selector: &str) -> bool {
        self.lookup_selector(species, selector).is_some()
    }

    // ------------------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------------------

    /// Selector symbol of a compiled method
    fn method_selector(&self, method: Oop) -> Option<Oop>;

    /// Species owning a compiled method
    fn method_class(&self, method: Oop) -> Oop;

    /// Source string of a compiled method, or nil when the source is unavailable
    fn method_source(&self, method: Oop) -> Oop;

    /// Category a compiled method is filed under
    fn method_category(&self, method: Oop) -> Option<String>;

    /// Whether the method reads the named instance variable
    fn method_reads_slot(&self, method: Oop, name: &str) -> bool;

    /// Whether the method assigns the named instance variable
    fn method_writes_slot(&self, method: Oop, name: &str) -> bool;

    /// Whether the method references the named class variable
    fn method_references_class_variable(&self, method: Oop, name: &str) -> bool;

    // ------------------------------------------------------------------------
    // System services
    // ------------------------------------------------------------------------

    /// Every method whose code sends `selector`
    fn senders_of(&self, selector: &str) -> Vec<Oop>;

    /// Every method whose code references the global `name`
    fn references_to(&self, name: &str) -> Vec<Oop>;
}
