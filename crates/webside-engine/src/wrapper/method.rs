//! Compiled method view

use serde_json::{json, Value};

use super::{ObjectWrapper, Reflective, SpeciesWrapper};

/// Source text reported for methods without source
pub const NO_SOURCE: &str = "no source";

const DEFAULT_CATEGORY: &str = "self category";
const DEFAULT_AUTHOR: &str = "self author";
const DEFAULT_TIMESTAMP: &str = "self timeStamp";

/// A compiled method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodWrapper(ObjectWrapper);

impl From<ObjectWrapper> for MethodWrapper {
    fn from(object: ObjectWrapper) -> Self {
        MethodWrapper(object)
    }
}

impl MethodWrapper {
    /// Selector the method is bound to
    pub fn selector(&self) -> Option<String> {
        let runtime = self.0.runtime();
        runtime
            .method_selector(self.oop())
            .and_then(|selector| runtime.string_value(selector))
    }

    /// Species defining the method
    pub fn method_class(&self) -> SpeciesWrapper {
        let class = self.0.runtime().method_class(self.oop());
        SpeciesWrapper::from(ObjectWrapper::on(class, self.0.runtime()))
    }

    /// Source text, or [`NO_SOURCE`]
    pub fn source_code(&self) -> String {
        let runtime = self.0.runtime();
        let source = runtime.method_source(self.oop());
        if source == runtime.nil() {
            return NO_SOURCE.to_string();
        }
        runtime
            .string_value(source)
            .unwrap_or_else(|| NO_SOURCE.to_string())
    }

    /// Category the method is filed under
    pub fn category(&self) -> Option<String> {
        self.0.runtime().method_category(self.oop())
    }

    /// Whether the method reads the instance variable `name`
    pub fn reads(&self, name: &str) -> bool {
        self.0.runtime().method_reads_slot(self.oop(), name)
    }

    /// Whether the method assigns the instance variable `name`
    pub fn writes(&self, name: &str) -> bool {
        self.0.runtime().method_writes_slot(self.oop(), name)
    }

    /// Whether the method reads or assigns the instance variable `name`
    pub fn accesses(&self, name: &str) -> bool {
        self.reads(name) || self.writes(name)
    }

    /// Whether the method refers to the class variable `name`
    pub fn references_class_variable(&self, name: &str) -> bool {
        self.0
            .runtime()
            .method_references_class_variable(self.oop(), name)
    }
}

impl Reflective for MethodWrapper {
    fn object(&self) -> &ObjectWrapper {
        &self.0
    }

    fn to_json(&self) -> Value {
        let mut json = self.0.base_json();
        json.insert("selector".into(), json!(self.selector()));
        json.insert("methodClass".into(), json!(self.method_class().name()));
        json.insert(
            "category".into(),
            json!(self
                .category()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())),
        );
        json.insert("source".into(), json!(self.source_code()));
        json.insert("author".into(), json!(DEFAULT_AUTHOR));
        json.insert("timestamp".into(), json!(DEFAULT_TIMESTAMP));
        json.insert("overriding".into(), json!(false));
        json.insert("overriden".into(), json!(false));
        Value::Object(json)
    }
}
