//! Session facade
//!
//! An [`Inspector`] owns one runtime handle and one pin table and answers every
//! protocol request as a JSON value. The HTTP layer holds it behind a single lock, so
//! the methods here are plain synchronous calls.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ReflectError, ReflectResult};
use crate::hierarchy::{class_named, class_tree, default_root_class, TreeShape};
use crate::pins::PinTable;
use crate::query::{self, MethodQuery};
use crate::runtime::{Oop, Runtime};
use crate::slots::{self, IndexRange, Resolved};
use crate::wrapper::{Reflective, SpeciesWrapper, VariableInfo, VariableKind, Wrapped};

/// Conventional method categories offered to editing tools
pub const USUAL_CATEGORIES: &[&str] = &[
    "accessing",
    "comparing",
    "converting",
    "copying",
    "enumerating",
    "initialization",
    "instance creation",
    "printing",
    "private",
    "testing",
];

const BAD_SLOT_URI: &str = "Bad object slot URI";
const OBJECTS_MARKER: &str = "/objects/";

/// Parameters of `GET /classes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClassesQuery {
    /// Root class name; the default root when absent
    pub root: Option<String>,
    /// Answer a nested tree instead of a flat list
    pub tree: Option<bool>,
    /// Tree depth bound
    pub depth: Option<u32>,
    /// Answer names only
    pub names: Option<bool>,
}

/// Body of a pin-by-URI request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PinRequest {
    /// `.../objects/<id>/<path...>` of the object to pin
    pub uri: Option<String>,
}

/// Runtime handle plus pin table
pub struct Inspector {
    runtime: Arc<dyn Runtime>,
    pins: PinTable,
}

impl Inspector {
    /// Create a session over `runtime` with nothing pinned
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            pins: PinTable::new(),
        }
    }

    /// Inspected runtime
    pub fn runtime(&self) -> &Arc<dyn Runtime> {
        &self.runtime
    }

    /// Pin table of the session
    pub fn pins(&self) -> &PinTable {
        &self.pins
    }

    fn wrap(&self, oop: Oop) -> Wrapped {
        Wrapped::on(oop, &self.runtime)
    }

    fn class(&self, name: &str) -> ReflectResult<SpeciesWrapper> {
        class_named(&self.runtime, name)
    }

    // ------------------------------------------------------------------------
    // Code
    // ------------------------------------------------------------------------

    /// Dialect name of the runtime
    pub fn dialect(&self) -> String {
        self.runtime.dialect().to_string()
    }

    /// `GET /classes`
    pub fn classes(&self, query: &ClassesQuery) -> ReflectResult<Value> {
        let root = match &query.root {
            Some(name) => self.class(name)?,
            None => default_root_class(&self.runtime)?,
        };
        let names = query.names.unwrap_or(false);
        if query.tree.unwrap_or(false) {
            let shape = if names { TreeShape::Names } else { TreeShape::Full };
            return Ok(json!([class_tree(&root, query.depth, shape)?]));
        }
        let classes = root.with_all_subclasses()?;
        Ok(if names {
            json!(classes.iter().map(|c| c.name()).collect::<Vec<_>>())
        } else {
            Value::Array(classes.iter().map(|c| c.to_json()).collect())
        })
    }

    /// `GET /classes/:name`
    pub fn class_definition(&self, name: &str) -> ReflectResult<Value> {
        Ok(self.class(name)?.to_json())
    }

    /// `GET /classes/:name/variables`
    pub fn variables(&self, name: &str) -> ReflectResult<Value> {
        variables_json(self.class(name)?.variables()?)
    }

    /// `GET /classes/:name/instance-variables`
    pub fn instance_variables(&self, name: &str) -> ReflectResult<Value> {
        let mut variables = self.class(name)?.variables()?;
        variables.retain(|v| v.kind == VariableKind::Instance);
        variables_json(variables)
    }

    /// `GET /classes/:name/class-variables`
    pub fn class_variables(&self, name: &str) -> ReflectResult<Value> {
        let mut variables = self.class(name)?.variables()?;
        variables.retain(|v| v.kind == VariableKind::Class);
        variables_json(variables)
    }

    /// `GET /classes/:name/subclasses`
    pub fn subclasses(&self, name: &str) -> ReflectResult<Value> {
        let subclasses = self.class(name)?.subclasses();
        Ok(Value::Array(subclasses.iter().map(|c| c.to_json()).collect()))
    }

    /// `GET /classes/:name/categories`
    pub fn categories(&self, name: &str) -> ReflectResult<Value> {
        Ok(json!(self.class(name)?.categories()))
    }

    /// `GET /classes/:name/used-categories`
    pub fn used_categories(&self, name: &str) -> ReflectResult<Value> {
        Ok(json!(self.class(name)?.used_categories()))
    }

    /// `GET /methods` and `GET /classes/:name/methods`
    pub fn methods(&self, query: &MethodQuery, class: Option<&str>) -> ReflectResult<Value> {
        let methods = query::methods(&self.runtime, query, class)?;
        Ok(Value::Array(methods.iter().map(|m| m.to_json()).collect()))
    }

    /// `GET /usual-categories`
    pub fn usual_categories(&self) -> Value {
        json!(USUAL_CATEGORIES)
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    /// `GET /objects`
    pub fn pinned_objects(&self) -> Value {
        Value::Array(
            self.pins
                .all()
                .into_iter()
                .map(|(id, object)| with_id(object.to_json(), &id))
                .collect(),
        )
    }

    /// `GET /objects/:id`
    pub fn pinned_object(&self, id: &str) -> ReflectResult<Value> {
        Ok(with_id(self.pins.get(id)?.to_json(), id))
    }

    /// `GET /objects/:id/<path...>`
    pub fn pinned_object_path(
        &self,
        id: &str,
        path: &str,
        range: IndexRange,
    ) -> ReflectResult<Value> {
        let root = self.pins.get(id)?;
        let segments: Vec<&str> = path.split('/').collect();
        match slots::resolve_path(root, &segments)? {
            Resolved::Object(object) => Ok(object.to_json()),
            Resolved::Listing(listing, object) => slots::listing_of(listing, &object, range),
        }
    }

    /// `DELETE /objects/:id`
    pub fn unpin(&mut self, id: &str) -> ReflectResult<String> {
        let id = self.pins.unpin(id)?;
        info!(id = %id, "unpinned object");
        Ok(id)
    }

    /// `POST /objects`: pin the object a URI designates
    pub fn pin_object(&mut self, request: &PinRequest) -> ReflectResult<Value> {
        let object = self.object_at_uri(request)?;
        let json = object.to_json();
        let id = self.pins.pin(object);
        Ok(with_id(json, &id))
    }

    fn object_at_uri(&self, request: &PinRequest) -> ReflectResult<Wrapped> {
        let bad_request = || ReflectError::bad_request(BAD_SLOT_URI);
        let uri = request.uri.as_deref().ok_or_else(bad_request)?;
        let start = uri.find(OBJECTS_MARKER).ok_or_else(bad_request)? + OBJECTS_MARKER.len();
        let mut segments = uri[start..].split('/').filter(|s| !s.is_empty());
        let id = segments.next().ok_or_else(bad_request)?;
        let mut object = self.pins.get(id).map_err(|_| bad_request())?;
        for segment in segments {
            object = slots::slot_of(segment, &object).map_err(|err| match err {
                ReflectError::Fatal(_) => err,
                _ => bad_request(),
            })?;
        }
        debug!(uri = %uri, "resolved pin uri");
        Ok(object)
    }

    /// Pin a value under a fresh identifier
    pub fn pin(&mut self, oop: Oop) -> String {
        let object = self.wrap(oop);
        self.pins.pin(object)
    }

    /// Pin a value under `id`, which must not be in use
    pub fn pin_as(&mut self, id: &str, oop: Oop) -> ReflectResult<()> {
        let object = self.wrap(oop);
        self.pins.pin_as(id, object)
    }

    /// Pin `(id, value)` pairs, typically the runtime's sample objects
    pub fn pin_samples(&mut self, samples: &[(String, Oop)]) -> ReflectResult<()> {
        for (id, oop) in samples {
            self.pin_as(id, *oop)?;
        }
        info!(count = samples.len(), "pinned sample objects");
        Ok(())
    }
}

fn variables_json(variables: Vec<VariableInfo>) -> ReflectResult<Value> {
    serde_json::to_value(variables).map_err(|err| ReflectError::fatal(err.to_string()))
}

fn with_id(mut json: Value, id: &str) -> Value {
    if let Value::Object(fields) = &mut json {
        fields.insert("id".into(), json!(id));
    }
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::bootstrap;

    fn inspector() -> Inspector {
        let mut memory = bootstrap::kernel_image().unwrap();
        let samples = bootstrap::sample_objects(&mut memory).unwrap();
        let mut inspector = Inspector::new(Arc::new(memory));
        inspector.pin_samples(&samples).unwrap();
        inspector
    }

    fn request(uri: &str) -> PinRequest {
        PinRequest {
            uri: Some(uri.to_string()),
        }
    }

    #[test]
    fn test_sample_ids_cannot_be_pinned_twice() {
        let mut memory = bootstrap::kernel_image().unwrap();
        let samples = bootstrap::sample_objects(&mut memory).unwrap();
        let mut inspector = Inspector::new(Arc::new(memory));
        inspector.pin_samples(&samples).unwrap();
        assert!(matches!(
            inspector.pin_samples(&samples),
            Err(ReflectError::BadRequest(_))
        ));
        assert_eq!(inspector.pins().len(), 6);
        let point = inspector.pinned_object("4").unwrap();
        assert_eq!(point["objectClass"], "Point");
    }

    #[test]
    fn test_dialect() {
        assert_eq!(inspector().dialect(), bootstrap::KERNEL_DIALECT);
    }

    #[test]
    fn test_class_names_list_starts_at_root() {
        let names = inspector()
            .classes(&ClassesQuery {
                names: Some(true),
                ..Default::default()
            })
            .unwrap();
        let names = names.as_array().unwrap();
        assert_eq!(names[0], "Object");
        assert!(names.contains(&json!("Point")));
        assert!(!names.contains(&json!("Point class")));
    }

    #[test]
    fn test_class_tree_is_wrapped_in_array() {
        let tree = inspector()
            .classes(&ClassesQuery {
                root: Some("Boolean".into()),
                tree: Some(true),
                depth: Some(1),
                names: Some(true),
            })
            .unwrap();
        assert_eq!(
            tree,
            json!([{
                "name": "Boolean",
                "superclass": "Object",
                "subclasses": [
                    {"name": "True", "superclass": "Boolean"},
                    {"name": "False", "superclass": "Boolean"}
                ]
            }])
        );
    }

    #[test]
    fn test_unknown_class_is_not_found() {
        let inspector = inspector();
        assert!(matches!(
            inspector.class_definition("Nonexistent"),
            Err(ReflectError::NotFound(_))
        ));
        assert!(matches!(
            inspector.classes(&ClassesQuery {
                root: Some("Nonexistent".into()),
                ..Default::default()
            }),
            Err(ReflectError::NotFound(_))
        ));
    }

    #[test]
    fn test_variable_routes() {
        let inspector = inspector();
        let instance = inspector.instance_variables("Point").unwrap();
        assert_eq!(
            instance,
            json!([
                {"name": "x", "class": "Point", "type": "instance"},
                {"name": "y", "class": "Point", "type": "instance"}
            ])
        );
        let shared = inspector.class_variables("Point").unwrap();
        assert_eq!(
            shared,
            json!([{"name": "DependentsFields", "class": "Object", "type": "class"}])
        );
        let all = inspector.variables("Point").unwrap();
        assert_eq!(all.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_pinned_samples_listing() {
        let objects = inspector().pinned_objects();
        let objects = objects.as_array().unwrap();
        let ids: Vec<&str> = objects.iter().map(|o| o["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5"]);
        assert_eq!(objects[2]["printString"], "123");
        assert_eq!(objects[5]["name"], "Point");
    }

    #[test]
    fn test_object_path_routes() {
        let inspector = inspector();
        let x = inspector
            .pinned_object_path("4", "x", IndexRange::default())
            .unwrap();
        assert_eq!(x["printString"], "1");
        let named = inspector
            .pinned_object_path("4", "named-slots", IndexRange::default())
            .unwrap();
        assert_eq!(named[1]["slot"], "y");
        let indexed = inspector
            .pinned_object_path("3", "indexed-slots", IndexRange { from: Some(2), to: None })
            .unwrap();
        assert_eq!(indexed.as_array().unwrap().len(), 2);
        assert!(matches!(
            inspector.pinned_object_path("4", "z", IndexRange::default()),
            Err(ReflectError::NotFound(_))
        ));
        assert!(matches!(
            inspector.pinned_object_path("99", "x", IndexRange::default()),
            Err(ReflectError::NotFound(_))
        ));
    }

    #[test]
    fn test_pin_by_uri() {
        let mut inspector = inspector();
        let pinned = inspector
            .pin_object(&request("http://localhost:9001/objects/4/y"))
            .unwrap();
        assert_eq!(pinned["printString"], "2");
        // six samples pinned, so the next id is 7
        assert_eq!(pinned["id"], "7");
        assert_eq!(inspector.pinned_object("7").unwrap()["printString"], "2");
    }

    #[test]
    fn test_malformed_pin_requests_are_bad_requests() {
        let mut inspector = inspector();
        for request in [
            PinRequest::default(),
            request("/somewhere/else"),
            request("/objects/"),
            request("/objects/42"),
            request("/objects/4/z"),
        ] {
            assert_eq!(
                inspector.pin_object(&request),
                Err(ReflectError::BadRequest(BAD_SLOT_URI.to_string()))
            );
        }
    }

    #[test]
    fn test_unpin() {
        let mut inspector = inspector();
        assert_eq!(inspector.unpin("2").unwrap(), "2");
        assert!(matches!(
            inspector.pinned_object("2"),
            Err(ReflectError::NotFound(_))
        ));
        assert!(matches!(inspector.unpin("2"), Err(ReflectError::NotFound(_))));
    }

    #[test]
    fn test_class_methods_route() {
        let inspector = inspector();
        let methods = inspector
            .methods(&MethodQuery::default(), Some("Point class"))
            .unwrap();
        assert_eq!(methods.as_array().unwrap().len(), 1);
        assert_eq!(methods[0]["selector"], "x:y:");
        assert_eq!(methods[0]["methodClass"], "Point class");
    }
}
