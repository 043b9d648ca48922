//! Slot path resolution
//!
//! A path is a sequence of segments walked from a root object. Each segment is first
//! classified against the current object into a [`SlotStep`] and only then resolved:
//!
//! - a canonical decimal number on an object with indexed slots selects an element
//! - a name present in the class's instance-variable layout selects that named slot
//! - a listing keyword in last position answers a [`Listing`] of the current object
//!
//! Any segment that cannot be resolved makes the whole path `NotFound`.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ReflectError, ReflectResult};
use crate::wrapper::{Reflective, Wrapped};

/// Terminal path keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// `instance-variables`: the names of the instance-variable layout
    InstanceVariables,
    /// `named-slots`: every named slot, tagged with its name
    NamedSlots,
    /// `indexed-slots`: a range of indexed elements, tagged with their index
    IndexedSlots,
    /// `custom-presentations`: always empty
    CustomPresentations,
}

impl Listing {
    /// Parse a terminal keyword
    pub fn from_keyword(segment: &str) -> Option<Self> {
        match segment {
            "instance-variables" => Some(Listing::InstanceVariables),
            "named-slots" => Some(Listing::NamedSlots),
            "indexed-slots" => Some(Listing::IndexedSlots),
            "custom-presentations" => Some(Listing::CustomPresentations),
            _ => None,
        }
    }

    /// Keyword spelling of the listing
    pub fn keyword(&self) -> &'static str {
        match self {
            Listing::InstanceVariables => "instance-variables",
            Listing::NamedSlots => "named-slots",
            Listing::IndexedSlots => "indexed-slots",
            Listing::CustomPresentations => "custom-presentations",
        }
    }
}

/// One classified path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStep {
    /// 1-based indexed element
    Indexed(usize),
    /// Named slot at a 1-based layout position
    Named {
        /// Instance-variable name
        name: String,
        /// Position in the full layout
        position: usize,
    },
    /// Terminal listing
    Listing(Listing),
    /// Segment matching neither an element nor a slot name
    Unresolvable(String),
}

impl SlotStep {
    /// Classify `segment` against `object`; keywords only count in `terminal` position
    pub fn classify(segment: &str, object: &Wrapped, terminal: bool) -> ReflectResult<SlotStep> {
        if terminal {
            if let Some(listing) = Listing::from_keyword(segment) {
                return Ok(SlotStep::Listing(listing));
            }
        }
        if let Some(index) = parse_index(segment) {
            if object.object().has_indexed_slots() {
                return Ok(SlotStep::Indexed(index));
            }
        }
        let layout = object.object_class().all_instance_variable_names()?;
        Ok(match layout.iter().position(|name| name == segment) {
            Some(k) => SlotStep::Named {
                name: segment.to_string(),
                position: k + 1,
            },
            None => SlotStep::Unresolvable(segment.to_string()),
        })
    }
}

/// Canonical decimal segments only: `"3"` but not `"03"` or `"+3"`
fn parse_index(segment: &str) -> Option<usize> {
    let index = segment.parse::<usize>().ok()?;
    (index.to_string() == segment).then_some(index)
}

/// Result of walking a path
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The path ends at an object
    Object(Wrapped),
    /// The path ends with a listing keyword applied to an object
    Listing(Listing, Wrapped),
}

/// Resolve one non-terminal segment against `object`
pub fn slot_of(segment: &str, object: &Wrapped) -> ReflectResult<Wrapped> {
    match SlotStep::classify(segment, object, false)? {
        SlotStep::Indexed(index) => object.at(index).map_err(ReflectError::into_not_found),
        SlotStep::Named { position, .. } => object
            .slot_at(position)
            .map_err(ReflectError::into_not_found),
        SlotStep::Listing(listing) => Err(ReflectError::not_found(listing.keyword())),
        SlotStep::Unresolvable(segment) => Err(ReflectError::not_found(format!(
            "slot {} of {}",
            segment,
            object.object().print_string()
        ))),
    }
}

/// Walk `segments` from `root`
///
/// Empty segments (from doubled or trailing slashes) are skipped.
pub fn resolve_path(root: Wrapped, segments: &[&str]) -> ReflectResult<Resolved> {
    let segments: Vec<&str> = segments.iter().copied().filter(|s| !s.is_empty()).collect();
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        if i + 1 == segments.len() {
            if let Some(listing) = Listing::from_keyword(segment) {
                debug!(listing = listing.keyword(), "path ends in listing");
                return Ok(Resolved::Listing(listing, current));
            }
        }
        current = slot_of(segment, &current)?;
    }
    debug!(depth = segments.len(), "resolved slot path");
    Ok(Resolved::Object(current))
}

/// Requested window of an `indexed-slots` listing
///
/// Bounds are inclusive and 1-based; missing bounds default to the full range and
/// out-of-range bounds are clipped to `[1, size]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct IndexRange {
    /// First index
    pub from: Option<usize>,
    /// Last index
    pub to: Option<usize>,
}

impl IndexRange {
    /// Inclusive bounds clipped to an object of `size` elements
    pub fn clip(&self, size: usize) -> std::ops::RangeInclusive<usize> {
        let from = self.from.unwrap_or(1).max(1);
        let to = self.to.unwrap_or(size).min(size);
        from..=to
    }
}

/// `[{name}]` for every instance variable of the object's class layout
pub fn instance_variables_of(object: &Wrapped) -> ReflectResult<Value> {
    let names = object.object_class().all_instance_variable_names()?;
    Ok(Value::Array(
        names.into_iter().map(|name| json!({ "name": name })).collect(),
    ))
}

/// Every named slot in layout order, each tagged with `slot: <name>`
pub fn named_slots_of(object: &Wrapped) -> ReflectResult<Value> {
    let names = object.object_class().all_instance_variable_names()?;
    let mut slots = Vec::with_capacity(names.len());
    for (k, name) in names.into_iter().enumerate() {
        let slot = object
            .slot_at(k + 1)
            .map_err(ReflectError::into_not_found)?;
        slots.push(tagged(slot.to_json(), json!(name)));
    }
    Ok(Value::Array(slots))
}

/// Indexed elements within `range`, each tagged with `slot: <index>`
pub fn indexed_slots_of(object: &Wrapped, range: IndexRange) -> ReflectResult<Value> {
    let wrapper = object.object();
    if !wrapper.has_indexed_slots() {
        return Err(ReflectError::not_found(format!(
            "indexed slots of {}",
            wrapper.print_string()
        )));
    }
    let mut slots = Vec::new();
    for index in range.clip(wrapper.size()) {
        let element = object.at(index).map_err(ReflectError::into_not_found)?;
        slots.push(tagged(element.to_json(), json!(index)));
    }
    Ok(Value::Array(slots))
}

/// Custom presentations are not provided by any runtime
pub fn custom_presentations_of(_object: &Wrapped) -> ReflectResult<Value> {
    Ok(json!([]))
}

/// Answer the listing a path ended with
pub fn listing_of(listing: Listing, object: &Wrapped, range: IndexRange) -> ReflectResult<Value> {
    match listing {
        Listing::InstanceVariables => instance_variables_of(object),
        Listing::NamedSlots => named_slots_of(object),
        Listing::IndexedSlots => indexed_slots_of(object, range),
        Listing::CustomPresentations => custom_presentations_of(object),
    }
}

fn tagged(mut json: Value, slot: Value) -> Value {
    if let Value::Object(fields) = &mut json {
        fields.insert("slot".into(), slot);
    }
    json
}
