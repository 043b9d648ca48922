//! Webside Introspection Engine
//!
//! This crate exposes a live object graph (classes, metaclasses, compiled methods and
//! their instances) in the shape consumed by the Webside development tools:
//! - **Runtime**: the capability trait the engine queries (`runtime` module)
//! - **Memory**: an in-process object table implementing that trait (`memory` module)
//! - **Wrappers**: uniform, serializable views over runtime values (`wrapper` module)
//! - **Navigation**: class lookup, class trees and slot paths (`hierarchy`, `slots`)
//! - **Queries**: method-set aggregation over the class universe (`query` module)
//! - **Pins**: stable short identifiers for live objects (`pins` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webside_engine::{memory::bootstrap, ClassesQuery, Inspector, Runtime};
//!
//! let memory = bootstrap::kernel_image().unwrap();
//! let runtime: Arc<dyn Runtime> = Arc::new(memory);
//! let inspector = Inspector::new(runtime);
//!
//! let point = inspector.class_definition("Point").unwrap();
//! assert_eq!(point["name"], "Point");
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Error taxonomy shared by every navigation and query operation
pub mod error;

/// Runtime capability trait and object handles
pub mod runtime;

/// In-process object memory implementing the runtime capability
pub mod memory;

/// Uniform views over runtime values
pub mod wrapper;

/// Class lookup and class-tree construction
pub mod hierarchy;

/// Slot path resolution and slot listings
pub mod slots;

/// Method-set aggregation
pub mod query;

/// Pinned object table
pub mod pins;

/// Request-level facade over the runtime and the pin table
pub mod inspector;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{ReflectError, ReflectResult};
pub use hierarchy::{class_named, class_tree, default_root_class, TreeShape};
pub use inspector::{ClassesQuery, Inspector, PinRequest};
pub use pins::PinTable;
pub use query::MethodQuery;
pub use runtime::{ObjectKind, Oop, Runtime};
pub use slots::{IndexRange, Listing, Resolved, SlotStep};
pub use wrapper::{MethodWrapper, ObjectWrapper, Reflective, SpeciesWrapper, Wrapped};
