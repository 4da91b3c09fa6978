//! Schema-driven injection of JSON documents into typed object trees.
//!
//! ```
//! use json_inject::schema::{ClassDef, DataType, Multiplicity, Schema};
//! use json_inject::model::Scalar;
//! use serde_json::json;
//!
//! let schema = Schema::new("people", [
//!     ClassDef::new("Root")
//!         .attribute("name", DataType::String, Multiplicity::Single)
//!         .attribute("scores", DataType::Integer, Multiplicity::Many),
//! ]).unwrap();
//!
//! let objects = json_inject::inject(&json!({"name": "a", "scores": [1, 2, 3]}), &schema);
//! assert_eq!(objects.len(), 1);
//! assert_eq!(objects[0].attribute("name"), Some(&Scalar::from("a")));
//! assert_eq!(objects[0].attributes("scores").len(), 3);
//! ```
pub mod schema;
pub mod model;
pub mod inject;
pub mod cli;
pub mod jq_exec;

pub use inject::{inject, inject_file, inject_str, InjectError, InjectOptions, Injector};
pub use model::{Instance, Scalar, Slot};
pub use schema::{Schema, SchemaError};
