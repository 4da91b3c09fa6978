//! Schema-driven injection engine.
//!
//! Walk a JSON tree depth-first and build typed [`Instance`]s from a
//! [`Schema`]. Matching is purely by key name: keys with no field are
//! ignored, fields with no key stay empty, and values whose shape does not
//! fit their field are dropped. Nothing here fails; a partially matching
//! document yields a partially populated graph.
//!
//! Rules:
//! - Root: a JSON object, or every object element of a JSON array.
//! - Arrays feed their elements one at a time into the same field, so a
//!   single-valued field fed an array keeps the last assignable element.
//! - Attributes take coerced primitives; references take nested objects,
//!   instantiated against the field's target class.
pub mod coerce;

use std::path::{Path, PathBuf};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::Instance;
use crate::schema::{Classifier, FieldDef, FieldKind, Schema, SchemaError};

pub use coerce::coerce;

// ------------------------------- Policy ---------------------------------- //

/// Conventional name of the entry-point class.
pub const ROOT_CLASS: &str = "Root";
/// Nesting guard: objects deeper than this many reference hops are dropped.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Clone, Debug)]
pub struct InjectOptions {
    pub root_class: String,
    pub max_depth: usize,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self { root_class: ROOT_CLASS.to_string(), max_depth: DEFAULT_MAX_DEPTH }
    }
}

// -------------------------------- Roots ----------------------------------- //

/// Top-level JSON objects to instantiate, in document order.
pub fn root_objects(v: &Value) -> Vec<&Map<String, Value>> {
    match v {
        Value::Array(xs) => {
            tracing::debug!(len = xs.len(), "several root candidates found");
            xs.iter().filter_map(Value::as_object).collect()
        }
        Value::Object(m) => {
            tracing::debug!("single root object found");
            vec![m]
        }
        other => {
            tracing::debug!(root = %other, "root is neither object nor array");
            Vec::new()
        }
    }
}

// ------------------------------- Front API -------------------------------- //

pub struct Injector<'s> {
    schema: &'s Schema,
    options: InjectOptions,
}

impl<'s> Injector<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_options(schema, InjectOptions::default())
    }

    pub fn with_options(schema: &'s Schema, options: InjectOptions) -> Self {
        Self { schema, options }
    }

    pub fn inject(&self, v: &Value) -> Vec<Instance> {
        let roots = root_objects(v);
        let Some(root) = self.schema.classifier(&self.options.root_class) else {
            tracing::debug!(root_class = %self.options.root_class, "root class not in schema");
            return Vec::new();
        };
        roots
            .into_iter()
            .filter_map(|obj| self.instantiate(root, obj, 0))
            .collect()
    }

    // ---------------------------- Instantiate ----------------------------- //

    /// Build one instance of `classifier` from `obj`. `None` when the
    /// classifier cannot be instantiated or `depth` exceeds the limit.
    pub fn instantiate(&self, classifier: &Classifier, obj: &Map<String, Value>, depth: usize) -> Option<Instance> {
        let Some(class) = classifier.as_instantiable() else {
            tracing::debug!(classifier = classifier.name(), "not instantiable; object dropped");
            return None;
        };
        if depth > self.options.max_depth {
            tracing::warn!(class = class.name(), depth, max_depth = self.options.max_depth, "nesting too deep; object dropped");
            return None;
        }

        let mut inst = Instance::new(class);
        for (key, value) in obj {
            match class.field_by_name(key) {
                Some(field) => self.assign(&mut inst, field, value, depth),
                None => tracing::trace!(class = class.name(), key = %key, "no such field; ignored"),
            }
        }
        Some(inst)
    }

    // ------------------------------- Assign ------------------------------- //

    /// Assign `v` to `field`, element by element when `v` is an array.
    pub fn assign(&self, inst: &mut Instance, field: &FieldDef, v: &Value, depth: usize) {
        match v {
            Value::Array(xs) => {
                for x in xs {
                    self.assign_one(inst, field, x, depth);
                }
            }
            _ => self.assign_one(inst, field, v, depth),
        }
    }

    fn assign_one(&self, inst: &mut Instance, field: &FieldDef, v: &Value, depth: usize) {
        tracing::trace!(field = field.name(), "setting field");
        match field.kind() {
            FieldKind::Attribute { .. } => {
                // Non-coercible values are skipped: no placeholder is appended
                // and a previous single value is kept.
                if let Some(scalar) = coerce(v) {
                    inst.set_attribute(field.name(), scalar);
                }
            }
            FieldKind::Reference { target } => {
                let Value::Object(child_obj) = v else {
                    return;
                };
                let Some(child_class) = self.schema.classifier(target) else {
                    tracing::debug!(field = field.name(), target = %target, "reference target not in schema; value dropped");
                    return;
                };
                if let Some(child) = self.instantiate(child_class, child_obj, depth + 1) {
                    inst.set_child(field.name(), child);
                }
            }
        }
    }
}

/// Inject `v` against `schema` with default options.
pub fn inject(v: &Value, schema: &Schema) -> Vec<Instance> {
    Injector::new(schema).inject(v)
}

// ----------------------------- Text and files ----------------------------- //

/// Failures before injection starts: the core itself never fails.
#[derive(Error, Debug)]
pub enum InjectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub fn read_source(path: &Path) -> Result<String, InjectError> {
    std::fs::read_to_string(path).map_err(|source| InjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_document(src: &str) -> Result<Value, InjectError> {
    Ok(serde_json::from_str::<Value>(src)?)
}

/// Parse `src` and inject it against `schema`.
pub fn inject_str(src: &str, schema: &Schema) -> Result<Vec<Instance>, InjectError> {
    Ok(inject(&parse_document(src)?, schema))
}

/// Load the schema at `schema_path`, then inject the JSON file at `json_path`.
pub fn inject_file(json_path: impl AsRef<Path>, schema_path: impl AsRef<Path>) -> Result<Vec<Instance>, InjectError> {
    let schema = Schema::load(schema_path)?;
    inject_str(&read_source(json_path.as_ref())?, &schema)
}

// ------------------------------- Tests ------------------------------------ //
