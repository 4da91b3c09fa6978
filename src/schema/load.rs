//! Schema documents on disk.
//!
//! The on-disk form is plain JSON (`classifiers` tagged by `kind`). Parse
//! failures report the JSON path of the offending entry.
use std::path::{Path, PathBuf};
use serde::Deserialize;
use thiserror::Error;

use super::{ClassDef, Classifier, DataType, DataTypeDef, FieldDef, Multiplicity, Schema};

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schema at JSON path {path}: {message}")]
    Parse { path: String, message: String },

    #[error("duplicate classifier `{name}`")]
    DuplicateClassifier { name: String },

    #[error("duplicate field `{field}` in class `{class}`")]
    DuplicateField { class: String, field: String },
}

// ------------------------------ Documents --------------------------------- //

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    classifiers: Vec<ClassifierDoc>,
}

// Plain structs with a `kind` field rather than internally tagged enums:
// serde buffers tagged enums, which hides the error path inside them.

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ClassifierKind {
    Class,
    Datatype,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ClassifierDoc {
    kind: ClassifierKind,
    name: String,
    #[serde(default, rename = "abstract")]
    is_abstract: Option<bool>,
    #[serde(default)]
    fields: Option<Vec<FieldDoc>>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum FieldKindDoc {
    Attribute,
    Reference,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FieldDoc {
    kind: FieldKindDoc,
    name: String,
    #[serde(default, rename = "type")]
    data_type: Option<DataType>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    many: bool,
}

fn multiplicity(many: bool) -> Multiplicity {
    if many { Multiplicity::Many } else { Multiplicity::Single }
}

fn malformed(path: String, message: &str) -> SchemaError {
    SchemaError::Parse { path, message: message.to_string() }
}

impl FieldDoc {
    /// `path` locates this entry, e.g. `classifiers[0].fields[1]`.
    fn into_def(self, path: String) -> Result<FieldDef, SchemaError> {
        let many = multiplicity(self.many);
        match self.kind {
            FieldKindDoc::Attribute => {
                if self.target.is_some() {
                    return Err(malformed(path, "`target` is only allowed on references"));
                }
                Ok(FieldDef::attribute(self.name, self.data_type.unwrap_or_default(), many))
            }
            FieldKindDoc::Reference => {
                if self.data_type.is_some() {
                    return Err(malformed(path, "`type` is only allowed on attributes"));
                }
                let Some(target) = self.target else {
                    return Err(malformed(path, "missing field `target`"));
                };
                Ok(FieldDef::reference(self.name, target, many))
            }
        }
    }
}

impl ClassifierDoc {
    fn into_classifier(self, path: String) -> Result<Classifier, SchemaError> {
        match self.kind {
            ClassifierKind::Datatype => {
                if self.is_abstract.is_some() || self.fields.is_some() {
                    return Err(malformed(path, "datatypes take no `abstract` or `fields`"));
                }
                Ok(DataTypeDef::new(self.name).into())
            }
            ClassifierKind::Class => {
                let mut class = ClassDef::new(self.name);
                if self.is_abstract.unwrap_or(false) {
                    class = class.abstract_class();
                }
                for (i, f) in self.fields.unwrap_or_default().into_iter().enumerate() {
                    class = class.try_with_field(f.into_def(format!("{path}.fields[{i}]"))?)?;
                }
                Ok(class.into())
            }
        }
    }
}

// ------------------------------- Loading ---------------------------------- //

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<'de, T: Deserialize<'de>>(src: &'de str) -> Result<T, SchemaError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| SchemaError::Parse {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

impl Schema {
    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDoc = from_str_with_path(src)?;
        let classifiers = doc
            .classifiers
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.into_classifier(format!("classifiers[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Schema::new(doc.name, classifiers)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_json_str(&src)?;
        tracing::debug!(path = %path.display(), classifiers = schema.classifiers().count(), "loaded schema");
        Ok(schema)
    }
}

// ------------------------------- Tests ------------------------------------ //
