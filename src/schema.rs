//! In-memory schema registry.
//!
//! A [`Schema`] is a named set of classifiers. Classes carry ordered field
//! definitions; data types are named but never instantiated. The registry is
//! immutable once built, so one schema can be shared by any number of
//! concurrent injections.
pub mod load;

use std::fmt;
use indexmap::IndexMap;
use indexmap::map::Entry;

pub use load::SchemaError;

// ------------------------------ Field defs -------------------------------- //

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Multiplicity {
    #[default]
    Single,
    Many,
}

/// Declared scalar type of an attribute. Descriptive only: injection
/// coerces by JSON shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Integer,
    Boolean,
    #[default]
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Attribute { data_type: DataType },
    Reference { target: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    name: String,
    kind: FieldKind,
    multiplicity: Multiplicity,
}

impl FieldDef {
    pub fn attribute(name: impl Into<String>, data_type: DataType, multiplicity: Multiplicity) -> Self {
        Self { name: name.into(), kind: FieldKind::Attribute { data_type }, multiplicity }
    }
    pub fn reference(name: impl Into<String>, target: impl Into<String>, multiplicity: Multiplicity) -> Self {
        Self { name: name.into(), kind: FieldKind::Reference { target: target.into() }, multiplicity }
    }
    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> &FieldKind { &self.kind }
    pub fn multiplicity(&self) -> Multiplicity { self.multiplicity }
    pub fn is_many(&self) -> bool { self.multiplicity == Multiplicity::Many }
}

// ------------------------------ Classifiers ------------------------------- //

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    name: String,
    is_abstract: bool,
    fields: IndexMap<String, FieldDef>,
    // first field name the builders saw twice; `Schema::new` rejects it
    duplicate: Option<String>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_abstract: false, fields: IndexMap::new(), duplicate: None }
    }

    /// Builder: mark the class abstract.
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Builder: add a field. A repeated name is remembered and the class is
    /// rejected by [`Schema::new`]; [`ClassDef::try_with_field`] fails at once.
    pub fn field(mut self, field: FieldDef) -> Self {
        match self.fields.entry(field.name.clone()) {
            Entry::Occupied(e) => {
                if self.duplicate.is_none() {
                    self.duplicate = Some(e.key().clone());
                }
            }
            Entry::Vacant(e) => { e.insert(field); }
        }
        self
    }

    pub fn attribute(self, name: &str, data_type: DataType, multiplicity: Multiplicity) -> Self {
        self.field(FieldDef::attribute(name, data_type, multiplicity))
    }

    pub fn reference(self, name: &str, target: &str, multiplicity: Multiplicity) -> Self {
        self.field(FieldDef::reference(name, target, multiplicity))
    }

    pub fn try_with_field(mut self, field: FieldDef) -> Result<Self, SchemaError> {
        match self.fields.entry(field.name.clone()) {
            Entry::Occupied(_) => Err(SchemaError::DuplicateField {
                class: self.name.clone(),
                field: field.name,
            }),
            Entry::Vacant(slot) => {
                slot.insert(field);
                Ok(self)
            }
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn is_abstract(&self) -> bool { self.is_abstract }
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> { self.fields.get(name) }
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> { self.fields.values() }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataTypeDef {
    name: String,
}

impl DataTypeDef {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
    pub fn name(&self) -> &str { &self.name }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classifier {
    Class(ClassDef),
    DataType(DataTypeDef),
}

impl Classifier {
    pub fn name(&self) -> &str {
        match self {
            Classifier::Class(c) => c.name(),
            Classifier::DataType(d) => d.name(),
        }
    }

    /// The class definition, if this classifier can be instantiated.
    pub fn as_instantiable(&self) -> Option<&ClassDef> {
        match self {
            Classifier::Class(c) if !c.is_abstract() => Some(c),
            _ => None,
        }
    }
}

impl From<ClassDef> for Classifier {
    fn from(c: ClassDef) -> Self { Classifier::Class(c) }
}

impl From<DataTypeDef> for Classifier {
    fn from(d: DataTypeDef) -> Self { Classifier::DataType(d) }
}

// -------------------------------- Schema ---------------------------------- //

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    name: String,
    classifiers: IndexMap<String, Classifier>,
}

impl Schema {
    /// Build a schema, rejecting classifiers that share a name.
    pub fn new<I>(name: impl Into<String>, classifiers: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator,
        I::Item: Into<Classifier>,
    {
        let mut map = IndexMap::<String, Classifier>::new();
        for c in classifiers {
            let c = c.into();
            if let Classifier::Class(ClassDef { name, duplicate: Some(field), .. }) = &c {
                return Err(SchemaError::DuplicateField { class: name.clone(), field: field.clone() });
            }
            match map.entry(c.name().to_string()) {
                Entry::Occupied(e) => {
                    return Err(SchemaError::DuplicateClassifier { name: e.key().clone() });
                }
                Entry::Vacant(e) => { e.insert(c); }
            }
        }
        Ok(Self { name: name.into(), classifiers: map })
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn classifier(&self, name: &str) -> Option<&Classifier> {
        self.classifiers.get(name)
    }

    /// Any class (abstract included) with this name.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassDef> {
        match self.classifiers.get(name)? {
            Classifier::Class(c) => Some(c),
            Classifier::DataType(_) => None,
        }
    }

    pub fn classifiers(&self) -> impl Iterator<Item = &Classifier> {
        self.classifiers.values()
    }
}

// ------------------------------- Listing ---------------------------------- //

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Boolean => "boolean",
            DataType::Any => "any",
        })
    }
}

impl fmt::Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = if self.is_many() { "[*]" } else { "[1]" };
        match &self.kind {
            FieldKind::Attribute { data_type } => write!(f, "{}: {} {}", self.name, data_type, bound),
            FieldKind::Reference { target } => write!(f, "{} -> {} {}", self.name, target, bound),
        }
    }
}

/// `classes` listing: one header per classifier, fields indented below.
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema {}", self.name)?;
        for c in self.classifiers() {
            match c {
                Classifier::DataType(d) => writeln!(f, "datatype {}", d.name())?,
                Classifier::Class(class) => {
                    let prefix = if class.is_abstract() { "abstract class" } else { "class" };
                    writeln!(f, "{prefix} {}", class.name())?;
                    for field in class.fields() {
                        writeln!(f, "  {field}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Schema {
        Schema::new("people", [
            Classifier::from(
                ClassDef::new("Root")
                    .attribute("name", DataType::String, Multiplicity::Single)
                    .reference("child", "Node", Multiplicity::Many),
            ),
            ClassDef::new("Shape").abstract_class().into(),
            DataTypeDef::new("Date").into(),
        ]).unwrap()
    }

    #[test]
    fn lookups_distinguish_classes_from_datatypes() {
        let schema = people();
        assert!(schema.class_by_name("Root").is_some());
        assert!(schema.class_by_name("Date").is_none());
        assert!(schema.classifier("Date").is_some());
        assert!(schema.classifier("Missing").is_none());
    }

    #[test]
    fn abstract_and_datatype_are_not_instantiable() {
        let schema = people();
        assert!(schema.classifier("Root").unwrap().as_instantiable().is_some());
        assert!(schema.classifier("Shape").unwrap().as_instantiable().is_none());
        assert!(schema.classifier("Date").unwrap().as_instantiable().is_none());
    }

    #[test]
    fn field_lookup_reports_kind_and_multiplicity() {
        let schema = people();
        let root = schema.class_by_name("Root").unwrap();
        let child = root.field_by_name("child").unwrap();
        assert!(child.is_many());
        assert_eq!(child.kind(), &FieldKind::Reference { target: "Node".into() });
        assert!(!root.field_by_name("name").unwrap().is_many());
        assert!(root.field_by_name("nope").is_none());
    }

    #[test]
    fn duplicate_classifier_is_rejected() {
        let err = Schema::new("dup", [ClassDef::new("A"), ClassDef::new("A")]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateClassifier { ref name } if name == "A"));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let err = ClassDef::new("A")
            .try_with_field(FieldDef::attribute("x", DataType::Any, Multiplicity::Single))
            .and_then(|c| c.try_with_field(FieldDef::attribute("x", DataType::Any, Multiplicity::Many)))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn duplicate_field_from_builders_is_rejected_by_schema() {
        let class = ClassDef::new("A")
            .attribute("x", DataType::Any, Multiplicity::Single)
            .reference("x", "A", Multiplicity::Many);
        assert_eq!(class.fields().count(), 1);
        let err = Schema::new("dup", [class]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { ref class, ref field } if class == "A" && field == "x"));
    }

    #[test]
    fn datatype_name_accessor() {
        let d = DataTypeDef::new("Date");
        assert_eq!(d.name(), "Date");
        assert_eq!(Classifier::from(d).name(), "Date");
    }

    #[test]
    fn listing_shows_bounds_and_targets() {
        let listing = people().to_string();
        assert!(listing.contains("class Root\n  name: string [1]\n  child -> Node [*]\n"));
        assert!(listing.contains("abstract class Shape"));
        assert!(listing.contains("datatype Date"));
    }
}
