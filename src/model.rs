// Instantiated objects produced by injection. No serde_json::Value here.

use std::fmt::{self, Write as _};
use indexmap::IndexMap;

use crate::schema::{ClassDef, FieldKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Attribute(Option<Scalar>),         // single-valued attribute
    Attributes(Vec<Scalar>),           // many-valued attribute
    Reference(Option<Box<Instance>>),  // single child
    References(Vec<Instance>),         // child collection
}

impl Slot {
    fn is_empty(&self) -> bool {
        match self {
            Slot::Attribute(v) => v.is_none(),
            Slot::Attributes(v) => v.is_empty(),
            Slot::Reference(v) => v.is_none(),
            Slot::References(v) => v.is_empty(),
        }
    }
}

/// One object of a schema class. Holds exactly one slot per class field, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    class: String,
    slots: IndexMap<String, Slot>,
}

impl Instance {
    /// Fresh instance with every slot empty.
    pub fn new(class: &ClassDef) -> Self {
        let slots = class.fields().map(|f| {
            let slot = match (f.kind(), f.is_many()) {
                (FieldKind::Attribute { .. }, false) => Slot::Attribute(None),
                (FieldKind::Attribute { .. }, true) => Slot::Attributes(Vec::new()),
                (FieldKind::Reference { .. }, false) => Slot::Reference(None),
                (FieldKind::Reference { .. }, true) => Slot::References(Vec::new()),
            };
            (f.name().to_string(), slot)
        }).collect();
        Self { class: class.name().to_string(), slots }
    }

    pub fn class_name(&self) -> &str { &self.class }

    pub fn slot(&self, name: &str) -> Option<&Slot> { self.slots.get(name) }

    pub fn slots(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attribute(&self, name: &str) -> Option<&Scalar> {
        match self.slots.get(name)? {
            Slot::Attribute(v) => v.as_ref(),
            _ => None,
        }
    }

    pub fn attributes(&self, name: &str) -> &[Scalar] {
        match self.slots.get(name) {
            Some(Slot::Attributes(v)) => v,
            _ => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&Instance> {
        match self.slots.get(name)? {
            Slot::Reference(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn children(&self, name: &str) -> &[Instance] {
        match self.slots.get(name) {
            Some(Slot::References(v)) => v,
            _ => &[],
        }
    }

    // Setters write through the slot shape fixed by `new`; a shape mismatch
    // leaves the instance untouched.

    pub(crate) fn set_attribute(&mut self, name: &str, value: Scalar) {
        match self.slots.get_mut(name) {
            Some(Slot::Attribute(v)) => *v = Some(value),
            Some(Slot::Attributes(v)) => v.push(value),
            _ => {}
        }
    }

    pub(crate) fn set_child(&mut self, name: &str, child: Instance) {
        match self.slots.get_mut(name) {
            Some(Slot::Reference(v)) => *v = Some(Box::new(child)),
            Some(Slot::References(v)) => v.push(child),
            _ => {}
        }
    }
}

// ------------------------------- Rendering -------------------------------- //

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{}", serde_json::Value::from(s.as_str())),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Indented tree, one line per non-empty slot.
impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        render(self, 0, &mut out)?;
        f.write_str(&out)
    }
}

fn render(inst: &Instance, depth: usize, out: &mut String) -> fmt::Result {
    writeln!(out, "{}", inst.class)?;
    let pad = "  ".repeat(depth + 1);
    for (name, slot) in &inst.slots {
        if slot.is_empty() {
            continue;
        }
        match slot {
            Slot::Attribute(Some(v)) => writeln!(out, "{pad}{name}: {v}")?,
            Slot::Attributes(vs) => {
                let items = vs.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                writeln!(out, "{pad}{name}: [{}]", items.join(", "))?;
            }
            Slot::Reference(Some(child)) => {
                write!(out, "{pad}{name}: ")?;
                render(child, depth + 1, out)?;
            }
            Slot::References(children) => {
                for (i, child) in children.iter().enumerate() {
                    write!(out, "{pad}{name}[{i}]: ")?;
                    render(child, depth + 1, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self { Scalar::String(s.to_string()) }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self { Scalar::Integer(i) }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self { Scalar::Boolean(b) }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, Multiplicity};

    fn node() -> ClassDef {
        ClassDef::new("Node")
            .attribute("name", DataType::String, Multiplicity::Single)
            .attribute("tags", DataType::String, Multiplicity::Many)
            .reference("next", "Node", Multiplicity::Single)
            .reference("kids", "Node", Multiplicity::Many)
    }

    #[test]
    fn new_instance_has_one_empty_slot_per_field() {
        let inst = Instance::new(&node());
        assert_eq!(inst.class_name(), "Node");
        let names: Vec<&str> = inst.slots().map(|(n, _)| n).collect();
        assert_eq!(names, ["name", "tags", "next", "kids"]);
        assert!(inst.attribute("name").is_none());
        assert!(inst.attributes("tags").is_empty());
        assert!(inst.child("next").is_none());
        assert!(inst.children("kids").is_empty());
    }

    #[test]
    fn setters_follow_slot_multiplicity() {
        let class = node();
        let mut inst = Instance::new(&class);
        inst.set_attribute("name", "a".into());
        inst.set_attribute("name", "b".into());
        inst.set_attribute("tags", "x".into());
        inst.set_attribute("tags", "y".into());
        inst.set_attribute("missing", "z".into());
        assert_eq!(inst.attribute("name"), Some(&Scalar::from("b")));
        assert_eq!(inst.attributes("tags"), [Scalar::from("x"), Scalar::from("y")]);
        assert!(inst.slot("missing").is_none());

        // an attribute value never lands in a reference slot
        inst.set_attribute("next", "oops".into());
        assert!(inst.child("next").is_none());
    }

    #[test]
    fn renders_nested_tree() {
        let class = node();
        let mut leaf = Instance::new(&class);
        leaf.set_attribute("name", "leaf".into());
        let mut root = Instance::new(&class);
        root.set_attribute("name", "root \"q\"".into());
        root.set_attribute("tags", "t1".into());
        root.set_child("next", leaf.clone());
        root.set_child("kids", leaf);

        let expected = "\
Node
  name: \"root \\\"q\\\"\"
  tags: [\"t1\"]
  next: Node
    name: \"leaf\"
  kids[0]: Node
    name: \"leaf\"
";
        assert_eq!(root.to_string(), expected);
    }

    #[test]
    fn scalars_render_like_json() {
        assert_eq!(Scalar::from(-3).to_string(), "-3");
        assert_eq!(Scalar::from(true).to_string(), "true");
        assert_eq!(Scalar::from("hi").to_string(), "\"hi\"");
    }
}
