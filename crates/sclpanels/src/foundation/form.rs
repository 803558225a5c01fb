//! Attribute field groups.
//!
//! A [`FieldGroup`] mirrors the attributes of one element (or of one named
//! child of it). Dirty state and saving compare every field with the live
//! attribute, so a save only ever carries what actually changed.

use super::inputs::Validity;
use super::nullable::AttributeInput;
use super::value::Value;
use crate::edit::{create_element, Edit, Insert, Update};
use crate::scl::{schema::get_reference, ElemId, SclDoc};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTarget {
    Element,
    /// First child of this tag, e.g. `TrgOps` of a ReportControl.
    Child(&'static str),
}

pub struct FormField {
    /// Attribute name, doubling as the field label.
    pub label: &'static str,
    pub helper: &'static str,
    pub input: Box<dyn AttributeInput>,
}

pub struct FieldGroup {
    target: GroupTarget,
    fields: Vec<FormField>,
}

impl FieldGroup {
    pub fn new(target: GroupTarget) -> Self {
        FieldGroup {
            target,
            fields: Vec::new(),
        }
    }

    pub fn with(
        mut self,
        label: &'static str,
        helper: &'static str,
        input: impl AttributeInput + 'static,
    ) -> Self {
        self.fields.push(FormField {
            label,
            helper,
            input: Box::new(input),
        });
        self
    }

    pub fn target(&self) -> GroupTarget {
        self.target
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, label: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.label == label)
    }

    pub fn field_mut(&mut self, label: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.label == label)
    }

    /// User edit of a field's visible value; unknown labels are ignored.
    pub fn input(&mut self, label: &str, raw: &str) {
        if let Some(field) = self.field_mut(label) {
            field.input.input(raw);
        }
    }

    pub fn set_null(&mut self, label: &str, null: bool) {
        if let Some(field) = self.field_mut(label) {
            field.input.set_null(null);
        }
    }

    pub fn set_reserved_values(&mut self, label: &str, reserved: Vec<String>) {
        if let Some(field) = self.field_mut(label) {
            field.input.set_reserved_values(reserved);
        }
    }

    pub fn set_custom_validity(&mut self, label: &str, message: Option<String>) {
        if let Some(field) = self.field_mut(label) {
            field.input.set_custom_validity(message);
        }
    }

    pub fn maybe_value(&self, label: &str) -> Value<String> {
        self.field(label)
            .map(|f| f.input.maybe_value())
            .unwrap_or(Value::Absent)
    }

    fn resolve(&self, doc: &SclDoc, element: ElemId) -> Option<ElemId> {
        match self.target {
            GroupTarget::Element => Some(element),
            GroupTarget::Child(tag) => doc.first_child(element, tag),
        }
    }

    fn current(&self, doc: &SclDoc, element: ElemId, label: &str) -> Value<String> {
        self.resolve(doc, element)
            .and_then(|target| doc.attr(target, label))
            .map(|v| v.to_string())
            .into()
    }

    /// Copies the live attributes into the fields.
    pub fn load(&mut self, doc: &SclDoc, element: ElemId) {
        let target = self.resolve(doc, element);
        for field in self.fields.iter_mut() {
            let value: Value<String> = target
                .and_then(|t| doc.attr(t, field.label))
                .map(|v| v.to_string())
                .into();
            field.input.set_maybe_value(value);
        }
    }

    pub fn validity(&self) -> Vec<(&'static str, Validity)> {
        self.fields
            .iter()
            .map(|f| (f.label, f.input.check_validity()))
            .filter(|(_, v)| !v.is_valid())
            .collect()
    }

    pub fn all_valid(&self) -> bool {
        self.fields.iter().all(|f| f.input.check_validity().is_valid())
    }

    pub fn some_diff(&self, doc: &SclDoc, element: ElemId) -> bool {
        self.fields
            .iter()
            .any(|f| f.input.maybe_value() != self.current(doc, element, f.label))
    }

    /// Changed attributes only, `None` meaning remove.
    pub fn attribute_diff(&self, doc: &SclDoc, element: ElemId) -> IndexMap<String, Option<String>> {
        self.fields
            .iter()
            .filter_map(|f| {
                let value = f.input.maybe_value();
                if value == self.current(doc, element, f.label) {
                    None
                } else {
                    Some((f.label.to_string(), value.into_option()))
                }
            })
            .collect()
    }

    /// Update of the changed attributes, or the insert of a missing child group.
    ///
    /// `None` while a field is invalid or nothing changed.
    pub fn save(&self, doc: &SclDoc, element: ElemId) -> Option<Edit> {
        if !self.all_valid() {
            return None;
        }
        let attributes = self.attribute_diff(doc, element);
        if attributes.is_empty() {
            return None;
        }
        match (self.resolve(doc, element), self.target) {
            (Some(target), _) => Some(
                Update {
                    element: target,
                    attributes,
                }
                .into(),
            ),
            (None, GroupTarget::Child(tag)) => {
                let present: Vec<(&str, Option<&str>)> = attributes
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_deref()))
                    .collect();
                Some(
                    Insert {
                        parent: element,
                        node: create_element(tag, &present),
                        reference: get_reference(doc, element, tag),
                    }
                    .into(),
                )
            }
            (None, GroupTarget::Element) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::inputs::{CheckboxInput, TextInput};
    use crate::foundation::nullable::Nullable;

    const XML: &str = r#"<ReportControl name="rcb" bufTime="100" desc="old"><OptFields seqNum="true"/></ReportControl>"#;

    fn main_group() -> FieldGroup {
        FieldGroup::new(GroupTarget::Element)
            .with("name", "", Nullable::new(TextInput::new().required(), ""))
            .with("desc", "", Nullable::new(TextInput::new(), "").nullable())
            .with("bufTime", "", Nullable::new(TextInput::new().number(Some(0)), "0").nullable())
    }

    #[test]
    fn loaded_group_is_clean() {
        let doc = SclDoc::parse(XML).unwrap();
        let mut group = main_group();
        group.load(&doc, doc.root());
        assert!(!group.some_diff(&doc, doc.root()));
        assert_eq!(group.save(&doc, doc.root()), None);
    }

    #[test]
    fn diff_carries_changes_only() {
        let doc = SclDoc::parse(XML).unwrap();
        let mut group = main_group();
        group.load(&doc, doc.root());
        group.set_null("desc", true);
        let diff = group.attribute_diff(&doc, doc.root());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.get("desc"), Some(&None));
    }

    #[test]
    fn invalid_field_blocks_save() {
        let doc = SclDoc::parse(XML).unwrap();
        let mut group = main_group();
        group.load(&doc, doc.root());
        group.input("bufTime", "-5");
        assert!(group.some_diff(&doc, doc.root()));
        assert!(!group.all_valid());
        assert_eq!(group.save(&doc, doc.root()), None);
    }

    #[test]
    fn missing_child_group_is_inserted() {
        let doc = SclDoc::parse(XML).unwrap();
        let mut trg_ops = FieldGroup::new(GroupTarget::Child("TrgOps"))
            .with("dchg", "", Nullable::new(CheckboxInput::new(), "false").nullable())
            .with("gi", "", Nullable::new(CheckboxInput::new(), "false").nullable());
        trg_ops.load(&doc, doc.root());
        assert!(trg_ops.field("dchg").unwrap().input.is_null());
        trg_ops.input("dchg", "true");
        let insert = trg_ops.save(&doc, doc.root()).unwrap();
        let insert = insert.as_insert().unwrap();
        assert_eq!(insert.node.tag, "TrgOps");
        assert_eq!(insert.node.attr("dchg"), Some("true"));
        assert_eq!(insert.node.attr("gi"), None);
        assert_eq!(insert.reference, doc.first_child(doc.root(), "OptFields"));
    }
}
