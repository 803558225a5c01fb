//! Edit actions handed to the host.
//!
//! These are plain values. The host owns the document, applies them and keeps
//! the undo stack; a [`Edit::Complex`] is one undo step.

use crate::scl::ElemId;
use indexmap::IndexMap;
use serde::Serialize;

/// Element the host should create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewElement {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<NewElement>,
}

impl NewElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    pub fn with_child(mut self, child: NewElement) -> Self {
        self.children.push(child);
        self
    }
}

/// Builds a [`NewElement`]; attributes given as `None` are left out.
pub fn create_element(tag: &str, attributes: &[(&str, Option<&str>)]) -> NewElement {
    NewElement {
        tag: tag.to_string(),
        attributes: attributes
            .iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.to_string())))
            .collect(),
        children: Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insert {
    pub parent: ElemId,
    pub node: NewElement,
    /// Sibling to insert before, `None` appends.
    pub reference: Option<ElemId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Update {
    pub element: ElemId,
    /// `None` removes the attribute.
    pub attributes: IndexMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remove {
    pub node: ElemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Edit {
    Insert(Insert),
    Update(Update),
    Remove(Remove),
    Complex { actions: Vec<Edit> },
}

impl From<Insert> for Edit {
    fn from(value: Insert) -> Self {
        Edit::Insert(value)
    }
}

impl From<Update> for Edit {
    fn from(value: Update) -> Self {
        Edit::Update(value)
    }
}

impl From<Remove> for Edit {
    fn from(value: Remove) -> Self {
        Edit::Remove(value)
    }
}

impl Edit {
    pub fn remove(node: ElemId) -> Self {
        Edit::Remove(Remove { node })
    }

    /// Bundles `actions`: nothing for none, the action itself for one.
    pub fn from_actions(mut actions: Vec<Edit>) -> Option<Edit> {
        match actions.len() {
            0 => None,
            1 => actions.pop(),
            _ => Some(Edit::Complex { actions }),
        }
    }

    /// Flattened leaf actions in application order.
    pub fn actions(&self) -> Vec<&Edit> {
        match self {
            Edit::Complex { actions } => actions.iter().flat_map(|a| a.actions()).collect(),
            leaf => vec![leaf],
        }
    }

    pub fn as_update(&self) -> Option<&Update> {
        match self {
            Edit::Update(update) => Some(update),
            _ => None,
        }
    }

    pub fn as_insert(&self) -> Option<&Insert> {
        match self {
            Edit::Insert(insert) => Some(insert),
            _ => None,
        }
    }
}
