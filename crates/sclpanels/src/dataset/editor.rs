//! DataSet element editing.

use super::fcda::{add_fcdas, add_fcdos};
use super::tree::{build_attribute_tree, build_data_object_tree, resolve_fc_path, resolve_tree_path, Tree};
use crate::cfg::EditorCfg;
use crate::controlblock::CONTROL_BLOCK_TAGS;
use crate::edit::{Edit, Update};
use crate::foundation::{FieldGroup, GroupTarget, Nullable, Pattern, TextInput, Value};
use crate::scl::{identity, ElemId, SclDoc};
use indexmap::IndexMap;
use serde::Serialize;

/// Name and description of a DataSet.
pub struct DataSetForm {
    group: FieldGroup,
    loaded: Option<ElemId>,
}

impl DataSetForm {
    pub fn new(cfg: &EditorCfg) -> Self {
        let group = FieldGroup::new(GroupTarget::Element)
            .with(
                "name",
                "DataSet Name",
                Nullable::new(
                    TextInput::new()
                        .required()
                        .pattern(Pattern::AsciName)
                        .max_length(cfg.cb_name_max_len),
                    "",
                ),
            )
            .with(
                "desc",
                "DataSet Description",
                Nullable::new(TextInput::new(), "").nullable(),
            );
        DataSetForm { group, loaded: None }
    }

    pub fn group(&self) -> &FieldGroup {
        &self.group
    }

    pub fn group_mut(&mut self) -> &mut FieldGroup {
        &mut self.group
    }

    /// DataSet the form was last loaded from.
    pub fn loaded(&self) -> Option<ElemId> {
        self.loaded
    }

    /// Detaches the form; nothing is saved until the next `load`.
    pub fn clear(&mut self) {
        self.loaded = None;
    }

    /// Loads `data_set`; sibling DataSet names become reserved.
    pub fn load(&mut self, doc: &SclDoc, data_set: ElemId) {
        self.loaded = Some(data_set);
        self.group.load(doc, data_set);
        let reserved = doc
            .parent(data_set)
            .map(|parent| {
                doc.children_by_tag(parent, "DataSet")
                    .filter(|other| *other != data_set)
                    .filter_map(|other| doc.attr(other, "name"))
                    .map(|name| name.to_string())
                    .collect()
            })
            .unwrap_or_default();
        self.group.set_reserved_values("name", reserved);
    }

    pub fn some_diff(&self, doc: &SclDoc, data_set: ElemId) -> bool {
        self.group.some_diff(doc, data_set)
    }

    pub fn can_save(&self, doc: &SclDoc, data_set: ElemId) -> bool {
        self.loaded == Some(data_set) && self.group.all_valid() && self.some_diff(doc, data_set)
    }

    /// Changed attributes; a rename also repoints the control blocks of the
    /// same logical node that used the old name.
    pub fn save(&self, doc: &SclDoc, data_set: ElemId) -> Option<Edit> {
        if self.loaded != Some(data_set) {
            return None;
        }
        let update = self.group.save(doc, data_set)?;
        let mut actions = vec![update];
        if let (Some(old), Value::Present(new)) = (doc.attr(data_set, "name"), self.group.maybe_value("name")) {
            if old != new {
                actions.extend(data_set_renames(doc, data_set, old, &new));
            }
        }
        Edit::from_actions(actions)
    }
}

fn data_set_renames(doc: &SclDoc, data_set: ElemId, old: &str, new: &str) -> Vec<Edit> {
    let Some(parent) = doc.parent(data_set) else {
        return Vec::new();
    };
    doc.children(parent)
        .iter()
        .copied()
        .filter(|cb| CONTROL_BLOCK_TAGS.contains(&doc.tag(*cb)))
        .filter(|cb| doc.attr(*cb, "datSet") == Some(old))
        .map(|cb| {
            let mut attributes = IndexMap::new();
            attributes.insert("datSet".to_string(), Some(new.to_string()));
            Update {
                element: cb,
                attributes,
            }
            .into()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FcdaItem {
    pub element: ElemId,
    pub identity: String,
    /// `doName[.daName] [fc]`
    pub label: String,
}

pub fn fcda_items(doc: &SclDoc, data_set: ElemId) -> Vec<FcdaItem> {
    doc.children_by_tag(data_set, "FCDA")
        .map(|fcda| {
            let mut label = doc.attr(fcda, "doName").unwrap_or("").to_string();
            if let Some(da_name) = doc.attr(fcda, "daName") {
                label = format!("{}.{}", label, da_name);
            }
            FcdaItem {
                element: fcda,
                identity: identity(doc, fcda),
                label: format!("{} [{}]", label, doc.attr(fcda, "fc").unwrap_or("")),
            }
        })
        .collect()
}

pub fn remove_fcda(doc: &SclDoc, fcda: ElemId) -> Option<Edit> {
    (doc.tag(fcda) == "FCDA").then(|| Edit::remove(fcda))
}

/// Data attribute picker over the Server that holds `data_set`.
pub fn attribute_picker(doc: &SclDoc, data_set: ElemId) -> Tree {
    doc.closest(data_set, "Server")
        .map(|server| build_attribute_tree(doc, server))
        .unwrap_or_default()
}

/// Data object picker over the Server that holds `data_set`.
pub fn data_object_picker(doc: &SclDoc, data_set: ElemId) -> Tree {
    doc.closest(data_set, "Server")
        .map(|server| build_data_object_tree(doc, server))
        .unwrap_or_default()
}

/// Adds the picked data attributes as one edit, `None` when nothing is new.
pub fn save_data_attributes<S: AsRef<str>>(doc: &SclDoc, data_set: ElemId, picked: &[Vec<S>]) -> Option<Edit> {
    let paths: Vec<Vec<ElemId>> = picked.iter().map(|keys| resolve_tree_path(doc, keys)).collect();
    let actions = add_fcdas(doc, data_set, &paths)
        .into_iter()
        .map(Edit::from)
        .collect();
    Edit::from_actions(actions)
}

/// Adds the picked functionally constrained data objects as one edit.
pub fn save_data_objects<S: AsRef<str>>(doc: &SclDoc, data_set: ElemId, picked: &[Vec<S>]) -> Option<Edit> {
    let fc_paths: Vec<_> = picked
        .iter()
        .filter_map(|keys| resolve_fc_path(doc, keys))
        .collect();
    let actions = add_fcdos(doc, data_set, &fc_paths)
        .into_iter()
        .map(Edit::from)
        .collect();
    Edit::from_actions(actions)
}
