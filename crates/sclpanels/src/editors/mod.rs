//! Control block editors.
//!
//! One [`ControlBlockEditor`] per kind holds the current document, the
//! selected control block and its DataSet. Selections are kept as element ids
//! of the current document and re-resolved by identity when the host hands
//! over a new one.

pub mod gsecontrol;
pub mod report;
pub mod sampledvalue;

use crate::cfg::EditorCfg;
use crate::controlblock::{create_data_set, find_control_block_subscriptions, find_data_set, remove_control_block};
use crate::dataset::DataSetForm;
use crate::edit::{Edit, Insert, Update};
use crate::scl::{identity, update_element_reference, ElemId, SclDoc};
use crate::utils::contains_incaseinse;
use indexmap::IndexMap;
use serde::Serialize;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::info;

pub use gsecontrol::{GseControl, GseControlForm};
pub use report::{ReportControl, ReportControlForm};
pub use sampledvalue::{SampledValueControl, SampledValueControlForm};

pub type GseControlEditor = ControlBlockEditor<GseControl>;
pub type ReportControlEditor = ControlBlockEditor<ReportControl>;
pub type SampledValueControlEditor = ControlBlockEditor<SampledValueControl>;

/// Attribute form of one control block kind.
pub trait ControlBlockForm {
    fn new(cfg: &EditorCfg) -> Self;
    fn load(&mut self, doc: &SclDoc, cb: ElemId);
    fn some_diff(&self, doc: &SclDoc, cb: ElemId) -> bool;
    /// Dirty and valid.
    fn can_save(&self, doc: &SclDoc, cb: ElemId) -> bool;
    fn save(&self, doc: &SclDoc, cb: ElemId) -> Option<Edit>;
}

pub trait ControlKind {
    const TAG: &'static str;
    type Form: ControlBlockForm;

    /// Blocks of this kind listed under `ied`.
    fn control_blocks(doc: &SclDoc, ied: ElemId) -> Vec<ElemId> {
        doc.descendants_by_tag(ied, &[Self::TAG])
    }

    fn supporting_text(doc: &SclDoc, cb: ElemId) -> String {
        identity(doc, cb)
    }

    fn create(doc: &SclDoc, ied: ElemId, cfg: &EditorCfg) -> Option<Insert>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditorState {
    NoDocument,
    NoSelection,
    Selected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionItem {
    pub name: String,
    pub identity: String,
    pub supporting_text: String,
    pub delete: Option<Edit>,
}

/// One IED of the selection list: header plus its control blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionGroup {
    pub ied_name: String,
    /// Identities of all blocks in the group, used to keep the header visible
    /// while filtering.
    pub filter_group: Vec<String>,
    pub add: Option<Edit>,
    pub items: Vec<SelectionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSetCandidate {
    pub name: String,
    pub identity: String,
    pub selected: bool,
}

/// Block of kind `K` with `identity_str` among the ones the selection list shows.
fn find_listed<K: ControlKind>(doc: &SclDoc, identity_str: &str) -> Option<ElemId> {
    doc.children_by_tag(doc.root(), "IED")
        .flat_map(|ied| K::control_blocks(doc, ied))
        .find(|cb| identity(doc, *cb) == identity_str)
}

pub struct ControlBlockEditor<K: ControlKind> {
    cfg: EditorCfg,
    doc: Option<Rc<SclDoc>>,
    selected: Option<ElemId>,
    selected_data_set: Option<ElemId>,
    form: K::Form,
    data_set_form: DataSetForm,
    kind: PhantomData<K>,
}

impl<K: ControlKind> ControlBlockEditor<K> {
    pub fn new(cfg: EditorCfg) -> Self {
        ControlBlockEditor {
            form: K::Form::new(&cfg),
            data_set_form: DataSetForm::new(&cfg),
            cfg,
            doc: None,
            selected: None,
            selected_data_set: None,
            kind: PhantomData,
        }
    }

    pub fn state(&self) -> EditorState {
        match (&self.doc, self.selected) {
            (None, _) => EditorState::NoDocument,
            (Some(_), None) => EditorState::NoSelection,
            (Some(_), Some(_)) => EditorState::Selected,
        }
    }

    pub fn doc(&self) -> Option<&Rc<SclDoc>> {
        self.doc.as_ref()
    }

    pub fn selected(&self) -> Option<ElemId> {
        self.selected
    }

    pub fn selected_data_set(&self) -> Option<ElemId> {
        self.selected_data_set
    }

    pub fn form(&self) -> &K::Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut K::Form {
        &mut self.form
    }

    pub fn data_set_form(&self) -> &DataSetForm {
        &self.data_set_form
    }

    pub fn data_set_form_mut(&mut self) -> &mut DataSetForm {
        &mut self.data_set_form
    }

    fn reload_forms(&mut self, doc: &SclDoc) {
        if let Some(cb) = self.selected {
            self.form.load(doc, cb);
        }
        match self.selected_data_set {
            Some(data_set) => self.data_set_form.load(doc, data_set),
            None => self.data_set_form.clear(),
        }
    }

    /// Hands over the host's current document.
    ///
    /// The same `Rc` again changes nothing. For a different document the
    /// selection is looked up by identity and reset when it is gone.
    pub fn set_doc(&mut self, doc: Rc<SclDoc>) {
        if let Some(current) = &self.doc {
            if Rc::ptr_eq(current, &doc) {
                return;
            }
        }
        let old = self.doc.replace(doc.clone());
        if let (Some(old), Some(cb)) = (old, self.selected) {
            match update_element_reference(&doc, &old, cb) {
                Some(moved) => {
                    self.selected = Some(moved);
                    self.selected_data_set = find_data_set(&doc, moved);
                    self.reload_forms(&doc);
                }
                None => {
                    info!("{} {} not in new document, selection reset", K::TAG, identity(&old, cb));
                    self.clear_selection();
                }
            }
        }
    }

    pub fn selection_list(&self) -> Vec<SelectionGroup> {
        let Some(doc) = &self.doc else {
            return Vec::new();
        };
        doc.children_by_tag(doc.root(), "IED")
            .map(|ied| {
                let items: Vec<SelectionItem> = K::control_blocks(doc, ied)
                    .into_iter()
                    .map(|cb| SelectionItem {
                        name: doc.attr(cb, "name").unwrap_or("").to_string(),
                        identity: identity(doc, cb),
                        supporting_text: K::supporting_text(doc, cb),
                        delete: remove_control_block(doc, cb),
                    })
                    .collect();
                SelectionGroup {
                    ied_name: doc.attr(ied, "name").unwrap_or("").to_string(),
                    filter_group: items.iter().map(|i| i.identity.clone()).collect(),
                    add: K::create(doc, ied, &self.cfg).map(Edit::from),
                    items,
                }
            })
            .collect()
    }

    /// Selection list restricted to blocks whose name or supporting text
    /// contains `query` (case-insensitive). Groups left empty are dropped.
    pub fn filter_selection_list(&self, query: &str) -> Vec<SelectionGroup> {
        self.selection_list()
            .into_iter()
            .filter_map(|mut group| {
                group.items.retain(|item| {
                    contains_incaseinse(&item.name, query) || contains_incaseinse(&item.supporting_text, query)
                });
                (!group.items.is_empty()).then_some(group)
            })
            .collect()
    }

    /// Selects the block with `identity_str`; `false` leaves the editor as is.
    pub fn select(&mut self, identity_str: &str) -> bool {
        let Some(doc) = self.doc.clone() else {
            return false;
        };
        let Some(cb) = find_listed::<K>(&doc, identity_str) else {
            return false;
        };
        self.selected = Some(cb);
        self.selected_data_set = find_data_set(&doc, cb);
        self.reload_forms(&doc);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.selected_data_set = None;
        self.data_set_form.clear();
    }

    fn current(&self) -> Option<(&SclDoc, ElemId)> {
        Some((self.doc.as_deref()?, self.selected?))
    }

    /// DataSets next to the selected block.
    pub fn data_set_candidates(&self) -> Vec<DataSetCandidate> {
        let Some((doc, cb)) = self.current() else {
            return Vec::new();
        };
        let selected_name = self
            .selected_data_set
            .and_then(|ds| doc.attr(ds, "name"))
            .unwrap_or("UNDEFINED");
        doc.parent(cb)
            .map(|parent| {
                doc.children_by_tag(parent, "DataSet")
                    .map(|ds| {
                        let name = doc.attr(ds, "name").unwrap_or("UNDEFINED");
                        DataSetCandidate {
                            name: name.to_string(),
                            identity: identity(doc, ds),
                            selected: name == selected_name,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A subscribed block keeps its DataSet.
    pub fn can_change_data_set(&self) -> bool {
        self.current()
            .map(|(doc, cb)| find_control_block_subscriptions(doc, cb).is_empty())
            .unwrap_or(false)
    }

    pub fn can_add_data_set(&self) -> bool {
        self.current()
            .map(|(doc, cb)| doc.attr(cb, "datSet").is_none())
            .unwrap_or(false)
    }

    /// Points the selected block at the sibling DataSet `name`.
    pub fn select_data_set(&mut self, name: &str) -> Option<Edit> {
        let doc = self.doc.clone()?;
        let cb = self.selected?;
        let data_set = doc.parent(cb).and_then(|p| doc.named_child(p, "DataSet", name))?;
        let mut attributes = IndexMap::new();
        attributes.insert("datSet".to_string(), Some(name.to_string()));
        self.selected_data_set = Some(data_set);
        self.data_set_form.load(&doc, data_set);
        Some(Update { element: cb, attributes }.into())
    }

    /// New empty DataSet plus the `datSet` update, as one edit.
    pub fn add_new_data_set(&self) -> Option<Edit> {
        if !self.can_add_data_set() {
            return None;
        }
        let (doc, cb) = self.current()?;
        let insert = create_data_set(doc, doc.parent(cb)?, &self.cfg)?;
        let name = insert.node.attr("name")?.to_string();
        let mut attributes = IndexMap::new();
        attributes.insert("datSet".to_string(), Some(name));
        Edit::from_actions(vec![insert.into(), Update { element: cb, attributes }.into()])
    }

    pub fn delete(&self, identity_str: &str) -> Option<Edit> {
        let doc = self.doc.as_deref()?;
        let cb = find_listed::<K>(doc, identity_str)?;
        remove_control_block(doc, cb)
    }

    pub fn can_save(&self) -> bool {
        self.current()
            .map(|(doc, cb)| self.form.can_save(doc, cb))
            .unwrap_or(false)
    }

    /// Changed attributes of the selected block.
    pub fn save(&self) -> Option<Edit> {
        let (doc, cb) = self.current()?;
        self.form.save(doc, cb)
    }

    pub fn save_data_set(&self) -> Option<Edit> {
        let doc = self.doc.as_deref()?;
        self.data_set_form.save(doc, self.selected_data_set?)
    }
}
