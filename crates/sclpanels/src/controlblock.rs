//! Control block helpers: creation, subscriber lookup, composite removal and
//! attribute updates that keep references intact.

use crate::cfg::EditorCfg;
use crate::edit::{create_element, Edit, Insert, NewElement, Update};
use crate::scl::{identity, schema::get_reference, ElemId, SclDoc};
use crate::utils::unique_name;
use indexmap::IndexMap;
use tracing::debug;

pub const CONTROL_BLOCK_TAGS: &[&str] = &[
    "GSEControl",
    "ReportControl",
    "SampledValueControl",
    "LogControl",
];

/************************************************************************/
/*			1 查找					*/
/************************************************************************/

/// Sibling DataSet named by the block's `datSet`.
pub fn find_data_set(doc: &SclDoc, cb: ElemId) -> Option<ElemId> {
    let name = doc.attr(cb, "datSet")?;
    let parent = doc.parent(cb)?;
    doc.named_child(parent, "DataSet", name)
}

/// Source reference of a control block as seen from a subscriber.
struct SourceRef<'a> {
    ied_name: &'a str,
    ld_inst: &'a str,
    prefix: &'a str,
    ln_class: &'a str,
    ln_inst: &'a str,
    cb_name: &'a str,
}

impl<'a> SourceRef<'a> {
    fn of(doc: &'a SclDoc, cb: ElemId) -> Option<Self> {
        let ln = doc.parent(cb)?;
        let ied = doc.closest(cb, "IED")?;
        let ld = doc.closest(cb, "LDevice")?;
        Some(SourceRef {
            ied_name: doc.attr(ied, "name")?,
            ld_inst: doc.attr(ld, "inst")?,
            prefix: doc.attr(ln, "prefix").unwrap_or(""),
            ln_class: doc.attr(ln, "lnClass").unwrap_or("LLN0"),
            ln_inst: doc.attr(ln, "inst").unwrap_or(""),
            cb_name: doc.attr(cb, "name")?,
        })
    }

    fn is_source_of(&self, doc: &SclDoc, ext_ref: ElemId) -> bool {
        let att = |name: &str| doc.attr(ext_ref, name);
        att("iedName") == Some(self.ied_name)
            && att("srcCBName") == Some(self.cb_name)
            && att("srcLDInst").or_else(|| att("ldInst")) == Some(self.ld_inst)
            && att("srcLNClass").unwrap_or("LLN0") == self.ln_class
            && att("srcPrefix").unwrap_or("") == self.prefix
            && att("srcLNInst").unwrap_or("") == self.ln_inst
    }
}

/// `ExtRef`s anywhere in the document subscribed to `cb`.
pub fn find_control_block_subscriptions(doc: &SclDoc, cb: ElemId) -> Vec<ElemId> {
    let Some(source) = SourceRef::of(doc, cb) else {
        return Vec::new();
    };
    doc.elements_by_tag("ExtRef")
        .filter(|ext_ref| source.is_source_of(doc, *ext_ref))
        .collect()
}

/// Communication `GSE`/`SMV` elements addressing `cb`.
pub fn find_communication_elements(doc: &SclDoc, cb: ElemId) -> Vec<ElemId> {
    let tag = match doc.tag(cb) {
        "GSEControl" => "GSE",
        "SampledValueControl" => "SMV",
        _ => return Vec::new(),
    };
    let (Some(ied), Some(ld)) = (doc.closest(cb, "IED"), doc.closest(cb, "LDevice")) else {
        return Vec::new();
    };
    let ied_name = doc.attr(ied, "name");
    let ld_inst = doc.attr(ld, "inst");
    let cb_name = doc.attr(cb, "name");
    doc.elements_by_tag(tag)
        .filter(|comm| {
            doc.parent(*comm)
                .filter(|ap| doc.tag(*ap) == "ConnectedAP")
                .and_then(|ap| doc.attr(ap, "iedName"))
                == ied_name
                && doc.attr(*comm, "ldInst") == ld_inst
                && doc.attr(*comm, "cbName") == cb_name
        })
        .collect()
}
/************************************************************************/
/*			1 查找 end					*/
/************************************************************************/

/************************************************************************/
/*			2 新建					*/
/************************************************************************/
fn sibling_names<'a>(doc: &'a SclDoc, parent: ElemId, tags: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    doc.children(parent)
        .iter()
        .filter(move |c| tags.contains(&doc.tag(**c)))
        .filter_map(move |c| doc.attr(*c, "name"))
}

/// New empty DataSet below an LN0/LN, with a name not yet used there.
pub fn create_data_set(doc: &SclDoc, parent: ElemId, cfg: &EditorCfg) -> Option<Insert> {
    if !matches!(doc.tag(parent), "LN0" | "LN") {
        return None;
    }
    let name = unique_name(
        &cfg.new_dataset_prefix,
        sibling_names(doc, parent, &["DataSet"]),
    );
    Some(Insert {
        parent,
        node: create_element("DataSet", &[("name", Some(name.as_str()))]),
        reference: get_reference(doc, parent, "DataSet"),
    })
}

fn first_ln0(doc: &SclDoc, ied: ElemId) -> Option<ElemId> {
    if doc.tag(ied) != "IED" {
        return None;
    }
    let ln0 = doc.descendants_by_tag(ied, &["LN0"]).into_iter().next();
    if ln0.is_none() {
        debug!("IED {} has no LN0 to hold a control block", identity(doc, ied));
    }
    ln0
}

fn control_block_insert(doc: &SclDoc, ln0: ElemId, node: NewElement) -> Insert {
    let reference = get_reference(doc, ln0, &node.tag);
    Insert {
        parent: ln0,
        node,
        reference,
    }
}

fn control_block_name(doc: &SclDoc, ln0: ElemId, prefix: &str) -> String {
    unique_name(prefix, sibling_names(doc, ln0, CONTROL_BLOCK_TAGS))
}

pub fn create_gse_control(doc: &SclDoc, ied: ElemId, cfg: &EditorCfg) -> Option<Insert> {
    let ln0 = first_ln0(doc, ied)?;
    let name = control_block_name(doc, ln0, &cfg.new_gse_control_prefix);
    let node = create_element(
        "GSEControl",
        &[
            ("name", Some(name.as_str())),
            ("type", Some("GOOSE")),
            ("appID", Some(name.as_str())),
            ("confRev", Some("1")),
        ],
    );
    Some(control_block_insert(doc, ln0, node))
}

pub fn create_report_control(doc: &SclDoc, ied: ElemId, cfg: &EditorCfg) -> Option<Insert> {
    let ln0 = first_ln0(doc, ied)?;
    let name = control_block_name(doc, ln0, &cfg.new_report_control_prefix);
    let yes = Some("true");
    let node = create_element(
        "ReportControl",
        &[
            ("name", Some(name.as_str())),
            ("rptID", Some(name.as_str())),
            ("confRev", Some("1")),
            ("buffered", yes),
            ("bufTime", Some(cfg.default_buf_time.as_str())),
            ("intgPd", Some(cfg.default_intg_pd.as_str())),
        ],
    )
    .with_child(create_element(
        "TrgOps",
        &[("dchg", yes), ("qchg", yes), ("dupd", yes), ("period", yes), ("gi", yes)],
    ))
    .with_child(create_element(
        "OptFields",
        &[
            ("seqNum", yes),
            ("timeStamp", yes),
            ("dataSet", yes),
            ("reasonCode", yes),
            ("entryID", yes),
            ("configRef", yes),
            ("bufOvfl", yes),
        ],
    ))
    .with_child(create_element(
        "RptEnabled",
        &[("max", Some(cfg.default_max_clients.as_str()))],
    ));
    Some(control_block_insert(doc, ln0, node))
}

pub fn create_smv_control(doc: &SclDoc, ied: ElemId, cfg: &EditorCfg) -> Option<Insert> {
    let ln0 = first_ln0(doc, ied)?;
    let name = control_block_name(doc, ln0, &cfg.new_smv_control_prefix);
    let node = create_element(
        "SampledValueControl",
        &[
            ("name", Some(name.as_str())),
            ("smvID", Some(name.as_str())),
            ("multicast", Some("true")),
            ("smpMod", Some("SmpPerPeriod")),
            ("smpRate", Some("80")),
            ("nofASDU", Some("1")),
            ("confRev", Some("1")),
        ],
    )
    .with_child(create_element(
        "SmvOpts",
        &[
            ("refreshTime", Some("false")),
            ("sampleSynchronized", Some("true")),
            ("sampleRate", Some("false")),
            ("dataSet", Some("false")),
            ("security", Some("false")),
        ],
    ));
    Some(control_block_insert(doc, ln0, node))
}
/************************************************************************/
/*			2 新建 end					*/
/************************************************************************/

/************************************************************************/
/*			3 删除 及 更新					*/
/************************************************************************/

/// Removes `cb`, its DataSet when no other block of the same logical node uses
/// it, the subscribing `ExtRef`s and its Communication `GSE`/`SMV`.
pub fn remove_control_block(doc: &SclDoc, cb: ElemId) -> Option<Edit> {
    if !CONTROL_BLOCK_TAGS.contains(&doc.tag(cb)) {
        return None;
    }
    let mut actions = vec![Edit::remove(cb)];
    if let (Some(data_set), Some(parent)) = (find_data_set(doc, cb), doc.parent(cb)) {
        let dat_set = doc.attr(cb, "datSet");
        let shared = doc
            .children(parent)
            .iter()
            .any(|other| *other != cb && CONTROL_BLOCK_TAGS.contains(&doc.tag(*other)) && doc.attr(*other, "datSet") == dat_set);
        if !shared {
            actions.push(Edit::remove(data_set));
        }
    }
    actions.extend(
        find_control_block_subscriptions(doc, cb)
            .into_iter()
            .map(Edit::remove),
    );
    actions.extend(
        find_communication_elements(doc, cb)
            .into_iter()
            .map(Edit::remove),
    );
    Edit::from_actions(actions)
}

fn single_update(element: ElemId, name: &str, value: Option<&str>) -> Edit {
    let mut attributes = IndexMap::new();
    attributes.insert(name.to_string(), value.map(|v| v.to_string()));
    Update { element, attributes }.into()
}

/// Update of `cb`. A new `name` is carried into subscribing `ExtRef`s
/// (`srcCBName`) and Communication `GSE`/`SMV` (`cbName`).
pub fn update_control_block(
    doc: &SclDoc,
    cb: ElemId,
    attributes: IndexMap<String, Option<String>>,
) -> Vec<Edit> {
    if attributes.is_empty() {
        return Vec::new();
    }
    let rename = match (doc.attr(cb, "name"), attributes.get("name")) {
        (Some(old), Some(Some(new))) if old != new => Some(new.clone()),
        _ => None,
    };
    let mut actions: Vec<Edit> = vec![Update {
        element: cb,
        attributes,
    }
    .into()];
    if let Some(new) = rename {
        actions.extend(
            find_control_block_subscriptions(doc, cb)
                .into_iter()
                .map(|ext_ref| single_update(ext_ref, "srcCBName", Some(new.as_str()))),
        );
        actions.extend(
            find_communication_elements(doc, cb)
                .into_iter()
                .map(|comm| single_update(comm, "cbName", Some(new.as_str()))),
        );
    }
    actions
}

/// `RptEnabled max` of a ReportControl, `None` when nothing changes.
///
/// Clearing `max` removes the `RptEnabled` only while it holds no `ClientLN`.
pub fn update_max_clients(doc: &SclDoc, rcb: ElemId, max: Option<&str>) -> Option<Edit> {
    if doc.tag(rcb) != "ReportControl" {
        return None;
    }
    let Some(rpt_enabled) = doc.first_child(rcb, "RptEnabled") else {
        let max = max?;
        return Some(
            Insert {
                parent: rcb,
                node: create_element("RptEnabled", &[("max", Some(max))]),
                reference: get_reference(doc, rcb, "RptEnabled"),
            }
            .into(),
        );
    };
    if doc.attr(rpt_enabled, "max") == max {
        return None;
    }
    if max.is_none() && doc.first_child(rpt_enabled, "ClientLN").is_none() {
        return Some(Edit::remove(rpt_enabled));
    }
    Some(single_update(rpt_enabled, "max", max))
}
/************************************************************************/
/*			3 删除 及 更新 end					*/
/************************************************************************/
