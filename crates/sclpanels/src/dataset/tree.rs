//! Picker trees over a Server's logical devices.
//!
//! Keys are `"<TAG>: <identity>"`, so a selected path can be turned back into
//! elements with [`resolve_tree_path`]. Missing type definitions only cut the
//! branch short; building a tree never fails.

use crate::scl::{find, identity, ElemId, SclDoc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

pub type Tree = IndexMap<String, TreeNode>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub text: String,
    /// `None` for leaves and for branches without a type definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Tree>,
}

/// Path through the data object picker plus the functional constraint of its
/// `FC: ` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FcPath {
    pub path: Vec<ElemId>,
    pub fc: String,
}

//类型嵌套最大深度 防止递归的类型定义
const MAX_TYPE_NEST: usize = 30;

const FC_KEY_PREFIX: &str = "FC: ";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn label(base: &str, desc: Option<&str>) -> String {
    match non_empty(desc) {
        Some(desc) => format!("{} ({})", base, desc),
        None => base.to_string(),
    }
}

fn node_key(doc: &SclDoc, id: ElemId) -> String {
    format!("{}: {}", doc.tag(id), identity(doc, id))
}

fn name_or_unknown<'a>(doc: &'a SclDoc, id: ElemId, tag: &str) -> std::borrow::Cow<'a, str> {
    match doc.attr(id, "name") {
        Some(name) => name.into(),
        None => format!("UNKNOWN_{}", tag).into(),
    }
}

fn ldevice_label(doc: &SclDoc, ld: ElemId) -> String {
    label(doc.attr(ld, "inst").unwrap_or("UNKNOWN_LDEVICE"), doc.attr(ld, "desc"))
}

fn any_ln_label(doc: &SclDoc, ln: ElemId) -> String {
    let base = format!(
        "{} {} {}",
        doc.attr(ln, "prefix").unwrap_or(""),
        doc.attr(ln, "lnClass").unwrap_or("UNKNOWN_INST"),
        doc.attr(ln, "inst").unwrap_or("")
    );
    label(&base, doc.attr(ln, "desc"))
}

/// `id` → element lookup for the data type templates, first definition wins.
struct Templates<'a> {
    doc: &'a SclDoc,
    index: HashMap<(&'a str, &'a str), ElemId>,
}

impl<'a> Templates<'a> {
    fn new(doc: &'a SclDoc) -> Self {
        let mut index = HashMap::new();
        for tag in ["LNodeType", "DOType", "DAType"] {
            for def in doc.elements_by_tag(tag) {
                if let Some(id) = doc.attr(def, "id") {
                    index.entry((doc.tag(def), id)).or_insert(def);
                }
            }
        }
        Templates { doc, index }
    }

    /// Definition referenced by `attr` of `user` (`lnType` or `type`).
    fn lookup(&self, tag: &'a str, user: ElemId, attr: &str) -> Option<ElemId> {
        let id = self.doc.attr(user, attr)?;
        self.index.get(&(tag, id)).copied()
    }
}

/************************************************************************/
/*			1 数据属性树					*/
/************************************************************************/
struct AttributeTreeBuilder<'a> {
    doc: &'a SclDoc,
    templates: Templates<'a>,
}

impl<'a> AttributeTreeBuilder<'a> {
    fn ldevice(&self, ld: ElemId) -> Tree {
        self.doc
            .descendants_by_tag(ld, &["LN0", "LN"])
            .into_iter()
            .map(|ln| {
                let node = TreeNode {
                    text: any_ln_label(self.doc, ln),
                    children: self.logical_node(ln),
                };
                (node_key(self.doc, ln), node)
            })
            .collect()
    }

    fn logical_node(&self, ln: ElemId) -> Option<Tree> {
        let doc = self.doc;
        let ln_type = self.templates.lookup("LNodeType", ln, "lnType")?;
        let tree = doc
            .descendants_by_tag(ln_type, &["DO"])
            .into_iter()
            .map(|dobj| {
                let name = name_or_unknown(doc, dobj, "DO");
                let doi = doc.named_child(ln, "DOI", &name);
                let node = TreeNode {
                    text: label(&name, doi.and_then(|d| doc.attr(d, "desc"))),
                    children: self.data_object(dobj, doi, true, 0),
                };
                (node_key(doc, dobj), node)
            })
            .collect();
        Some(tree)
    }

    /// Expands a `DO` (`top`) or `SDO` through its DOType. `instance` is the
    /// matching DOI or SDI.
    fn data_object(&self, holder: ElemId, instance: Option<ElemId>, top: bool, depth: usize) -> Option<Tree> {
        let doc = self.doc;
        if depth > MAX_TYPE_NEST {
            warn!("type nesting below {} too deep, branch cut", identity(doc, holder));
            return None;
        }
        let do_type = self.templates.lookup("DOType", holder, "type")?;
        let mut tree = Tree::new();
        for child in doc.descendants_by_tag(do_type, &["SDO", "DA"]) {
            if doc.tag(child) == "SDO" {
                let name = name_or_unknown(doc, child, "SDO");
                let sdi = instance.and_then(|i| doc.named_descendant(i, "SDI", &name));
                let desc = if top {
                    instance.and_then(|doi| d_description(doc, doi))
                } else {
                    sdi.and_then(|s| doc.attr(s, "desc"))
                };
                let node = TreeNode {
                    text: label(&name, desc),
                    children: self.data_object(child, sdi, false, depth + 1),
                };
                tree.insert(node_key(doc, child), node);
            } else {
                let name = name_or_unknown(doc, child, "DA");
                let dai = instance.and_then(|i| doc.named_descendant(i, "DAI", &name));
                let node = TreeNode {
                    text: da_label(doc, child, &name, dai.and_then(|d| doc.attr(d, "desc"))),
                    children: self.struct_children(child, dai, depth),
                };
                tree.insert(node_key(doc, child), node);
            }
        }
        Some(tree)
    }

    fn struct_children(&self, attr: ElemId, dai: Option<ElemId>, depth: usize) -> Option<Tree> {
        if self.doc.attr(attr, "bType") == Some("Struct") {
            self.data_attribute(attr, dai, depth + 1)
        } else {
            None
        }
    }

    /// Expands a Struct `DA`/`BDA`. The DAI description decorates the
    /// immediate BDAs only.
    fn data_attribute(&self, attr: ElemId, dai: Option<ElemId>, depth: usize) -> Option<Tree> {
        let doc = self.doc;
        if depth > MAX_TYPE_NEST {
            warn!("type nesting below {} too deep, branch cut", identity(doc, attr));
            return None;
        }
        let da_type = self.templates.lookup("DAType", attr, "type")?;
        let desc = dai.and_then(|d| doc.attr(d, "desc"));
        let tree = doc
            .descendants_by_tag(da_type, &["BDA"])
            .into_iter()
            .map(|bda| {
                let name = name_or_unknown(doc, bda, "BDA");
                let node = TreeNode {
                    text: label(&name, desc),
                    children: self.struct_children(bda, None, depth),
                };
                (node_key(doc, bda), node)
            })
            .collect();
        Some(tree)
    }
}

/// DOI description, falling back to the text of its `d` DAI value.
fn d_description(doc: &SclDoc, doi: ElemId) -> Option<&str> {
    non_empty(doc.attr(doi, "desc")).or_else(|| {
        doc.named_child(doi, "DAI", "d")
            .and_then(|dai| doc.first_child(dai, "Val"))
            .map(|val| doc.text(val))
    })
}

fn da_label(doc: &SclDoc, da: ElemId, name: &str, desc: Option<&str>) -> String {
    let fc = doc.attr(da, "fc").unwrap_or("UNKNOWN_FC");
    let base = if fc.is_empty() {
        name.to_string()
    } else {
        format!("{} - FC: {}", name, fc)
    };
    label(&base, desc)
}

/// Every data attribute reachable below `server`, grouped
/// `LDevice > LN0/LN > DO > SDO/DA > BDA`.
pub fn build_attribute_tree(doc: &SclDoc, server: ElemId) -> Tree {
    let builder = AttributeTreeBuilder {
        doc,
        templates: Templates::new(doc),
    };
    doc.descendants_by_tag(server, &["LDevice"])
        .into_iter()
        .map(|ld| {
            let node = TreeNode {
                text: ldevice_label(doc, ld),
                children: Some(builder.ldevice(ld)),
            };
            (node_key(doc, ld), node)
        })
        .collect()
}
/************************************************************************/
/*			1 数据属性树 end					*/
/************************************************************************/

/************************************************************************/
/*			2 数据对象树 (按功能约束分组)					*/
/************************************************************************/
struct DataObjectTreeBuilder<'a> {
    doc: &'a SclDoc,
    templates: Templates<'a>,
}

impl<'a> DataObjectTreeBuilder<'a> {
    /// Functional constraints of the DAs below a DO/SDO type, nested SDOs included.
    fn fcs(&self, holder: ElemId, depth: usize) -> BTreeSet<&'a str> {
        let mut fcs = BTreeSet::new();
        if depth > MAX_TYPE_NEST {
            return fcs;
        }
        let Some(do_type) = self.templates.lookup("DOType", holder, "type") else {
            return fcs;
        };
        for child in self.doc.descendants_by_tag(do_type, &["SDO", "DA"]) {
            if self.doc.tag(child) == "DA" {
                if let Some(fc) = non_empty(self.doc.attr(child, "fc")) {
                    fcs.insert(fc);
                }
            } else {
                fcs.extend(self.fcs(child, depth + 1));
            }
        }
        fcs
    }

    fn logical_node(&self, ln: ElemId) -> Option<Tree> {
        let doc = self.doc;
        let ln_type = self.templates.lookup("LNodeType", ln, "lnType")?;
        let dobjs = doc.descendants_by_tag(ln_type, &["DO"]);
        let per_do: Vec<(ElemId, BTreeSet<&str>)> =
            dobjs.into_iter().map(|d| (d, self.fcs(d, 0))).collect();
        let all: BTreeSet<&str> = per_do.iter().flat_map(|(_, f)| f.iter().copied()).collect();

        let tree = all
            .into_iter()
            .map(|fc| {
                let group: Tree = per_do
                    .iter()
                    .filter(|(_, f)| f.contains(fc))
                    .map(|(dobj, _)| {
                        let name = name_or_unknown(doc, *dobj, "DO");
                        let doi = doc.named_child(ln, "DOI", &name);
                        let node = TreeNode {
                            text: label(&name, doi.and_then(|d| doc.attr(d, "desc"))),
                            children: self.sub_data_objects(*dobj, doi, fc, 0),
                        };
                        (node_key(doc, *dobj), node)
                    })
                    .collect();
                let node = TreeNode {
                    text: fc.to_string(),
                    children: Some(group),
                };
                (format!("{}{}", FC_KEY_PREFIX, fc), node)
            })
            .collect();
        Some(tree)
    }

    fn sub_data_objects(&self, holder: ElemId, instance: Option<ElemId>, fc: &str, depth: usize) -> Option<Tree> {
        let doc = self.doc;
        if depth > MAX_TYPE_NEST {
            return None;
        }
        let do_type = self.templates.lookup("DOType", holder, "type")?;
        let tree: Tree = doc
            .descendants_by_tag(do_type, &["SDO"])
            .into_iter()
            .filter(|sdo| self.fcs(*sdo, depth + 1).contains(fc))
            .map(|sdo| {
                let name = name_or_unknown(doc, sdo, "SDO");
                let sdi = instance.and_then(|i| doc.named_descendant(i, "SDI", &name));
                let node = TreeNode {
                    text: label(&name, sdi.and_then(|s| doc.attr(s, "desc"))),
                    children: self.sub_data_objects(sdo, sdi, fc, depth + 1),
                };
                (node_key(doc, sdo), node)
            })
            .collect();
        if tree.is_empty() {
            None
        } else {
            Some(tree)
        }
    }
}

/// Data objects below `server` grouped by functional constraint:
/// `LDevice > LN0/LN > FC: <fc> > DO > SDO`.
pub fn build_data_object_tree(doc: &SclDoc, server: ElemId) -> Tree {
    let builder = DataObjectTreeBuilder {
        doc,
        templates: Templates::new(doc),
    };
    doc.descendants_by_tag(server, &["LDevice"])
        .into_iter()
        .map(|ld| {
            let lns: Tree = doc
                .descendants_by_tag(ld, &["LN0", "LN"])
                .into_iter()
                .map(|ln| {
                    let node = TreeNode {
                        text: any_ln_label(doc, ln),
                        children: builder.logical_node(ln),
                    };
                    (node_key(doc, ln), node)
                })
                .collect();
            let node = TreeNode {
                text: ldevice_label(doc, ld),
                children: Some(lns),
            };
            (node_key(doc, ld), node)
        })
        .collect()
}
/************************************************************************/
/*			2 数据对象树 end					*/
/************************************************************************/

/// Elements behind a picker path. Keys that resolve to nothing are dropped.
pub fn resolve_tree_path<S: AsRef<str>>(doc: &SclDoc, keys: &[S]) -> Vec<ElemId> {
    keys.iter()
        .filter_map(|key| {
            let (tag, ident) = key.as_ref().split_once(": ")?;
            find(doc, tag, ident)
        })
        .collect()
}

/// Like [`resolve_tree_path`] for the data object picker; `None` without an
/// `FC: ` segment.
pub fn resolve_fc_path<S: AsRef<str>>(doc: &SclDoc, keys: &[S]) -> Option<FcPath> {
    let fc = keys
        .iter()
        .find_map(|key| key.as_ref().strip_prefix(FC_KEY_PREFIX))?
        .to_string();
    Some(FcPath {
        path: resolve_tree_path(doc, keys),
        fc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<SCL>
  <IED name="IED1"><AccessPoint name="AP1"><Server>
    <LDevice inst="LD1" desc="bay">
      <LN0 lnClass="LLN0" inst="" lnType="LLN0_T"/>
      <LN prefix="P" lnClass="XCBR" inst="1" lnType="XCBR_T">
        <DOI name="Pos" desc="breaker"/>
      </LN>
      <LN lnClass="MMXU" inst="1" lnType="MISSING"/>
    </LDevice>
  </Server></AccessPoint></IED>
  <DataTypeTemplates>
    <LNodeType id="LLN0_T" lnClass="LLN0"><DO name="Mod" type="ENC"/></LNodeType>
    <LNodeType id="XCBR_T" lnClass="XCBR"><DO name="Pos" type="DPC"/></LNodeType>
    <DOType id="ENC" cdc="ENC"><DA name="stVal" bType="Enum" fc="ST"/><DA name="ctlModel" fc="CF"/></DOType>
    <DOType id="DPC" cdc="DPC">
      <DA name="stVal" bType="Dbpos" fc="ST"/>
      <DA name="origin" bType="Struct" type="Originator" fc="ST"/>
    </DOType>
    <DAType id="Originator"><BDA name="orCat" bType="Enum"/><BDA name="orIdent" bType="Octet64"/></DAType>
  </DataTypeTemplates>
</SCL>"#;

    fn server(doc: &SclDoc) -> ElemId {
        doc.elements_by_tag("Server").next().unwrap()
    }

    #[test]
    fn ldevice_and_ln_labels() {
        let doc = SclDoc::parse(XML).unwrap();
        let tree = build_attribute_tree(&doc, server(&doc));
        let ld = &tree["LDevice: IED1>>LD1"];
        assert_eq!(ld.text, "LD1 (bay)");
        let lns = ld.children.as_ref().unwrap();
        assert_eq!(lns.len(), 3);
        assert_eq!(lns["LN0: IED1>>LD1>LLN0"].text, " LLN0 ");
        assert_eq!(lns["LN: IED1>>LD1>P XCBR 1"].text, "P XCBR 1");
    }

    #[test]
    fn data_attributes_carry_fc_and_desc() {
        let doc = SclDoc::parse(XML).unwrap();
        let tree = build_attribute_tree(&doc, server(&doc));
        let xcbr = tree["LDevice: IED1>>LD1"].children.as_ref().unwrap()["LN: IED1>>LD1>P XCBR 1"]
            .children
            .as_ref()
            .unwrap();
        let pos = &xcbr["DO: #XCBR_T>Pos"];
        assert_eq!(pos.text, "Pos (breaker)");
        let das = pos.children.as_ref().unwrap();
        assert_eq!(das["DA: #DPC>stVal"].text, "stVal - FC: ST");
        assert_eq!(das["DA: #DPC>stVal"].children, None);
        let origin = das["DA: #DPC>origin"].children.as_ref().unwrap();
        assert_eq!(origin.keys().collect::<Vec<_>>(), vec!["BDA: #Originator>orCat", "BDA: #Originator>orIdent"]);
    }

    #[test]
    fn missing_type_has_no_children() {
        let doc = SclDoc::parse(XML).unwrap();
        let tree = build_attribute_tree(&doc, server(&doc));
        let lns = tree["LDevice: IED1>>LD1"].children.as_ref().unwrap();
        assert_eq!(lns["LN: IED1>>LD1>MMXU 1"].children, None);
        let json = serde_json::to_value(&lns["LN: IED1>>LD1>MMXU 1"]).unwrap();
        assert!(json.get("children").is_none());
    }

    #[test]
    fn recursive_types_are_cut() {
        let xml = r#"<SCL><IED name="I"><Server><LDevice inst="L">
            <LN lnClass="GGIO" inst="1" lnType="G"/></LDevice></Server></IED>
            <DataTypeTemplates><LNodeType id="G"><DO name="Loop" type="R"/></LNodeType>
            <DOType id="R"><SDO name="again" type="R"/></DOType></DataTypeTemplates></SCL>"#;
        let doc = SclDoc::parse(xml).unwrap();
        let tree = build_attribute_tree(&doc, server(&doc));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn sdo_label_falls_back_to_d_value_and_unnamed_get_sentinels() {
        let xml = r#"<SCL><IED name="I"><Server><LDevice inst="L">
            <LN lnClass="XCBR" inst="1" lnType="X">
              <DOI name="Pos"><DAI name="d"><Val>dtext</Val></DAI></DOI>
            </LN></LDevice></Server></IED>
            <DataTypeTemplates>
              <LNodeType id="X"><DO name="Pos" type="DPS"/><DO type="SUB"/></LNodeType>
              <DOType id="DPS"><SDO name="s" type="SUB"/></DOType>
              <DOType id="SUB"><DA name="q" fc="ST"/><DA name="raw"/></DOType>
            </DataTypeTemplates></SCL>"#;
        let doc = SclDoc::parse(xml).unwrap();
        let tree = build_attribute_tree(&doc, server(&doc));
        let dos = tree["LDevice: I>>L"].children.as_ref().unwrap()["LN: I>>L>XCBR 1"]
            .children
            .as_ref()
            .unwrap();
        let pos = &dos["DO: #X>Pos"];
        assert_eq!(pos.text, "Pos");
        let sdo = &pos.children.as_ref().unwrap()["SDO: #DPS>s"];
        assert_eq!(sdo.text, "s (dtext)");
        let das = sdo.children.as_ref().unwrap();
        assert_eq!(das["DA: #SUB>q"].text, "q - FC: ST");
        assert_eq!(das["DA: #SUB>raw"].text, "raw - FC: UNKNOWN_FC");

        let unnamed = &dos["DO: #X"];
        assert_eq!(unnamed.text, "UNKNOWN_DO");
        assert_eq!(unnamed.children.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn data_object_tree_groups_by_fc() {
        let doc = SclDoc::parse(XML).unwrap();
        let tree = build_data_object_tree(&doc, server(&doc));
        let ln0 = tree["LDevice: IED1>>LD1"].children.as_ref().unwrap()["LN0: IED1>>LD1>LLN0"]
            .children
            .as_ref()
            .unwrap();
        assert_eq!(ln0.keys().collect::<Vec<_>>(), vec!["FC: CF", "FC: ST"]);
        assert!(ln0["FC: ST"].children.as_ref().unwrap().contains_key("DO: #LLN0_T>Mod"));
    }

    #[test]
    fn paths_resolve_back_to_elements() {
        let doc = SclDoc::parse(XML).unwrap();
        let keys = [
            "LDevice: IED1>>LD1",
            "LN0: IED1>>LD1>LLN0",
            "FC: ST",
            "DO: #LLN0_T>Mod",
        ];
        let fc_path = resolve_fc_path(&doc, &keys).unwrap();
        assert_eq!(fc_path.fc, "ST");
        let tags: Vec<&str> = fc_path.path.iter().map(|id| doc.tag(*id)).collect();
        assert_eq!(tags, vec!["LDevice", "LN0", "DO"]);
        assert_eq!(resolve_fc_path(&doc, &keys[..2]), None);
    }
}
