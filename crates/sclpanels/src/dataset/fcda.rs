//! Picker paths to `FCDA` inserts.

use super::tree::FcPath;
use crate::edit::{create_element, Insert, NewElement};
use crate::scl::{identity, ElemId, SclDoc};
use tracing::debug;

/// Reference tuple of one FCDA. `prefix` and `lnInst` read as empty when
/// absent, `da_name` stays absent for data object references.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FcdaRef {
    ld_inst: String,
    prefix: String,
    ln_class: String,
    ln_inst: String,
    do_name: String,
    da_name: Option<String>,
    fc: String,
}

impl FcdaRef {
    fn matches(&self, doc: &SclDoc, fcda: ElemId) -> bool {
        doc.attr(fcda, "ldInst") == Some(self.ld_inst.as_str())
            && doc.attr(fcda, "prefix").unwrap_or("") == self.prefix
            && doc.attr(fcda, "lnInst").unwrap_or("") == self.ln_inst
            && doc.attr(fcda, "lnClass") == Some(self.ln_class.as_str())
            && doc.attr(fcda, "doName") == Some(self.do_name.as_str())
            && doc.attr(fcda, "daName") == self.da_name.as_deref()
            && doc.attr(fcda, "fc") == Some(self.fc.as_str())
    }

    fn exists_in(&self, doc: &SclDoc, data_set: ElemId) -> bool {
        doc.children_by_tag(data_set, "FCDA")
            .any(|fcda| self.matches(doc, fcda))
    }

    fn to_element(&self) -> NewElement {
        create_element(
            "FCDA",
            &[
                ("ldInst", Some(self.ld_inst.as_str())),
                ("prefix", Some(self.prefix.as_str())),
                ("lnClass", Some(self.ln_class.as_str())),
                ("lnInst", Some(self.ln_inst.as_str())),
                ("doName", Some(self.do_name.as_str())),
                ("daName", self.da_name.as_deref()),
                ("fc", Some(self.fc.as_str())),
            ],
        )
    }
}

/// `ldInst`, `prefix`, `lnClass`, `lnInst` from the LDevice and LN0/LN on the
/// path. `None` without a non-empty `ldInst` and `lnClass`.
fn logical_node_part(doc: &SclDoc, path: &[ElemId]) -> Option<(String, String, String, String)> {
    let ld = path.iter().find(|e| doc.tag(**e) == "LDevice");
    let ln = path.iter().find(|e| matches!(doc.tag(**e), "LN" | "LN0"));
    let ld_inst = ld.and_then(|e| doc.attr(*e, "inst")).filter(|v| !v.is_empty())?;
    let ln_class = ln.and_then(|e| doc.attr(*e, "lnClass")).filter(|v| !v.is_empty())?;
    let prefix = ln.and_then(|e| doc.attr(*e, "prefix")).unwrap_or("");
    let ln_inst = ln.and_then(|e| doc.attr(*e, "inst")).unwrap_or("");
    Some((
        ld_inst.to_string(),
        prefix.to_string(),
        ln_class.to_string(),
        ln_inst.to_string(),
    ))
}

fn path_label(doc: &SclDoc, path: &[ElemId]) -> String {
    path.last()
        .map(|e| identity(doc, *e))
        .unwrap_or_default()
}

fn data_attribute_ref(doc: &SclDoc, path: &[ElemId]) -> Option<FcdaRef> {
    let (ld_inst, prefix, ln_class, ln_inst) = logical_node_part(doc, path)?;
    let mut do_name = String::new();
    let mut da_name = String::new();
    let mut fc = String::new();
    for ancestor in path {
        let name = doc.attr(*ancestor, "name").unwrap_or("");
        match doc.tag(*ancestor) {
            "DO" => do_name = name.to_string(),
            "SDO" => do_name = format!("{}.{}", do_name, name),
            "DA" => {
                da_name = name.to_string();
                fc = doc.attr(*ancestor, "fc").unwrap_or("").to_string();
            }
            "BDA" => da_name = format!("{}.{}", da_name, name),
            _ => {}
        }
    }
    if do_name.is_empty() || da_name.is_empty() || fc.is_empty() {
        return None;
    }
    Some(FcdaRef {
        ld_inst,
        prefix,
        ln_class,
        ln_inst,
        do_name,
        da_name: Some(da_name),
        fc,
    })
}

fn data_object_ref(doc: &SclDoc, fc_path: &FcPath) -> Option<FcdaRef> {
    let (ld_inst, prefix, ln_class, ln_inst) = logical_node_part(doc, &fc_path.path)?;
    let mut do_name = String::new();
    for ancestor in &fc_path.path {
        let name = doc.attr(*ancestor, "name").unwrap_or("");
        match doc.tag(*ancestor) {
            "DO" => do_name = name.to_string(),
            "SDO" => do_name = format!("{}.{}", do_name, name),
            _ => {}
        }
    }
    if do_name.is_empty() {
        return None;
    }
    Some(FcdaRef {
        ld_inst,
        prefix,
        ln_class,
        ln_inst,
        do_name,
        da_name: None,
        fc: fc_path.fc.clone(),
    })
}

fn collect_inserts(
    doc: &SclDoc,
    data_set: ElemId,
    refs: impl Iterator<Item = Option<FcdaRef>>,
) -> Vec<Insert> {
    let mut emitted: Vec<FcdaRef> = Vec::new();
    for fcda in refs.flatten() {
        if fcda.exists_in(doc, data_set) || emitted.contains(&fcda) {
            debug!("skip FCDA {}/{}.{} already in data set", fcda.ld_inst, fcda.ln_class, fcda.do_name);
            continue;
        }
        emitted.push(fcda);
    }
    emitted
        .iter()
        .map(|fcda| Insert {
            parent: data_set,
            node: fcda.to_element(),
            reference: None,
        })
        .collect()
}

/// Inserts for the data attributes at the end of `paths`.
///
/// Paths without a complete reference (no DA on the path, say) and references
/// already present in `data_set` are skipped.
pub fn add_fcdas(doc: &SclDoc, data_set: ElemId, paths: &[Vec<ElemId>]) -> Vec<Insert> {
    let refs = paths.iter().map(|path| {
        let fcda = data_attribute_ref(doc, path);
        if fcda.is_none() {
            debug!("skip incomplete data attribute path {}", path_label(doc, path));
        }
        fcda
    });
    collect_inserts(doc, data_set, refs)
}

/// Inserts for functionally constrained data objects (no `daName`).
pub fn add_fcdos(doc: &SclDoc, data_set: ElemId, fc_paths: &[FcPath]) -> Vec<Insert> {
    let refs = fc_paths.iter().map(|fc_path| {
        let fcda = data_object_ref(doc, fc_path);
        if fcda.is_none() {
            debug!("skip incomplete data object path {}", path_label(doc, &fc_path.path));
        }
        fcda
    });
    collect_inserts(doc, data_set, refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<SCL>
  <IED name="IED1"><AccessPoint name="AP1"><Server>
    <LDevice inst="LD1">
      <LN0 lnClass="LLN0" inst="" lnType="LLN0_T">
        <DataSet name="ds"><FCDA ldInst="LD1" lnClass="XCBR" lnInst="1" doName="Pos" daName="stVal" fc="ST"/></DataSet>
      </LN0>
      <LN lnClass="XCBR" inst="1" lnType="XCBR_T"/>
      <LN prefix="" lnClass="" inst="2" lnType="XCBR_T"/>
    </LDevice>
  </Server></AccessPoint></IED>
  <DataTypeTemplates>
    <LNodeType id="XCBR_T" lnClass="XCBR"><DO name="Pos" type="DPC"/></LNodeType>
    <DOType id="DPC"><DA name="stVal" fc="ST"/><DA name="q" fc="ST"/><DA name="origin" bType="Struct" type="Orig" fc="ST"/></DOType>
    <DAType id="Orig"><BDA name="orCat"/></DAType>
  </DataTypeTemplates>
</SCL>"#;

    struct Fixture {
        doc: SclDoc,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                doc: SclDoc::parse(XML).unwrap(),
            }
        }

        fn first(&self, tag: &str) -> ElemId {
            self.doc.elements_by_tag(tag).next().unwrap()
        }

        fn named(&self, tag: &str, name: &str) -> ElemId {
            self.doc
                .elements_by_tag(tag)
                .find(|e| self.doc.attr(*e, "name") == Some(name))
                .unwrap()
        }
    }

    #[test]
    fn existing_reference_is_not_added_again() {
        let f = Fixture::new();
        let ln = f.doc.elements_by_tag("LN").next().unwrap();
        let path = vec![f.first("LDevice"), ln, f.first("DO"), f.named("DA", "stVal")];
        assert!(add_fcdas(&f.doc, f.first("DataSet"), &[path]).is_empty());
    }

    #[test]
    fn bda_path_builds_dotted_da_name() {
        let f = Fixture::new();
        let ln = f.doc.elements_by_tag("LN").next().unwrap();
        let path = vec![
            f.first("LDevice"),
            ln,
            f.first("DO"),
            f.named("DA", "origin"),
            f.first("BDA"),
        ];
        let inserts = add_fcdas(&f.doc, f.first("DataSet"), &[path.clone(), path]);
        assert_eq!(inserts.len(), 1);
        let node = &inserts[0].node;
        assert_eq!(node.attr("daName"), Some("origin.orCat"));
        assert_eq!(node.attr("prefix"), Some(""));
        assert_eq!(node.attr("lnInst"), Some("1"));
        assert_eq!(inserts[0].reference, None);
    }

    #[test]
    fn missing_ln_class_is_skipped() {
        let f = Fixture::new();
        let ln2 = f.doc.elements_by_tag("LN").nth(1).unwrap();
        let path = vec![f.first("LDevice"), ln2, f.first("DO"), f.named("DA", "q")];
        assert!(add_fcdas(&f.doc, f.first("DataSet"), &[path]).is_empty());
    }

    #[test]
    fn data_object_reference_has_no_da_name() {
        let f = Fixture::new();
        let ln = f.doc.elements_by_tag("LN").next().unwrap();
        let fc_path = FcPath {
            path: vec![f.first("LDevice"), ln, f.first("DO")],
            fc: "ST".to_string(),
        };
        // the existing Pos.stVal FCDA carries a daName, so it does not block
        let inserts = add_fcdos(&f.doc, f.first("DataSet"), &[fc_path]);
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].node.attr("doName"), Some("Pos"));
        assert_eq!(inserts[0].node.attr("daName"), None);
        assert_eq!(inserts[0].node.attr("fc"), Some("ST"));
    }

    #[test]
    fn existing_data_object_reference_blocks_insert() {
        let doc = SclDoc::parse(&XML.replace(r#" daName="stVal""#, "")).unwrap();
        let first = |tag: &str| doc.elements_by_tag(tag).next().unwrap();
        let path = vec![first("LDevice"), first("LN"), first("DO")];
        let fc_path = |fc: &str| FcPath {
            path: path.clone(),
            fc: fc.to_string(),
        };
        assert!(add_fcdos(&doc, first("DataSet"), &[fc_path("ST")]).is_empty());

        let inserts = add_fcdos(&doc, first("DataSet"), &[fc_path("CF")]);
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].node.attr("fc"), Some("CF"));
    }
}
