//! Path-like identity strings.
//!
//! An identity names an element by its structural position, so the same
//! control block in two parses of one file has the same identity even though
//! its [`ElemId`]s differ. The panels use identities as tree keys and to
//! re-resolve selections when the host hands over a new document.

use super::dom::{ElemId, SclDoc};
use crate::utils::join_non_empty;

fn att<'a>(doc: &'a SclDoc, id: ElemId, name: &str) -> &'a str {
    doc.attr(id, name).unwrap_or("")
}

fn parent_identity(doc: &SclDoc, id: ElemId) -> String {
    doc.parent(id)
        .map(|parent| identity(doc, parent))
        .unwrap_or_default()
}

fn ln_reference(doc: &SclDoc, id: ElemId, inst_attr: &str) -> String {
    join_non_empty(&[
        att(doc, id, "prefix"),
        att(doc, id, "lnClass"),
        att(doc, id, inst_attr),
    ])
}

pub fn identity(doc: &SclDoc, id: ElemId) -> String {
    match doc.tag(id) {
        "" | "SCL" => String::new(),
        "IED" => att(doc, id, "name").to_string(),
        "LDevice" => {
            let ied = doc
                .closest(id, "IED")
                .map(|ied| identity(doc, ied))
                .unwrap_or_default();
            format!("{}>>{}", ied, att(doc, id, "inst"))
        }
        "LN0" | "LN" => format!("{}>{}", parent_identity(doc, id), ln_reference(doc, id, "inst")),
        "LNodeType" | "DOType" | "DAType" | "EnumType" => format!("#{}", att(doc, id, "id")),
        "DOI" | "SDI" | "DAI" => match doc.attr(id, "ix") {
            Some(ix) => format!("{}>{}[{}]", parent_identity(doc, id), att(doc, id, "name"), ix),
            None => format!("{}>{}", parent_identity(doc, id), att(doc, id, "name")),
        },
        "FCDA" => {
            let mut data = att(doc, id, "doName").to_string();
            if let Some(da_name) = doc.attr(id, "daName") {
                data = format!("{}.{}", data, da_name);
            }
            format!(
                "{}>{}/{}.{} ({})",
                parent_identity(doc, id),
                att(doc, id, "ldInst"),
                ln_reference(doc, id, "lnInst"),
                data,
                att(doc, id, "fc")
            )
        }
        "ClientLN" => format!(
            "{}>{} {} {}/{}",
            parent_identity(doc, id),
            att(doc, id, "iedName"),
            att(doc, id, "apRef"),
            att(doc, id, "ldInst"),
            ln_reference(doc, id, "lnInst")
        ),
        "ExtRef" => {
            let mut data = att(doc, id, "doName").to_string();
            if let Some(da_name) = doc.attr(id, "daName") {
                data = format!("{}.{}", data, da_name);
            }
            format!(
                "{}>{} {}/{} {} {}",
                parent_identity(doc, id),
                att(doc, id, "iedName"),
                att(doc, id, "ldInst"),
                ln_reference(doc, id, "lnInst"),
                data,
                att(doc, id, "srcCBName")
            )
        }
        "GSE" | "SMV" => format!(
            "{}>{}>{}",
            parent_identity(doc, id),
            att(doc, id, "ldInst"),
            att(doc, id, "cbName")
        ),
        "ConnectedAP" => format!(
            "{}>{} {}",
            parent_identity(doc, id),
            att(doc, id, "iedName"),
            att(doc, id, "apName")
        ),
        _ => match doc.attr(id, "name") {
            Some(name) => format!("{}>{}", parent_identity(doc, id), name),
            None => parent_identity(doc, id),
        },
    }
}

/// First element of `tag` whose identity equals `identity_str`.
pub fn find(doc: &SclDoc, tag: &str, identity_str: &str) -> Option<ElemId> {
    doc.elements_by_tag(tag)
        .find(|id| identity(doc, *id) == identity_str)
}

/// Resolves `old` (an element of `old_doc`) in `new_doc` by tag and identity.
pub fn update_element_reference(new_doc: &SclDoc, old_doc: &SclDoc, old: ElemId) -> Option<ElemId> {
    let tag = old_doc.tag(old);
    if tag.is_empty() {
        return None;
    }
    find(new_doc, tag, &identity(old_doc, old))
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<SCL>
  <IED name="IED1">
    <AccessPoint name="AP1"><Server>
      <LDevice inst="LD1">
        <LN0 lnClass="LLN0" inst="" lnType="LLN0_T">
          <DataSet name="ds1">
            <FCDA ldInst="LD1" prefix="" lnClass="MMXU" lnInst="1" doName="A.phsA" daName="cVal.mag.f" fc="MX"/>
            <FCDA ldInst="LD1" lnClass="XCBR" lnInst="1" doName="Pos" fc="ST"/>
          </DataSet>
          <GSEControl name="gcb1" datSet="ds1"/>
          <ReportControl name="rcb1"><TrgOps dchg="true"/></ReportControl>
        </LN0>
        <LN prefix="Bay" lnClass="MMXU" inst="1" lnType="MMXU_T">
          <DOI name="A"><SDI name="phsA"><DAI name="cVal" ix="1"/></SDI></DOI>
        </LN>
      </LDevice>
    </Server></AccessPoint>
  </IED>
  <DataTypeTemplates><LNodeType id="MMXU_T" lnClass="MMXU"><DO name="A" type="WYE"/></LNodeType></DataTypeTemplates>
</SCL>"#;

    fn first(doc: &SclDoc, tag: &str) -> ElemId {
        doc.elements_by_tag(tag).next().unwrap()
    }

    #[test]
    fn identities_follow_structure() {
        let doc = SclDoc::parse(XML).unwrap();
        assert_eq!(identity(&doc, first(&doc, "IED")), "IED1");
        assert_eq!(identity(&doc, first(&doc, "LDevice")), "IED1>>LD1");
        assert_eq!(identity(&doc, first(&doc, "LN0")), "IED1>>LD1>LLN0");
        assert_eq!(identity(&doc, first(&doc, "LN")), "IED1>>LD1>Bay MMXU 1");
        assert_eq!(identity(&doc, first(&doc, "GSEControl")), "IED1>>LD1>LLN0>gcb1");
        assert_eq!(identity(&doc, first(&doc, "DataSet")), "IED1>>LD1>LLN0>ds1");
        assert_eq!(identity(&doc, first(&doc, "DAI")), "IED1>>LD1>Bay MMXU 1>A>phsA>cVal[1]");
        assert_eq!(identity(&doc, first(&doc, "DO")), "#MMXU_T>A");
        // singleton children share the parent identity
        assert_eq!(identity(&doc, first(&doc, "TrgOps")), "IED1>>LD1>LLN0>rcb1");
    }

    #[test]
    fn fcda_identity_carries_reference() {
        let doc = SclDoc::parse(XML).unwrap();
        let fcdas: Vec<String> = doc
            .elements_by_tag("FCDA")
            .map(|id| identity(&doc, id))
            .collect();
        assert_eq!(
            fcdas,
            vec![
                "IED1>>LD1>LLN0>ds1>LD1/MMXU 1.A.phsA.cVal.mag.f (MX)",
                "IED1>>LD1>LLN0>ds1>LD1/XCBR 1.Pos (ST)",
            ]
        );
    }

    #[test]
    fn find_is_inverse_of_identity() {
        let doc = SclDoc::parse(XML).unwrap();
        for tag in ["LDevice", "LN0", "LN", "GSEControl", "ReportControl", "FCDA", "DAI", "DO"] {
            for id in doc.elements_by_tag(tag).collect::<Vec<_>>() {
                assert_eq!(find(&doc, tag, &identity(&doc, id)), Some(id));
            }
        }
        assert_eq!(find(&doc, "GSEControl", "IED1>>LD1>LLN0>nope"), None);
    }

    #[test]
    fn reference_survives_reparse() {
        let old = SclDoc::parse(XML).unwrap();
        let new = SclDoc::parse(&XML.replace("<Server>", "<Server><LDevice inst=\"LD0\"/>")).unwrap();
        let gcb = first(&old, "GSEControl");
        let moved = update_element_reference(&new, &old, gcb).unwrap();
        assert_ne!(moved, gcb);
        assert_eq!(new.attr(moved, "name"), Some("gcb1"));
    }
}
