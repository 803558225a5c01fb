//! Child ordering of the SCL elements the editors insert into.

use super::dom::{ElemId, SclDoc};

const LN0_CHILDREN: &[&str] = &[
    "Private",
    "Text",
    "DataSet",
    "ReportControl",
    "LogControl",
    "DOI",
    "Inputs",
    "Log",
    "GSEControl",
    "SampledValueControl",
    "SettingControl",
];

const LN_CHILDREN: &[&str] = &[
    "Private",
    "Text",
    "DataSet",
    "ReportControl",
    "LogControl",
    "DOI",
    "Inputs",
    "Log",
];

const REPORT_CONTROL_CHILDREN: &[&str] = &["Private", "Text", "TrgOps", "OptFields", "RptEnabled"];
const GSE_CONTROL_CHILDREN: &[&str] = &["Private", "Text", "IEDName", "Protocol"];
const SMV_CONTROL_CHILDREN: &[&str] = &["Private", "Text", "IEDName", "SmvOpts"];
const DATASET_CHILDREN: &[&str] = &["Private", "Text", "FCDA", "FCCB"];
const RPT_ENABLED_CHILDREN: &[&str] = &["Private", "Text", "ClientLN"];

pub fn child_order(parent_tag: &str) -> Option<&'static [&'static str]> {
    match parent_tag {
        "LN0" => Some(LN0_CHILDREN),
        "LN" => Some(LN_CHILDREN),
        "ReportControl" => Some(REPORT_CONTROL_CHILDREN),
        "GSEControl" => Some(GSE_CONTROL_CHILDREN),
        "SampledValueControl" => Some(SMV_CONTROL_CHILDREN),
        "DataSet" => Some(DATASET_CHILDREN),
        "RptEnabled" => Some(RPT_ENABLED_CHILDREN),
        _ => None,
    }
}

/// Sibling before which a new `tag` child of `parent` belongs.
///
/// `None` means append. Unknown parents or tags append as well.
pub fn get_reference(doc: &SclDoc, parent: ElemId, tag: &str) -> Option<ElemId> {
    let order = child_order(doc.tag(parent))?;
    let pos = order.iter().position(|t| *t == tag)?;
    let later = &order[pos + 1..];
    doc.children(parent)
        .iter()
        .copied()
        .find(|c| later.contains(&doc.tag(*c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_first_later_sibling() {
        let doc = crate::scl::SclDoc::parse(
            r#"<LN0 lnClass="LLN0"><DataSet name="a"/><DOI name="Mod"/><GSEControl name="g"/></LN0>"#,
        )
        .unwrap();
        let ln0 = doc.root();
        let doi = doc.first_child(ln0, "DOI");
        let gse = doc.first_child(ln0, "GSEControl");
        assert_eq!(get_reference(&doc, ln0, "DataSet"), doi);
        assert_eq!(get_reference(&doc, ln0, "ReportControl"), doi);
        assert_eq!(get_reference(&doc, ln0, "Log"), gse);
        assert_eq!(get_reference(&doc, ln0, "SampledValueControl"), None);
        assert_eq!(get_reference(&doc, ln0, "Unknown"), None);
    }
}
