use anyhow::{bail, Context};
use indexmap::IndexMap;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;
use std::str::from_utf8;
use tokio::fs;
use tracing::debug;

/************************************************************************/
/*			目录					*/
/* 1 入口函数 */
/* 2 文档结构体 及查询 */
/* 3 解析辅助函数 */
/************************************************************************/

/// Index of an element inside the [`SclDoc`] that produced it.
///
/// An `ElemId` is meaningless for any other document; re-resolve through
/// [`crate::scl::update_element_reference`] after the host replaces the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElemId(pub usize);

#[derive(Debug, Clone)]
struct SclElement {
    tag: String,
    atts: IndexMap<String, String>,
    parent: Option<ElemId>,
    children: Vec<ElemId>,
    text: String,
}

/// Read-only snapshot of an SCL file.
///
/// Elements are stored in document order, so iterating the arena is the same as
/// a pre-order walk of the XML tree.
#[derive(Debug, Clone)]
pub struct SclDoc {
    elements: Vec<SclElement>,
}

//解析出来的tag信息还是要转成utf8
struct TagInfo {
    tag: String,
    atts: IndexMap<String, String>,
}

/************************************************************************/
/*			1入口函数 start					*/
/************************************************************************/
pub async fn read_scl_file(xmlfilename: impl AsRef<Path>) -> crate::Result<SclDoc> {
    let sclstr = fs::read_to_string(xmlfilename)
        .await
        .context("open scl file failed")?;
    SclDoc::parse(&sclstr)
}

impl SclDoc {
    pub fn parse(xml: &str) -> crate::Result<SclDoc> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc = SclDoc {
            elements: Vec::new(),
        };
        //当前打开的元素栈
        let mut stack: Vec<ElemId> = Vec::new();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let start_tag_info = get_start_tag_info(e, &reader)?;
                    let id = doc.push_element(start_tag_info, stack.last().copied())?;
                    stack.push(id);
                }
                Ok(Event::Empty(ref e)) => {
                    let start_tag_info = get_start_tag_info(e, &reader)?;
                    doc.push_element(start_tag_info, stack.last().copied())?;
                }
                Ok(Event::End(ref e)) => {
                    let tag = from_utf8(e.name().as_ref())?.to_string();
                    match stack.pop() {
                        Some(open) if doc.tag(open) == tag => {}
                        Some(open) => bail!(
                            "XML malformed: found {}, expected {}",
                            tag,
                            doc.tag(open)
                        ),
                        None => bail!("Unexpected End tag {}. Invalid nesting.", tag),
                    }
                }
                Ok(Event::Text(e)) => {
                    let txt = e.unescape()?;
                    if let Some(open) = stack.last() {
                        doc.elements[open.0].text.push_str(&txt);
                    }
                }
                Ok(Event::CData(e)) => {
                    let raw = e.into_inner();
                    let txt = from_utf8(&raw)?;
                    if let Some(open) = stack.last() {
                        doc.elements[open.0].text.push_str(txt);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => bail!("Error at position {}: {:?}", reader.buffer_position(), e),
                _ => (),
            }
            buf.clear();
        }
        if let Some(open) = stack.last() {
            bail!("XML malformed: element {} not closed", doc.tag(*open));
        }
        if doc.elements.is_empty() {
            bail!("empty scl document");
        }
        debug!("parsed scl document with {} elements", doc.elements.len());
        Ok(doc)
    }

    fn push_element(&mut self, tag_info: TagInfo, parent: Option<ElemId>) -> crate::Result<ElemId> {
        if parent.is_none() && !self.elements.is_empty() {
            bail!("XML malformed: second root element {}", tag_info.tag);
        }
        let id = ElemId(self.elements.len());
        self.elements.push(SclElement {
            tag: tag_info.tag,
            atts: tag_info.atts,
            parent,
            children: Vec::new(),
            text: String::new(),
        });
        if let Some(parent) = parent {
            self.elements[parent.0].children.push(id);
        }
        Ok(id)
    }
}
/************************************************************************/
/*			1入口函数 end					*/
/************************************************************************/

/************************************************************************/
/*			2 文档结构体 及查询 start					*/
/************************************************************************/
impl SclDoc {
    fn el(&self, id: ElemId) -> Option<&SclElement> {
        self.elements.get(id.0)
    }

    pub fn root(&self) -> ElemId {
        ElemId(0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Tag name, empty for an id that does not belong to this document.
    pub fn tag(&self, id: ElemId) -> &str {
        self.el(id).map(|e| e.tag.as_str()).unwrap_or("")
    }

    pub fn attr(&self, id: ElemId, name: &str) -> Option<&str> {
        self.el(id)
            .and_then(|e| e.atts.get(name))
            .map(|v| v.as_str())
    }

    pub fn attrs(&self, id: ElemId) -> impl Iterator<Item = (&str, &str)> {
        self.el(id)
            .into_iter()
            .flat_map(|e| e.atts.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn parent(&self, id: ElemId) -> Option<ElemId> {
        self.el(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElemId) -> &[ElemId] {
        self.el(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn children_by_tag<'a>(
        &'a self,
        id: ElemId,
        tag: &'a str,
    ) -> impl Iterator<Item = ElemId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.tag(*c) == tag)
    }

    pub fn first_child(&self, id: ElemId, tag: &str) -> Option<ElemId> {
        self.children_by_tag(id, tag).next()
    }

    /// Direct child of `tag` whose `name` attribute equals `name`.
    pub fn named_child(&self, id: ElemId, tag: &str, name: &str) -> Option<ElemId> {
        self.children_by_tag(id, tag)
            .find(|c| self.attr(*c, "name") == Some(name))
    }

    /// All descendants of `id` (not `id` itself) in document order.
    pub fn descendants(&self, id: ElemId) -> Vec<ElemId> {
        let mut res = Vec::new();
        let mut stack: Vec<ElemId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            res.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        res
    }

    pub fn descendants_by_tag(&self, id: ElemId, tags: &[&str]) -> Vec<ElemId> {
        self.descendants(id)
            .into_iter()
            .filter(|d| tags.contains(&self.tag(*d)))
            .collect()
    }

    /// First descendant of `tag` whose `name` attribute equals `name`.
    pub fn named_descendant(&self, id: ElemId, tag: &str, name: &str) -> Option<ElemId> {
        self.descendants(id)
            .into_iter()
            .find(|d| self.tag(*d) == tag && self.attr(*d, "name") == Some(name))
    }

    /// Every element of `tag` in the document, in document order.
    pub fn elements_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = ElemId> + 'a {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.tag == tag)
            .map(|(index, _)| ElemId(index))
    }

    /// `id` itself or its nearest ancestor carrying `tag`.
    pub fn closest(&self, id: ElemId, tag: &str) -> Option<ElemId> {
        let mut now = Some(id);
        while let Some(e) = now {
            if self.tag(e) == tag {
                return Some(e);
            }
            now = self.parent(e);
        }
        None
    }

    pub fn text(&self, id: ElemId) -> &str {
        self.el(id).map(|e| e.text.as_str()).unwrap_or("")
    }
}
/************************************************************************/
/*			2 文档结构体 及查询 end					*/
/************************************************************************/

/************************************************************************/
/*			3 解析辅助函数 start					*/
/************************************************************************/
///辅助函数 用来解析 tag 为拥有的 string
fn get_start_tag_info<B: BufRead>(btstart: &BytesStart<'_>, reader: &Reader<B>) -> crate::Result<TagInfo> {
    let tag = from_utf8(btstart.name().as_ref())?.to_string();
    let mut atts: IndexMap<String, String> = IndexMap::new();
    for att in btstart.attributes() {
        let att = att?;
        let value = att.decode_and_unescape_value(reader)?.to_string();
        let key = from_utf8(att.key.as_ref())?.to_string();
        atts.insert(key, value);
    }
    Ok(TagInfo { tag, atts })
}
/************************************************************************/
/*			3 解析辅助函数 end					*/
/************************************************************************/

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SCL>
  <IED name="IED1">
    <DOI name="Beh" desc="a &amp; b"><DAI name="d"><Val>Behaviour</Val></DAI></DOI>
    <Empty/>
  </IED>
</SCL>"#;

    #[test]
    fn parses_elements_in_document_order() {
        let doc = SclDoc::parse(XML).unwrap();
        assert_eq!(doc.tag(doc.root()), "SCL");
        let tags: Vec<&str> = doc
            .descendants(doc.root())
            .into_iter()
            .map(|id| doc.tag(id))
            .collect();
        assert_eq!(tags, vec!["IED", "DOI", "DAI", "Val", "Empty"]);
    }

    #[test]
    fn unescapes_attributes_and_keeps_text() {
        let doc = SclDoc::parse(XML).unwrap();
        let doi = doc.elements_by_tag("DOI").next().unwrap();
        assert_eq!(doc.attr(doi, "desc"), Some("a & b"));
        let val = doc.elements_by_tag("Val").next().unwrap();
        assert_eq!(doc.text(val), "Behaviour");
        assert_eq!(doc.closest(val, "IED"), doc.elements_by_tag("IED").next());
        assert_eq!(doc.named_child(doi, "DAI", "d"), doc.elements_by_tag("DAI").next());
    }

    #[test]
    fn foreign_ids_degrade() {
        let doc = SclDoc::parse(XML).unwrap();
        let stale = ElemId(999);
        assert_eq!(doc.tag(stale), "");
        assert_eq!(doc.attr(stale, "name"), None);
        assert!(doc.children(stale).is_empty());
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(SclDoc::parse("<SCL><IED></SCL>").is_err());
        assert!(SclDoc::parse("<SCL>").is_err());
        assert!(SclDoc::parse("").is_err());
        assert!(SclDoc::parse("<A/><B/>").is_err());
    }
}
