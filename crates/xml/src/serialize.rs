//! Serializes a document back to indented text for diagnostics.

use crate::document::{NodeKind, XmlDocument, XmlNode};
use crate::error::XmlError;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use std::io::Cursor;

pub fn to_pretty_string(doc: &XmlDocument) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    for child in doc.root().child_nodes() {
        write_node(&mut writer, child)?;
    }
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| XmlError::Serialize(e.to_string()))
}

fn write_event(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Serialize(e.to_string()))
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: XmlNode<'_>) -> Result<(), XmlError> {
    match node.kind() {
        NodeKind::Element => {
            let name = node.xml_name().map(|n| n.qualified()).unwrap_or_default();
            let mut start = BytesStart::new(name.as_str());
            for ns in node.declared_namespaces() {
                let key = match &ns.prefix {
                    Some(prefix) => format!("xmlns:{}", prefix),
                    None => "xmlns".to_string(),
                };
                start.push_attribute((key.as_str(), ns.uri.as_str()));
            }
            for attr in node.attribute_nodes() {
                let key = attr.xml_name().map(|n| n.qualified()).unwrap_or_default();
                start.push_attribute((key.as_str(), attr.value().unwrap_or_default()));
            }
            if node.first_child().is_none() {
                return write_event(writer, Event::Empty(start));
            }
            write_event(writer, Event::Start(start))?;
            for child in node.child_nodes() {
                write_node(writer, child)?;
            }
            write_event(writer, Event::End(BytesEnd::new(name.as_str())))
        }
        NodeKind::Text => write_event(
            writer,
            Event::Text(BytesText::new(node.value().unwrap_or_default())),
        ),
        NodeKind::Comment => write_event(
            writer,
            Event::Comment(BytesText::from_escaped(node.value().unwrap_or_default())),
        ),
        NodeKind::ProcessingInstruction => {
            let target = node.local_name().unwrap_or_default();
            let content = match node.value() {
                Some(value) => format!("{} {}", target, value),
                None => target.to_string(),
            };
            write_event(writer, Event::PI(BytesPI::new(content)))
        }
        NodeKind::Document | NodeKind::Attribute => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_document_parses_back_equivalently() {
        let source = r#"<o:order xmlns:o="urn:o" id="1"><!--c--><o:item>a &amp; b</o:item><empty/><?pi data?></o:order>"#;
        let doc = XmlDocument::parse(source).unwrap();
        let text = to_pretty_string(&doc).unwrap();
        assert!(text.contains("xmlns:o=\"urn:o\""));
        assert!(text.contains("a &amp; b"));
        assert!(text.contains("<empty/>"));

        let reparsed = XmlDocument::parse(&text).unwrap();
        let item = reparsed.document_element().unwrap().child_nodes().nth(1).unwrap();
        assert_eq!(item.namespace_uri(), Some("urn:o"));
        assert_eq!(item.first_child().unwrap().value(), Some("a & b"));
    }
}
