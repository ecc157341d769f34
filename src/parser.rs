//! Response parsing and fault classification.
//!
//! Uses quick-xml, which never expands external entities; DOCTYPE declarations
//! are rejected outright.

use crate::error::{AmtError, WsmanError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An XML element with namespace prefixes stripped from its name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local element name
    pub name: String,
    /// Attributes by local name, namespace declarations excluded
    pub attributes: Vec<(String, String)>,
    /// Direct character data
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of local names through first matches.
    pub fn descend(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |element, name| element.child(name))
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All character data in this element and its descendants.
    pub fn deep_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.deep_text());
        }
        out
    }
}

/// WS-Addressing / WS-Management response header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    pub to: String,
    pub relates_to: String,
    pub action: String,
    pub message_id: String,
    pub resource_uri: String,
}

/// A parsed response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub header: ResponseHeader,
    /// The Body element itself
    pub body: XmlElement,
}

impl ResponseEnvelope {
    /// First body child with the given local name.
    pub fn body_root(&self, name: &str) -> Option<&XmlElement> {
        self.body.child(name)
    }

    /// The SOAP Fault carried by the body, if any.
    pub fn fault(&self) -> Option<AmtError> {
        let fault = self.body.child("Fault")?;
        let sub_code = fault
            .descend(&["Code", "Subcode", "Value"])
            .map(|e| e.text.trim().to_string())
            .unwrap_or_default();
        let message = fault
            .descend(&["Reason", "Text"])
            .map(|e| e.text.trim().to_string())
            .unwrap_or_default();
        let detail = fault
            .child("Detail")
            .map(|e| e.deep_text().trim().to_string())
            .unwrap_or_default();
        Some(AmtError {
            sub_code,
            message,
            detail,
        })
    }
}

/// Parse a response and classify it.
///
/// A Body carrying a Fault yields `WsmanError::Fault`; anything that is not a
/// well-formed envelope yields `WsmanError::MalformedResponse`.
pub fn parse_response(data: &[u8]) -> Result<ResponseEnvelope, WsmanError> {
    let envelope = parse_envelope(data)?;
    match envelope.fault() {
        Some(fault) => Err(WsmanError::Fault(fault)),
        None => Ok(envelope),
    }
}

/// Parse a response envelope without fault classification.
pub fn parse_envelope(data: &[u8]) -> Result<ResponseEnvelope, WsmanError> {
    let root = parse_document(data)?;
    if root.name != "Envelope" {
        return Err(WsmanError::MalformedResponse(format!(
            "expected Envelope root element, found <{}>",
            root.name
        )));
    }

    let header = root.child("Header").map(parse_header).unwrap_or_default();
    let body = root
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .ok_or_else(|| WsmanError::MalformedResponse("envelope has no Body".to_string()))?;

    Ok(ResponseEnvelope { header, body })
}

fn parse_header(header: &XmlElement) -> ResponseHeader {
    let text = |name: &str| {
        header
            .child(name)
            .map(|e| e.text.trim().to_string())
            .unwrap_or_default()
    };
    ResponseHeader {
        to: text("To"),
        relates_to: text("RelatesTo"),
        action: text("Action"),
        message_id: text("MessageID"),
        resource_uri: text("ResourceURI"),
    }
}

/// Parse raw bytes into an element tree.
///
/// Character data is kept as sent. Whitespace-only text is dropped from
/// elements that have children, and from outside the root.
pub fn parse_document(data: &[u8]) -> Result<XmlElement, WsmanError> {
    let xml = std::str::from_utf8(data)
        .map_err(|e| WsmanError::MalformedResponse(format!("invalid UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(start_element(e)?),

            Ok(Event::Empty(ref e)) => {
                let element = start_element(e)?;
                attach(&mut stack, &mut root, element)?;
            }

            Ok(Event::End(_)) => {
                let mut element = stack.pop().ok_or_else(|| {
                    WsmanError::MalformedResponse("unbalanced end tag".to_string())
                })?;
                if !element.children.is_empty() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }

            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| {
                    WsmanError::MalformedResponse(format!("bad character data: {}", err))
                })?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(WsmanError::MalformedResponse(
                            "character data outside the root element".to_string(),
                        ))
                    }
                }
            }

            Ok(Event::CData(ref e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(e));
                }
            }

            Ok(Event::DocType(_)) => {
                return Err(WsmanError::MalformedResponse(
                    "DOCTYPE declarations are not accepted".to_string(),
                ));
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(WsmanError::MalformedResponse(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }

            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(WsmanError::MalformedResponse(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| WsmanError::MalformedResponse("document has no root element".to_string()))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), WsmanError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(WsmanError::MalformedResponse(
            "multiple root elements".to_string(),
        ))
    }
}

fn start_element(e: &BytesStart) -> Result<XmlElement, WsmanError> {
    let name = utf8(e.local_name().as_ref())?;

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            WsmanError::MalformedResponse(format!("bad attribute on <{}>: {}", name, err))
        })?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = utf8(attr.key.local_name().as_ref())?;
        let value = attr.unescape_value().map_err(|err| {
            WsmanError::MalformedResponse(format!("bad attribute value on <{}>: {}", name, err))
        })?;
        attributes.push((key, value.into_owned()));
    }

    Ok(XmlElement {
        name,
        attributes,
        ..Default::default()
    })
}

fn utf8(bytes: &[u8]) -> Result<String, WsmanError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| WsmanError::MalformedResponse(format!("invalid UTF-8 in name: {}", e)))
}
