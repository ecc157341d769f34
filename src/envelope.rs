//! SOAP envelope construction.
//!
//! Envelopes are written as plain strings with fixed namespace prefixes so that
//! identical input (including the MessageID) always produces identical bytes:
//!
//! - default namespace: SOAP 1.2 envelope
//! - `a:` WS-Addressing 2004/08
//! - `w:` WS-Management
//! - `h:` the resource URI, for Put and method payloads

use crate::catalog::{
    is_xml_name, ActionCatalog, ResourceIdentity, Verb, ADDRESSING_NS, ANONYMOUS_ADDRESS,
    ENUMERATION_NS, SELECTOR_FILTER_DIALECT, SOAP_12_NS, WSMAN_NS,
};
use crate::cursor::EnumerationContext;
use crate::error::WsmanError;
use quick_xml::escape::escape;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default Pull batch size.
pub const DEFAULT_MAX_ELEMENTS: u32 = 999;
/// Default Pull character budget.
pub const DEFAULT_MAX_CHARACTERS: u32 = 99_999;
/// Default WS-Management OperationTimeout.
pub const DEFAULT_OPERATION_TIMEOUT: &str = "PT60S";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Session-scoped MessageID source.
///
/// Every built envelope takes exactly one ID. Increment-and-read is a single
/// atomic step, so a counter shared between threads never hands out
/// duplicates.
#[derive(Debug, Default)]
pub struct MessageIdCounter {
    next: AtomicU64,
}

impl MessageIdCounter {
    /// Create a counter whose first ID is `base`.
    pub fn new(base: u64) -> Self {
        Self {
            next: AtomicU64::new(base),
        }
    }

    /// Take the next ID.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The ID the next envelope will receive.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    /// Restart numbering at `base`.
    pub fn reset(&self, base: u64) {
        self.next.store(base, Ordering::Relaxed);
    }
}

/// Key/value pair addressing one resource instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub name: String,
    pub value: String,
}

impl Selector {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// WS-Addressing endpoint reference, used as a method parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReference {
    pub address: String,
    pub resource_uri: String,
    pub selectors: Vec<Selector>,
}

impl EndpointReference {
    /// Reference to an instance of `identity`, addressed anonymously.
    pub fn new(identity: &ResourceIdentity, selectors: Vec<Selector>) -> Self {
        Self {
            address: ANONYMOUS_ADDRESS.to_string(),
            resource_uri: identity.resource_uri().to_string(),
            selectors,
        }
    }
}

/// Value of a method input parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Text(String),
    Reference(EndpointReference),
}

/// One method input parameter. Parameters are written in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: String,
    pub value: ParameterValue,
}

impl MethodParameter {
    pub fn text(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: ParameterValue::Text(value.to_string()),
        }
    }

    pub fn reference(name: impl Into<String>, reference: EndpointReference) -> Self {
        Self {
            name: name.into(),
            value: ParameterValue::Reference(reference),
        }
    }
}

/// A built request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// MessageID carried in the header
    pub message_id: u64,
    /// Resolved action URI
    pub action: String,
    /// Serialized XML
    pub xml: String,
}

impl Envelope {
    pub fn as_bytes(&self) -> &[u8] {
        self.xml.as_bytes()
    }
}

/// Builds request envelopes for one resource class.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    identity: ResourceIdentity,
    actions: ActionCatalog,
    message_ids: Arc<MessageIdCounter>,
    operation_timeout: String,
    max_characters: u32,
}

impl EnvelopeBuilder {
    /// Create a builder drawing MessageIDs from `message_ids`.
    pub fn new(identity: ResourceIdentity, message_ids: Arc<MessageIdCounter>) -> Self {
        let actions = ActionCatalog::for_resource(&identity);
        Self {
            identity,
            actions,
            message_ids,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT.to_string(),
            max_characters: DEFAULT_MAX_CHARACTERS,
        }
    }

    /// Override the OperationTimeout header (xs:duration, e.g. `PT30S`).
    pub fn with_operation_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.operation_timeout = timeout.into();
        self
    }

    /// Override the MaxCharacters value sent with Pull.
    pub fn with_max_characters(mut self, max_characters: u32) -> Self {
        self.max_characters = max_characters;
        self
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn message_ids(&self) -> &Arc<MessageIdCounter> {
        &self.message_ids
    }

    /// Transfer Get.
    pub fn get(&self, selectors: &[Selector]) -> Envelope {
        self.build(&Verb::Get, selectors, "")
    }

    /// Enumeration Enumerate, optionally restricted by a selector filter.
    pub fn enumerate(&self, filter: Option<&[Selector]>) -> Envelope {
        let body = match filter {
            Some(selectors) if !selectors.is_empty() => format!(
                r#"<Enumerate xmlns="{}"><w:Filter Dialect="{}">{}</w:Filter></Enumerate>"#,
                ENUMERATION_NS,
                SELECTOR_FILTER_DIALECT,
                selector_set(selectors)
            ),
            _ => format!(r#"<Enumerate xmlns="{}" />"#, ENUMERATION_NS),
        };
        self.build(&Verb::Enumerate, &[], &body)
    }

    /// Enumeration Pull continuing `context`.
    pub fn pull(&self, context: &EnumerationContext, max_elements: Option<u32>) -> Envelope {
        let body = format!(
            r#"<Pull xmlns="{}"><EnumerationContext>{}</EnumerationContext><MaxElements>{}</MaxElements><MaxCharacters>{}</MaxCharacters></Pull>"#,
            ENUMERATION_NS,
            escape(context.as_str()),
            max_elements.unwrap_or(DEFAULT_MAX_ELEMENTS),
            self.max_characters
        );
        self.build(&Verb::Pull, &[], &body)
    }

    /// Enumeration Release, abandoning `context`.
    pub fn release(&self, context: &EnumerationContext) -> Envelope {
        let body = format!(
            r#"<Release xmlns="{}"><EnumerationContext>{}</EnumerationContext></Release>"#,
            ENUMERATION_NS,
            escape(context.as_str())
        );
        self.build(&Verb::Release, &[], &body)
    }

    /// Transfer Put with already-ordered field values.
    ///
    /// A field name may repeat; each occurrence becomes one element. Names
    /// that are not XML names are rejected before a MessageID is taken.
    pub fn put(
        &self,
        fields: &[(&str, String)],
        selectors: &[Selector],
    ) -> Result<Envelope, WsmanError> {
        check_element_name("class", self.identity.local_name())?;
        let mut payload = String::new();
        for (name, value) in fields {
            check_element_name("field", name)?;
            payload.push_str(&format!("<h:{0}>{1}</h:{0}>", name, escape(value.as_str())));
        }
        let body = format!(
            r#"<h:{0} xmlns:h="{1}">{2}</h:{0}>"#,
            self.identity.local_name(),
            escape(self.identity.resource_uri()),
            payload
        );
        Ok(self.build(&Verb::Put, selectors, &body))
    }

    /// Transfer Delete.
    pub fn delete(&self, selectors: &[Selector]) -> Envelope {
        self.build(&Verb::Delete, selectors, "")
    }

    /// Extrinsic method call; the body is `<h:{method}_INPUT>`.
    pub fn invoke(
        &self,
        method: &str,
        parameters: &[MethodParameter],
        selectors: &[Selector],
    ) -> Result<Envelope, WsmanError> {
        check_element_name("method", method)?;
        let mut payload = String::new();
        for parameter in parameters {
            check_element_name("parameter", &parameter.name)?;
            match &parameter.value {
                ParameterValue::Text(value) => payload.push_str(&format!(
                    "<h:{0}>{1}</h:{0}>",
                    parameter.name,
                    escape(value.as_str())
                )),
                ParameterValue::Reference(reference) => payload.push_str(&format!(
                    "<h:{0}>{1}</h:{0}>",
                    parameter.name,
                    endpoint_reference(reference)
                )),
            }
        }
        let body = format!(
            r#"<h:{0}_INPUT xmlns:h="{1}">{2}</h:{0}_INPUT>"#,
            method,
            escape(self.identity.resource_uri()),
            payload
        );
        Ok(self.build(&Verb::Method(method.to_string()), selectors, &body))
    }

    fn build(&self, verb: &Verb, selectors: &[Selector], body: &str) -> Envelope {
        let message_id = self.message_ids.next_id();
        let action = self.actions.action(verb);

        let mut xml = String::with_capacity(768 + body.len());
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(
            r#"<Envelope xmlns="{}" xmlns:a="{}" xmlns:w="{}">"#,
            SOAP_12_NS, ADDRESSING_NS, WSMAN_NS
        ));
        xml.push_str("<Header>");
        xml.push_str(&format!("<a:Action>{}</a:Action>", escape(action.as_str())));
        xml.push_str("<a:To>/wsman</a:To>");
        xml.push_str(&format!(
            "<w:ResourceURI>{}</w:ResourceURI>",
            escape(self.identity.resource_uri())
        ));
        xml.push_str(&format!("<a:MessageID>{}</a:MessageID>", message_id));
        xml.push_str(&format!(
            "<a:ReplyTo><a:Address>{}</a:Address></a:ReplyTo>",
            ANONYMOUS_ADDRESS
        ));
        xml.push_str(&format!(
            "<w:OperationTimeout>{}</w:OperationTimeout>",
            escape(self.operation_timeout.as_str())
        ));
        if !selectors.is_empty() {
            xml.push_str(&selector_set(selectors));
        }
        xml.push_str("</Header>");
        xml.push_str("<Body>");
        xml.push_str(body);
        xml.push_str("</Body></Envelope>");

        Envelope {
            message_id,
            action,
            xml,
        }
    }
}

/// Render a `w:SelectorSet` in the given order.
pub fn selector_set(selectors: &[Selector]) -> String {
    let mut xml = String::from("<w:SelectorSet>");
    for selector in selectors {
        xml.push_str(&format!(
            r#"<w:Selector Name="{}">{}</w:Selector>"#,
            escape(selector.name.as_str()),
            escape(selector.value.as_str())
        ));
    }
    xml.push_str("</w:SelectorSet>");
    xml
}

fn check_element_name(kind: &str, name: &str) -> Result<(), WsmanError> {
    if is_xml_name(name) {
        Ok(())
    } else {
        Err(WsmanError::Schema(format!(
            "{} name '{}' is not a valid XML name",
            kind, name
        )))
    }
}

fn endpoint_reference(reference: &EndpointReference) -> String {
    let mut xml = format!(
        "<a:Address>{}</a:Address><a:ReferenceParameters><w:ResourceURI>{}</w:ResourceURI>",
        escape(reference.address.as_str()),
        escape(reference.resource_uri.as_str())
    );
    if !reference.selectors.is_empty() {
        xml.push_str(&selector_set(&reference.selectors));
    }
    xml.push_str("</a:ReferenceParameters>");
    xml
}
