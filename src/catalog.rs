//! Resource identities and action URIs.

use crate::error::WsmanError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace URIs used on the wire.
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const ADDRESSING_NS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
pub const WSMAN_NS: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";
pub const TRANSFER_NS: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer";
pub const ENUMERATION_NS: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration";

/// Anonymous WS-Addressing reply endpoint.
pub const ANONYMOUS_ADDRESS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Filter dialect for selector-based enumeration filters.
pub const SELECTOR_FILTER_DIALECT: &str =
    "http://schemas.dmtf.org/wbem/wsman/1/wsman/SelectorFilter";

/// Schema families exposed by an AMT device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFamily {
    /// Intel AMT classes (`AMT_*`)
    Amt,
    /// DMTF CIM classes (`CIM_*`)
    Cim,
    /// Intel platform services classes (`IPS_*`)
    Ips,
}

impl SchemaFamily {
    /// Base resource URI, including the trailing slash.
    pub fn base_uri(&self) -> &'static str {
        match self {
            Self::Amt => "http://intel.com/wbem/wscim/1/amt-schema/1/",
            Self::Cim => "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/",
            Self::Ips => "http://intel.com/wbem/wscim/1/ips-schema/1/",
        }
    }

    /// Infer the family from a class name prefix.
    pub fn from_class_name(class_name: &str) -> Option<Self> {
        if class_name.starts_with("AMT_") {
            Some(Self::Amt)
        } else if class_name.starts_with("CIM_") {
            Some(Self::Cim)
        } else if class_name.starts_with("IPS_") {
            Some(Self::Ips)
        } else {
            None
        }
    }
}

/// Identity of a WS-Management resource class.
///
/// `local_name` is always the last path segment of `resource_uri` and is the
/// element name expected at the root of Get/Put response bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    resource_uri: String,
    local_name: String,
}

impl ResourceIdentity {
    /// Identity for `class_name` within a schema family.
    pub fn new(family: SchemaFamily, class_name: &str) -> Self {
        Self {
            resource_uri: format!("{}{}", family.base_uri(), class_name),
            local_name: class_name.to_string(),
        }
    }

    /// Identity for a prefixed class name such as `AMT_GeneralSettings`.
    pub fn for_class(class_name: &str) -> Result<Self, WsmanError> {
        check_class_name(class_name)?;
        let family = SchemaFamily::from_class_name(class_name).ok_or_else(|| {
            WsmanError::Schema(format!(
                "cannot infer schema family for class '{}'",
                class_name
            ))
        })?;
        Ok(Self::new(family, class_name))
    }

    /// Identity from a full resource URI.
    pub fn from_uri(resource_uri: &str) -> Result<Self, WsmanError> {
        let local_name = resource_uri
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                WsmanError::Schema(format!(
                    "resource URI '{}' has no terminal class segment",
                    resource_uri
                ))
            })?;
        check_class_name(local_name)?;
        Ok(Self {
            resource_uri: resource_uri.to_string(),
            local_name: local_name.to_string(),
        })
    }

    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

fn check_class_name(class_name: &str) -> Result<(), WsmanError> {
    if is_xml_name(class_name) {
        Ok(())
    } else {
        Err(WsmanError::Schema(format!(
            "'{}' is not a valid class element name",
            class_name
        )))
    }
}

/// Whether `name` can be used as an unprefixed XML element name.
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource_uri)
    }
}

/// A WS-Management verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
    Delete,
    Enumerate,
    Pull,
    Release,
    /// Extrinsic method defined by the resource class
    Method(String),
}

/// Action URIs for one resource class, resolved once per binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalog {
    resource_uri: String,
    get: String,
    put: String,
    delete: String,
    enumerate: String,
    pull: String,
    release: String,
}

impl ActionCatalog {
    /// Resolve the standard actions for `identity`.
    pub fn for_resource(identity: &ResourceIdentity) -> Self {
        Self {
            resource_uri: identity.resource_uri().to_string(),
            get: format!("{}/Get", TRANSFER_NS),
            put: format!("{}/Put", TRANSFER_NS),
            delete: format!("{}/Delete", TRANSFER_NS),
            enumerate: format!("{}/Enumerate", ENUMERATION_NS),
            pull: format!("{}/Pull", ENUMERATION_NS),
            release: format!("{}/Release", ENUMERATION_NS),
        }
    }

    /// Action URI for `verb`.
    pub fn action(&self, verb: &Verb) -> String {
        match verb {
            Verb::Get => self.get.clone(),
            Verb::Put => self.put.clone(),
            Verb::Delete => self.delete.clone(),
            Verb::Enumerate => self.enumerate.clone(),
            Verb::Pull => self.pull.clone(),
            Verb::Release => self.release.clone(),
            Verb::Method(name) => self.method(name),
        }
    }

    /// Action URI for an extrinsic method: `<resourceURI>/<MethodName>`.
    pub fn method(&self, name: &str) -> String {
        format!("{}/{}", self.resource_uri, name)
    }
}
