//! Field descriptors: how typed resources map to and from XML elements.
//!
//! A resource lists its fields once, in schema order, as [`FieldDescriptor`]s.
//! The same table drives decoding (element name → setter) and Put encoding
//! (getter → element), so there is no reflection and no per-type XML code.

use crate::catalog::{ResourceIdentity, SchemaFamily};
use crate::error::WsmanError;
use crate::parser::XmlElement;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// Reads a field as zero or more wire values.
pub type FieldReader<T> = fn(&T) -> Vec<String>;
/// Writes one wire value into a field.
pub type FieldWriter<T> = fn(&mut T, &str) -> Result<(), String>;

/// How a field takes part in Put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Identity field; always sent, even when the caller left it empty
    Key,
    /// Sent whenever it has a value
    Writable,
    /// Never sent
    ReadOnly,
}

/// One element of a resource schema.
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub access: Access,
    /// Value sent for an empty key field
    pub default: Option<&'static str>,
    read: FieldReader<T>,
    write: FieldWriter<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn key(name: &'static str, read: FieldReader<T>, write: FieldWriter<T>) -> Self {
        Self::with_access(name, Access::Key, read, write)
    }

    pub fn writable(name: &'static str, read: FieldReader<T>, write: FieldWriter<T>) -> Self {
        Self::with_access(name, Access::Writable, read, write)
    }

    pub fn read_only(name: &'static str, read: FieldReader<T>, write: FieldWriter<T>) -> Self {
        Self::with_access(name, Access::ReadOnly, read, write)
    }

    /// Fixed value for a key field the caller did not fill in.
    pub fn with_default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    fn with_access(
        name: &'static str,
        access: Access,
        read: FieldReader<T>,
        write: FieldWriter<T>,
    ) -> Self {
        Self {
            name,
            access,
            default: None,
            read,
            write,
        }
    }
}

/// A shape the decoder can fill from XML.
pub trait Fields: Default {
    /// Field descriptors in schema order.
    fn fields() -> Vec<FieldDescriptor<Self>>;
}

/// A resource class addressable through WS-Management.
pub trait Resource: Fields {
    const FAMILY: SchemaFamily;
    const CLASS_NAME: &'static str;

    fn identity() -> ResourceIdentity {
        ResourceIdentity::new(Self::FAMILY, Self::CLASS_NAME)
    }
}

/// Check a schema for duplicate field names.
pub fn validate_fields<T: Fields>() -> Result<(), WsmanError> {
    let mut seen = HashSet::new();
    for field in T::fields() {
        if !seen.insert(field.name) {
            return Err(WsmanError::Schema(format!(
                "field '{}' declared more than once",
                field.name
            )));
        }
    }
    Ok(())
}

/// Fill a `T` from the children of `element`.
///
/// Unknown children are ignored and absent fields keep their zero value.
/// Repeated children append to list fields in document order.
pub fn decode_fields<T: Fields>(element: &XmlElement) -> Result<T, WsmanError> {
    let fields = T::fields();
    let mut value = T::default();
    for child in &element.children {
        if let Some(field) = fields.iter().find(|f| f.name == child.name) {
            (field.write)(&mut value, &child.text).map_err(|reason| {
                WsmanError::MalformedResponse(format!(
                    "<{}> in <{}>: {}",
                    child.name, element.name, reason
                ))
            })?;
        }
    }
    Ok(value)
}

/// Decode the first body child named `root`, or the zero value if none.
///
/// A mismatched root is not an error: callers see an all-zero `T`.
pub fn decode_root<T: Fields>(body: &XmlElement, root: &str) -> Result<T, WsmanError> {
    match body.child(root) {
        Some(element) => decode_fields(element),
        None => Ok(T::default()),
    }
}

/// Ordered `(element, value)` pairs for a Put body.
pub fn encode_fields<T: Fields>(value: &T) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();
    for field in T::fields() {
        match field.access {
            Access::ReadOnly => {}
            Access::Writable => {
                for v in (field.read)(value) {
                    out.push((field.name, v));
                }
            }
            Access::Key => {
                let values = (field.read)(value);
                if values.is_empty() {
                    out.push((field.name, field.default.unwrap_or_default().to_string()));
                } else {
                    out.extend(values.into_iter().map(|v| (field.name, v)));
                }
            }
        }
    }
    out
}

// Reader/writer helpers for descriptor tables.

/// A text field; empty means absent.
pub fn text(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// A scalar field; always one value.
pub fn scalar<V: Display>(value: &V) -> Vec<String> {
    vec![value.to_string()]
}

/// A repeated field.
pub fn list(values: &[String]) -> Vec<String> {
    values.to_vec()
}

pub fn set_text(slot: &mut String, raw: &str) -> Result<(), String> {
    *slot = raw.to_string();
    Ok(())
}

pub fn push_text(slot: &mut Vec<String>, raw: &str) -> Result<(), String> {
    slot.push(raw.to_string());
    Ok(())
}

/// Parse a scalar; an empty element leaves the zero value.
pub fn parse_scalar<V>(slot: &mut V, raw: &str) -> Result<(), String>
where
    V: FromStr + Default,
    V::Err: Display,
{
    let raw = raw.trim();
    *slot = if raw.is_empty() {
        V::default()
    } else {
        raw.parse()
            .map_err(|e| format!("cannot parse '{}': {}", raw, e))?
    };
    Ok(())
}

/// Parse an xs:boolean (`true`, `false`, `1`, `0`); empty leaves `false`.
pub fn parse_bool(slot: &mut bool, raw: &str) -> Result<(), String> {
    *slot = match raw.trim() {
        "" | "false" | "0" => false,
        "true" | "1" => true,
        other => return Err(format!("cannot parse '{}' as xs:boolean", other)),
    };
    Ok(())
}

/// Output of methods that only report a `ReturnValue`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReturnValueOutput {
    pub return_value: u32,
}

impl ReturnValueOutput {
    /// Zero is success for every CIM/AMT method.
    pub fn is_success(&self) -> bool {
        self.return_value == 0
    }
}

impl Fields for ReturnValueOutput {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![FieldDescriptor::read_only(
            "ReturnValue",
            |s: &Self| scalar(&s.return_value),
            |s: &mut Self, raw: &str| parse_scalar(&mut s.return_value, raw),
        )]
    }
}

/// Two-way value ↔ label table for enumerated CIM properties.
///
/// Both values and labels must be unique; this is checked on construction.
#[derive(Debug, Clone)]
pub struct LabelMap<V> {
    by_value: HashMap<V, &'static str>,
    by_label: HashMap<&'static str, V>,
}

impl<V> LabelMap<V>
where
    V: Copy + Eq + Hash + Display,
{
    pub fn new(entries: &[(V, &'static str)]) -> Result<Self, WsmanError> {
        let mut by_value = HashMap::with_capacity(entries.len());
        let mut by_label = HashMap::with_capacity(entries.len());
        for &(value, label) in entries {
            if by_value.insert(value, label).is_some() {
                return Err(WsmanError::Schema(format!(
                    "value {} labelled more than once",
                    value
                )));
            }
            if by_label.insert(label, value).is_some() {
                return Err(WsmanError::Schema(format!(
                    "label '{}' used for more than one value",
                    label
                )));
            }
        }
        Ok(Self { by_value, by_label })
    }

    pub fn label(&self, value: V) -> Option<&'static str> {
        self.by_value.get(&value).copied()
    }

    pub fn value(&self, label: &str) -> Option<V> {
        self.by_label.get(label).copied()
    }

    /// Label for `value`, or `Value(<n>)` when unknown.
    pub fn describe(&self, value: V) -> String {
        match self.label(value) {
            Some(label) => label.to_string(),
            None => format!("Value({})", value),
        }
    }

    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        instance_id: String,
        enabled: bool,
        count: u16,
        tags: Vec<String>,
        status: String,
    }

    impl Fields for Sample {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::key(
                    "InstanceID",
                    |s: &Self| text(&s.instance_id),
                    |s: &mut Self, raw: &str| set_text(&mut s.instance_id, raw),
                )
                .with_default("Sample 0"),
                FieldDescriptor::writable(
                    "Enabled",
                    |s: &Self| scalar(&s.enabled),
                    |s: &mut Self, raw: &str| parse_bool(&mut s.enabled, raw),
                ),
                FieldDescriptor::writable(
                    "Count",
                    |s: &Self| scalar(&s.count),
                    |s: &mut Self, raw: &str| parse_scalar(&mut s.count, raw),
                ),
                FieldDescriptor::writable(
                    "Tags",
                    |s: &Self| list(&s.tags),
                    |s: &mut Self, raw: &str| push_text(&mut s.tags, raw),
                ),
                FieldDescriptor::read_only(
                    "Status",
                    |s: &Self| text(&s.status),
                    |s: &mut Self, raw: &str| set_text(&mut s.status, raw),
                ),
            ]
        }
    }

    #[derive(Default)]
    struct Duplicated;

    impl Fields for Duplicated {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::read_only(
                    "Name",
                    |_: &Self| Vec::new(),
                    |_: &mut Self, _: &str| Ok(()),
                ),
                FieldDescriptor::read_only(
                    "Name",
                    |_: &Self| Vec::new(),
                    |_: &mut Self, _: &str| Ok(()),
                ),
            ]
        }
    }

    #[test]
    fn test_decode_known_unknown_and_missing() {
        let element = parse_document(
            b"<Sample><Count>7</Count><Unknown>x</Unknown><Tags>a</Tags><Tags>b</Tags><Enabled>true</Enabled></Sample>",
        )
        .unwrap();
        let sample: Sample = decode_fields(&element).unwrap();
        assert_eq!(sample.count, 7);
        assert!(sample.enabled);
        assert_eq!(sample.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sample.instance_id, "");
        assert_eq!(sample.status, "");
    }

    #[test]
    fn test_decode_empty_scalar_is_zero() {
        let element = parse_document(b"<Sample><Count/><Enabled></Enabled></Sample>").unwrap();
        let sample: Sample = decode_fields(&element).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_decode_bad_scalar_is_malformed() {
        let element = parse_document(b"<Sample><Count>lots</Count></Sample>").unwrap();
        let err = decode_fields::<Sample>(&element).unwrap_err();
        assert!(matches!(err, WsmanError::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_root_mismatch_is_zero_value() {
        let body = parse_document(b"<Body><Other><Count>3</Count></Other></Body>").unwrap();
        let sample: Sample = decode_root(&body, "Sample").unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_encode_order_and_access() {
        let sample = Sample {
            instance_id: String::new(),
            enabled: false,
            count: 2,
            tags: vec!["x".to_string(), "y".to_string()],
            status: "ignored".to_string(),
        };
        let fields = encode_fields(&sample);
        assert_eq!(
            fields,
            vec![
                ("InstanceID", "Sample 0".to_string()),
                ("Enabled", "false".to_string()),
                ("Count", "2".to_string()),
                ("Tags", "x".to_string()),
                ("Tags", "y".to_string()),
            ]
        );
    }

    #[test]
    fn test_encode_key_keeps_caller_value() {
        let sample = Sample {
            instance_id: "Sample 9".to_string(),
            ..Default::default()
        };
        let fields = encode_fields(&sample);
        assert_eq!(fields[0], ("InstanceID", "Sample 9".to_string()));
    }

    #[test]
    fn test_parse_bool_lexical_forms() {
        let mut flag = false;
        let cases = [
            ("1", true),
            ("0", false),
            (" true ", true),
            ("false", false),
            ("", false),
        ];
        for (raw, expected) in cases {
            parse_bool(&mut flag, raw).unwrap();
            assert_eq!(flag, expected, "input {:?}", raw);
        }
        assert!(parse_bool(&mut flag, "yes").is_err());
        assert!(parse_bool(&mut flag, "TRUE").is_err());
    }

    #[test]
    fn test_validate_fields() {
        assert!(validate_fields::<Sample>().is_ok());
        assert!(matches!(
            validate_fields::<Duplicated>(),
            Err(WsmanError::Schema(_))
        ));
    }

    #[test]
    fn test_return_value_output() {
        let element = parse_document(
            b"<RequestStateChange_OUTPUT><ReturnValue>4096</ReturnValue></RequestStateChange_OUTPUT>",
        )
        .unwrap();
        let output: ReturnValueOutput = decode_fields(&element).unwrap();
        assert_eq!(output.return_value, 4096);
        assert!(!output.is_success());
    }

    #[test]
    fn test_label_map_lookup() {
        let map = LabelMap::new(&[(2u16, "Enabled"), (3, "Disabled")]).unwrap();
        assert_eq!(map.label(2), Some("Enabled"));
        assert_eq!(map.value("Disabled"), Some(3));
        assert_eq!(map.describe(9), "Value(9)");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_label_map_rejects_duplicates() {
        assert!(LabelMap::new(&[(1u8, "A"), (1, "B")]).is_err());
        assert!(LabelMap::new(&[(1u8, "A"), (2, "A")]).is_err());
    }
}
