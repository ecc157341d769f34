//! `AMT_EnvironmentDetectionSettingData`: domains used to decide whether the
//! platform is inside the enterprise network.

use crate::catalog::SchemaFamily;
use crate::error::WsmanError;
use crate::schema::{
    list, parse_scalar, push_text, scalar, set_text, text, FieldDescriptor, Fields, LabelMap,
    Resource,
};
use serde::{Deserialize, Serialize};

/// The single instance's fixed identity.
pub const INSTANCE_ID: &str = "Intel(r) AMT Environment Detection Settings";

/// DetectionAlgorithm values.
pub const DETECTION_ALGORITHM_LABELS: &[(u8, &str)] = &[(0, "LocalDomains"), (1, "RemoteURLs")];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentDetectionSettingData {
    pub element_name: String,
    #[serde(rename = "InstanceID")]
    pub instance_id: String,
    pub detection_algorithm: u8,
    pub detection_strings: Vec<String>,
    #[serde(rename = "DetectionIPv6LocalPrefixes")]
    pub detection_ipv6_local_prefixes: Vec<String>,
}

impl EnvironmentDetectionSettingData {
    pub fn detection_algorithm_labels() -> Result<LabelMap<u8>, WsmanError> {
        LabelMap::new(DETECTION_ALGORITHM_LABELS)
    }
}

impl Fields for EnvironmentDetectionSettingData {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::key(
                "ElementName",
                |s: &Self| text(&s.element_name),
                |s: &mut Self, raw: &str| set_text(&mut s.element_name, raw),
            )
            .with_default(INSTANCE_ID),
            FieldDescriptor::key(
                "InstanceID",
                |s: &Self| text(&s.instance_id),
                |s: &mut Self, raw: &str| set_text(&mut s.instance_id, raw),
            )
            .with_default(INSTANCE_ID),
            FieldDescriptor::writable(
                "DetectionAlgorithm",
                |s: &Self| scalar(&s.detection_algorithm),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.detection_algorithm, raw),
            ),
            FieldDescriptor::writable(
                "DetectionStrings",
                |s: &Self| list(&s.detection_strings),
                |s: &mut Self, raw: &str| push_text(&mut s.detection_strings, raw),
            ),
            FieldDescriptor::writable(
                "DetectionIPv6LocalPrefixes",
                |s: &Self| list(&s.detection_ipv6_local_prefixes),
                |s: &mut Self, raw: &str| push_text(&mut s.detection_ipv6_local_prefixes, raw),
            ),
        ]
    }
}

impl Resource for EnvironmentDetectionSettingData {
    const FAMILY: SchemaFamily = SchemaFamily::Amt;
    const CLASS_NAME: &'static str = "AMT_EnvironmentDetectionSettingData";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_response;
    use crate::schema::{decode_root, encode_fields, validate_fields};

    #[test]
    fn test_schema_is_valid() {
        assert!(validate_fields::<EnvironmentDetectionSettingData>().is_ok());
        let labels = EnvironmentDetectionSettingData::detection_algorithm_labels().unwrap();
        assert_eq!(labels.label(1), Some("RemoteURLs"));
    }

    #[test]
    fn test_decode_get_response() {
        let xml = r#"<a:Envelope xmlns:a="http://www.w3.org/2003/05/soap-envelope" xmlns:g="http://intel.com/wbem/wscim/1/amt-schema/1/AMT_EnvironmentDetectionSettingData"><a:Header/><a:Body><g:AMT_EnvironmentDetectionSettingData><g:DetectionAlgorithm>0</g:DetectionAlgorithm><g:DetectionStrings>a.com</g:DetectionStrings><g:DetectionStrings>b.com</g:DetectionStrings><g:ElementName>Intel(r) AMT Environment Detection Settings</g:ElementName><g:InstanceID>Intel(r) AMT Environment Detection Settings</g:InstanceID></g:AMT_EnvironmentDetectionSettingData></a:Body></a:Envelope>"#;
        let envelope = parse_response(xml.as_bytes()).unwrap();
        let settings: EnvironmentDetectionSettingData =
            decode_root(&envelope.body, "AMT_EnvironmentDetectionSettingData").unwrap();
        assert_eq!(settings.detection_algorithm, 0);
        assert_eq!(settings.detection_strings, vec!["a.com", "b.com"]);
        assert_eq!(settings.instance_id, INSTANCE_ID);
        assert!(settings.detection_ipv6_local_prefixes.is_empty());
    }

    #[test]
    fn test_put_fields_include_identity() {
        let update = EnvironmentDetectionSettingData {
            detection_strings: vec!["corp.example".to_string()],
            ..Default::default()
        };
        let fields = encode_fields(&update);
        assert_eq!(
            fields,
            vec![
                ("ElementName", INSTANCE_ID.to_string()),
                ("InstanceID", INSTANCE_ID.to_string()),
                ("DetectionAlgorithm", "0".to_string()),
                ("DetectionStrings", "corp.example".to_string()),
            ]
        );
    }

    #[test]
    fn test_json_projection() {
        let settings = EnvironmentDetectionSettingData {
            instance_id: INSTANCE_ID.to_string(),
            detection_strings: vec!["a.com".to_string()],
            ..Default::default()
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["InstanceID"], INSTANCE_ID);
        assert_eq!(json["DetectionStrings"][0], "a.com");
        assert_eq!(json["DetectionAlgorithm"], 0);
    }
}
