//! `AMT_GeneralSettings` (subset).

use crate::catalog::SchemaFamily;
use crate::error::WsmanError;
use crate::schema::{
    parse_bool, parse_scalar, scalar, set_text, text, FieldDescriptor, Fields, LabelMap,
    Resource,
};
use serde::{Deserialize, Serialize};

pub const INSTANCE_ID: &str = "Intel(r) AMT: General Settings";

pub const PREFERRED_ADDRESS_FAMILY_LABELS: &[(u8, &str)] = &[(0, "IPv4"), (1, "IPv6")];

pub const AMT_NETWORK_ENABLED_LABELS: &[(u8, &str)] = &[(0, "Disabled"), (1, "Enabled")];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeneralSettings {
    pub element_name: String,
    #[serde(rename = "InstanceID")]
    pub instance_id: String,
    pub network_interface_enabled: bool,
    pub digest_realm: String,
    pub idle_wake_timeout: u32,
    pub host_name: String,
    pub domain_name: String,
    pub ping_response_enabled: bool,
    pub wsman_only_mode: bool,
    pub preferred_address_family: u8,
    #[serde(rename = "DHCPv6ConfigurationTimeout")]
    pub dhcpv6_configuration_timeout: u32,
    #[serde(rename = "DDNSUpdateEnabled")]
    pub ddns_update_enabled: bool,
    #[serde(rename = "AMTNetworkEnabled")]
    pub amt_network_enabled: u8,
    pub rmcp_ping_response_enabled: bool,
    pub privacy_level: u8,
}

impl GeneralSettings {
    pub fn preferred_address_family_labels() -> Result<LabelMap<u8>, WsmanError> {
        LabelMap::new(PREFERRED_ADDRESS_FAMILY_LABELS)
    }

    pub fn amt_network_enabled_labels() -> Result<LabelMap<u8>, WsmanError> {
        LabelMap::new(AMT_NETWORK_ENABLED_LABELS)
    }
}

impl Fields for GeneralSettings {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::read_only(
                "ElementName",
                |s: &Self| text(&s.element_name),
                |s: &mut Self, raw: &str| set_text(&mut s.element_name, raw),
            ),
            FieldDescriptor::key(
                "InstanceID",
                |s: &Self| text(&s.instance_id),
                |s: &mut Self, raw: &str| set_text(&mut s.instance_id, raw),
            )
            .with_default(INSTANCE_ID),
            FieldDescriptor::read_only(
                "NetworkInterfaceEnabled",
                |s: &Self| scalar(&s.network_interface_enabled),
                |s: &mut Self, raw: &str| parse_bool(&mut s.network_interface_enabled, raw),
            ),
            FieldDescriptor::read_only(
                "DigestRealm",
                |s: &Self| text(&s.digest_realm),
                |s: &mut Self, raw: &str| set_text(&mut s.digest_realm, raw),
            ),
            FieldDescriptor::writable(
                "IdleWakeTimeout",
                |s: &Self| scalar(&s.idle_wake_timeout),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.idle_wake_timeout, raw),
            ),
            FieldDescriptor::writable(
                "HostName",
                |s: &Self| text(&s.host_name),
                |s: &mut Self, raw: &str| set_text(&mut s.host_name, raw),
            ),
            FieldDescriptor::writable(
                "DomainName",
                |s: &Self| text(&s.domain_name),
                |s: &mut Self, raw: &str| set_text(&mut s.domain_name, raw),
            ),
            FieldDescriptor::writable(
                "PingResponseEnabled",
                |s: &Self| scalar(&s.ping_response_enabled),
                |s: &mut Self, raw: &str| parse_bool(&mut s.ping_response_enabled, raw),
            ),
            FieldDescriptor::writable(
                "WsmanOnlyMode",
                |s: &Self| scalar(&s.wsman_only_mode),
                |s: &mut Self, raw: &str| parse_bool(&mut s.wsman_only_mode, raw),
            ),
            FieldDescriptor::writable(
                "PreferredAddressFamily",
                |s: &Self| scalar(&s.preferred_address_family),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.preferred_address_family, raw),
            ),
            FieldDescriptor::writable(
                "DHCPv6ConfigurationTimeout",
                |s: &Self| scalar(&s.dhcpv6_configuration_timeout),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.dhcpv6_configuration_timeout, raw),
            ),
            FieldDescriptor::writable(
                "DDNSUpdateEnabled",
                |s: &Self| scalar(&s.ddns_update_enabled),
                |s: &mut Self, raw: &str| parse_bool(&mut s.ddns_update_enabled, raw),
            ),
            FieldDescriptor::writable(
                "AMTNetworkEnabled",
                |s: &Self| scalar(&s.amt_network_enabled),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.amt_network_enabled, raw),
            ),
            FieldDescriptor::writable(
                "RmcpPingResponseEnabled",
                |s: &Self| scalar(&s.rmcp_ping_response_enabled),
                |s: &mut Self, raw: &str| parse_bool(&mut s.rmcp_ping_response_enabled, raw),
            ),
            FieldDescriptor::read_only(
                "PrivacyLevel",
                |s: &Self| scalar(&s.privacy_level),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.privacy_level, raw),
            ),
        ]
    }
}

impl Resource for GeneralSettings {
    const FAMILY: SchemaFamily = SchemaFamily::Amt;
    const CLASS_NAME: &'static str = "AMT_GeneralSettings";
}
