//! `CIM_KVMRedirectionSAP`: the KVM redirection service access point.

use crate::catalog::SchemaFamily;
use crate::client::Client;
use crate::envelope::MethodParameter;
use crate::error::WsmanError;
use crate::schema::{
    parse_scalar, scalar, set_text, text, FieldDescriptor, Fields, LabelMap, Resource,
    ReturnValueOutput,
};
use serde::{Deserialize, Serialize};

/// EnabledState values reported by the SAP.
pub const ENABLED_STATE_LABELS: &[(u16, &str)] = &[
    (0, "Unknown"),
    (1, "Other"),
    (2, "Enabled"),
    (3, "Disabled"),
    (4, "ShuttingDown"),
    (5, "NotApplicable"),
    (6, "EnabledButOffline"),
    (7, "InTest"),
    (8, "Deferred"),
    (9, "Quiesce"),
    (10, "Starting"),
];

/// RequestStateChange ReturnValue codes.
pub const RETURN_VALUE_LABELS: &[(u32, &str)] = &[
    (0, "CompletedWithNoError"),
    (1, "NotSupported"),
    (2, "UnknownOrUnspecifiedError"),
    (3, "CannotCompleteWithinTimeoutPeriod"),
    (4, "Failed"),
    (5, "InvalidParameter"),
    (6, "InUse"),
    (4096, "MethodParametersCheckedJobStarted"),
    (4097, "InvalidStateTransition"),
    (4098, "UseOfTimeoutParameterNotSupported"),
    (4099, "Busy"),
];

/// States accepted by RequestStateChange on AMT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvmRequestedState {
    /// Redirection enabled and listening
    Enabled,
    /// Redirection disabled
    Disabled,
    /// Enabled but not listening (AMT vendor value)
    EnabledButOffline,
}

impl KvmRequestedState {
    pub fn value(&self) -> u16 {
        match self {
            Self::Enabled => 2,
            Self::Disabled => 3,
            Self::EnabledButOffline => 32771,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KvmRedirectionSap {
    pub name: String,
    pub creation_class_name: String,
    pub system_name: String,
    pub system_creation_class_name: String,
    pub element_name: String,
    pub enabled_state: u16,
    pub requested_state: u16,
    #[serde(rename = "KVMProtocol")]
    pub kvm_protocol: u16,
}

impl KvmRedirectionSap {
    pub fn enabled_state_labels() -> Result<LabelMap<u16>, WsmanError> {
        LabelMap::new(ENABLED_STATE_LABELS)
    }

    pub fn return_value_labels() -> Result<LabelMap<u32>, WsmanError> {
        LabelMap::new(RETURN_VALUE_LABELS)
    }
}

impl Fields for KvmRedirectionSap {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::key(
                "Name",
                |s: &Self| text(&s.name),
                |s: &mut Self, raw: &str| set_text(&mut s.name, raw),
            ),
            FieldDescriptor::key(
                "CreationClassName",
                |s: &Self| text(&s.creation_class_name),
                |s: &mut Self, raw: &str| set_text(&mut s.creation_class_name, raw),
            )
            .with_default("CIM_KVMRedirectionSAP"),
            FieldDescriptor::key(
                "SystemName",
                |s: &Self| text(&s.system_name),
                |s: &mut Self, raw: &str| set_text(&mut s.system_name, raw),
            ),
            FieldDescriptor::key(
                "SystemCreationClassName",
                |s: &Self| text(&s.system_creation_class_name),
                |s: &mut Self, raw: &str| set_text(&mut s.system_creation_class_name, raw),
            )
            .with_default("CIM_ComputerSystem"),
            FieldDescriptor::read_only(
                "ElementName",
                |s: &Self| text(&s.element_name),
                |s: &mut Self, raw: &str| set_text(&mut s.element_name, raw),
            ),
            FieldDescriptor::read_only(
                "EnabledState",
                |s: &Self| scalar(&s.enabled_state),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.enabled_state, raw),
            ),
            FieldDescriptor::read_only(
                "RequestedState",
                |s: &Self| scalar(&s.requested_state),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.requested_state, raw),
            ),
            FieldDescriptor::read_only(
                "KVMProtocol",
                |s: &Self| scalar(&s.kvm_protocol),
                |s: &mut Self, raw: &str| parse_scalar(&mut s.kvm_protocol, raw),
            ),
        ]
    }
}

impl Resource for KvmRedirectionSap {
    const FAMILY: SchemaFamily = SchemaFamily::Cim;
    const CLASS_NAME: &'static str = "CIM_KVMRedirectionSAP";
}

impl Client<KvmRedirectionSap> {
    /// Request a KVM state change. The outcome is in the returned code.
    pub fn request_state_change(
        &self,
        state: KvmRequestedState,
    ) -> Result<ReturnValueOutput, WsmanError> {
        self.invoke(
            "RequestStateChange",
            &[MethodParameter::text("RequestedState", state.value())],
            &[],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Session;
    use crate::transport::ReplayTransport;
    use std::sync::Arc;

    #[test]
    fn test_label_tables_are_unique() {
        let states = KvmRedirectionSap::enabled_state_labels().unwrap();
        assert_eq!(states.label(6), Some("EnabledButOffline"));
        assert_eq!(states.value("Disabled"), Some(3));

        let codes = KvmRedirectionSap::return_value_labels().unwrap();
        assert_eq!(codes.describe(4097), "InvalidStateTransition");
        assert_eq!(codes.describe(77), "Value(77)");
    }

    #[test]
    fn test_request_state_change() {
        let transport = Arc::new(ReplayTransport::new().respond(
            r#"<a:Envelope xmlns:a="http://www.w3.org/2003/05/soap-envelope" xmlns:g="http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_KVMRedirectionSAP"><a:Header/><a:Body><g:RequestStateChange_OUTPUT><g:ReturnValue>0</g:ReturnValue></g:RequestStateChange_OUTPUT></a:Body></a:Envelope>"#,
        ));
        let session = Session::new(transport.clone());
        let client = session.client::<KvmRedirectionSap>().unwrap();

        let output = client
            .request_state_change(KvmRequestedState::EnabledButOffline)
            .unwrap();
        assert!(output.is_success());
        assert!(transport.requests()[0].contains("<h:RequestedState>32771</h:RequestedState>"));
    }
}
