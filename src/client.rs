//! Generic resource client.
//!
//! A [`Session`] owns the transport and the MessageID counter; it hands out
//! typed [`Client`]s, one per resource class. Every client call is one
//! blocking round trip and consumes exactly one MessageID, whatever the
//! outcome.

use crate::catalog::ResourceIdentity;
use crate::config::{EnumerationConfig, WsmanConfig};
use crate::cursor::{EnumerationContext, EnumerationCursor};
use crate::envelope::{
    Envelope, EnvelopeBuilder, MessageIdCounter, MethodParameter, Selector,
    DEFAULT_OPERATION_TIMEOUT,
};
use crate::error::WsmanError;
use crate::parser::{parse_response, ResponseEnvelope};
use crate::schema::{decode_fields, decode_root, encode_fields, validate_fields, Fields, Resource};
use crate::transport::Transport;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state for all clients talking to one device.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
    message_ids: Arc<MessageIdCounter>,
    operation_timeout: String,
    enumeration: EnumerationConfig,
}

impl Session {
    /// Session with default envelope and enumeration settings.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            message_ids: Arc::new(MessageIdCounter::default()),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT.to_string(),
            enumeration: EnumerationConfig::default(),
        }
    }

    /// Session configured from `config`.
    pub fn from_config(
        config: &WsmanConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, WsmanError> {
        config.validate()?;
        Ok(Self {
            transport,
            message_ids: Arc::new(MessageIdCounter::new(config.envelope.message_id_base)),
            operation_timeout: config.envelope.operation_timeout.clone(),
            enumeration: config.enumeration.clone(),
        })
    }

    /// The MessageID counter shared by every client of this session.
    pub fn message_ids(&self) -> &Arc<MessageIdCounter> {
        &self.message_ids
    }

    /// Typed client for resource `T`.
    pub fn client<T: Resource>(&self) -> Result<Client<T>, WsmanError> {
        validate_fields::<T>()?;
        let builder = EnvelopeBuilder::new(T::identity(), Arc::clone(&self.message_ids))
            .with_operation_timeout(self.operation_timeout.clone())
            .with_max_characters(self.enumeration.max_characters);
        Ok(Client {
            builder,
            transport: Arc::clone(&self.transport),
            enumeration: self.enumeration.clone(),
            _resource: PhantomData,
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("next_message_id", &self.message_ids.peek())
            .field("operation_timeout", &self.operation_timeout)
            .field("enumeration", &self.enumeration)
            .finish()
    }
}

/// One batch of a Pull.
#[derive(Debug)]
pub struct PullBatch<T> {
    pub items: Vec<T>,
    /// Context for the next Pull; `None` once the sequence has ended
    pub next: Option<EnumerationContext>,
}

impl<T> PullBatch<T> {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Uniform WS-Management operations over resource `T`.
pub struct Client<T> {
    builder: EnvelopeBuilder,
    transport: Arc<dyn Transport>,
    enumeration: EnumerationConfig,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> Client<T> {
    pub fn identity(&self) -> &ResourceIdentity {
        self.builder.identity()
    }

    pub fn builder(&self) -> &EnvelopeBuilder {
        &self.builder
    }

    pub fn enumeration(&self) -> &EnumerationConfig {
        &self.enumeration
    }

    /// Transfer Get. A body without the expected root yields `T::default()`.
    pub fn get(&self, selectors: &[Selector]) -> Result<T, WsmanError> {
        let response = self.round_trip(self.builder.get(selectors))?;
        decode_root(&response.body, self.identity().local_name())
    }

    /// Start an enumeration.
    pub fn enumerate(&self) -> Result<EnumerationContext, WsmanError> {
        self.enumerate_with(None)
    }

    /// Start an enumeration restricted by a selector filter.
    pub fn enumerate_filtered(
        &self,
        filter: &[Selector],
    ) -> Result<EnumerationContext, WsmanError> {
        self.enumerate_with(Some(filter))
    }

    pub(crate) fn enumerate_with(
        &self,
        filter: Option<&[Selector]>,
    ) -> Result<EnumerationContext, WsmanError> {
        let response = self.round_trip(self.builder.enumerate(filter))?;
        response
            .body
            .descend(&["EnumerateResponse", "EnumerationContext"])
            .map(|e| e.text.trim())
            .filter(|token| !token.is_empty())
            .map(EnumerationContext::new)
            .ok_or_else(|| {
                WsmanError::MalformedResponse(
                    "EnumerateResponse carried no EnumerationContext".to_string(),
                )
            })
    }

    /// Pull the next batch, consuming `context`.
    pub fn pull(&self, context: EnumerationContext) -> Result<PullBatch<T>, WsmanError> {
        let request = self
            .builder
            .pull(&context, Some(self.enumeration.max_elements));
        let response = self.round_trip(request)?;

        let Some(pull) = response.body_root("PullResponse") else {
            return Ok(PullBatch {
                items: Vec::new(),
                next: None,
            });
        };

        let items = match pull.child("Items") {
            Some(items) => items
                .children_named(self.identity().local_name())
                .map(decode_fields::<T>)
                .collect::<Result<Vec<T>, _>>()?,
            None => Vec::new(),
        };

        let next = if pull.child("EndOfSequence").is_some() {
            None
        } else {
            pull.child("EnumerationContext")
                .map(|e| e.text.trim())
                .filter(|token| !token.is_empty())
                .map(EnumerationContext::new)
        };

        debug!(
            resource = %self.identity(),
            items = items.len(),
            more = next.is_some(),
            "Pulled batch"
        );
        Ok(PullBatch { items, next })
    }

    /// Release an enumeration context before it is exhausted.
    pub fn release(&self, context: EnumerationContext) -> Result<(), WsmanError> {
        self.round_trip(self.builder.release(&context))?;
        Ok(())
    }

    /// Transfer Put. Key fields are always sent; the response is decoded
    /// like a Get.
    pub fn put(&self, value: &T, selectors: &[Selector]) -> Result<T, WsmanError> {
        let fields = encode_fields(value);
        let response = self.round_trip(self.builder.put(&fields, selectors)?)?;
        decode_root(&response.body, self.identity().local_name())
    }

    /// Transfer Delete.
    pub fn delete(&self, selectors: &[Selector]) -> Result<(), WsmanError> {
        self.round_trip(self.builder.delete(selectors))?;
        Ok(())
    }

    /// Invoke an extrinsic method and decode `<{method}_OUTPUT>`.
    ///
    /// A non-zero `ReturnValue` in the output is data, not an error.
    pub fn invoke<O: Fields>(
        &self,
        method: &str,
        parameters: &[MethodParameter],
        selectors: &[Selector],
    ) -> Result<O, WsmanError> {
        let request = self.builder.invoke(method, parameters, selectors)?;
        let response = self.round_trip(request)?;
        decode_root(&response.body, &format!("{}_OUTPUT", method))
    }

    /// A cursor over this resource class.
    pub fn cursor(&self) -> EnumerationCursor<'_, T> {
        EnumerationCursor::new(self)
    }

    /// Enumerate and pull every instance.
    pub fn pull_all(&self) -> Result<Vec<T>, WsmanError> {
        let mut all = Vec::new();
        for batch in self.cursor().batches() {
            all.extend(batch?);
        }
        Ok(all)
    }

    fn round_trip(&self, request: Envelope) -> Result<ResponseEnvelope, WsmanError> {
        debug!(
            message_id = request.message_id,
            action = %request.action,
            resource = %self.identity(),
            "Sending WS-Management request"
        );

        let response = self.transport.execute(request.as_bytes()).map_err(|e| {
            warn!(message_id = request.message_id, error = %e, "Transport error");
            WsmanError::Transport(e)
        })?;

        match parse_response(&response) {
            Ok(envelope) => {
                debug!(
                    message_id = request.message_id,
                    relates_to = %envelope.header.relates_to,
                    "Received response"
                );
                Ok(envelope)
            }
            Err(WsmanError::Fault(fault)) => {
                warn!(
                    message_id = request.message_id,
                    kind = fault.kind().as_str(),
                    sub_code = %fault.sub_code,
                    message = %fault.message,
                    "WS-Management fault"
                );
                Err(WsmanError::Fault(fault))
            }
            Err(e) => {
                warn!(message_id = request.message_id, error = %e, "Malformed response");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::resources::{EnvironmentDetectionSettingData, KvmRedirectionSap};
    use crate::schema::ReturnValueOutput;
    use crate::transport::ReplayTransport;

    const EMPTY_RESPONSE: &str = r#"<a:Envelope xmlns:a="http://www.w3.org/2003/05/soap-envelope"><a:Header/><a:Body/></a:Envelope>"#;

    fn fixture_session(transport: ReplayTransport) -> (Session, Arc<ReplayTransport>) {
        let transport = Arc::new(transport);
        (Session::new(transport.clone()), transport)
    }

    #[test]
    fn test_message_id_advances_on_every_outcome() {
        let (session, _) = fixture_session(
            ReplayTransport::new()
                .respond(EMPTY_RESPONSE)
                .fail(TransportError::Connection("refused".to_string()))
                .respond("not xml at all")
                .respond(r#"<a:Envelope xmlns:a="http://www.w3.org/2003/05/soap-envelope"><a:Body><a:Fault><a:Code><a:Subcode><a:Value>b:TimedOut</a:Value></a:Subcode></a:Code><a:Reason><a:Text>late</a:Text></a:Reason></a:Fault></a:Body></a:Envelope>"#),
        );
        let client = session.client::<EnvironmentDetectionSettingData>().unwrap();
        assert_eq!(session.message_ids().peek(), 0);

        assert!(client.get(&[]).is_ok());
        assert_eq!(session.message_ids().peek(), 1);

        assert!(matches!(client.get(&[]), Err(WsmanError::Transport(_))));
        assert_eq!(session.message_ids().peek(), 2);

        assert!(matches!(client.get(&[]), Err(WsmanError::MalformedResponse(_))));
        assert_eq!(session.message_ids().peek(), 3);

        assert!(matches!(client.get(&[]), Err(WsmanError::Fault(_))));
        assert_eq!(session.message_ids().peek(), 4);
    }

    #[test]
    fn test_transport_error_passes_through() {
        let (session, _) = fixture_session(ReplayTransport::new().fail(TransportError::Status {
            code: 401,
            body: "Unauthorized".to_string(),
        }));
        let client = session.client::<EnvironmentDetectionSettingData>().unwrap();
        match client.get(&[]) {
            Err(WsmanError::Transport(TransportError::Status { code, body })) => {
                assert_eq!(code, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_get_is_zero_value() {
        let (session, _) = fixture_session(ReplayTransport::new().respond(EMPTY_RESPONSE));
        let client = session.client::<EnvironmentDetectionSettingData>().unwrap();
        let settings = client.get(&[]).unwrap();
        assert_eq!(settings, EnvironmentDetectionSettingData::default());
    }

    #[test]
    fn test_enumerate_without_context_is_malformed() {
        let (session, _) = fixture_session(ReplayTransport::new().respond(EMPTY_RESPONSE));
        let client = session.client::<EnvironmentDetectionSettingData>().unwrap();
        assert!(matches!(
            client.enumerate(),
            Err(WsmanError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_pull_without_pull_response_is_empty_last_batch() {
        let (session, _) = fixture_session(ReplayTransport::new().respond(EMPTY_RESPONSE));
        let client = session.client::<EnvironmentDetectionSettingData>().unwrap();
        let batch = client.pull(EnumerationContext::new("ctx")).unwrap();
        assert!(batch.items.is_empty());
        assert!(batch.is_last());
    }

    #[test]
    fn test_invoke_returns_code_as_data() {
        let (session, transport) = fixture_session(ReplayTransport::new().respond(
            r#"<a:Envelope xmlns:a="http://www.w3.org/2003/05/soap-envelope" xmlns:g="http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_KVMRedirectionSAP"><a:Header/><a:Body><g:RequestStateChange_OUTPUT><g:ReturnValue>2</g:ReturnValue></g:RequestStateChange_OUTPUT></a:Body></a:Envelope>"#,
        ));
        let client = session.client::<KvmRedirectionSap>().unwrap();
        let output: ReturnValueOutput = client
            .invoke(
                "RequestStateChange",
                &[MethodParameter::text("RequestedState", 32768)],
                &[],
            )
            .unwrap();
        assert_eq!(output.return_value, 2);
        assert!(!output.is_success());
        assert!(transport.requests()[0].contains("<h:RequestedState>32768</h:RequestedState>"));
    }

    #[test]
    fn test_delete_sends_selectors() {
        let (session, transport) = fixture_session(ReplayTransport::new().respond(EMPTY_RESPONSE));
        let client = session.client::<EnvironmentDetectionSettingData>().unwrap();
        client
            .delete(&[Selector::new("InstanceID", "to-remove")])
            .unwrap();
        let request = &transport.requests()[0];
        assert!(request.contains("/transfer/Delete</a:Action>"));
        assert!(request.contains(r#"<w:Selector Name="InstanceID">to-remove</w:Selector>"#));
    }

    #[test]
    fn test_session_from_config_uses_base_and_timeout() {
        let mut config = WsmanConfig::default();
        config.envelope.message_id_base = 500;
        config.envelope.operation_timeout = "PT5S".to_string();
        let transport = Arc::new(ReplayTransport::new().respond(EMPTY_RESPONSE));
        let session = Session::from_config(&config, transport.clone()).unwrap();
        let client = session.client::<EnvironmentDetectionSettingData>().unwrap();
        client.get(&[]).unwrap();

        let request = &transport.requests()[0];
        assert!(request.contains("<a:MessageID>500</a:MessageID>"));
        assert!(request.contains("<w:OperationTimeout>PT5S</w:OperationTimeout>"));
    }

    #[test]
    fn test_session_from_invalid_config() {
        let mut config = WsmanConfig::default();
        config.enumeration.max_elements = 0;
        let transport: Arc<dyn Transport> = Arc::new(ReplayTransport::new());
        assert!(matches!(
            Session::from_config(&config, transport),
            Err(WsmanError::Config(_))
        ));
    }

    #[test]
    fn test_client_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<Session>();
        assert_send_sync::<Client<EnvironmentDetectionSettingData>>();
    }
}
