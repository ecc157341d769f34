//! Transport execution port.
//!
//! The client hands a serialized envelope to a [`Transport`] and gets raw
//! response bytes back. Timeouts, TLS and authentication all live behind this
//! trait; the client itself never retries.

use crate::error::TransportError;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Synchronous request/response exchange with a WS-Management endpoint.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, TransportError> + Send + Sync,
{
    fn execute(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        self(request)
    }
}

/// Replays scripted responses in order and records every request.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response body.
    pub fn respond(self, body: impl Into<Vec<u8>>) -> Self {
        self.lock_responses().push_back(Ok(body.into()));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, error: TransportError) -> Self {
        self.lock_responses().push_back(Err(error));
        self
    }

    /// Requests seen so far, as UTF-8 text.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> MutexGuard<'_, VecDeque<Result<Vec<u8>, TransportError>>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for ReplayTransport {
    fn execute(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let index = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(String::from_utf8_lossy(request).into_owned());
            requests.len()
        };
        self.lock_responses()
            .pop_front()
            .unwrap_or(Err(TransportError::Exhausted(index)))
    }
}

#[cfg(feature = "http")]
pub use self::http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::Transport;
    use crate::config::EndpointConfig;
    use crate::error::TransportError;
    use crate::parser::parse_envelope;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::io::Read;
    use std::time::Duration;
    use tracing::{debug, trace};

    const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

    /// Blocking HTTP transport.
    ///
    /// Sends Basic credentials when a password is configured. AMT answers many
    /// faults with HTTP 400/500 and a SOAP body; such bodies are returned as
    /// responses so the fault inside gets decoded. Any other error body (the
    /// HTML page behind a 401, for instance) stays a status error.
    pub struct HttpTransport {
        agent: ureq::Agent,
        url: String,
        authorization: Option<String>,
    }

    impl HttpTransport {
        pub fn new(endpoint: &EndpointConfig) -> Self {
            let agent = ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(endpoint.timeout_secs))
                .build();
            let authorization = endpoint.password.as_ref().map(|password| {
                let token = STANDARD.encode(format!("{}:{}", endpoint.username, password));
                format!("Basic {}", token)
            });
            Self {
                agent,
                url: endpoint.url(),
                authorization,
            }
        }

        pub fn url(&self) -> &str {
            &self.url
        }
    }

    impl std::fmt::Debug for HttpTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("HttpTransport")
                .field("url", &self.url)
                .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
                .finish()
        }
    }

    impl Transport for HttpTransport {
        fn execute(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
            trace!(url = %self.url, bytes = request.len(), "POST");
            let mut call = self
                .agent
                .post(&self.url)
                .set("Content-Type", SOAP_CONTENT_TYPE);
            if let Some(ref authorization) = self.authorization {
                call = call.set("Authorization", authorization);
            }

            match call.send_bytes(request) {
                Ok(response) => read_body(response),
                Err(ureq::Error::Status(code, response)) => {
                    let body = read_body(response)?;
                    if parse_envelope(&body).is_ok() {
                        debug!(status = code, "HTTP error status with SOAP envelope");
                        Ok(body)
                    } else {
                        Err(TransportError::Status {
                            code,
                            body: String::from_utf8_lossy(&body).into_owned(),
                        })
                    }
                }
                Err(ureq::Error::Transport(e)) => Err(TransportError::Connection(e.to_string())),
            }
        }
    }

    fn read_body(response: ureq::Response) -> Result<Vec<u8>, TransportError> {
        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;
        Ok(body)
    }

}
