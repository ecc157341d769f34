//! WS-Management client for Intel AMT
//!
//! Builds SOAP 1.2 / WS-Management request envelopes, sends them through a
//! pluggable transport, and decodes responses into typed resources.
//!
//! # Features
//!
//! - Deterministic envelope construction with a shared MessageID counter
//! - Get, Put, Delete, extrinsic method calls
//! - Enumerate/Pull/Release with an explicit cursor state machine
//! - Response classification into transport, malformed and fault errors
//! - Descriptor-driven decoding (unknown elements ignored, missing ones zero)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wsman_amt::{HttpTransport, Session, WsmanConfig};
//! use wsman_amt::resources::EnvironmentDetectionSettingData;
//!
//! let config = WsmanConfig::default();
//! let transport = Arc::new(HttpTransport::new(&config.endpoint));
//! let session = Session::from_config(&config, transport)?;
//! let settings = session
//!     .client::<EnvironmentDetectionSettingData>()?
//!     .get(&[])?;
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod cursor;
pub mod envelope;
pub mod error;
pub mod parser;
pub mod resources;
pub mod schema;
pub mod transport;

pub use catalog::{ActionCatalog, ResourceIdentity, SchemaFamily, Verb};
pub use client::{Client, PullBatch, Session};
pub use config::WsmanConfig;
pub use cursor::{CursorState, EnumerationContext, EnumerationCursor};
pub use envelope::{EnvelopeBuilder, MessageIdCounter, MethodParameter, Selector};
pub use error::{AmtError, FaultKind, TransportError, WsmanError};
pub use schema::{Fields, LabelMap, Resource, ReturnValueOutput};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{ReplayTransport, Transport};
