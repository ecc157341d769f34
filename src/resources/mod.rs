//! Sample resource bindings.
//!
//! Each binding is a plain struct plus a descriptor table; the client core
//! knows nothing about individual classes.

pub mod environment_detection;
pub mod general_settings;
pub mod kvm_redirection;

pub use environment_detection::EnvironmentDetectionSettingData;
pub use general_settings::GeneralSettings;
pub use kvm_redirection::{KvmRedirectionSap, KvmRequestedState};
