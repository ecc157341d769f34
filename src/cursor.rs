//! Enumerate/Pull cursor.
//!
//! ```text
//! Idle ──enumerate──▶ Enumerated ──pull──▶ Pulling ──pull (last)──▶ Exhausted
//!                          │                  │
//!                          └──── error ───────┴──────▶ Failed
//! ```
//!
//! An enumeration context is single-use: the device invalidates it as soon as
//! a Pull consumes it, so [`EnumerationContext`] is not `Clone` and is moved
//! into each Pull.

use crate::client::Client;
use crate::envelope::Selector;
use crate::error::WsmanError;
use crate::schema::Resource;
use tracing::debug;

/// Opaque, single-use enumeration token issued by the device.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumerationContext(String);

impl EnumerationContext {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Cursor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    Enumerated,
    Pulling,
    Exhausted,
    Failed,
}

/// Drives one enumeration over a resource class.
pub struct EnumerationCursor<'a, T> {
    client: &'a Client<T>,
    state: CursorState,
    context: Option<EnumerationContext>,
    filter: Option<Vec<Selector>>,
    pulls: u32,
}

impl<'a, T: Resource> EnumerationCursor<'a, T> {
    pub fn new(client: &'a Client<T>) -> Self {
        Self {
            client,
            state: CursorState::Idle,
            context: None,
            filter: None,
            pulls: 0,
        }
    }

    /// Restrict the enumeration with a selector filter.
    pub fn with_filter(mut self, filter: Vec<Selector>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Pull round trips issued since the last Enumerate.
    pub fn pulls(&self) -> u32 {
        self.pulls
    }

    /// Start a fresh enumeration, discarding any context held.
    pub fn enumerate(&mut self) -> Result<(), WsmanError> {
        self.context = None;
        self.pulls = 0;
        match self.client.enumerate_with(self.filter.as_deref()) {
            Ok(context) => {
                debug!(resource = %self.client.identity(), "Enumeration started");
                self.context = Some(context);
                self.state = CursorState::Enumerated;
                Ok(())
            }
            Err(e) => {
                self.state = CursorState::Failed;
                Err(e)
            }
        }
    }

    /// Pull the next batch.
    ///
    /// Only valid in `Enumerated` or `Pulling`; any other state is reported
    /// without touching the device.
    pub fn pull(&mut self) -> Result<Vec<T>, WsmanError> {
        if !matches!(self.state, CursorState::Enumerated | CursorState::Pulling) {
            return Err(WsmanError::InvalidCursorState(self.state));
        }
        let Some(context) = self.context.take() else {
            self.state = CursorState::Failed;
            return Err(WsmanError::InvalidCursorState(self.state));
        };

        let max_pulls = self.client.enumeration().max_pulls;
        if self.pulls >= max_pulls {
            self.state = CursorState::Failed;
            return Err(WsmanError::PullLimitExceeded(max_pulls));
        }
        self.pulls += 1;

        match self.client.pull(context) {
            Ok(batch) => {
                match batch.next {
                    Some(next) => {
                        self.context = Some(next);
                        self.state = CursorState::Pulling;
                    }
                    None => {
                        debug!(
                            resource = %self.client.identity(),
                            pulls = self.pulls,
                            "Enumeration exhausted"
                        );
                        self.state = CursorState::Exhausted;
                    }
                }
                Ok(batch.items)
            }
            Err(e) => {
                self.state = CursorState::Failed;
                Err(e)
            }
        }
    }

    /// Abandon the enumeration on the device.
    pub fn release(&mut self) -> Result<(), WsmanError> {
        let Some(context) = self.context.take() else {
            return Ok(());
        };
        match self.client.release(context) {
            Ok(()) => {
                self.state = CursorState::Exhausted;
                Ok(())
            }
            Err(e) => {
                self.state = CursorState::Failed;
                Err(e)
            }
        }
    }

    /// Lazy sequence of batches, enumerating first if needed.
    pub fn batches(self) -> Batches<'a, T> {
        Batches {
            cursor: self,
            done: false,
        }
    }
}

/// Iterator over the batches of one enumeration.
///
/// Ends after the last batch or the first error. It cannot be resumed: start
/// a new cursor to enumerate again.
pub struct Batches<'a, T> {
    cursor: EnumerationCursor<'a, T>,
    done: bool,
}

impl<'a, T: Resource> Batches<'a, T> {
    pub fn state(&self) -> CursorState {
        self.cursor.state
    }
}

impl<'a, T: Resource> Iterator for Batches<'a, T> {
    type Item = Result<Vec<T>, WsmanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cursor.state == CursorState::Idle {
            if let Err(e) = self.cursor.enumerate() {
                self.done = true;
                return Some(Err(e));
            }
        }
        if matches!(
            self.cursor.state,
            CursorState::Exhausted | CursorState::Failed
        ) {
            self.done = true;
            return None;
        }

        let batch = self.cursor.pull();
        if batch.is_err() || self.cursor.state == CursorState::Exhausted {
            self.done = true;
        }
        Some(batch)
    }
}
