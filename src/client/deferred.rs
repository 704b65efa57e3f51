//! Deferred results of batched requests.
//!
//! Issuing a request on a [`BatchSession`](super::BatchSession) sends nothing. The
//! caller gets a [`Deferred`] back at once, which becomes readable when the
//! session is finalized and its sub-response has been unpacked.
//!
//! # States
//!
//! ```text
//! Unresolved ──resolve(part)──▶ Resolved(part)
//! ```
//!
//! The transition happens exactly once. Every accessor fails with
//! [`BatchError::Usage`] while the handle is unresolved.
//!
//! # Examples
//!
//! ```ignore
//! let alice = session.patch("/person/alice", RequestOptions::new().json(&body)?)?;
//! assert!(alice.status().is_err()); // nothing sent yet
//!
//! session.finalize().await?;
//! println!("{} {}", alice.status()?, alice.text()?);
//! ```

use crate::error::{BatchError, Result};
use crate::protocol::HeaderList;
use crate::types::DecodedPart;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const NOT_FINALIZED: &str = "read before batch finalized";

#[derive(Debug)]
enum DeferredState {
    Unresolved,
    Resolved(DecodedPart),
}

/// Handle to the eventual response of one batched request.
///
/// Clones share the same slot, so a handle kept by the caller observes the
/// resolution performed by the session.
#[derive(Debug, Clone)]
pub struct Deferred {
    slot: Arc<Mutex<DeferredState>>,
}

impl Deferred {
    pub(crate) fn new() -> Self {
        Deferred {
            slot: Arc::new(Mutex::new(DeferredState::Unresolved)),
        }
    }

    /// Store the sub-response.
    ///
    /// # Panics
    ///
    /// Panics if the handle is already resolved; a batch executes at most once.
    pub(crate) fn resolve(&self, part: DecodedPart) {
        let mut state = self.slot.lock();
        assert!(
            matches!(*state, DeferredState::Unresolved),
            "deferred result resolved twice"
        );
        *state = DeferredState::Resolved(part);
    }

    /// Whether the batch has delivered this result.
    pub fn is_resolved(&self) -> bool {
        matches!(*self.slot.lock(), DeferredState::Resolved(_))
    }

    fn read<T>(&self, f: impl FnOnce(&DecodedPart) -> T) -> Result<T> {
        match &*self.slot.lock() {
            DeferredState::Resolved(part) => Ok(f(part)),
            DeferredState::Unresolved => Err(BatchError::Usage(NOT_FINALIZED.to_string())),
        }
    }

    /// Status code of the sub-response.
    pub fn status(&self) -> Result<u16> {
        self.read(|part| part.status)
    }

    /// Reason phrase of the sub-response.
    pub fn reason(&self) -> Result<String> {
        self.read(|part| part.reason.clone())
    }

    /// Headers of the sub-response.
    pub fn headers(&self) -> Result<HeaderList> {
        self.read(|part| part.headers.clone())
    }

    /// Raw body of the sub-response.
    pub fn body(&self) -> Result<Bytes> {
        self.read(|part| part.body.clone())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Result<String> {
        self.read(|part| String::from_utf8_lossy(&part.body).into_owned())
    }

    /// Body deserialized from JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.body()?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Body as an untyped JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value> {
        self.json()
    }

    /// `Content-ID` of the MIME part carrying the sub-response, if any.
    pub fn content_id(&self) -> Result<Option<String>> {
        self.read(|part| part.content_id.clone())
    }

    /// Snapshot of the whole decoded part.
    pub fn part(&self) -> Result<DecodedPart> {
        self.read(DecodedPart::clone)
    }
}
