//! The seam between the session controller and the network.
//!
//! [`CoachClient`](crate::CoachClient) implements [`ChatBackend`] over HTTP.
//! Anything else that can produce usage snapshots, intros and event streams
//! (a recorded transcript, a test double) can drive a session the same way.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;

use crate::{ChatRequest, Result, StreamEvent, Universe, UsageSnapshot};

/// A boxed stream of decoded chat events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// The three calls a chat session makes against the coaching service.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Fetch the current quota snapshot.
    async fn fetch_usage(&self) -> Result<UsageSnapshot>;

    /// Fetch the greeting for `universe`.
    async fn fetch_intro(&self, universe: Universe) -> Result<String>;

    /// Submit `request` and return the reply as a stream of events.
    ///
    /// Resolves once the response headers are accepted; errors before that
    /// point are returned here, errors afterwards are yielded by the stream.
    async fn open_stream(&self, request: ChatRequest) -> Result<EventStream>;
}

#[async_trait::async_trait]
impl<B: ChatBackend + ?Sized> ChatBackend for Arc<B> {
    async fn fetch_usage(&self) -> Result<UsageSnapshot> {
        (**self).fetch_usage().await
    }

    async fn fetch_intro(&self, universe: Universe) -> Result<String> {
        (**self).fetch_intro(universe).await
    }

    async fn open_stream(&self, request: ChatRequest) -> Result<EventStream> {
        (**self).open_stream(request).await
    }
}
