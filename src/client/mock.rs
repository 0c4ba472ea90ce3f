//! Scripted in-memory transport for client tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::BytesMut;

use crate::error::{BaoError, RecvError};
use crate::message::encode::encode_message;
use crate::transport::Transport;

/// Replays queued responses and records every envelope sent.
///
/// Once the queue is empty, receives fail with `ConnectionClosed`.
#[derive(Default)]
pub struct MockTransport {
    replies: VecDeque<Result<BytesMut, BaoError>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, msg_type: u8, fields: &[&str]) -> Self {
        let envelope = encode_message(msg_type, fields).unwrap();
        self.replies.push_back(Ok(envelope));
        self
    }

    pub fn reply_raw(mut self, envelope: BytesMut) -> Self {
        self.replies.push_back(Ok(envelope));
        self
    }

    pub fn fail(mut self, err: BaoError) -> Self {
        self.replies.push_back(Err(err));
        self
    }

    /// Envelopes sent so far.
    pub fn sent(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.sent)
    }

    /// Number of send and receive calls so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send_request(&mut self, envelope: &[u8]) -> Result<(), BaoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(envelope.to_vec());
        Ok(())
    }

    async fn receive_response(&mut self) -> Result<BytesMut, BaoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .pop_front()
            .unwrap_or(Err(RecvError::ConnectionClosed.into()))
    }

    async fn shutdown(&mut self) -> Result<(), BaoError> {
        Ok(())
    }
}
