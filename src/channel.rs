//! Message channel seam: at-least-once delivery with explicit acknowledgment.
//!
//! A received message stays leased until it is deleted with its receipt.
//! Messages that are never deleted become visible again once the channel's
//! visibility timeout passes, so a failed consumer gets another try.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Channel storage error: {0}")]
    Db(#[from] crate::db::DbError),
    #[error("Receipt {receipt} on queue {queue} is no longer valid")]
    StaleReceipt { queue: String, receipt: String },
}

/// One delivered message. `receipt` identifies this particular delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub receipt: String,
    pub body: String,
}

pub trait Channel {
    /// Queue name, for diagnostics.
    fn name(&self) -> &str;

    /// Enqueue a body and return the id assigned to it.
    fn send(&mut self, body: &str) -> Result<String, ChannelError>;

    /// Lease up to `max` messages, waiting at most `wait` for the first one.
    /// An empty batch means the queue had nothing visible in that window.
    fn receive(&mut self, max: usize, wait: Duration) -> Result<Vec<Message>, ChannelError>;

    /// Acknowledge a delivery so it is never redelivered.
    fn delete(&mut self, receipt: &str) -> Result<(), ChannelError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// In-memory channel that records sends and acknowledgments.
    #[derive(Default)]
    pub struct FakeChannel {
        pub pending: VecDeque<Message>,
        pub sent: Vec<String>,
        pub deleted: Vec<String>,
        pub receive_calls: usize,
        next_id: usize,
    }

    impl FakeChannel {
        pub fn with_bodies(bodies: &[&str]) -> Self {
            let mut ch = Self::default();
            for body in bodies {
                ch.push(body);
            }
            ch
        }

        pub fn push(&mut self, body: &str) {
            self.next_id += 1;
            self.pending.push_back(Message {
                id: format!("msg-{}", self.next_id),
                receipt: format!("rcpt-{}", self.next_id),
                body: body.to_string(),
            });
        }
    }

    impl Channel for FakeChannel {
        fn name(&self) -> &str {
            "fake"
        }

        fn send(&mut self, body: &str) -> Result<String, ChannelError> {
            self.sent.push(body.to_string());
            Ok(format!("sent-{}", self.sent.len()))
        }

        fn receive(&mut self, max: usize, _wait: Duration) -> Result<Vec<Message>, ChannelError> {
            self.receive_calls += 1;
            let n = max.min(self.pending.len());
            Ok(self.pending.drain(..n).collect())
        }

        fn delete(&mut self, receipt: &str) -> Result<(), ChannelError> {
            self.deleted.push(receipt.to_string());
            Ok(())
        }
    }
}
