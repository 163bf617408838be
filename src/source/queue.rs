use super::{FileCallback, Source, SourceError};
use crate::channel::Channel;
use std::time::Duration;

/// Filenames from message bodies on a channel.
///
/// A message is acknowledged only after its callback succeeds; failed ones
/// stay on the channel and are redelivered once their lease expires.
pub struct QueueSource<C: Channel> {
    channel: C,
    batch_size: usize,
    wait: Duration,
}

impl<C: Channel> QueueSource<C> {
    pub fn new(channel: C, batch_size: usize, wait: Duration) -> Self {
        Self {
            channel,
            batch_size: batch_size.max(1),
            wait,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<C: Channel> Source for QueueSource<C> {
    fn name(&self) -> &str {
        self.channel.name()
    }

    fn analyze_files(&mut self, callback: &mut FileCallback<'_>) -> Result<(), SourceError> {
        loop {
            let batch = self
                .channel
                .receive(self.batch_size, self.wait)
                .map_err(|e| SourceError::Receive {
                    queue: self.channel.name().to_string(),
                    source: e,
                })?;
            if batch.is_empty() {
                return Ok(());
            }

            for msg in batch {
                log::info!("Received [{}] {:?}", msg.id, msg.body);
                match callback(&msg.body) {
                    Ok(()) => {
                        self.channel.delete(&msg.receipt).map_err(|e| {
                            SourceError::Acknowledge {
                                queue: self.channel.name().to_string(),
                                message_id: msg.id.clone(),
                                source: e,
                            }
                        })?;
                    }
                    Err(e) if e.is_fatal() => return Err(SourceError::Aborted(Box::new(e))),
                    Err(e) => {
                        log::warn!("Leaving [{}] {:?} for redelivery: {e}", msg.id, msg.body);
                    }
                }
            }
        }
    }

    fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}
