use super::{Sink, SinkError};
use crate::channel::Channel;

/// Sends each path as one message body.
pub struct QueueSink<C: Channel> {
    channel: C,
    last_message_id: Option<String>,
}

impl<C: Channel> QueueSink<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            last_message_id: None,
        }
    }

    pub fn last_message_id(&self) -> Option<&str> {
        self.last_message_id.as_deref()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<C: Channel> Sink for QueueSink<C> {
    fn add_file(&mut self, path: &str) -> Result<(), SinkError> {
        let id = self.channel.send(path).map_err(|e| SinkError::Send {
            path: path.to_string(),
            queue: self.channel.name().to_string(),
            source: e,
        })?;
        println!("[{id}]: {path:?}");
        self.last_message_id = Some(id);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
