use super::{Database, Result};
use crate::channel::{Channel, ChannelError, Message};
use chrono::Utc;
use rusqlite::params;
use std::thread;
use std::time::{Duration, Instant};

/// How often an empty long-poll re-checks the table.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

impl Database {
    /// Append a message body to `queue`. Returns the message id.
    pub fn enqueue(&self, queue: &str, body: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO messages (queue, body, visible_at) VALUES (?1, ?2, ?3)",
            params![queue, body, now_millis()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Lease up to `max` visible messages, hiding them for `visibility`.
    /// Each lease gets a fresh receipt so an older delivery cannot ack it.
    pub fn lease_messages(
        &self,
        queue: &str,
        max: usize,
        visibility: Duration,
    ) -> Result<Vec<Message>> {
        let now = now_millis();
        let hidden_until = now + visibility.as_millis() as i64;

        let tx = self.conn.unchecked_transaction()?;
        let rows: Vec<(i64, String, i64)> = {
            let mut stmt = tx.prepare(
                "SELECT id, body, receive_count FROM messages
                 WHERE queue = ?1 AND visible_at <= ?2
                 ORDER BY id
                 LIMIT ?3",
            )?;
            let mapped = stmt.query_map(params![queue, now, max as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            mapped.collect::<std::result::Result<_, _>>()?
        };

        let mut batch = Vec::with_capacity(rows.len());
        for (id, body, receive_count) in rows {
            let count = receive_count + 1;
            let receipt = format!("{id}-{count}");
            tx.execute(
                "UPDATE messages SET visible_at = ?1, receive_count = ?2, receipt = ?3
                 WHERE id = ?4",
                params![hidden_until, count, receipt, id],
            )?;
            batch.push(Message {
                id: id.to_string(),
                receipt,
                body,
            });
        }
        tx.commit()?;

        Ok(batch)
    }

    /// Delete the message currently leased under `receipt`.
    /// Returns false when the receipt no longer matches any message.
    pub fn delete_message(&self, queue: &str, receipt: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM messages WHERE queue = ?1 AND receipt = ?2",
            params![queue, receipt],
        )?;
        Ok(n > 0)
    }

    pub fn queue_depth(&self, queue: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE queue = ?1",
            params![queue],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// A named queue stored in a SQLite file.
pub struct SqliteChannel {
    db: Database,
    queue: String,
    visibility: Duration,
}

impl SqliteChannel {
    pub fn new(db: Database, queue: &str, visibility: Duration) -> Self {
        Self {
            db,
            queue: queue.to_string(),
            visibility,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Channel for SqliteChannel {
    fn name(&self) -> &str {
        &self.queue
    }

    fn send(&mut self, body: &str) -> std::result::Result<String, ChannelError> {
        let id = self.db.enqueue(&self.queue, body)?;
        Ok(id.to_string())
    }

    fn receive(
        &mut self,
        max: usize,
        wait: Duration,
    ) -> std::result::Result<Vec<Message>, ChannelError> {
        let deadline = Instant::now() + wait;
        loop {
            let batch = self.db.lease_messages(&self.queue, max, self.visibility)?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !batch.is_empty() || remaining.is_zero() {
                return Ok(batch);
            }
            thread::sleep(POLL_INTERVAL.min(remaining));
        }
    }

    fn delete(&mut self, receipt: &str) -> std::result::Result<(), ChannelError> {
        if self.db.delete_message(&self.queue, receipt)? {
            Ok(())
        } else {
            Err(ChannelError::StaleReceipt {
                queue: self.queue.clone(),
                receipt: receipt.to_string(),
            })
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
