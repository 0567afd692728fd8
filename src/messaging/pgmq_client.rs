//! # PostgreSQL Message Queue Client
//!
//! [`QueueClient`] over the pgmq extension, accessed through a shared sqlx
//! pool.
//!
//! pgmq identifies messages by a numeric `msg_id` and counts reads in
//! `read_ct`. The receipt handle pairs the two (`"<msg_id>:<read_ct>"`) so a
//! delete only succeeds for the delivery that produced the handle: once the
//! visibility timeout lapses and another poller re-reads the message, the old
//! handle no longer matches any row.

use super::errors::{MessagingResult, QueueError};
use super::message::{MessageId, ReceiptHandle, ReceiveRequest, TelemetryMessage};
use super::queue_client::QueueClient;
use crate::config::QueueConfig;
use crate::constants::queue::MAX_QUEUE_NAME_LENGTH;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

/// pgmq-backed queue client
#[derive(Debug, Clone)]
pub struct PgmqQueueClient {
    pool: PgPool,
    queue_name: String,
    poll_interval_ms: i32,
}

impl PgmqQueueClient {
    /// Connect a new pool from configuration
    pub async fn connect(config: &QueueConfig) -> MessagingResult<Self> {
        validate_queue_name(&config.queue_name)?;
        info!(queue = %config.queue_name, "Connecting to pgmq");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| QueueError::from_sqlx(&config.queue_name, "connect", e))?;

        info!(queue = %config.queue_name, "Connected to pgmq");
        Self::new_with_pool(pool, &config.queue_name, config.poll_interval_ms)
    }

    /// Create a client on an existing pool (BYOP - Bring Your Own Pool)
    pub fn new_with_pool(
        pool: PgPool,
        queue_name: &str,
        poll_interval_ms: u32,
    ) -> MessagingResult<Self> {
        validate_queue_name(queue_name)?;
        Ok(Self {
            pool,
            queue_name: queue_name.to_string(),
            poll_interval_ms: i32::try_from(poll_interval_ms).unwrap_or(i32::MAX),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_message(&self, row: &PgRow) -> MessagingResult<TelemetryMessage> {
        let map_err = |e: sqlx::Error| QueueError::from_sqlx(&self.queue_name, "decode_row", e);

        let msg_id: i64 = row.try_get("msg_id").map_err(map_err)?;
        let read_ct: i32 = row.try_get("read_ct").map_err(map_err)?;
        let message: serde_json::Value = row.try_get("message").map_err(map_err)?;

        Ok(TelemetryMessage::new(
            MessageId::new(msg_id.to_string()),
            encode_receipt_handle(msg_id, read_ct),
            body_bytes(message),
            u32::try_from(read_ct).unwrap_or(0),
        ))
    }
}

#[async_trait]
impl QueueClient for PgmqQueueClient {
    async fn receive(&self, request: &ReceiveRequest) -> MessagingResult<Vec<TelemetryMessage>> {
        let vt = to_i32(request.visibility_timeout_seconds());
        let qty = to_i32(request.max_messages());
        let wait = to_i32(request.wait_time_seconds());

        debug!(
            queue = %self.queue_name,
            max_messages = qty,
            wait_time_seconds = wait,
            visibility_timeout_seconds = vt,
            "Reading messages from pgmq"
        );

        // read_with_poll returns before its first read when the poll window is zero
        let result = if wait == 0 {
            sqlx::query("SELECT msg_id, read_ct, message FROM pgmq.read($1, $2, $3)")
                .bind(&self.queue_name)
                .bind(vt)
                .bind(qty)
                .fetch_all(&self.pool)
                .await
        } else {
            sqlx::query(
                "SELECT msg_id, read_ct, message FROM pgmq.read_with_poll($1, $2, $3, $4, $5)",
            )
            .bind(&self.queue_name)
            .bind(vt)
            .bind(qty)
            .bind(wait)
            .bind(self.poll_interval_ms)
            .fetch_all(&self.pool)
            .await
        };
        let rows = result
            .map_err(|e| QueueError::from_sqlx(&self.queue_name, "receive", e))?;

        let messages = rows
            .iter()
            .map(|row| self.row_to_message(row))
            .collect::<MessagingResult<Vec<_>>>()?;

        debug!(
            queue = %self.queue_name,
            count = messages.len(),
            "Read messages from pgmq"
        );
        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> MessagingResult<()> {
        let (msg_id, read_ct) = decode_receipt_handle(receipt_handle)?;

        // Queue name is validated to [a-z0-9_], safe to splice into the table name
        let sql = format!(
            "DELETE FROM pgmq.q_{} WHERE msg_id = $1 AND read_ct = $2 RETURNING msg_id",
            self.queue_name
        );
        let deleted = sqlx::query(&sql)
            .bind(msg_id)
            .bind(read_ct)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| QueueError::from_sqlx(&self.queue_name, "delete", e))?;

        match deleted {
            Some(_) => {
                debug!(queue = %self.queue_name, msg_id = msg_id, "Message deleted");
                Ok(())
            }
            None => Err(QueueError::invalid_receipt_handle(format!(
                "{msg_id}:{read_ct} (message already deleted or redelivered)"
            ))),
        }
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// pgmq queue names must be short lowercase identifiers
pub fn validate_queue_name(queue_name: &str) -> MessagingResult<()> {
    if queue_name.is_empty() {
        return Err(QueueError::invalid_queue_name(queue_name, "must not be empty"));
    }
    if queue_name.len() > MAX_QUEUE_NAME_LENGTH {
        return Err(QueueError::invalid_queue_name(
            queue_name,
            format!("longer than {MAX_QUEUE_NAME_LENGTH} characters"),
        ));
    }
    if !queue_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(QueueError::invalid_queue_name(
            queue_name,
            "only lowercase letters, digits and underscores are allowed",
        ));
    }
    Ok(())
}

fn encode_receipt_handle(msg_id: i64, read_ct: i32) -> ReceiptHandle {
    ReceiptHandle::new(format!("{msg_id}:{read_ct}"))
}

fn decode_receipt_handle(handle: &ReceiptHandle) -> MessagingResult<(i64, i32)> {
    let invalid = || QueueError::invalid_receipt_handle(handle.as_str());

    let (msg_id, read_ct) = handle.as_str().split_once(':').ok_or_else(invalid)?;
    let msg_id = msg_id.parse::<i64>().map_err(|_| invalid())?;
    let read_ct = read_ct.parse::<i32>().map_err(|_| invalid())?;
    Ok((msg_id, read_ct))
}

/// pgmq stores jsonb. Producers that publish an SQS-style string body end up
/// with a JSON string; its contents are the raw body.
fn body_bytes(message: serde_json::Value) -> Vec<u8> {
    match message {
        serde_json::Value::String(raw) => raw.into_bytes(),
        other => other.to_string().into_bytes(),
    }
}
