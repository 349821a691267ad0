use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sqlx::SqlitePool;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{BrokerError, BrokerResult};
use crate::substrate::handle::{Delivery, QueueSubstrate, Receipt};

/// Durable substrate on SQLite tables. Processes sharing the database file
/// share topics and queues; visibility deadlines are wall-clock millis.
pub struct SqliteQueue {
    pool: SqlitePool,
    poll_interval: Duration,
    published: Notify,
}

impl SqliteQueue {
    pub async fn init(pool: SqlitePool) -> BrokerResult<Self> {
        sqlx::raw_sql(include_str!("../../resources/create_queue_tables.sql")).execute(&pool).await?;

        Ok(Self { pool, poll_interval: Duration::from_millis(250), published: Notify::new() })
    }

    /// How often an idle receive re-checks the table for messages
    /// published by other processes.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn queue_exists(&self, queue: &str) -> BrokerResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM broker_queues WHERE name = ?")
            .bind(queue)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn claim(
        &self,
        queue: &str,
        max_messages: usize,
        visibility: Duration,
    ) -> BrokerResult<Vec<Delivery>> {
        let now = now_millis();
        let query = r#"
            UPDATE broker_messages
            SET visible_at = ?, receive_count = receive_count + 1
            WHERE id IN (
                SELECT id
                FROM broker_messages
                WHERE queue = ? AND visible_at <= ?
                ORDER BY id ASC
                LIMIT ?
            )
            RETURNING id, payload, receive_count
            "#;
        let mut rows: Vec<(i64, Vec<u8>, i64)> = sqlx::query_as(query)
            .bind(now.saturating_add(duration_millis(visibility)))
            .bind(queue)
            .bind(now)
            .bind(i64::try_from(max_messages.max(1)).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.sort_by_key(|(id, _, _)| *id);

        Ok(rows
            .into_iter()
            .map(|(message_id, payload, generation)| Delivery {
                receipt: Receipt { message_id, generation },
                payload,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl QueueSubstrate for SqliteQueue {
    async fn create_topic(&self, topic: &str) -> BrokerResult<()> {
        sqlx::query("INSERT OR IGNORE INTO broker_topics (name) VALUES (?)")
            .bind(topic)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_queue(&self, queue: &str) -> BrokerResult<()> {
        sqlx::query("INSERT OR IGNORE INTO broker_queues (name) VALUES (?)")
            .bind(queue)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bind(&self, topic: &str, queue: &str) -> BrokerResult<()> {
        if !self.queue_exists(queue).await? {
            return Err(BrokerError::UnknownQueue(queue.to_string()));
        }
        self.create_topic(topic).await?;
        sqlx::query("INSERT OR IGNORE INTO broker_bindings (topic, queue) VALUES (?, ?)")
            .bind(topic)
            .bind(queue)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> BrokerResult<usize> {
        self.create_topic(topic).await?;

        let query = r#"
            INSERT INTO broker_messages (queue, payload, visible_at, receive_count)
            SELECT queue, ?, ?, 0
            FROM broker_bindings
            WHERE topic = ?
            "#;
        let result = sqlx::query(query)
            .bind(payload)
            .bind(now_millis())
            .bind(topic)
            .execute(&self.pool)
            .await?;

        self.published.notify_waiters();
        Ok(result.rows_affected() as usize)
    }

    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
        visibility: Duration,
    ) -> BrokerResult<Vec<Delivery>> {
        if !self.queue_exists(queue).await? {
            return Err(BrokerError::UnknownQueue(queue.to_string()));
        }

        let deadline = Instant::now() + wait;
        loop {
            let notified = self.published.notified();

            let deliveries = self.claim(queue, max_messages, visibility).await?;
            let now = Instant::now();
            if !deliveries.is_empty() || now >= deadline {
                return Ok(deliveries);
            }

            let wake_at = (now + self.poll_interval).min(deadline);
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete(&self, queue: &str, receipt: Receipt) -> BrokerResult<bool> {
        let query = r#"
            DELETE FROM broker_messages
            WHERE id = ? AND queue = ? AND receive_count = ?
            "#;
        let result = sqlx::query(query)
            .bind(receipt.message_id)
            .bind(queue)
            .bind(receipt.generation)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_queue(&self, queue: &str) -> BrokerResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM broker_bindings WHERE queue = ?")
            .bind(queue)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM broker_messages WHERE queue = ?")
            .bind(queue)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM broker_queues WHERE name = ?")
            .bind(queue)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    async fn depth(&self, queue: &str) -> BrokerResult<usize> {
        if !self.queue_exists(queue).await? {
            return Err(BrokerError::UnknownQueue(queue.to_string()));
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM broker_messages WHERE queue = ?")
            .bind(queue)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }
}

fn now_millis() -> i64 {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX)
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
