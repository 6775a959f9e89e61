use crate::client::PostgresClient;
use async_trait::async_trait;
use fleetstat_domain::{DomainError, DomainResult, NewStatusRecord, StatusRecord, StatusRepository};
use tokio_postgres::Row;
use tracing::{debug, instrument};

/// PostgreSQL implementation of the StatusRepository trait
#[derive(Clone)]
pub struct PostgresStatusRepository {
    client: PostgresClient,
}

impl PostgresStatusRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

fn row_to_status(row: &Row) -> StatusRecord {
    StatusRecord {
        group_id: row.get(0),
        device_id: row.get(1),
        status: row.get(2),
        created_at: row.get(3),
    }
}

#[async_trait]
impl StatusRepository for PostgresStatusRepository {
    #[instrument(skip(self, record), fields(device_id = %record.device_id, group_id = %record.group_id))]
    async fn insert_status(&self, record: NewStatusRecord) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // created_at is assigned by the database default
        conn.execute(
            "INSERT INTO statuses (group_id, device_id, status) VALUES ($1, $2, $3)",
            &[&record.group_id, &record.device_id, &record.status],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!("inserted status record");
        Ok(())
    }

    async fn find_all(&self) -> DomainResult<Vec<StatusRecord>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT group_id, device_id, status, created_at FROM statuses",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(row_to_status).collect())
    }

    #[instrument(skip(self))]
    async fn find_latest_by_device(&self, device_id: &str) -> DomainResult<Option<StatusRecord>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "SELECT group_id, device_id, status, created_at
                 FROM statuses
                 WHERE device_id = $1
                 ORDER BY created_at DESC
                 LIMIT 1",
                &[&device_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(row_to_status))
    }

    #[instrument(skip(self))]
    async fn find_history_by_device(&self, device_id: &str) -> DomainResult<Vec<StatusRecord>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT group_id, device_id, status, created_at
                 FROM statuses
                 WHERE device_id = $1
                 ORDER BY created_at DESC",
                &[&device_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(row_to_status).collect())
    }

    #[instrument(skip(self, device_ids), fields(device_count = device_ids.len()))]
    async fn find_recent_per_device(
        &self,
        device_ids: &[String],
        limit: i64,
    ) -> DomainResult<Vec<StatusRecord>> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT group_id, device_id, status, created_at
                 FROM (
                     SELECT *,
                            ROW_NUMBER() OVER (PARTITION BY device_id ORDER BY created_at DESC) AS rn
                     FROM statuses
                     WHERE device_id = ANY($1)
                 ) ranked
                 WHERE rn <= $2
                 ORDER BY device_id, created_at DESC",
                &[&device_ids, &limit],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(row_to_status).collect())
    }
}
