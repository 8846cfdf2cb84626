use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use parcelis_core::model::{ShipmentRecord, ShipmentStatus};
use parcelis_core::repository::{RepoError, ShipmentRepository};

pub struct PostgresShipmentRepository {
    pool: PgPool,
}

impl PostgresShipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ShipmentRow {
    id: Uuid,
    order_number: String,
    batch_id: String,
    tracking_number: Option<String>,
    pieces_count: i32,
    product_type: String,
    depot: Option<String>,
    label_path: Option<String>,
    label_mime: Option<String>,
    status: String,
    status_text: Option<String>,
    last_sync_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShipmentRow {
    fn into_record(self) -> Result<ShipmentRecord, RepoError> {
        let status = ShipmentStatus::parse(&self.status)
            .ok_or_else(|| RepoError::Backend(format!("unknown status '{}'", self.status)))?;
        Ok(ShipmentRecord {
            id: self.id,
            order_number: self.order_number,
            batch_id: self.batch_id,
            tracking_number: self.tracking_number,
            pieces_count: self.pieces_count,
            product_type: self.product_type,
            depot: self.depot,
            label_path: self.label_path,
            label_mime: self.label_mime,
            status,
            status_text: self.status_text,
            last_sync_at: self.last_sync_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, order_number, batch_id, tracking_number, pieces_count, \
     product_type, depot, label_path, label_mime, status, status_text, last_sync_at, \
     created_at, updated_at";

fn backend(e: sqlx::Error) -> RepoError {
    RepoError::Backend(e.to_string())
}

#[async_trait]
impl ShipmentRepository for PostgresShipmentRepository {
    async fn create(&self, record: &ShipmentRecord) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO shipments (id, order_number, batch_id, tracking_number, pieces_count,
                product_type, depot, label_path, label_mime, status, status_text, last_sync_at,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(record.id)
        .bind(&record.order_number)
        .bind(&record.batch_id)
        .bind(&record.tracking_number)
        .bind(record.pieces_count)
        .bind(&record.product_type)
        .bind(&record.depot)
        .bind(&record.label_path)
        .bind(&record.label_mime)
        .bind(record.status.as_str())
        .bind(&record.status_text)
        .bind(record.last_sync_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepoError::DuplicateOrder(record.order_number.clone()))
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn update(&self, record: &ShipmentRecord) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE shipments
            SET tracking_number = $2, pieces_count = $3, product_type = $4, depot = $5,
                label_path = $6, label_mime = $7, status = $8, status_text = $9,
                last_sync_at = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.tracking_number)
        .bind(record.pieces_count)
        .bind(&record.product_type)
        .bind(&record.depot)
        .bind(&record.label_path)
        .bind(&record.label_mime)
        .bind(record.status.as_str())
        .bind(&record.status_text)
        .bind(record.last_sync_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(record.id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ShipmentRecord>, RepoError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM shipments WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(ShipmentRow::into_record).transpose()
    }

    async fn find_by_order(
        &self,
        order_number: &str,
    ) -> Result<Option<ShipmentRecord>, RepoError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM shipments WHERE order_number = $1",
            SELECT_COLUMNS
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(ShipmentRow::into_record).transpose()
    }

    async fn find_by_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentRecord>, RepoError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM shipments WHERE tracking_number = $1 LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(tracking_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(ShipmentRow::into_record).transpose()
    }

    async fn list_unfinished(
        &self,
        exclude: &[ShipmentStatus],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShipmentRecord>, RepoError> {
        let excluded: Vec<String> = exclude.iter().map(|s| s.as_str().to_string()).collect();

        let rows: Vec<ShipmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM shipments WHERE status <> ALL($1) \
             ORDER BY created_at ASC LIMIT $2 OFFSET $3",
            SELECT_COLUMNS
        ))
        .bind(&excluded)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(ShipmentRow::into_record).collect()
    }
}
