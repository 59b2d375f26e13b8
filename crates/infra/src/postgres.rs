//! Postgres-backed record stores.
//!
//! Runtime-checked queries (`sqlx::query`), so the crate builds without a
//! live database. Tables are expected to exist already; `sql/schema.sql`
//! documents their shape.
//!
//! ## Error Mapping
//!
//! | SQLx error                         | `StoreError`    |
//! |------------------------------------|-----------------|
//! | Database, code `23505` (unique)    | `Conflict`      |
//! | Column decode failure              | `Serialization` |
//! | Anything else                      | `Backend`       |

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use exportdesk_core::{Entity, InvoiceId, PartyId, ProductId};
use exportdesk_invoicing::{Addressee, Compliance, Invoice, InvoiceItem, References, Shipment};
use exportdesk_parties::{Party, PartyKind};
use exportdesk_products::Product;

use crate::store::{RecordStore, StoreError};

/// Open a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn limit_param(limit: Option<usize>) -> Option<i64> {
    limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}

/// Row mapping and bind order for one table.
pub trait Table: Entity + Sized {
    const TABLE: &'static str;
    /// Column list in bind order; the first column is the primary key.
    const COLUMNS: &'static [&'static str];

    fn id_uuid(id: &Self::Id) -> uuid::Uuid;
    fn push_values(&self, row: &mut sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>);
    fn from_row(row: &PgRow) -> Result<Self, StoreError>;
}

/// Generic Postgres store for any [`Table`].
pub struct PgStore<V> {
    pool: Arc<PgPool>,
    _record: std::marker::PhantomData<fn() -> V>,
}

pub type PgPartyStore = PgStore<Party>;
pub type PgProductStore = PgStore<Product>;
pub type PgInvoiceStore = PgStore<Invoice>;

impl<V> PgStore<V> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            _record: std::marker::PhantomData,
        }
    }
}

impl<V: Table> PgStore<V> {
    fn insert_builder(records: &[V]) -> QueryBuilder<'_, Postgres> {
        let mut qb = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            V::TABLE,
            V::COLUMNS.join(", ")
        ));
        qb.push_values(records, |mut row, record| record.push_values(&mut row));
        qb
    }

    fn select_sql(tail: &str) -> String {
        format!("SELECT {} FROM {} {tail}", V::COLUMNS.join(", "), V::TABLE)
    }
}

#[async_trait::async_trait]
impl<V> RecordStore<V> for PgStore<V>
where
    V: Table + Send + Sync + 'static,
    V::Id: Send + Sync,
{
    #[instrument(skip_all, fields(table = V::TABLE), err)]
    async fn insert(&self, record: V) -> Result<V, StoreError> {
        Self::insert_builder(std::slice::from_ref(&record))
            .build()
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(record)
    }

    #[instrument(skip_all, fields(table = V::TABLE, count = records.len()), err)]
    async fn insert_many(&self, records: Vec<V>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        // Postgres caps bind parameters at 65535 per statement.
        let chunk = (65_535 / V::COLUMNS.len()).max(1);
        for batch in records.chunks(chunk) {
            Self::insert_builder(batch)
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_many", e))?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(records.len())
    }

    async fn get(&self, id: &V::Id) -> Result<Option<V>, StoreError> {
        let sql = Self::select_sql(&format!("WHERE {} = $1", V::COLUMNS[0]));
        let row = sqlx::query(&sql)
            .bind(V::id_uuid(id))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.as_ref().map(V::from_row).transpose()
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<V>, StoreError> {
        let sql = Self::select_sql("ORDER BY created_at DESC, id DESC LIMIT $1");
        let rows = sqlx::query(&sql)
            .bind(limit_param(limit))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;
        rows.iter().map(V::from_row).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", V::TABLE);
        let row = sqlx::query(&sql)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        let total: i64 = row.try_get("total").map_err(|e| map_sqlx_error("count", e))?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    #[instrument(skip_all, fields(table = V::TABLE), err)]
    async fn delete(&self, id: &V::Id) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE {} = $1", V::TABLE, V::COLUMNS[0]);
        let result = sqlx::query(&sql)
            .bind(V::id_uuid(id))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(|e| map_sqlx_error("decode", e))
}

impl Table for Party {
    const TABLE: &'static str = "parties";
    const COLUMNS: &'static [&'static str] =
        &["id", "kind", "name", "address", "gst_no", "iec", "pan", "created_at"];

    fn id_uuid(id: &PartyId) -> uuid::Uuid {
        *id.as_uuid()
    }

    fn push_values(&self, row: &mut sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(*self.id.as_uuid())
            .push_bind(self.kind.as_str())
            .push_bind(self.name.clone())
            .push_bind(self.address.clone())
            .push_bind(self.gst_no.clone())
            .push_bind(self.iec.clone())
            .push_bind(self.pan.clone())
            .push_bind(self.created_at);
    }

    fn from_row(row: &PgRow) -> Result<Self, StoreError> {
        let kind: String = get(row, "kind")?;
        let kind = PartyKind::parse(&kind)
            .ok_or_else(|| StoreError::Serialization(format!("unknown party kind '{kind}'")))?;
        Ok(Party {
            id: PartyId::from_uuid(get(row, "id")?),
            kind,
            name: get(row, "name")?,
            address: get(row, "address")?,
            gst_no: get(row, "gst_no")?,
            iec: get(row, "iec")?,
            pan: get(row, "pan")?,
            created_at: get(row, "created_at")?,
        })
    }
}

impl Table for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "description", "hsn", "unit_price", "unit", "created_at"];

    fn id_uuid(id: &ProductId) -> uuid::Uuid {
        *id.as_uuid()
    }

    fn push_values(&self, row: &mut sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(*self.id.as_uuid())
            .push_bind(self.name.clone())
            .push_bind(self.description.clone())
            .push_bind(self.hsn.clone())
            .push_bind(self.unit_price)
            .push_bind(self.unit.clone())
            .push_bind(self.created_at);
    }

    fn from_row(row: &PgRow) -> Result<Self, StoreError> {
        Ok(Product {
            id: ProductId::from_uuid(get(row, "id")?),
            name: get(row, "name")?,
            description: get(row, "description")?,
            hsn: get(row, "hsn")?,
            unit_price: get::<Option<Decimal>>(row, "unit_price")?,
            unit: get(row, "unit")?,
            created_at: get(row, "created_at")?,
        })
    }
}

impl Table for Invoice {
    const TABLE: &'static str = "invoices";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "invoice_no",
        "invoice_date",
        "exporter",
        "compliance",
        "consignee",
        "notify",
        "refs",
        "shipment",
        "items",
        "total_amount_cif",
        "amount_in_words",
        "created_at",
    ];

    fn id_uuid(id: &InvoiceId) -> uuid::Uuid {
        *id.as_uuid()
    }

    fn push_values(&self, row: &mut sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(*self.id.as_uuid())
            .push_bind(self.invoice_no.clone())
            .push_bind(self.invoice_date)
            .push_bind(Json(self.exporter.clone()))
            .push_bind(Json(self.compliance.clone()))
            .push_bind(Json(self.consignee.clone()))
            .push_bind(self.notify.clone().map(Json))
            .push_bind(Json(self.references.clone()))
            .push_bind(Json(self.shipment.clone()))
            .push_bind(Json(self.items.clone()))
            .push_bind(self.total_amount_cif)
            .push_bind(self.amount_in_words.clone())
            .push_bind(self.created_at);
    }

    fn from_row(row: &PgRow) -> Result<Self, StoreError> {
        let Json(exporter) = get::<Json<Addressee>>(row, "exporter")?;
        let Json(compliance) = get::<Json<Compliance>>(row, "compliance")?;
        let Json(consignee) = get::<Json<Addressee>>(row, "consignee")?;
        let notify = get::<Option<Json<Addressee>>>(row, "notify")?.map(|Json(n)| n);
        let Json(references) = get::<Json<References>>(row, "refs")?;
        let Json(shipment) = get::<Json<Shipment>>(row, "shipment")?;
        let Json(items) = get::<Json<Vec<InvoiceItem>>>(row, "items")?;

        Ok(Invoice {
            id: InvoiceId::from_uuid(get(row, "id")?),
            invoice_no: get(row, "invoice_no")?,
            invoice_date: get::<NaiveDate>(row, "invoice_date")?,
            exporter,
            compliance,
            consignee,
            notify,
            references,
            shipment,
            items,
            total_amount_cif: get::<Decimal>(row, "total_amount_cif")?,
            amount_in_words: get(row, "amount_in_words")?,
            created_at: get::<DateTime<Utc>>(row, "created_at")?,
        })
    }
}
