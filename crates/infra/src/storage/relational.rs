//! SQLite-backed relational order store.
//!
//! Orders are written to two tables, `Orders` (one row per order) and
//! `OrderDetails` (one row per line item, keyed by order + detail number).
//! Each write opens its own connection, creates the tables if needed, inserts
//! everything inside a single transaction and closes the connection again.
//!
//! The public API is synchronous: the sqlx driver runs on a short-lived
//! current-thread tokio runtime. Do not call it from inside an async runtime.
//!
//! ## Error Mapping
//!
//! | SQLx Error | SQLite result code | StoreError | Scenario |
//! |------------|--------------------|------------|----------|
//! | any error while connecting | N/A | `Connection` | missing file, bad descriptor, permissions |
//! | Database (constraint) | `19` + extended codes | `ConstraintViolation` | duplicate order number, foreign key |
//! | Database (other) | any other | `Database` | locked database, malformed SQL |
//! | Io | N/A | `Connection` | connection dropped mid-write |
//! | Other | N/A | `Database` | everything else |

use chrono::{DateTime, Local};
use sqlx::error::{DatabaseError, ErrorKind};
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;
use tracing::instrument;

use ordercap_core::OrderNumber;
use ordercap_sales::Order;

use super::r#trait::{BackendKind, StorageBackend, StoreError};

/// Timestamp layout of the `Orders.dateTime` column.
pub const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CREATE_ORDERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS Orders (
        orderNumber   INTEGER PRIMARY KEY,
        dateTime      TEXT NOT NULL,
        customerName  TEXT NOT NULL,
        customerPhone TEXT NOT NULL,
        taxAmount     REAL NOT NULL,
        totalAmount   REAL NOT NULL
    )
"#;

const CREATE_ORDER_DETAILS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS OrderDetails (
        orderNumber  INTEGER NOT NULL,
        detailNumber INTEGER NOT NULL,
        stockID      TEXT NOT NULL,
        stockName    TEXT NOT NULL,
        stockPrice   REAL NOT NULL,
        quantity     INTEGER NOT NULL,
        PRIMARY KEY (orderNumber, detailNumber),
        FOREIGN KEY (orderNumber) REFERENCES Orders(orderNumber)
    )
"#;

const INSERT_ORDER: &str = r#"
    INSERT INTO Orders (orderNumber, dateTime, customerName, customerPhone, taxAmount, totalAmount)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

const INSERT_ORDER_DETAIL: &str = r#"
    INSERT INTO OrderDetails (orderNumber, detailNumber, stockID, stockName, stockPrice, quantity)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

const SELECT_MAX_ORDER_NUMBER: &str = "SELECT MAX(orderNumber) FROM Orders";

/// Relational order store bound to one connection descriptor.
///
/// The descriptor is an sqlx SQLite URL (`sqlite://orders.db`,
/// `sqlite://orders.db?mode=rwc`, ...) and is handed to the driver unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalStore {
    descriptor: String,
}

impl RelationalStore {
    pub fn new(descriptor: impl Into<String>) -> Result<Self, StoreError> {
        let descriptor = descriptor.into();
        if descriptor.is_empty() {
            return Err(StoreError::InvalidArgument(
                "connection descriptor must not be empty".to_string(),
            ));
        }
        Ok(Self { descriptor })
    }

    /// For descriptors already validated by the selector.
    pub(crate) fn from_checked(descriptor: String) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Reachability check: open a connection and close it straight away.
    pub fn probe(descriptor: &str) -> Result<(), StoreError> {
        block_on(async {
            let conn = open(descriptor).await?;
            conn.close().await.map_err(|e| map_sqlx_error("close", e))
        })
    }
}

impl StorageBackend for RelationalStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn describe(&self) -> String {
        format!("relational store at {}", self.descriptor)
    }

    #[instrument(
        skip(self, order),
        fields(order_number = %order.order_number(), descriptor = %self.descriptor),
        err
    )]
    fn write(&self, order: &Order) -> Result<(), StoreError> {
        block_on(async {
            let mut conn = open(&self.descriptor).await?;
            let result = insert_order(&mut conn, order).await;
            close_quietly(conn).await;
            result
        })?;

        tracing::info!(
            line_items = order.line_items().len(),
            "inserted order and its details into the relational store"
        );
        Ok(())
    }

    fn last_order_number(&self) -> Result<Option<OrderNumber>, StoreError> {
        let max = block_on(async {
            let mut conn = open(&self.descriptor).await?;
            let result = max_order_number(&mut conn).await;
            close_quietly(conn).await;
            result
        })?;

        max.map(OrderNumber::try_from)
            .transpose()
            .map_err(|e| StoreError::Decode(format!("stored order number is invalid: {e}")))
    }
}

/// Render a timestamp the way the `dateTime` column stores it.
pub fn format_sql_datetime(timestamp: &DateTime<Local>) -> String {
    timestamp.format(SQL_DATETIME_FORMAT).to_string()
}

fn block_on<F, T>(future: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| StoreError::Database(format!("failed to start sqlite runtime: {e}")))?;
    runtime.block_on(future)
}

async fn open(descriptor: &str) -> Result<SqliteConnection, StoreError> {
    SqliteConnection::connect(descriptor)
        .await
        .map_err(|e| StoreError::Connection(format!("failed to open {descriptor}: {e}")))
}

async fn close_quietly(conn: SqliteConnection) {
    if let Err(err) = conn.close().await {
        tracing::debug!(error = %err, "failed to close sqlite connection cleanly");
    }
}

async fn create_tables(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query(CREATE_ORDERS_TABLE)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("create_orders_table", e))?;
    sqlx::query(CREATE_ORDER_DETAILS_TABLE)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("create_order_details_table", e))?;
    Ok(())
}

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> Result<(), StoreError> {
    create_tables(conn).await?;

    let order_number = i64::from(order.order_number());

    // Dropping the transaction on an early return rolls it back.
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| map_sqlx_error("begin_transaction", e))?;

    sqlx::query(INSERT_ORDER)
        .bind(order_number)
        .bind(format_sql_datetime(&order.timestamp()))
        .bind(order.customer_name())
        .bind(order.customer_phone())
        .bind(order.tax_amount())
        .bind(order.total_amount())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

    for item in order.line_items() {
        let (Some(detail_number), Some(quantity)) = (item.line_number(), item.quantity()) else {
            return Err(StoreError::InvalidArgument(format!(
                "line item {} is not attached to order {}",
                item.stock_id(),
                order.order_number()
            )));
        };

        sqlx::query(INSERT_ORDER_DETAIL)
            .bind(order_number)
            .bind(i64::from(detail_number))
            .bind(item.stock_id())
            .bind(item.stock_name())
            .bind(item.unit_price())
            .bind(i64::from(quantity))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_detail", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit", e))
}

async fn max_order_number(conn: &mut SqliteConnection) -> Result<Option<i64>, StoreError> {
    create_tables(conn).await?;
    sqlx::query_scalar::<_, Option<i64>>(SELECT_MAX_ORDER_NUMBER)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("max_order_number", e))
}

/// SQLITE_CONSTRAINT; extended constraint codes share this low byte.
const SQLITE_CONSTRAINT: i32 = 19;

fn is_constraint_violation(db_err: &dyn DatabaseError) -> bool {
    if matches!(
        db_err.kind(),
        ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
    ) {
        return true;
    }

    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| code & 0xff == SQLITE_CONSTRAINT)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if is_constraint_violation(&*db_err) {
                StoreError::ConstraintViolation(msg)
            } else {
                StoreError::Database(msg)
            }
        }
        sqlx::Error::Io(io_err) => {
            StoreError::Connection(format!("io error in {}: {}", operation, io_err))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
