//! Catalog reads against `information_schema`.
//!
//! Identifier columns of `information_schema` use the `sql_identifier`
//! domain, which tokio-postgres will not decode as `String`, so every
//! selected column and every parameter is cast to `text`.

use std::time::Duration;

use pgshape_model::ColumnDescriptor;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

use crate::error::{Cause, Error, QueryTimeout};
use crate::traced::{Connection, ConnectionExt};
use crate::Result;

const COLUMNS_SQL: &str = r#"
SELECT column_name::text, is_nullable::text, data_type::text, udt_name::text
FROM information_schema.columns
WHERE table_catalog = $1::text AND table_schema = $2::text AND table_name = $3::text
ORDER BY ordinal_position"#;

const TABLES_SQL: &str = r#"
SELECT table_name::text
FROM information_schema.tables
WHERE table_catalog = $1::text AND table_schema = $2::text
  AND table_type IN ('BASE TABLE', 'VIEW')
ORDER BY table_name"#;

const PRIMARY_KEY_SQL: &str = r#"
SELECT kcu.column_name::text
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON kcu.constraint_catalog = tc.constraint_catalog
 AND kcu.constraint_schema = tc.constraint_schema
 AND kcu.constraint_name = tc.constraint_name
 AND kcu.table_name = tc.table_name
WHERE tc.constraint_type = 'PRIMARY KEY'
  AND tc.table_catalog = $1::text AND tc.table_schema = $2::text AND tc.table_name = $3::text
ORDER BY kcu.ordinal_position"#;

const CURRENT_CATALOG_SQL: &str = "SELECT current_database()::text";

/// Reads table metadata from the catalog over one connection.
pub struct CatalogReader<'a, C: Connection> {
    conn: &'a C,
    timeout: Option<Duration>,
}

impl<'a, C: Connection> CatalogReader<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self {
            conn,
            timeout: None,
        }
    }

    /// Fail queries that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Columns of `catalog.schema.table`, in ordinal order.
    ///
    /// Unknown tables yield an empty list.
    pub async fn fetch_columns(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let rows = self
            .query(COLUMNS_SQL, &[&catalog, &schema, &table])
            .await
            .map_err(|e| Error::introspection(schema, table, e))?;

        rows.iter()
            .map(column_descriptor)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::introspection(schema, table, e))
    }

    /// Primary key column names of a table, in key order.
    pub async fn fetch_primary_key(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>> {
        let rows = self
            .query(PRIMARY_KEY_SQL, &[&catalog, &schema, &table])
            .await
            .map_err(|e| Error::introspection(schema, table, e))?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::introspection(schema, table, e))
    }

    /// Names of the tables and views in a schema, sorted.
    pub async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<String>> {
        let rows = self
            .query(TABLES_SQL, &[&catalog, &schema])
            .await
            .map_err(|e| Error::introspection(schema, "*", e))?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::introspection(schema, "*", e))
    }

    /// Name of the database the connection is attached to.
    pub async fn current_catalog(&self) -> Result<String> {
        let row = self
            .conn
            .traced()
            .query_one(CURRENT_CATALOG_SQL, &[])
            .await
            .map_err(Error::connection)?;
        row.try_get(0).map_err(Error::connection)
    }

    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<Vec<Row>, Cause> {
        let traced = self.conn.traced();
        let fut = traced.query(sql, params);
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(rows) => Ok(rows?),
                Err(_) => Err(QueryTimeout(limit).into()),
            },
            None => Ok(fut.await?),
        }
    }
}

fn column_descriptor(row: &Row) -> std::result::Result<ColumnDescriptor, tokio_postgres::Error> {
    let is_nullable: Option<String> = row.try_get(1)?;
    Ok(ColumnDescriptor {
        name: row.try_get(0)?,
        is_nullable: ColumnDescriptor::parse_nullable(is_nullable.as_deref().unwrap_or_default()),
        raw_data_type: row.try_get(2)?,
        enum_name: row.try_get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

/// Columns of `catalog.schema.table`, in ordinal order.
pub async fn fetch_columns<C: Connection>(
    conn: &C,
    catalog: &str,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnDescriptor>> {
    CatalogReader::new(conn)
        .fetch_columns(catalog, schema, table)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    /// A connection whose queries never complete.
    struct Stalled;

    impl Connection for Stalled {
        fn query<'a>(
            &'a self,
            _sql: &'a str,
            _params: &'a [&'a (dyn ToSql + Sync)],
        ) -> crate::traced::QueryFuture<'a, Vec<Row>> {
            Box::pin(pending::<std::result::Result<Vec<Row>, tokio_postgres::Error>>())
        }

        fn query_one<'a>(
            &'a self,
            _sql: &'a str,
            _params: &'a [&'a (dyn ToSql + Sync)],
        ) -> crate::traced::QueryFuture<'a, Row> {
            Box::pin(pending::<std::result::Result<Row, tokio_postgres::Error>>())
        }
    }

    #[tokio::test]
    async fn test_timeout_is_an_introspection_error() {
        let reader = CatalogReader::new(&Stalled).with_timeout(Some(Duration::from_millis(10)));

        let err = reader
            .fetch_columns("dvds", "public", "film")
            .await
            .unwrap_err();
        match err {
            Error::Introspection {
                schema,
                table,
                source,
            } => {
                assert_eq!(schema, "public");
                assert_eq!(table, "film");
                assert!(source.is::<QueryTimeout>());
            }
            other => panic!("expected an introspection error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_applies_to_every_catalog_read() {
        let reader = CatalogReader::new(&Stalled).with_timeout(Some(Duration::from_millis(10)));

        let err = reader.list_tables("dvds", "public").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Introspection { ref table, ref source, .. }
                if table == "*" && source.is::<QueryTimeout>()
        ));

        let err = reader
            .fetch_primary_key("dvds", "public", "film")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Introspection { ref source, .. } if source.is::<QueryTimeout>()
        ));
    }
}
