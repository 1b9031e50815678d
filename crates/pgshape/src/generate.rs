//! The generation pipeline: select tables, introspect them concurrently,
//! build their models.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::Pool;
use pgshape_config::Config;
use pgshape_model::{MutabilityPolicy, TableModel, TableModelBuilder, TableSet, UnmappedType};
use tokio::task::JoinSet;

use crate::error::{Error, TableNotFound};
use crate::introspect::CatalogReader;
use crate::{Result, pool};

/// Schema used when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// What to introspect and how to decide mutability.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Catalog name; `None` means the connection's current database
    pub catalog: Option<String>,
    pub schema: String,
    /// Tables to generate; empty means every table in the schema
    pub tables: Vec<String>,
    /// Policy for tables without an override
    pub mutability: MutabilityPolicy,
    /// Per-table policy overrides
    pub table_mutability: HashMap<String, MutabilityPolicy>,
    /// Per-query timeout for catalog reads
    pub timeout: Option<Duration>,
}

impl GenerateOptions {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Default::default()
        }
    }

    /// Derive options from a (merged) configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mutability = match config.mutability.as_deref() {
            None => MutabilityPolicy::default(),
            Some(name) => MutabilityPolicy::from_name(name).ok_or_else(|| {
                Error::Config(format!(
                    "unknown mutability policy '{}', expected none, all or non-key",
                    name
                ))
            })?,
        };

        let table_mutability = config
            .mutable_columns
            .iter()
            .map(|t| {
                (
                    t.table.clone(),
                    MutabilityPolicy::columns(t.columns.iter().cloned()),
                )
            })
            .collect();

        Ok(Self {
            catalog: config.catalog.clone(),
            schema: config
                .schema
                .clone()
                .unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            tables: config.tables.clone(),
            mutability,
            table_mutability,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }

    /// The policy that applies to `table`.
    pub fn policy_for(&self, table: &str) -> &MutabilityPolicy {
        self.table_mutability
            .get(table)
            .unwrap_or(&self.mutability)
    }
}

/// Outcome of a generation run.
#[derive(Debug)]
pub struct GenerationReport {
    /// Catalog that was read
    pub catalog: String,
    /// Successfully built models, in selection order
    pub tables: TableSet,
    /// Tables that could not be introspected
    pub failures: Vec<Error>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Unmapped-type diagnostics across all tables.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &UnmappedType)> {
        self.tables.diagnostics()
    }
}

/// Runs the catalog → model pipeline over a connection pool.
pub struct Generator {
    pool: Pool,
    options: Arc<GenerateOptions>,
}

impl Generator {
    pub fn new(pool: Pool, options: GenerateOptions) -> Self {
        Self {
            pool,
            options: Arc::new(options),
        }
    }

    /// Introspect every selected table.
    ///
    /// Fails outright only when the database cannot be reached or the table
    /// list cannot be read; per-table faults are collected in the report.
    pub async fn run(&self) -> Result<GenerationReport> {
        let (catalog, tables) = self.select_tables().await?;
        tracing::info!(
            catalog = %catalog,
            schema = %self.options.schema,
            tables = tables.len(),
            "introspecting"
        );

        let mut workers = JoinSet::new();
        for (idx, table) in tables.into_iter().enumerate() {
            let pool = self.pool.clone();
            let options = Arc::clone(&self.options);
            let catalog = catalog.clone();
            workers.spawn(async move {
                let result = introspect_table(&pool, &options, &catalog, &table).await;
                (idx, result)
            });
        }

        let mut results = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(done) => results.push(done),
                // Workers are never aborted, so this is a panic
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            }
        }
        results.sort_by_key(|(idx, _)| *idx);

        assemble_report(catalog, results.into_iter().map(|(_, result)| result))
    }

    async fn select_tables(&self) -> Result<(String, Vec<String>)> {
        let conn = pool::checkout(&self.pool).await?;
        let reader = CatalogReader::new(&conn).with_timeout(self.options.timeout);

        let catalog = match &self.options.catalog {
            Some(catalog) => catalog.clone(),
            None => reader.current_catalog().await?,
        };

        let tables = if self.options.tables.is_empty() {
            reader.list_tables(&catalog, &self.options.schema).await?
        } else {
            self.options.tables.clone()
        };

        Ok((catalog, tables))
    }
}

/// Collect per-table results, in order, into a report.
///
/// Losing the database is not a per-table fault: the first connection
/// error fails the whole run.
fn assemble_report(
    catalog: String,
    results: impl IntoIterator<Item = Result<TableModel>>,
) -> Result<GenerationReport> {
    let mut report = GenerationReport {
        catalog,
        tables: TableSet::new(),
        failures: Vec::new(),
    };
    for result in results {
        match result {
            Ok(model) => {
                report.tables.insert(model);
            }
            Err(e @ Error::Connection(_)) => return Err(e),
            Err(e) => {
                tracing::error!(error = %e, "table skipped");
                report.failures.push(e);
            }
        }
    }

    Ok(report)
}

/// Read one table and build its model on a dedicated pooled connection.
async fn introspect_table(
    pool: &Pool,
    options: &GenerateOptions,
    catalog: &str,
    table: &str,
) -> Result<TableModel> {
    let schema = options.schema.as_str();
    let conn = pool::checkout(pool).await?;
    let reader = CatalogReader::new(&conn).with_timeout(options.timeout);

    let columns = reader.fetch_columns(catalog, schema, table).await?;
    if columns.is_empty() {
        return Err(Error::introspection(schema, table, TableNotFound));
    }

    let policy = options.policy_for(table).clone();
    let key_columns = if policy == MutabilityPolicy::NonKey {
        reader.fetch_primary_key(catalog, schema, table).await?
    } else {
        Vec::new()
    };

    let model = TableModelBuilder::new(schema, table)
        .policy(policy)
        .key_columns(key_columns)
        .build(&columns);

    tracing::info!(
        schema,
        table,
        columns = model.columns.len(),
        mutable = model.mutable_columns().len(),
        "introspected table"
    );

    Ok(model)
}
