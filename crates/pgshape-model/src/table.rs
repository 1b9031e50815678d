//! Per-table models built from catalog descriptors.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use crate::casing::{snake_to_camel, type_ident};
use crate::descriptor::ColumnDescriptor;
use crate::kind::{ColumnKind, LanguageType};
use crate::typemap::TypeMap;

/// Display name of the conflict-target form, as used in
/// `ON CONFLICT ... DO UPDATE SET col = excluded.col`.
pub const EXCLUDED_TABLE: &str = "excluded";

/// A single column of a table model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnModel {
    /// Column name in the database
    pub name: String,
    /// CamelCase field name (`film_id` -> `FilmID`)
    pub field_name: String,
    /// Name of the column handle variable (`FilmIDColumn`)
    pub var_name: String,
    pub kind: ColumnKind,
    /// Decoded type, `Optional` when the column is nullable
    pub ty: LanguageType,
}

impl ColumnModel {
    pub fn is_nullable(&self) -> bool {
        self.ty.is_optional()
    }
}

/// A column whose data type was not recognized and fell back to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedType {
    pub column: String,
    pub raw_data_type: String,
}

/// Which columns may appear on the update side of an upsert.
///
/// This cannot be inferred from `information_schema.columns` alone, so it
/// is always chosen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MutabilityPolicy {
    /// No column is mutable
    #[default]
    None,
    /// Every column is mutable
    All,
    /// Every column except the key columns given to the builder
    NonKey,
    /// Exactly the named columns (names not in the table are ignored)
    Columns(BTreeSet<String>),
}

impl MutabilityPolicy {
    /// Parse a policy name: `none`, `all` or `non-key`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(MutabilityPolicy::None),
            "all" => Some(MutabilityPolicy::All),
            "non-key" | "non_key" => Some(MutabilityPolicy::NonKey),
            _ => None,
        }
    }

    /// Build a `Columns` policy from column names.
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MutabilityPolicy::Columns(names.into_iter().map(Into::into).collect())
    }

    fn is_mutable(&self, column: &str, key_columns: &BTreeSet<String>) -> bool {
        match self {
            MutabilityPolicy::None => false,
            MutabilityPolicy::All => true,
            MutabilityPolicy::NonKey => !key_columns.contains(column),
            MutabilityPolicy::Columns(names) => names.contains(column),
        }
    }
}

/// Typed model of one table.
///
/// Models are values: the alias and conflict-target forms are independent
/// copies and never touch the model they were derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    /// Schema the table lives in (empty for the conflict-target form)
    pub schema_name: String,
    /// Table name in the database
    pub table_name: String,
    /// Display name override used when the table is referenced under an alias
    pub alias: Option<String>,
    /// Columns in ordinal order
    pub columns: Vec<ColumnModel>,
    /// Indices into `columns`, in ordinal order
    all_columns: Vec<usize>,
    /// Indices into `columns`; always a subsequence of `all_columns`
    mutable_columns: Vec<usize>,
    /// Columns that used the text fallback
    pub diagnostics: Vec<UnmappedType>,
}

impl TableModel {
    /// Every column, in ordinal order.
    pub fn all_columns(&self) -> impl ExactSizeIterator<Item = &ColumnModel> + '_ {
        self.all_columns.iter().map(|&i| &self.columns[i])
    }

    /// Columns allowed on the update side of an upsert, in ordinal order.
    pub fn mutable_columns(&self) -> impl ExactSizeIterator<Item = &ColumnModel> + '_ {
        self.mutable_columns.iter().map(|&i| &self.columns[i])
    }

    /// Look up a column by its database name.
    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Name the table is referred to by in SQL.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table_name)
    }

    /// Schema qualifier for SQL references; empty when aliased.
    pub fn schema_qualifier(&self) -> &str {
        if self.alias.is_some() {
            ""
        } else {
            &self.schema_name
        }
    }

    /// `schema.table`, or just the display name when there is no qualifier.
    pub fn qualified_name(&self) -> String {
        match self.schema_qualifier() {
            "" => self.display_name().to_string(),
            schema => format!("{}.{}", schema, self.display_name()),
        }
    }

    /// A copy of this table referenced under another name (self-joins).
    pub fn with_alias(&self, alias: impl Into<String>) -> TableModel {
        TableModel {
            alias: Some(alias.into()),
            ..self.clone()
        }
    }

    /// The `excluded` pseudo-table of an upsert, with the same columns.
    pub fn conflict_target(&self) -> TableModel {
        TableModel {
            schema_name: String::new(),
            table_name: EXCLUDED_TABLE.to_string(),
            alias: None,
            ..self.clone()
        }
    }

    /// CamelCase type name of the table (`film_category` -> `FilmCategory`).
    pub fn type_name(&self) -> String {
        type_ident(&self.table_name)
    }
}

/// Builds a [`TableModel`] from catalog descriptors.
#[derive(Debug, Clone)]
pub struct TableModelBuilder<'a> {
    schema_name: String,
    table_name: String,
    policy: MutabilityPolicy,
    key_columns: BTreeSet<String>,
    type_map: &'a TypeMap,
}

impl TableModelBuilder<'static> {
    /// A builder using the built-in type map and no mutable columns.
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            policy: MutabilityPolicy::default(),
            key_columns: BTreeSet::new(),
            type_map: TypeMap::shared(),
        }
    }
}

impl<'a> TableModelBuilder<'a> {
    /// Use a custom type map.
    pub fn type_map<'b>(self, type_map: &'b TypeMap) -> TableModelBuilder<'b> {
        TableModelBuilder {
            schema_name: self.schema_name,
            table_name: self.table_name,
            policy: self.policy,
            key_columns: self.key_columns,
            type_map,
        }
    }

    /// Choose which columns are mutable.
    pub fn policy(mut self, policy: MutabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Key columns, excluded by [`MutabilityPolicy::NonKey`].
    pub fn key_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self, descriptors: &[ColumnDescriptor]) -> TableModel {
        let mut columns = Vec::with_capacity(descriptors.len());
        let mut mutable_columns = Vec::new();
        let mut diagnostics = Vec::new();

        for (idx, desc) in descriptors.iter().enumerate() {
            let class = self.type_map.resolve(&desc.raw_data_type, &desc.enum_name);
            if class.unmapped {
                // Reported to users through `diagnostics`
                tracing::debug!(
                    schema = %self.schema_name,
                    table = %self.table_name,
                    column = %desc.name,
                    data_type = %desc.raw_data_type,
                    "unknown data type, using string column instead"
                );
                diagnostics.push(UnmappedType {
                    column: desc.name.clone(),
                    raw_data_type: desc.raw_data_type.clone(),
                });
            }

            if self.policy.is_mutable(&desc.name, &self.key_columns) {
                mutable_columns.push(idx);
            }

            let field_name = snake_to_camel(&desc.name);
            columns.push(ColumnModel {
                name: desc.name.clone(),
                var_name: format!("{}Column", field_name),
                field_name,
                kind: class.kind,
                ty: class.ty.nullable_if(desc.is_nullable),
            });
        }

        TableModel {
            schema_name: self.schema_name,
            table_name: self.table_name,
            alias: None,
            all_columns: (0..columns.len()).collect(),
            mutable_columns,
            columns,
            diagnostics,
        }
    }
}

/// Build a model with the built-in type map and no mutable columns.
pub fn build(
    schema_name: impl Into<String>,
    table_name: impl Into<String>,
    descriptors: &[ColumnDescriptor],
) -> TableModel {
    TableModelBuilder::new(schema_name, table_name).build(descriptors)
}

/// An owned set of table models, keyed by table name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSet {
    tables: IndexMap<String, TableModel>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model, replacing any previous model for the same table.
    pub fn insert(&mut self, model: TableModel) -> Option<TableModel> {
        self.tables.insert(model.table_name.clone(), model)
    }

    /// Get a table by name.
    pub fn get(&self, table_name: &str) -> Option<&TableModel> {
        self.tables.get(table_name)
    }

    /// Iterate over all tables.
    pub fn iter(&self) -> impl Iterator<Item = &TableModel> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every unmapped-type diagnostic, with its table name.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &UnmappedType)> {
        self.tables
            .values()
            .flat_map(|t| t.diagnostics.iter().map(move |d| (t.table_name.as_str(), d)))
    }
}

impl FromIterator<TableModel> for TableSet {
    fn from_iter<I: IntoIterator<Item = TableModel>>(iter: I) -> Self {
        let mut set = TableSet::new();
        for model in iter {
            set.insert(model);
        }
        set
    }
}
