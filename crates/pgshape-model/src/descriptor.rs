/// One column as reported by `information_schema.columns`.
///
/// Descriptors are produced in ordinal order by the catalog reader and are
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDescriptor {
    /// Column name, exactly as stored in the catalog
    pub name: String,
    /// Whether the column accepts NULL
    pub is_nullable: bool,
    /// `data_type` column of the catalog (e.g. `integer`, `USER-DEFINED`)
    pub raw_data_type: String,
    /// `udt_name` column of the catalog; names the enum for `USER-DEFINED` types
    pub enum_name: String,
}

impl ColumnDescriptor {
    /// Create a descriptor for a built-in type (no enum name).
    pub fn new(name: impl Into<String>, is_nullable: bool, raw_data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_nullable,
            raw_data_type: raw_data_type.into(),
            enum_name: String::new(),
        }
    }

    /// Create a descriptor for a user-defined enum column.
    pub fn user_defined(
        name: impl Into<String>,
        is_nullable: bool,
        enum_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            is_nullable,
            raw_data_type: crate::USER_DEFINED.to_string(),
            enum_name: enum_name.into(),
        }
    }

    /// Interpret the catalog's `is_nullable` string.
    ///
    /// Only the exact string `YES` means nullable. Anything else, including
    /// empty or unexpected values, is treated as NOT NULL.
    pub fn parse_nullable(is_nullable: &str) -> bool {
        is_nullable == "YES"
    }
}
