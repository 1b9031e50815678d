use std::fmt;

/// Column category, deciding which column builder the query DSL uses.
///
/// Independent of nullability: every kind can be nullable or not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// BOOLEAN
    Boolean,
    /// SMALLINT, INTEGER, BIGINT
    Integer,
    /// DATE and TIMESTAMP (with or without time zone)
    Time,
    /// Character types, BYTEA, UUID, and anything unmapped
    Text,
    /// REAL, DOUBLE PRECISION, NUMERIC
    Numeric,
    /// A user-defined enum, by its catalog name
    Enum(String),
    /// JSON and JSONB
    JsonText,
}

impl ColumnKind {
    /// Name of the column builder type in the runtime prelude.
    pub fn builder_name(&self) -> &'static str {
        match self {
            ColumnKind::Boolean => "ColumnBool",
            ColumnKind::Integer => "ColumnInteger",
            ColumnKind::Time => "ColumnTimestamp",
            ColumnKind::Text => "ColumnString",
            ColumnKind::Numeric => "ColumnFloat",
            ColumnKind::Enum(_) => "ColumnEnum",
            ColumnKind::JsonText => "ColumnJson",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Boolean => write!(f, "Boolean"),
            ColumnKind::Integer => write!(f, "Integer"),
            ColumnKind::Time => write!(f, "Time"),
            ColumnKind::Text => write!(f, "Text"),
            ColumnKind::Numeric => write!(f, "Numeric"),
            ColumnKind::Enum(name) => write!(f, "Enum({})", name),
            ColumnKind::JsonText => write!(f, "JsonText"),
        }
    }
}

/// The Rust-side type a column's values decode to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageType {
    Bool,
    Int16,
    Int32,
    Int64,
    Timestamp,
    Bytes,
    String,
    Float32,
    Float64,
    Uuid,
    /// A generated enum type, already in PascalCase
    Enum(String),
    JsonText,
    /// A nullable column; never nested
    Optional(Box<LanguageType>),
}

impl LanguageType {
    /// Wrap in `Optional`. Already optional types are returned as-is.
    pub fn optional(self) -> Self {
        match self {
            LanguageType::Optional(_) => self,
            other => LanguageType::Optional(Box::new(other)),
        }
    }

    /// Wrap in `Optional` only when `nullable` is true.
    pub fn nullable_if(self, nullable: bool) -> Self {
        if nullable { self.optional() } else { self }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, LanguageType::Optional(_))
    }

    /// The non-optional type underneath.
    pub fn base(&self) -> &LanguageType {
        match self {
            LanguageType::Optional(inner) => inner,
            other => other,
        }
    }

    /// Map this type to a Rust type string.
    ///
    /// Non-std names match what the runtime prelude exports.
    pub fn to_rust_type(&self) -> String {
        match self {
            LanguageType::Bool => "bool".to_string(),
            LanguageType::Int16 => "i16".to_string(),
            LanguageType::Int32 => "i32".to_string(),
            LanguageType::Int64 => "i64".to_string(),
            LanguageType::Timestamp => "Timestamp".to_string(),
            LanguageType::Bytes => "Vec<u8>".to_string(),
            LanguageType::String => "String".to_string(),
            LanguageType::Float32 => "f32".to_string(),
            LanguageType::Float64 => "f64".to_string(),
            LanguageType::Uuid => "Uuid".to_string(),
            LanguageType::Enum(name) => name.clone(),
            LanguageType::JsonText => "JsonText".to_string(),
            LanguageType::Optional(inner) => format!("Option<{}>", inner.to_rust_type()),
        }
    }
}

impl fmt::Display for LanguageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageType::Bool => write!(f, "boolean"),
            LanguageType::Int16 => write!(f, "int16"),
            LanguageType::Int32 => write!(f, "int32"),
            LanguageType::Int64 => write!(f, "int64"),
            LanguageType::Timestamp => write!(f, "timestamp"),
            LanguageType::Bytes => write!(f, "bytes"),
            LanguageType::String => write!(f, "string"),
            LanguageType::Float32 => write!(f, "float32"),
            LanguageType::Float64 => write!(f, "float64"),
            LanguageType::Uuid => write!(f, "uuid"),
            LanguageType::Enum(name) => write!(f, "enum {}", name),
            LanguageType::JsonText => write!(f, "json"),
            LanguageType::Optional(inner) => write!(f, "optional<{}>", inner),
        }
    }
}
