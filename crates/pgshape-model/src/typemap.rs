//! Mapping from Postgres `data_type` names to column kinds and Rust types.

use indexmap::IndexMap;
use std::sync::LazyLock;

use crate::casing::type_ident;
use crate::kind::{ColumnKind, LanguageType};

/// The `data_type` the catalog reports for enums and other user types.
pub const USER_DEFINED: &str = "USER-DEFINED";

/// Result of looking up a raw data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ColumnKind,
    /// Non-optional; nullability is applied by the caller
    pub ty: LanguageType,
    /// True when the type was not in the table and the text fallback was used
    pub unmapped: bool,
}

/// Lookup table from normalized `data_type` to `(ColumnKind, LanguageType)`.
///
/// `USER-DEFINED` is not stored here: its kind and type depend on the enum
/// name and are derived in [`TypeMap::resolve`].
#[derive(Debug, Clone)]
pub struct TypeMap {
    entries: IndexMap<String, (ColumnKind, LanguageType)>,
}

static BUILTIN: LazyLock<TypeMap> = LazyLock::new(TypeMap::builtin);

impl TypeMap {
    /// An empty map. Every type resolves to the text fallback.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// The built-in Postgres mappings.
    pub fn builtin() -> Self {
        use ColumnKind as K;
        use LanguageType as L;

        let mut map = Self::empty();
        map.insert("boolean", K::Boolean, L::Bool);
        map.insert("smallint", K::Integer, L::Int16);
        map.insert("integer", K::Integer, L::Int32);
        map.insert("bigint", K::Integer, L::Int64);
        for time in [
            "date",
            "timestamp without time zone",
            "timestamp with time zone",
        ] {
            map.insert(time, K::Time, L::Timestamp);
        }
        for text in ["text", "character", "character varying"] {
            map.insert(text, K::Text, L::String);
        }
        map.insert("bytea", K::Text, L::Bytes);
        map.insert("uuid", K::Text, L::Uuid);
        map.insert("real", K::Numeric, L::Float32);
        map.insert("numeric", K::Numeric, L::Float64);
        map.insert("double precision", K::Numeric, L::Float64);
        map.insert("json", K::JsonText, L::JsonText);
        map.insert("jsonb", K::JsonText, L::JsonText);
        map
    }

    /// Shared instance of [`TypeMap::builtin`], built on first use.
    pub fn shared() -> &'static TypeMap {
        &BUILTIN
    }

    /// Add or replace a mapping. The key is normalized like lookups are.
    pub fn insert(&mut self, raw_data_type: &str, kind: ColumnKind, ty: LanguageType) {
        self.entries.insert(normalize(raw_data_type), (kind, ty));
    }

    /// Iterate over every mapping, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnKind, &LanguageType)> {
        self.entries
            .iter()
            .map(|(raw, (kind, ty))| (raw.as_str(), kind, ty))
    }

    /// Classify a raw data type. Pure and total: unknown types fall back to
    /// text with `unmapped` set.
    pub fn resolve(&self, raw_data_type: &str, enum_name: &str) -> Classification {
        if raw_data_type == USER_DEFINED {
            return Classification {
                kind: ColumnKind::Enum(enum_name.to_string()),
                ty: LanguageType::Enum(type_ident(enum_name)),
                unmapped: false,
            };
        }

        match self.entries.get(&normalize(raw_data_type)) {
            Some((kind, ty)) => Classification {
                kind: kind.clone(),
                ty: ty.clone(),
                unmapped: false,
            },
            None => Classification {
                kind: ColumnKind::Text,
                ty: LanguageType::String,
                unmapped: true,
            },
        }
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(raw_data_type: &str) -> String {
    raw_data_type.trim().to_ascii_lowercase()
}

/// Classify a raw data type with the built-in map.
///
/// Unknown types map to `(Text, String)` and log a warning; they never
/// abort generation.
pub fn classify(raw_data_type: &str, enum_name: &str) -> (ColumnKind, LanguageType) {
    let c = TypeMap::shared().resolve(raw_data_type, enum_name);
    if c.unmapped {
        tracing::warn!(
            raw_data_type,
            enum_name,
            "unknown data type, using string column instead"
        );
    }
    (c.kind, c.ty)
}
