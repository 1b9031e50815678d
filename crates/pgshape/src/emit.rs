//! Rust source generation from table models using the `codegen` crate.
//!
//! Every table becomes one module file; a `mod.rs` ties them together.
//! Each file is written atomically (temporary file, then rename), so a
//! failed write never leaves a half-written artifact behind.

use std::collections::HashSet;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use codegen::{Function, Impl, Scope, Struct};
use pgshape_model::{ColumnModel, EXCLUDED_TABLE, TableModel, TableSet, rust_ident};

use crate::error::Error;
use crate::Result;

/// Default crate path the generated code imports its prelude from.
pub const DEFAULT_RUNTIME_CRATE: &str = "pgshape_runtime";

const HEADER: &str = "// Generated by pgshape. Do not edit.\n\
                      // Changes to this file will be lost when it is regenerated.";

/// Field names the generated structs use for themselves. `columns` and
/// `excluded` live on the table struct and would shadow a column through
/// `Deref`.
const RESERVED_FIELDS: &[&str] = &[
    "table",
    "all_columns",
    "mutable_columns",
    "columns",
    "excluded",
];

#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Crate path whose `prelude` provides `Table`, `ColumnList` and the
    /// column builders
    pub runtime_crate: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
        }
    }
}

/// Files written by [`Emitter::emit_all`], and the ones that failed.
#[derive(Debug, Default)]
pub struct EmitReport {
    pub written: Vec<Utf8PathBuf>,
    pub failures: Vec<Error>,
}

impl EmitReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Emitter {
    out_dir: Utf8PathBuf,
    options: EmitOptions,
}

impl Emitter {
    pub fn new(out_dir: impl Into<Utf8PathBuf>, options: EmitOptions) -> Self {
        Self {
            out_dir: out_dir.into(),
            options,
        }
    }

    pub fn out_dir(&self) -> &Utf8Path {
        &self.out_dir
    }

    /// Path of the artifact generated for `model`.
    pub fn table_path(&self, model: &TableModel) -> Utf8PathBuf {
        self.out_dir
            .join(format!("{}.rs", module_name(&model.table_name)))
    }

    /// Write one file per table plus `mod.rs`.
    ///
    /// A failed table write is recorded and the remaining tables are still
    /// written; `mod.rs` only declares modules that were written.
    pub fn emit_all(&self, tables: &TableSet) -> Result<EmitReport> {
        fs::create_dir_all(&self.out_dir).map_err(|source| Error::Emission {
            artifact: "output directory".to_string(),
            path: self.out_dir.clone(),
            source,
        })?;

        let mut report = EmitReport::default();
        let mut emitted = Vec::new();

        for model in tables.iter() {
            let path = self.table_path(model);
            match write_atomic(&path, &self.render_table(model)) {
                Ok(()) => {
                    tracing::info!(table = %model.table_name, path = %path, "wrote table");
                    emitted.push(model);
                    report.written.push(path);
                }
                Err(source) => report.failures.push(Error::Emission {
                    artifact: model.table_name.clone(),
                    path,
                    source,
                }),
            }
        }

        let mod_path = self.out_dir.join("mod.rs");
        match write_atomic(&mod_path, &render_mod(&emitted)) {
            Ok(()) => report.written.push(mod_path),
            Err(source) => report.failures.push(Error::Emission {
                artifact: "mod.rs".to_string(),
                path: mod_path,
                source,
            }),
        }

        Ok(report)
    }

    /// Render the module for one table.
    pub fn render_table(&self, model: &TableModel) -> String {
        let mut scope = Scope::new();
        scope.import(&format!("{}::prelude", self.options.runtime_crate), "*");

        let type_name = model.type_name();
        let columns_name = format!("{}Columns", type_name);
        let table_name = format!("{}Table", type_name);
        let fields = field_idents(model);

        scope.push_struct(columns_struct(model, &columns_name, &fields));
        scope.push_impl(columns_impl(model, &columns_name, &fields));
        scope.push_struct(table_struct(model, &table_name, &columns_name));
        scope.push_impl(table_deref_impl(&table_name, &columns_name));
        scope.push_impl(table_impl(model, &table_name, &columns_name));
        scope.push_impl(table_default_impl(&table_name));
        scope.push_struct(row_struct(model, &format!("{}Row", type_name), &fields));

        with_header(&scope)
    }
}

fn columns_struct(model: &TableModel, name: &str, fields: &[(String, &ColumnModel)]) -> Struct {
    let mut st = Struct::new(name);
    st.vis("pub");
    st.doc(&format!("Columns of `{}`.", model.qualified_name()));
    st.derive("Debug");
    st.derive("Clone");
    st.field("pub table", "Table");
    for (ident, col) in fields {
        st.field(&format!("pub {}", ident), col.kind.builder_name());
    }
    st.field("pub all_columns", "ColumnList");
    st.field("pub mutable_columns", "ColumnList");
    st
}

fn columns_impl(model: &TableModel, name: &str, fields: &[(String, &ColumnModel)]) -> Impl {
    let mut imp = Impl::new(name);

    let mut func = Function::new("new");
    func.arg("schema_name", "&str");
    func.arg("table_name", "&str");
    func.ret("Self");

    for (ident, col) in fields {
        func.line(format!(
            "let {} = {}::new({:?});",
            ident,
            col.kind.builder_name(),
            col.name
        ));
    }
    func.line(format!(
        "let all_columns = ColumnList::new(vec![{}]);",
        column_list(fields.iter().map(|(ident, _)| ident.as_str()))
    ));
    let mutable = model.mutable_columns().filter_map(|col| {
        fields
            .iter()
            .find(|(_, field)| field.name == col.name)
            .map(|(ident, _)| ident.as_str())
    });
    func.line(format!(
        "let mutable_columns = ColumnList::new(vec![{}]);",
        column_list(mutable)
    ));
    func.line("");
    func.line("Self {");
    func.line("    table: Table::new(schema_name, table_name, all_columns.clone()),");
    for (ident, _) in fields {
        func.line(format!("    {},", ident));
    }
    func.line("    all_columns,");
    func.line("    mutable_columns,");
    func.line("}");

    imp.push_fn(func);
    imp
}

fn table_struct(model: &TableModel, name: &str, columns_name: &str) -> Struct {
    let mut st = Struct::new(name);
    st.vis("pub");
    st.doc(&format!(
        "`{}`, with the `{}` row of upserts.",
        model.qualified_name(),
        EXCLUDED_TABLE
    ));
    st.derive("Debug");
    st.derive("Clone");
    st.field("columns", columns_name);
    st.field("pub excluded", columns_name);
    st
}

fn table_deref_impl(name: &str, columns_name: &str) -> Impl {
    let mut imp = Impl::new(name);
    imp.impl_trait("std::ops::Deref");
    imp.associate_type("Target", columns_name);

    let mut func = Function::new("deref");
    func.arg_ref_self();
    func.ret("&Self::Target");
    func.line("&self.columns");
    imp.push_fn(func);
    imp
}

fn table_impl(model: &TableModel, name: &str, columns_name: &str) -> Impl {
    let mut imp = Impl::new(name);

    let mut new = Function::new("new");
    new.vis("pub");
    new.doc("A fresh instance under the table's own name.");
    new.ret("Self");
    new.line("Self {");
    new.line(format!(
        "    columns: {}::new({:?}, {:?}),",
        columns_name, model.schema_name, model.table_name
    ));
    new.line(format!(
        "    excluded: {}::new(\"\", {:?}),",
        columns_name, EXCLUDED_TABLE
    ));
    new.line("}");
    imp.push_fn(new);

    let mut alias = Function::new("alias");
    alias.vis("pub");
    alias.doc("A fresh instance referenced as `alias`, for self-joins.");
    alias.arg_ref_self();
    alias.arg("alias", "&str");
    alias.ret("Self");
    alias.line("let mut table = Self::new();");
    alias.line("table.columns.table = table.columns.table.alias(alias);");
    alias.line("table");
    imp.push_fn(alias);

    imp
}

fn table_default_impl(name: &str) -> Impl {
    let mut imp = Impl::new(name);
    imp.impl_trait("Default");

    let mut func = Function::new("default");
    func.ret("Self");
    func.line("Self::new()");
    imp.push_fn(func);
    imp
}

fn row_struct(model: &TableModel, name: &str, fields: &[(String, &ColumnModel)]) -> Struct {
    let mut st = Struct::new(name);
    st.vis("pub");
    st.doc(&format!("A row of `{}`.", model.qualified_name()));
    st.derive("Debug");
    st.derive("Clone");
    st.derive("PartialEq");
    for (ident, col) in fields {
        st.field(&format!("pub {}", ident), col.ty.to_rust_type());
    }
    st
}

/// `mod.rs` declaring every table module.
fn render_mod(tables: &[&TableModel]) -> String {
    let mut scope = Scope::new();
    for model in tables {
        scope.raw(&format!("pub mod {};", module_name(&model.table_name)));
    }
    for model in tables {
        scope.raw(&format!(
            "pub use {}::{}Table;",
            module_name(&model.table_name),
            model.type_name()
        ));
    }

    with_header(&scope)
}

/// The scope's source with the generated-file header on top.
///
/// `Scope` always renders imports before any item, so the header cannot be
/// a raw item.
fn with_header(scope: &Scope) -> String {
    format!("{}\n\n{}\n", HEADER, scope.to_string())
}

fn column_list<'a>(idents: impl Iterator<Item = &'a str>) -> String {
    idents
        .map(|ident| format!("{}.clone().into()", ident))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Module and file stem for a table.
///
/// Never a raw identifier: `pub mod r#type;` would look for `type.rs`, and
/// a module named `mod` would collide with the index file.
fn module_name(table_name: &str) -> String {
    let ident = rust_ident(table_name);
    match ident.strip_prefix("r#") {
        Some(keyword) => format!("{}_", keyword),
        None => ident,
    }
}

/// Rust field names for every column, in ordinal order.
///
/// Names that clash with the structs' own fields get a `_column` suffix;
/// columns that collapse to the same identifier (`name` and `"Name"`) get
/// a numeric suffix in ordinal order.
fn field_idents(model: &TableModel) -> Vec<(String, &ColumnModel)> {
    let mut taken = HashSet::new();
    model
        .all_columns()
        .map(|col| {
            let mut ident = rust_ident(&col.name);
            if RESERVED_FIELDS.contains(&ident.as_str()) {
                ident = format!("{}_column", ident);
            }
            let base = ident.trim_start_matches("r#").to_string();
            let mut n = 2;
            while !taken.insert(ident.clone()) {
                ident = format!("{}_{}", base, n);
                n += 1;
            }
            (ident, col)
        })
        .collect()
}

/// Write `contents` to a sibling temporary file, then rename it into place.
fn write_atomic(path: &Utf8Path, contents: &str) -> std::io::Result<()> {
    let file_name = path.file_name().unwrap_or("artifact");
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
