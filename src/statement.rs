//! Prepared statements
//!
//! A [`Statement`] borrows its [`Connection`](crate::Connection) and wraps
//! one parsed native statement handle. It owns the bind dispatch (scalars,
//! LOB descriptors, cursor handles, named collections, bind arrays), the
//! commit-mode selection around execute, and the fetch engine with its
//! five result shapes.
//!
//! # LOB binds
//!
//! Binding a BLOB or CLOB allocates a descriptor, stages the payload in
//! temporary LOB storage, and defers the actual column write to a save
//! pass that runs after a successful execute, in bind order. While LOB
//! binds are pending the statement always executes without auto-commit;
//! the adapter commits itself after the save pass unless the caller has a
//! transaction open.

use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::connection::Connection;
use crate::error::{Error, ErrorInfo, Result, SQLSTATE_GENERAL, SQLSTATE_SUCCESS};
use crate::fetch::{apply_null_policy, coerce_number, FetchMode, Fetched, ObjectRow};
use crate::native::{
    CommitMode, FieldMeta, LobKind, NativeBindType, NativeError, NativeLob, NativeStatement,
    OracleType,
};
use crate::options::{AttrValue, Attribute, Attributes};
use crate::row::{Row, Value};

/// Placeholder selector for a bind call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Named placeholder, with or without the leading `:`
    Name(String),
    /// 1-based positional index, mapping onto the `:pN` rewrite
    Index(usize),
}

impl Param {
    /// Resolve to the native placeholder name
    fn resolve(&self) -> Result<String> {
        match self {
            Param::Name(name) => {
                if name.is_empty() {
                    return Err(Error::Bind("empty placeholder name".to_string()));
                }
                if name.starts_with(':') {
                    Ok(name.clone())
                } else {
                    Ok(format!(":{}", name))
                }
            }
            Param::Index(0) => Err(Error::Bind(
                "positional parameters are numbered from 1".to_string(),
            )),
            Param::Index(n) => Ok(format!(":p{}", n - 1)),
        }
    }
}

impl From<&str> for Param {
    fn from(name: &str) -> Self {
        Param::Name(name.to_string())
    }
}

impl From<String> for Param {
    fn from(name: String) -> Self {
        Param::Name(name)
    }
}

impl From<usize> for Param {
    fn from(index: usize) -> Self {
        Param::Index(index)
    }
}

/// Declared type of a bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Native boolean
    Bool,
    /// NULL
    Null,
    /// Integer
    Int,
    /// Character data
    Str,
    /// Binary large object
    Blob,
    /// Character large object
    Clob,
    /// OUT result-set cursor
    Stmt,
    /// Named collection object
    Collection,
}

impl ParamType {
    /// Infer a declared type from a value
    fn infer(value: &Value) -> Self {
        match value {
            Value::Null => ParamType::Null,
            Value::Integer(_) => ParamType::Int,
            _ => ParamType::Str,
        }
    }
}

/// Direction of a bound parameter.
///
/// Recorded for callers that track it; the native layer binds every
/// placeholder bidirectionally, so direction does not change dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindDirection {
    /// Input-only
    #[default]
    Input,
    /// Output-only
    Output,
    /// Both directions
    InputOutput,
}

/// Optional metadata for a bind call
#[derive(Debug, Clone, Default)]
pub struct BindOptions {
    /// Maximum bound length; `-1` (engine default) when absent
    pub max_length: Option<i64>,
    /// Owning schema for a collection type
    pub schema: Option<String>,
    /// Named collection type, required for [`ParamType::Collection`]
    pub type_name: Option<String>,
    /// Declared direction
    pub direction: BindDirection,
}

/// Outcome of a bind call.
///
/// Handle-typed binds allocate a native object and bind that instead of
/// the caller's value; `rebound` carries the handle so the caller can keep
/// hold of it (to read an OUT cursor, say).
#[derive(Debug, Clone, Default)]
pub struct BindOutcome {
    /// The value actually bound, when it differs from what was passed in
    pub rebound: Option<Value>,
}

/// One prepared statement on a connection
pub struct Statement<'conn> {
    conn: &'conn Connection,
    sth: Arc<dyn NativeStatement>,
    sql: String,
    attrs: Attributes,
    fetch_mode: FetchMode,
    bindings: Vec<Value>,
    lob_bindings: IndexMap<String, (Bytes, LobKind, Arc<dyn NativeLob>)>,
}

impl<'conn> Statement<'conn> {
    pub(crate) fn new(
        conn: &'conn Connection,
        sth: Arc<dyn NativeStatement>,
        sql: String,
        attrs: Attributes,
    ) -> Self {
        let fetch_mode = attrs.default_fetch_mode;
        Self {
            conn,
            sth,
            sql,
            attrs,
            fetch_mode,
            bindings: Vec::new(),
            lob_bindings: IndexMap::new(),
        }
    }

    /// Bind a value, inferring its declared type
    pub async fn bind_value(&mut self, param: impl Into<Param>, value: Value) -> Result<()> {
        let ptype = ParamType::infer(&value);
        self.bind_param(param, value, ptype, BindOptions::default())
            .await?;
        Ok(())
    }

    /// Bind a parameter with an explicit declared type and options
    pub async fn bind_param(
        &mut self,
        param: impl Into<Param>,
        value: Value,
        ptype: ParamType,
        opts: BindOptions,
    ) -> Result<BindOutcome> {
        let name = param.into().resolve()?;

        let value = match value {
            Value::Array(items) => {
                self.bind_array(Param::Name(name), items, 0, None, ptype)
                    .await?;
                return Ok(BindOutcome::default());
            }
            other => other,
        };

        let outcome = match ptype {
            ParamType::Blob => self.bind_lob(&name, value, LobKind::Blob).await?,
            ParamType::Clob => self.bind_lob(&name, value, LobKind::Clob).await?,
            ParamType::Stmt => {
                let cursor = self
                    .conn
                    .session()
                    .new_cursor()
                    .await
                    .map_err(|e| Error::Bind(e.to_string()))?;
                let bound = Value::Cursor(cursor);
                self.sth
                    .bind_by_name(&name, bound.clone(), -1, NativeBindType::Cursor)
                    .await
                    .map_err(|e| Error::Bind(e.to_string()))?;
                self.bindings.push(bound.clone());
                BindOutcome { rebound: Some(bound) }
            }
            ParamType::Collection => {
                let type_name = opts.type_name.as_deref().ok_or_else(|| {
                    Error::Bind("collection binds require a type name".to_string())
                })?;
                let collection = self
                    .conn
                    .session()
                    .new_collection(type_name, opts.schema.as_deref())
                    .await
                    .map_err(|e| Error::Bind(e.to_string()))?;
                let bound = Value::Collection(collection);
                self.sth
                    .bind_by_name(&name, bound.clone(), -1, NativeBindType::Collection)
                    .await
                    .map_err(|e| Error::Bind(e.to_string()))?;
                self.bindings.push(bound.clone());
                BindOutcome { rebound: Some(bound) }
            }
            ParamType::Bool | ParamType::Null | ParamType::Int | ParamType::Str => {
                let bind_type = match ptype {
                    ParamType::Bool | ParamType::Int => NativeBindType::Int,
                    _ => NativeBindType::Chr,
                };
                self.sth
                    .bind_by_name(&name, value.clone(), opts.max_length.unwrap_or(-1), bind_type)
                    .await
                    .map_err(|e| Error::Bind(e.to_string()))?;
                self.bindings.push(value);
                BindOutcome::default()
            }
        };

        Ok(outcome)
    }

    async fn bind_lob(&mut self, name: &str, value: Value, kind: LobKind) -> Result<BindOutcome> {
        let payload = match value {
            Value::String(s) => Bytes::from(s.into_bytes()),
            Value::Bytes(b) => Bytes::from(b),
            Value::Null => Bytes::new(),
            other => {
                return Err(Error::Bind(format!(
                    "cannot stage {} into LOB storage",
                    other.describe()
                )))
            }
        };

        let lob = self
            .conn
            .session()
            .new_descriptor(kind)
            .await
            .map_err(|e| Error::Bind(e.to_string()))?;
        lob.write_temporary(payload.clone(), kind)
            .await
            .map_err(|e| Error::Bind(e.to_string()))?;

        let bind_type = match kind {
            LobKind::Blob => NativeBindType::Blob,
            LobKind::Clob => NativeBindType::Clob,
        };
        let bound = Value::Lob(lob.clone());
        self.sth
            .bind_by_name(name, bound.clone(), -1, bind_type)
            .await
            .map_err(|e| Error::Bind(e.to_string()))?;

        self.lob_bindings
            .insert(name.to_string(), (payload, kind, lob));
        self.bindings.push(bound.clone());
        Ok(BindOutcome { rebound: Some(bound) })
    }

    /// Bind an array value (engine-side PL/SQL table).
    ///
    /// `max_table_length` of `0` means "as many as provided".
    pub async fn bind_array(
        &mut self,
        param: impl Into<Param>,
        values: Vec<Value>,
        max_table_length: usize,
        max_item_length: Option<usize>,
        ptype: ParamType,
    ) -> Result<()> {
        let name = param.into().resolve()?;
        let bind_type = match ptype {
            ParamType::Int | ParamType::Bool => NativeBindType::Int,
            ParamType::Blob | ParamType::Clob | ParamType::Stmt | ParamType::Collection => {
                return Err(Error::Bind(
                    "array binds are limited to scalar element types".to_string(),
                ))
            }
            _ => NativeBindType::Chr,
        };
        let table_length = if max_table_length == 0 {
            values.len()
        } else {
            max_table_length
        };
        self.sth
            .bind_array_by_name(&name, values.clone(), table_length, max_item_length, bind_type)
            .await
            .map_err(|e| Error::Bind(e.to_string()))?;
        self.bindings.push(Value::Array(values));
        Ok(())
    }

    /// Execute the statement.
    ///
    /// Runs without auto-commit while the connection has a transaction
    /// open or LOB binds are pending; after a successful execute the
    /// pending LOB payloads are saved in bind order, then committed unless
    /// the caller's transaction is still open. A native failure surfaces
    /// as [`Error::Execute`] with the statement text and bound values
    /// attached.
    pub async fn execute(&self) -> Result<()> {
        let mode = if self.conn.in_transaction() || !self.lob_bindings.is_empty() {
            CommitMode::Explicit
        } else {
            CommitMode::OnSuccess
        };

        tracing::trace!(sql = %self.sql, ?mode, "executing");
        if let Err(e) = self.sth.execute(mode).await {
            let native = self.sth.error().unwrap_or(e);
            return Err(self.execute_error(native));
        }

        if !self.lob_bindings.is_empty() {
            for (name, (payload, _, lob)) in &self.lob_bindings {
                lob.save(payload.clone()).await.map_err(|e| {
                    Error::Bind(format!("saving LOB for {} failed: {}", name, e))
                })?;
            }
            if !self.conn.in_transaction() {
                self.conn.commit().await?;
            }
        }

        Ok(())
    }

    /// Bind the given parameters, then execute
    pub async fn execute_with(
        &mut self,
        params: impl IntoIterator<Item = (Param, Value)>,
    ) -> Result<()> {
        for (param, value) in params {
            self.bind_value(param, value).await?;
        }
        self.execute().await
    }

    fn execute_error(&self, mut native: NativeError) -> Error {
        if native.sql_text.is_empty() {
            native.sql_text = self.sql.clone();
        }
        let rendered = self
            .bindings
            .iter()
            .map(Value::describe)
            .collect::<Vec<_>>()
            .join(",");
        Error::execute(native, rendered)
    }

    /// Fetch the next row in the given shape (or the statement's current
    /// fetch mode); `Ok(None)` when the result set is exhausted
    pub async fn fetch(&self, mode: Option<FetchMode>) -> Result<Option<Fetched>> {
        let mode = mode.unwrap_or(self.fetch_mode);
        match mode {
            FetchMode::Num | FetchMode::Column(_) => {
                let Some(values) = self.sth.fetch_row().await.map_err(|e| self.execute_error(e))?
                else {
                    return Ok(None);
                };
                let values = self.load_values(values).await;
                Ok(Some(match mode {
                    FetchMode::Column(index) => {
                        Fetched::Column(values.into_iter().nth(index).unwrap_or(Value::Null))
                    }
                    _ => Fetched::Num(values),
                }))
            }
            FetchMode::Assoc | FetchMode::Both | FetchMode::Object => {
                let Some(row) = self.sth.fetch_assoc().await.map_err(|e| self.execute_error(e))?
                else {
                    return Ok(None);
                };
                let row = self.load_row(row).await;
                Ok(Some(match mode {
                    FetchMode::Assoc => Fetched::Assoc(self.fold_pairs(row)),
                    FetchMode::Both => {
                        let by_index = row.values().to_vec();
                        Fetched::Both {
                            by_name: self.fold_pairs(row),
                            by_index,
                        }
                    }
                    _ => Fetched::Object(self.build_object(row)?),
                }))
            }
        }
    }

    /// Fetch every remaining row.
    ///
    /// Cursor-typed columns are drained in place: the handle is replaced
    /// by an array of its rows, each an array of column values.
    pub async fn fetch_all(&self, mode: Option<FetchMode>) -> Result<Vec<Fetched>> {
        let mut rows = Vec::new();
        while let Some(fetched) = self.fetch(mode).await? {
            rows.push(self.splice_cursors(fetched).await?);
        }
        Ok(rows)
    }

    /// Fetch a single column of the next row.
    ///
    /// Defaults to column 0, or the column of the statement's current
    /// [`FetchMode::Column`] mode.
    pub async fn fetch_column(&self, index: Option<usize>) -> Result<Option<Value>> {
        let index = index.unwrap_or(match self.fetch_mode {
            FetchMode::Column(i) => i,
            _ => 0,
        });
        match self.fetch(Some(FetchMode::Column(index))).await? {
            Some(Fetched::Column(value)) => Ok(Some(value)),
            Some(other) => Ok(other.first_value().cloned()),
            None => Ok(None),
        }
    }

    /// Fetch the next row as an object-shaped row
    pub async fn fetch_object(&self) -> Result<Option<ObjectRow>> {
        match self.fetch(Some(FetchMode::Object)).await? {
            Some(Fetched::Object(row)) => Ok(Some(row)),
            Some(_) => Ok(None),
            None => Ok(None),
        }
    }

    /// Fetch the next row and build a caller type from its fields
    pub async fn fetch_object_with<T>(
        &self,
        builder: impl FnOnce(ObjectRow) -> T,
    ) -> Result<Option<T>> {
        Ok(self.fetch_object().await?.map(builder))
    }

    /// Name-keyed view of a row with the case-folding attribute applied
    fn fold_pairs(&self, row: Row) -> IndexMap<String, Value> {
        row.into_pairs()
            .into_iter()
            .map(|(name, value)| (self.attrs.case.apply(&name), value))
            .collect()
    }

    /// Build the object shape: fold field-name case, normalize nulls and
    /// coerce NUMBER text per the statement attributes
    fn build_object(&self, row: Row) -> Result<ObjectRow> {
        let metas: Vec<Option<FieldMeta>> = (0..row.len()).map(|i| self.sth.field_meta(i)).collect();
        let mut fields = IndexMap::with_capacity(row.len());

        for (index, (name, value)) in row.into_pairs().into_iter().enumerate() {
            let meta = metas.get(index).and_then(|m| m.as_ref());
            if let Some(meta) = meta {
                if meta.oracle_type == OracleType::Rowid && value.is_handle() {
                    return Err(Error::Unsupported(
                        "ROWID descriptors cannot be returned in object rows".to_string(),
                    ));
                }
            }

            let mut value = apply_null_policy(self.attrs.nulls, value);
            if !self.attrs.stringify_fetches
                && meta.map(|m| m.oracle_type == OracleType::Number).unwrap_or(false)
            {
                value = coerce_number(value);
            }
            fields.insert(self.attrs.case.apply(&name), value);
        }

        Ok(ObjectRow::new(fields))
    }

    async fn load_row(&self, row: Row) -> Row {
        let (names, values): (Vec<_>, Vec<_>) = row.into_pairs().into_iter().unzip();
        let values = self.load_values(values).await;
        Row::new(names, values)
    }

    /// Auto-load LOB handles when enabled; a failed load reads as NULL
    async fn load_values(&self, values: Vec<Value>) -> Vec<Value> {
        if !self.attrs.return_lobs {
            return values;
        }
        let mut out = Vec::with_capacity(values.len());
        for value in values {
            out.push(match value {
                Value::Lob(lob) => match lob.load().await {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        tracing::trace!(error = %e, "LOB load failed");
                        Value::Null
                    }
                },
                other => other,
            });
        }
        out
    }

    async fn splice_cursors(&self, fetched: Fetched) -> Result<Fetched> {
        Ok(match fetched {
            Fetched::Num(values) => Fetched::Num(self.splice_values(values).await?),
            Fetched::Column(value) => {
                Fetched::Column(self.splice_value(value).await?)
            }
            Fetched::Assoc(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (name, value) in map {
                    out.insert(name, self.splice_value(value).await?);
                }
                Fetched::Assoc(out)
            }
            Fetched::Both { by_name, by_index } => {
                let mut named = IndexMap::with_capacity(by_name.len());
                for (name, value) in by_name {
                    named.insert(name, self.splice_value(value).await?);
                }
                Fetched::Both {
                    by_name: named,
                    by_index: self.splice_values(by_index).await?,
                }
            }
            Fetched::Object(row) => {
                let mut out = IndexMap::with_capacity(row.len());
                for (name, value) in row.into_fields() {
                    out.insert(name, self.splice_value(value).await?);
                }
                Fetched::Object(ObjectRow::new(out))
            }
        })
    }

    async fn splice_values(&self, values: Vec<Value>) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(values.len());
        for value in values {
            out.push(self.splice_value(value).await?);
        }
        Ok(out)
    }

    async fn splice_value(&self, value: Value) -> Result<Value> {
        let Value::Cursor(handle) = value else {
            return Ok(value);
        };
        handle
            .execute(CommitMode::OnSuccess)
            .await
            .map_err(|e| self.execute_error(e))?;
        let mut rows = Vec::new();
        while let Some(nested) = handle.fetch_row().await.map_err(|e| self.execute_error(e))? {
            rows.push(Value::Array(self.load_values(nested).await));
        }
        Ok(Value::Array(rows))
    }

    /// Rows affected by the last execute (rows fetched so far, for queries)
    pub fn row_count(&self) -> u64 {
        self.sth.num_rows()
    }

    /// Number of result-set columns
    pub fn column_count(&self) -> usize {
        self.sth.num_fields()
    }

    /// Metadata for one result-set column, 0-based
    pub fn column_meta(&self, index: usize) -> Option<FieldMeta> {
        self.sth.field_meta(index)
    }

    /// Select the fetch mode used when none is passed per call
    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }

    /// The statement's current fetch mode
    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    /// Read one statement attribute
    pub fn get_attribute(&self, attribute: Attribute) -> AttrValue {
        self.attrs.get(attribute)
    }

    /// Set one statement attribute; the connection's copy is untouched
    pub fn set_attribute(&mut self, attribute: Attribute, value: AttrValue) -> Result<()> {
        self.attrs.set(attribute, value)?;
        if let Attribute::DefaultFetchMode = attribute {
            self.fetch_mode = self.attrs.default_fetch_mode;
        }
        Ok(())
    }

    /// SQLSTATE-style code for the last statement-level error
    pub fn error_code(&self) -> &'static str {
        match self.sth.error() {
            Some(_) => SQLSTATE_GENERAL,
            None => SQLSTATE_SUCCESS,
        }
    }

    /// Two-tier error record for the last statement-level error
    pub fn error_info(&self) -> ErrorInfo {
        ErrorInfo::from_native(self.sth.error().as_ref())
    }

    /// Release the native statement handle
    pub async fn close_cursor(&self) -> Result<()> {
        self.sth.close().await.map_err(Error::Statement)
    }

    /// Column-to-variable binding is not part of this adapter
    pub fn bind_column(&self, _column: usize) -> Result<()> {
        Err(Error::Unsupported("bind_column".to_string()))
    }

    /// The engine exposes one rowset per statement
    pub fn next_rowset(&self) -> Result<()> {
        Err(Error::Unsupported("next_rowset".to_string()))
    }

    /// Bound-parameter introspection is not available from the native layer
    pub fn debug_dump_params(&self) -> Result<String> {
        Err(Error::Unsupported("debug_dump_params".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_name_resolution() {
        assert_eq!(Param::from(":name").resolve().unwrap(), ":name");
        assert_eq!(Param::from("name").resolve().unwrap(), ":name");
    }

    #[test]
    fn test_param_index_maps_onto_rewrite() {
        assert_eq!(Param::from(1usize).resolve().unwrap(), ":p0");
        assert_eq!(Param::from(3usize).resolve().unwrap(), ":p2");
    }

    #[test]
    fn test_param_index_zero_rejected() {
        assert!(matches!(Param::from(0usize).resolve(), Err(Error::Bind(_))));
    }

    #[test]
    fn test_param_type_inference() {
        assert_eq!(ParamType::infer(&Value::Null), ParamType::Null);
        assert_eq!(ParamType::infer(&Value::Integer(1)), ParamType::Int);
        assert_eq!(ParamType::infer(&Value::String("x".into())), ParamType::Str);
    }
}
