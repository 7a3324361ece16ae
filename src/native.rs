//! Narrow interface to the native client library
//!
//! Everything the adapter needs from the underlying engine is expressed as
//! the capability traits in this module: session, statement, LOB descriptor
//! and collection handles. The adapter never reaches past these traits; a
//! concrete driver (or a scripted fake in tests) implements them.
//!
//! Index convention: the native layer numbers fields from 1, this boundary
//! is 0-based throughout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::row::{Row, Value};

/// Result type for native calls
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Error record as retrieved from the native layer
///
/// Mirrors the engine's error-retrieval call: numeric code, message text,
/// byte offset of the error within the statement, and the statement text.
#[derive(Debug, Clone, Error)]
#[error("ORA-{code:05}: {message}")]
pub struct NativeError {
    /// Engine error code
    pub code: i64,
    /// Engine error message
    pub message: String,
    /// Byte offset of the error within the statement text
    pub offset: u32,
    /// The statement text the error relates to
    pub sql_text: String,
}

impl NativeError {
    /// Create an error record with no statement context
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            offset: 0,
            sql_text: String::new(),
        }
    }
}

/// Execution commit mode
///
/// The engine commits automatically on success unless told otherwise; the
/// adapter's transaction emulation works by picking the mode per execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Commit automatically if the statement succeeds
    #[default]
    OnSuccess,
    /// No automatic commit; an explicit commit/rollback follows later
    Explicit,
}

/// Kind of large-object temporary storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobKind {
    /// Binary large object
    Blob,
    /// Character large object
    Clob,
}

/// Native bind type selected by the adapter's bind dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeBindType {
    /// Integer bind
    Int,
    /// Character bind
    #[default]
    Chr,
    /// Binary LOB descriptor bind
    Blob,
    /// Character LOB descriptor bind
    Clob,
    /// Cursor (result set) bind
    Cursor,
    /// Named collection type bind
    Collection,
}

/// Session privilege mode requested at connect time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Ordinary session
    #[default]
    Default,
    /// SYSDBA privileged session
    SysDba,
    /// SYSOPER privileged session
    SysOper,
}

/// Native column type, reduced to what the fetch engine dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OracleType {
    /// VARCHAR2 / CHAR
    #[default]
    Varchar,
    /// NUMBER
    Number,
    /// DATE / TIMESTAMP family
    Date,
    /// RAW
    Raw,
    /// LONG
    Long,
    /// CLOB
    Clob,
    /// BLOB
    Blob,
    /// ROWID
    Rowid,
    /// Nested cursor
    Cursor,
    /// Anything the adapter does not special-case
    Other,
}

/// Metadata for one result-set field
#[derive(Debug, Clone)]
pub struct FieldMeta {
    /// Field name as reported by the engine (native casing)
    pub name: String,
    /// Native type
    pub oracle_type: OracleType,
    /// Declared size in bytes
    pub size: u32,
    /// Numeric precision, when applicable
    pub precision: i16,
    /// Whether NULLs are allowed
    pub nullable: bool,
}

impl FieldMeta {
    /// Create metadata with minimal info
    pub fn new(name: impl Into<String>, oracle_type: OracleType) -> Self {
        Self {
            name: name.into(),
            oracle_type,
            size: 0,
            precision: 0,
            nullable: true,
        }
    }
}

/// Parameters for one native connect attempt, fully resolved by the adapter
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: String,
    /// Engine connect string (`host[:port]/service` or a bare service name)
    pub connect_string: String,
    /// Session character set
    pub charset: String,
    /// Session privilege mode
    pub session_mode: SessionMode,
    /// Reuse a shared persistent session when the driver supports it
    pub persistent: bool,
    /// Bypass any session cache and force a new session
    pub force_new: bool,
}

/// Outcome of a native connect attempt
///
/// The engine can hand back a usable session together with a warning record
/// (password-expiry style); that case is distinct from a hard failure.
pub struct NativeHandle {
    /// The established session
    pub session: Arc<dyn NativeSession>,
    /// Warning raised during connect, if any
    pub warning: Option<NativeError>,
}

/// Entry point a concrete native client implements
#[async_trait]
pub trait NativeDriver: Send + Sync {
    /// Establish a session
    async fn connect(&self, params: &ConnectParams) -> NativeResult<NativeHandle>;
}

/// One native session
#[async_trait]
pub trait NativeSession: Send + Sync {
    /// Parse a statement, returning a statement handle
    async fn parse(&self, sql: &str) -> NativeResult<Arc<dyn NativeStatement>>;

    /// Commit the session's current transaction
    async fn commit(&self) -> NativeResult<()>;

    /// Roll back the session's current transaction
    async fn rollback(&self) -> NativeResult<()>;

    /// Error record from the last operation on this session, if any
    fn error(&self) -> Option<NativeError>;

    /// Allocate a fresh cursor handle for OUT result-set binds
    async fn new_cursor(&self) -> NativeResult<Arc<dyn NativeStatement>>;

    /// Allocate a LOB descriptor
    async fn new_descriptor(&self, kind: LobKind) -> NativeResult<Arc<dyn NativeLob>>;

    /// Allocate a named collection object; `schema` defaults to the
    /// current user when absent
    async fn new_collection(
        &self,
        type_name: &str,
        schema: Option<&str>,
    ) -> NativeResult<Arc<dyn NativeCollection>>;

    /// Advisory round-trip timeout passed straight through to the engine
    async fn set_call_timeout(&self, timeout: Duration) -> NativeResult<()>;

    /// Release the session
    async fn close(&self) -> NativeResult<()>;
}

/// One parsed native statement
#[async_trait]
pub trait NativeStatement: Send + Sync {
    /// Bind a scalar (or handle) value by placeholder name
    async fn bind_by_name(
        &self,
        name: &str,
        value: Value,
        max_length: i64,
        bind_type: NativeBindType,
    ) -> NativeResult<()>;

    /// Bind an array value by placeholder name
    async fn bind_array_by_name(
        &self,
        name: &str,
        values: Vec<Value>,
        max_table_length: usize,
        max_item_length: Option<usize>,
        bind_type: NativeBindType,
    ) -> NativeResult<()>;

    /// Execute with the given commit mode
    async fn execute(&self, mode: CommitMode) -> NativeResult<()>;

    /// Fetch the next row as an ordered value list; `None` when exhausted
    async fn fetch_row(&self) -> NativeResult<Option<Vec<Value>>>;

    /// Fetch the next row with field names attached; `None` when exhausted
    async fn fetch_assoc(&self) -> NativeResult<Option<Row>>;

    /// Rows affected by the last execute (or fetched so far for queries)
    fn num_rows(&self) -> u64;

    /// Number of result-set fields
    fn num_fields(&self) -> usize;

    /// Metadata for one field, 0-based
    fn field_meta(&self, index: usize) -> Option<FieldMeta>;

    /// Error record from the last operation on this statement, if any
    fn error(&self) -> Option<NativeError>;

    /// Release the statement handle
    async fn close(&self) -> NativeResult<()>;
}

/// One LOB descriptor
#[async_trait]
pub trait NativeLob: Send + Sync {
    /// Stage data into temporary LOB storage
    async fn write_temporary(&self, data: Bytes, kind: LobKind) -> NativeResult<()>;

    /// Load the LOB's content (a string value for CLOBs, bytes for BLOBs)
    async fn load(&self) -> NativeResult<Value>;

    /// Persist the buffered content into the bound column
    async fn save(&self, data: Bytes) -> NativeResult<()>;
}

/// One allocated collection object
pub trait NativeCollection: Send + Sync {
    /// The named type this collection was allocated for
    fn type_name(&self) -> &str;
}
