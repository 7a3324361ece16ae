//! Scripted in-memory native engine shared by the integration tests
//!
//! Implements the native capability traits over canned results: each
//! script matches statements by substring and supplies columns, rows,
//! an affected-row count and optional parse/execute failures. Sessions
//! record commits, rollbacks, bind calls and execute modes so tests can
//! assert on the adapter's native traffic.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use oracle_dbal::native::{
    CommitMode, ConnectParams, FieldMeta, LobKind, NativeBindType, NativeCollection, NativeDriver,
    NativeError, NativeHandle, NativeLob, NativeResult, NativeSession, NativeStatement,
    OracleType,
};
use oracle_dbal::{Row, Value};

/// Canned outcome for statements matching one script
#[derive(Clone, Default)]
pub struct ScriptedResult {
    pub columns: Vec<FieldMeta>,
    pub rows: Vec<Vec<Value>>,
    pub affected: u64,
    pub parse_error: Option<NativeError>,
    pub execute_error: Option<NativeError>,
}

/// Substring-matched script entry
#[derive(Clone)]
pub struct Script {
    pub needle: String,
    pub result: ScriptedResult,
}

impl Script {
    pub fn new(needle: &str, result: ScriptedResult) -> Self {
        Self {
            needle: needle.to_string(),
            result,
        }
    }

    /// A query script with the given columns and rows
    pub fn rows(needle: &str, columns: Vec<FieldMeta>, rows: Vec<Vec<Value>>) -> Self {
        Self::new(
            needle,
            ScriptedResult {
                columns,
                rows,
                ..ScriptedResult::default()
            },
        )
    }

    /// A DML script reporting an affected-row count
    pub fn affected(needle: &str, affected: u64) -> Self {
        Self::new(
            needle,
            ScriptedResult {
                affected,
                ..ScriptedResult::default()
            },
        )
    }

    /// A script whose execute fails
    pub fn failing(needle: &str, error: NativeError) -> Self {
        Self::new(
            needle,
            ScriptedResult {
                execute_error: Some(error),
                ..ScriptedResult::default()
            },
        )
    }
}

pub fn meta(name: &str, oracle_type: OracleType) -> FieldMeta {
    FieldMeta::new(name, oracle_type)
}

/// Scripted driver handing out one shared session
pub struct FakeDriver {
    pub session: Arc<FakeSession>,
    pub warning: Option<NativeError>,
    pub connect_error: Option<NativeError>,
    pub last_params: Mutex<Option<ConnectParams>>,
}

impl FakeDriver {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            session: Arc::new(FakeSession::new(scripts)),
            warning: None,
            connect_error: None,
            last_params: Mutex::new(None),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_warning(scripts: Vec<Script>, warning: NativeError) -> Self {
        let mut driver = Self::new(scripts);
        driver.warning = Some(warning);
        driver
    }

    pub fn failing(error: NativeError) -> Self {
        let mut driver = Self::empty();
        driver.connect_error = Some(error);
        driver
    }
}

#[async_trait]
impl NativeDriver for FakeDriver {
    async fn connect(&self, params: &ConnectParams) -> NativeResult<NativeHandle> {
        *self.last_params.lock().unwrap() = Some(params.clone());
        if let Some(e) = &self.connect_error {
            return Err(e.clone());
        }
        Ok(NativeHandle {
            session: self.session.clone(),
            warning: self.warning.clone(),
        })
    }
}

/// Scripted session recording all native traffic
pub struct FakeSession {
    scripts: Mutex<Vec<Script>>,
    pub statements: Mutex<Vec<Arc<FakeStatement>>>,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub lobs: Mutex<Vec<Arc<FakeLob>>>,
    pub collections: Mutex<Vec<Arc<FakeCollection>>>,
    pub call_timeout: Mutex<Option<Duration>>,
    pub last_error: Mutex<Option<NativeError>>,
    pub closed: AtomicBool,
}

impl FakeSession {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            statements: Mutex::new(Vec::new()),
            commits: AtomicUsize::new(0),
            rollbacks: AtomicUsize::new(0),
            lobs: Mutex::new(Vec::new()),
            collections: Mutex::new(Vec::new()),
            call_timeout: Mutex::new(None),
            last_error: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn add_script(&self, script: Script) {
        self.scripts.lock().unwrap().push(script);
    }

    fn lookup(&self, sql: &str) -> ScriptedResult {
        self.scripts
            .lock()
            .unwrap()
            .iter()
            .find(|s| sql.contains(s.needle.as_str()))
            .map(|s| s.result.clone())
            .unwrap_or_default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    /// The most recently parsed statement
    pub fn last_statement(&self) -> Arc<FakeStatement> {
        self.statements
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no statement parsed")
    }
}

#[async_trait]
impl NativeSession for FakeSession {
    async fn parse(&self, sql: &str) -> NativeResult<Arc<dyn NativeStatement>> {
        let result = self.lookup(sql);
        if let Some(e) = result.parse_error.clone() {
            *self.last_error.lock().unwrap() = Some(e.clone());
            return Err(e);
        }
        let stmt = Arc::new(FakeStatement::new(sql.to_string(), result));
        self.statements.lock().unwrap().push(stmt.clone());
        Ok(stmt)
    }

    async fn commit(&self) -> NativeResult<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> NativeResult<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn error(&self) -> Option<NativeError> {
        self.last_error.lock().unwrap().clone()
    }

    async fn new_cursor(&self) -> NativeResult<Arc<dyn NativeStatement>> {
        let stmt = Arc::new(FakeStatement::new(
            String::new(),
            ScriptedResult::default(),
        ));
        self.statements.lock().unwrap().push(stmt.clone());
        Ok(stmt)
    }

    async fn new_descriptor(&self, kind: LobKind) -> NativeResult<Arc<dyn NativeLob>> {
        let lob = Arc::new(FakeLob::new(kind));
        self.lobs.lock().unwrap().push(lob.clone());
        Ok(lob)
    }

    async fn new_collection(
        &self,
        type_name: &str,
        schema: Option<&str>,
    ) -> NativeResult<Arc<dyn NativeCollection>> {
        let collection = Arc::new(FakeCollection {
            type_name: type_name.to_string(),
            schema: schema.map(str::to_string),
        });
        self.collections.lock().unwrap().push(collection.clone());
        Ok(collection)
    }

    async fn set_call_timeout(&self, timeout: Duration) -> NativeResult<()> {
        *self.call_timeout.lock().unwrap() = Some(timeout);
        Ok(())
    }

    async fn close(&self) -> NativeResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted statement with recorded binds and execute modes
pub struct FakeStatement {
    pub sql: String,
    columns: Vec<FieldMeta>,
    pending: Mutex<VecDeque<Vec<Value>>>,
    affected: u64,
    execute_error: Option<NativeError>,
    pub binds: Mutex<Vec<(String, Value, i64, NativeBindType)>>,
    pub array_binds: Mutex<Vec<(String, Vec<Value>, usize, Option<usize>, NativeBindType)>>,
    pub execute_modes: Mutex<Vec<CommitMode>>,
    pub last_error: Mutex<Option<NativeError>>,
    fetched: AtomicU64,
    pub closed: AtomicBool,
}

impl FakeStatement {
    pub fn new(sql: String, result: ScriptedResult) -> Self {
        Self {
            sql,
            columns: result.columns,
            pending: Mutex::new(result.rows.into()),
            affected: result.affected,
            execute_error: result.execute_error,
            binds: Mutex::new(Vec::new()),
            array_binds: Mutex::new(Vec::new()),
            execute_modes: Mutex::new(Vec::new()),
            last_error: Mutex::new(None),
            fetched: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// A standalone statement preloaded with rows, for cursor-handle tests
    pub fn with_rows(columns: Vec<FieldMeta>, rows: Vec<Vec<Value>>) -> Arc<Self> {
        Arc::new(Self::new(
            String::new(),
            ScriptedResult {
                columns,
                rows,
                ..ScriptedResult::default()
            },
        ))
    }

    pub fn bound(&self, name: &str) -> Option<Value> {
        self.binds
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(n, ..)| n == name)
            .map(|(_, v, ..)| v.clone())
    }

    pub fn modes(&self) -> Vec<CommitMode> {
        self.execute_modes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeStatement for FakeStatement {
    async fn bind_by_name(
        &self,
        name: &str,
        value: Value,
        max_length: i64,
        bind_type: NativeBindType,
    ) -> NativeResult<()> {
        self.binds
            .lock()
            .unwrap()
            .push((name.to_string(), value, max_length, bind_type));
        Ok(())
    }

    async fn bind_array_by_name(
        &self,
        name: &str,
        values: Vec<Value>,
        max_table_length: usize,
        max_item_length: Option<usize>,
        bind_type: NativeBindType,
    ) -> NativeResult<()> {
        self.array_binds.lock().unwrap().push((
            name.to_string(),
            values,
            max_table_length,
            max_item_length,
            bind_type,
        ));
        Ok(())
    }

    async fn execute(&self, mode: CommitMode) -> NativeResult<()> {
        self.execute_modes.lock().unwrap().push(mode);
        if let Some(e) = &self.execute_error {
            *self.last_error.lock().unwrap() = Some(e.clone());
            return Err(e.clone());
        }
        Ok(())
    }

    async fn fetch_row(&self) -> NativeResult<Option<Vec<Value>>> {
        let row = self.pending.lock().unwrap().pop_front();
        if row.is_some() {
            self.fetched.fetch_add(1, Ordering::SeqCst);
        }
        Ok(row)
    }

    async fn fetch_assoc(&self) -> NativeResult<Option<Row>> {
        let Some(values) = self.pending.lock().unwrap().pop_front() else {
            return Ok(None);
        };
        self.fetched.fetch_add(1, Ordering::SeqCst);
        let names = self.columns.iter().map(|c| c.name.clone()).collect();
        Ok(Some(Row::new(names, values)))
    }

    fn num_rows(&self) -> u64 {
        if self.columns.is_empty() {
            self.affected
        } else {
            self.fetched.load(Ordering::SeqCst)
        }
    }

    fn num_fields(&self) -> usize {
        self.columns.len()
    }

    fn field_meta(&self, index: usize) -> Option<FieldMeta> {
        self.columns.get(index).cloned()
    }

    fn error(&self) -> Option<NativeError> {
        self.last_error.lock().unwrap().clone()
    }

    async fn close(&self) -> NativeResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// LOB descriptor storing staged and saved payloads
pub struct FakeLob {
    pub kind: LobKind,
    pub temporary: Mutex<Option<Bytes>>,
    pub saved: Mutex<Option<Bytes>>,
    content: Mutex<Option<Value>>,
    load_error: Mutex<Option<NativeError>>,
}

impl FakeLob {
    pub fn new(kind: LobKind) -> Self {
        Self {
            kind,
            temporary: Mutex::new(None),
            saved: Mutex::new(None),
            content: Mutex::new(None),
            load_error: Mutex::new(None),
        }
    }

    /// A descriptor whose `load` returns canned content, for fetch tests
    pub fn with_content(kind: LobKind, content: Value) -> Arc<Self> {
        let lob = Self::new(kind);
        *lob.content.lock().unwrap() = Some(content);
        Arc::new(lob)
    }

    /// A descriptor whose `load` fails
    pub fn with_load_error(kind: LobKind, error: NativeError) -> Arc<Self> {
        let lob = Self::new(kind);
        *lob.load_error.lock().unwrap() = Some(error);
        Arc::new(lob)
    }

    pub fn saved_bytes(&self) -> Option<Bytes> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeLob for FakeLob {
    async fn write_temporary(&self, data: Bytes, _kind: LobKind) -> NativeResult<()> {
        *self.temporary.lock().unwrap() = Some(data);
        Ok(())
    }

    async fn load(&self) -> NativeResult<Value> {
        if let Some(e) = self.load_error.lock().unwrap().clone() {
            return Err(e);
        }
        if let Some(content) = self.content.lock().unwrap().clone() {
            return Ok(content);
        }
        match self.temporary.lock().unwrap().clone() {
            Some(data) => Ok(match self.kind {
                LobKind::Clob => Value::String(String::from_utf8_lossy(&data).into_owned()),
                LobKind::Blob => Value::Bytes(data.to_vec()),
            }),
            None => Ok(Value::Null),
        }
    }

    async fn save(&self, data: Bytes) -> NativeResult<()> {
        *self.saved.lock().unwrap() = Some(data);
        Ok(())
    }
}

/// Named collection object
pub struct FakeCollection {
    pub type_name: String,
    pub schema: Option<String>,
}

impl NativeCollection for FakeCollection {
    fn type_name(&self) -> &str {
        &self.type_name
    }
}
