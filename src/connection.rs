//! Connection management
//!
//! A [`Connection`] wraps one native session and layers the generic
//! driver contract on top: DSN normalization at connect time, statement
//! preparation with placeholder rewriting, emulated transactions, quoting,
//! last-insert-id emulation and the two-tier error surface.
//!
//! # Transactions
//!
//! The engine has no explicit "begin"; it auto-commits each successful
//! execute unless asked not to. The adapter therefore emulates the begin /
//! commit / rollback contract with a flag: while a transaction is active,
//! every execute runs in [`CommitMode::Explicit`], and `commit` /
//! `rollback` issue the real engine calls and clear the flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::dsn::{self, AliasResolver, NoAliases};
use crate::error::{Error, ErrorInfo, Result, SQLSTATE_GENERAL, SQLSTATE_SUCCESS};
use crate::fetch::FetchMode;
use crate::native::{ConnectParams, NativeDriver, NativeSession};
use crate::options::{AttrValue, Attribute, Attributes};
use crate::rewrite;
use crate::row::Value;
use crate::statement::Statement;

/// One adapter connection over a native session
pub struct Connection {
    session: Arc<dyn NativeSession>,
    attrs: Mutex<Attributes>,
    in_txn: AtomicBool,
    last_insert_table: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl Connection {
    /// Connect with default attributes and no alias resolution.
    ///
    /// See [`Connection::connect_with`] for the full-control variant.
    pub async fn connect(
        driver: &dyn NativeDriver,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        Self::connect_with(driver, dsn, username, password, Attributes::default(), &NoAliases)
            .await
    }

    /// Connect, supplying attributes and an alias resolver.
    ///
    /// The DSN is normalized first (descriptor, `uri:` indirection or
    /// alias), then the session character set is resolved: descriptor
    /// charset wins over the charset attribute, which wins over the
    /// default. A connect-time warning whose message matches the ignore
    /// list is swallowed; any other warning is raised as a
    /// [`Error::Connection`] even though the engine handed back a session.
    pub async fn connect_with(
        driver: &dyn NativeDriver,
        dsn: &str,
        username: &str,
        password: &str,
        attrs: Attributes,
        resolver: &dyn AliasResolver,
    ) -> Result<Self> {
        let params = dsn::parse_dsn(dsn, resolver)?;
        let charset = dsn::resolve_charset(params.charset.as_deref(), attrs.charset.as_deref());

        let connect = ConnectParams {
            username: username.to_string(),
            password: password.to_string(),
            connect_string: params.connect_string,
            charset,
            session_mode: attrs.session_mode,
            persistent: attrs.persistent,
            force_new: attrs.force_new,
        };

        tracing::debug!(connect_string = %connect.connect_string, "connecting");
        let handle = driver.connect(&connect).await.map_err(Error::Connection)?;

        if let Some(warning) = handle.warning {
            if attrs.ignores_connect_warning(&warning.message) {
                tracing::debug!(code = warning.code, "ignoring connect warning");
            } else {
                return Err(Error::Connection(warning));
            }
        }

        Ok(Self {
            session: handle.session,
            attrs: Mutex::new(attrs),
            in_txn: AtomicBool::new(false),
            last_insert_table: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Prepare a statement.
    ///
    /// Positional `?` placeholders are rewritten to named `:pN` ones
    /// before the native parse; an `INSERT INTO` target table is recorded
    /// for [`Connection::last_insert_id`]. The statement inherits the
    /// connection's current attributes.
    pub async fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        self.prepare_with(sql, self.attributes()).await
    }

    /// Prepare a statement with per-statement attribute overrides
    pub async fn prepare_with(&self, sql: &str, attrs: Attributes) -> Result<Statement<'_>> {
        let rewritten = rewrite::rewrite(sql);
        if let Some(table) = rewritten.insert_table {
            if let Ok(mut last) = self.last_insert_table.lock() {
                *last = Some(table);
            }
        }

        tracing::trace!(sql = %rewritten.sql, "preparing statement");
        let sth = self
            .session
            .parse(&rewritten.sql)
            .await
            .map_err(Error::Statement)?;
        Ok(Statement::new(self, sth, rewritten.sql, attrs))
    }

    /// Prepare, execute and return the statement ready for fetching
    pub async fn query(&self, sql: &str, mode: Option<FetchMode>) -> Result<Statement<'_>> {
        let mut stmt = self.prepare(sql).await?;
        if let Some(mode) = mode {
            stmt.set_fetch_mode(mode);
        }
        stmt.execute().await?;
        Ok(stmt)
    }

    /// Execute a statement directly, returning the number of affected rows
    pub async fn exec(&self, sql: &str) -> Result<u64> {
        let stmt = self.prepare(sql).await?;
        stmt.execute().await?;
        Ok(stmt.row_count())
    }

    /// Begin an emulated transaction.
    ///
    /// Fails when a transaction is already active.
    pub async fn begin_transaction(&self) -> Result<()> {
        if self
            .in_txn
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Transaction(
                "there is already an active transaction".to_string(),
            ));
        }
        tracing::trace!("transaction started");
        Ok(())
    }

    /// Commit the current transaction.
    ///
    /// The commit is forwarded to the engine even when no emulated
    /// transaction is active; sessions touched through LOB writes or
    /// explicit-mode executes may still hold uncommitted work.
    pub async fn commit(&self) -> Result<()> {
        self.session
            .commit()
            .await
            .map_err(|e| Error::Transaction(e.to_string()))?;
        self.in_txn.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Roll back the current transaction.
    ///
    /// Unlike [`Connection::commit`], rolling back without an active
    /// transaction is rejected.
    pub async fn rollback(&self) -> Result<()> {
        if !self.in_txn.load(Ordering::SeqCst) {
            return Err(Error::Transaction("there is no active transaction".to_string()));
        }
        self.session
            .rollback()
            .await
            .map_err(|e| Error::Transaction(e.to_string()))?;
        self.in_txn.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Whether an emulated transaction is active
    pub fn in_transaction(&self) -> bool {
        self.in_txn.load(Ordering::SeqCst)
    }

    /// Last-insert-id emulation through sequences.
    ///
    /// With no `sequence` argument the default `<table>_id_seq` name is
    /// derived from the most recent `INSERT INTO` target prepared on this
    /// connection; `0` is returned when no insert has been seen, or when
    /// the sequence does not exist in the data dictionary.
    pub async fn last_insert_id(&self, sequence: Option<&str>) -> Result<Value> {
        let name = match sequence {
            Some(name) => name.to_string(),
            None => {
                let table = match self.last_insert_table.lock() {
                    Ok(last) => last.clone(),
                    Err(_) => None,
                };
                match table {
                    Some(table) => format!("{}_id_seq", table),
                    None => return Ok(Value::Integer(0)),
                }
            }
        };

        if !self.sequence_exists(&name).await {
            return Ok(Value::Integer(0));
        }

        let sql = format!("SELECT {}.CURRVAL FROM DUAL", name);
        let stmt = self.query(&sql, Some(FetchMode::Column(0))).await?;
        match stmt.fetch_column(None).await? {
            Some(value) => Ok(value),
            None => Ok(Value::Integer(0)),
        }
    }

    /// Probe the data dictionary for a sequence; any failure reads as
    /// "does not exist"
    async fn sequence_exists(&self, name: &str) -> bool {
        let result = async {
            let mut stmt = self
                .prepare("SELECT COUNT(*) FROM ALL_SEQUENCES WHERE SEQUENCE_NAME = :name")
                .await?;
            stmt.bind_value(":name", Value::String(name.to_uppercase()))
                .await?;
            stmt.execute().await?;
            stmt.fetch_column(None).await
        }
        .await;

        match result {
            Ok(Some(count)) => count.as_i64().unwrap_or(0) > 0,
            Ok(None) => false,
            Err(e) => {
                tracing::trace!(error = %e, "sequence probe failed");
                false
            }
        }
    }

    /// Quote a string literal.
    ///
    /// Single quotes are doubled and the result wrapped in single quotes.
    /// When the numeric passthrough attribute is enabled, a plain decimal
    /// value is returned unchanged.
    pub fn quote(&self, value: &str) -> String {
        let passthrough = self
            .attrs
            .lock()
            .map(|a| a.numeric_quote_passthrough)
            .unwrap_or(false);
        if passthrough && is_plain_decimal(value) {
            return value.to_string();
        }
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Read one connection attribute
    pub fn get_attribute(&self, attribute: Attribute) -> AttrValue {
        match self.attrs.lock() {
            Ok(attrs) => attrs.get(attribute),
            Err(_) => AttrValue::None,
        }
    }

    /// Set one connection attribute
    pub fn set_attribute(&self, attribute: Attribute, value: AttrValue) -> Result<()> {
        let mut attrs = self
            .attrs
            .lock()
            .map_err(|_| Error::Configuration("attribute lock poisoned".to_string()))?;
        attrs.set(attribute, value)
    }

    /// Advisory round-trip timeout, forwarded to the engine
    pub async fn set_call_timeout(&self, timeout: Duration) -> Result<()> {
        self.session
            .set_call_timeout(timeout)
            .await
            .map_err(Error::Connection)
    }

    /// SQLSTATE-style code for the last session-level error
    pub fn error_code(&self) -> &'static str {
        if self.closed.load(Ordering::SeqCst) {
            return SQLSTATE_SUCCESS;
        }
        match self.session.error() {
            Some(_) => SQLSTATE_GENERAL,
            None => SQLSTATE_SUCCESS,
        }
    }

    /// Two-tier error record for the last session-level error
    pub fn error_info(&self) -> ErrorInfo {
        if self.closed.load(Ordering::SeqCst) {
            return ErrorInfo::success();
        }
        ErrorInfo::from_native(self.session.error().as_ref())
    }

    /// Release the session. Subsequent calls are no-ops.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.session
            .close()
            .await
            .map_err(Error::Connection)?;
        Ok(())
    }

    pub(crate) fn session(&self) -> &Arc<dyn NativeSession> {
        &self.session
    }

    pub(crate) fn attributes(&self) -> Attributes {
        match self.attrs.lock() {
            Ok(attrs) => attrs.clone(),
            Err(_) => Attributes::default(),
        }
    }
}

/// A value safe to pass through unquoted: optional sign, digits, at most
/// one decimal point, no leading-zero ambiguity beyond `0.x`
fn is_plain_decimal(value: &str) -> bool {
    let body = value.strip_prefix('-').unwrap_or(value);
    if body.is_empty() {
        return false;
    }
    let mut dots = 0;
    for ch in body.chars() {
        match ch {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    if dots > 1 || body.starts_with('.') || body.ends_with('.') {
        return false;
    }
    // "007" quoted; "0" and "0.5" pass
    !(body.len() > 1 && body.starts_with('0') && !body.starts_with("0."))
}
