//! # oracle-dbal
//!
//! A userspace adapter that layers a generic database-access contract on
//! top of a native Oracle client session: DSN normalization, positional
//! placeholder rewriting, emulated transactions, a typed bind dispatch
//! (scalars, LOBs, cursors, collections, bind arrays), a multi-shape fetch
//! engine and a two-tier error surface.
//!
//! The native client is reached only through the capability traits in
//! [`native`]; any implementation of [`native::NativeDriver`] plugs in,
//! which is also how the test suite substitutes a scripted engine.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use oracle_dbal::{Connection, FetchMode, Value};
//! # use oracle_dbal::native::NativeDriver;
//!
//! # async fn example(driver: &dyn NativeDriver) -> oracle_dbal::Result<()> {
//! let conn = Connection::connect(
//!     driver,
//!     "oci:host=dbhost;port=1521;dbname=XE",
//!     "scott",
//!     "tiger",
//! )
//! .await?;
//!
//! let mut stmt = conn.prepare("SELECT name, age FROM person WHERE id = ?").await?;
//! stmt.bind_value(1usize, Value::Integer(7)).await?;
//! stmt.execute().await?;
//!
//! while let Some(row) = stmt.fetch(Some(FetchMode::Assoc)).await? {
//!     println!("{:?}", row);
//! }
//!
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transactions
//!
//! The engine auto-commits each successful execute. [`Connection::begin_transaction`]
//! switches the connection to explicit-commit execution until
//! [`Connection::commit`] or [`Connection::rollback`] is called:
//!
//! ```rust,no_run
//! # async fn example(conn: &oracle_dbal::Connection) -> oracle_dbal::Result<()> {
//! conn.begin_transaction().await?;
//! conn.exec("UPDATE account SET balance = balance - 10 WHERE id = 1").await?;
//! conn.exec("UPDATE account SET balance = balance + 10 WHERE id = 2").await?;
//! conn.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod dsn;
pub mod error;
pub mod fetch;
pub mod native;
pub mod options;
pub mod rewrite;
pub mod row;
pub mod statement;

pub use connection::Connection;
pub use dsn::{parse_dsn, resolve_charset, AliasResolver, DsnParams, NoAliases, DEFAULT_CHARSET};
pub use error::{Error, ErrorInfo, Result, SQLSTATE_GENERAL, SQLSTATE_SUCCESS};
pub use fetch::{FetchMode, Fetched, ObjectRow};
pub use options::{AttrValue, Attribute, Attributes, CaseFolding, NullHandling, DRIVER_NAME};
pub use rewrite::{rewrite, Rewritten};
pub use row::{Row, Value};
pub use statement::{BindDirection, BindOptions, BindOutcome, Param, ParamType, Statement};
