//! Connection string normalization
//!
//! The adapter accepts several connection-string dialects and reduces all
//! of them to an engine connect string plus an optional character set:
//!
//! - `oci:host=H;port=P;dbname=D;charset=C` or `oci:dbname=D` (any
//!   `driver:` prefix is accepted the same way)
//! - `uri:<path>` where the file at `<path>` contains another DSN
//! - a bare alias looked up through an [`AliasResolver`]
//!
//! Alias lookup is injected rather than ambient so tests (and embedders)
//! control resolution.

use std::collections::HashMap;
use std::fs;

use crate::error::{Error, Result};

/// Default session character set
pub const DEFAULT_CHARSET: &str = "AL32UTF8";

/// Maximum `uri:`/alias indirection depth before giving up
const MAX_DEPTH: usize = 8;

/// Normalized connection parameters extracted from a DSN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsnParams {
    /// Engine connect string: `host[:port]/dbname`, or `dbname` alone
    pub connect_string: String,
    /// Character set named in the descriptor, if any
    pub charset: Option<String>,
}

/// Resolves bare DSN aliases to full DSN strings
pub trait AliasResolver {
    /// Look up an alias; `None` means unknown
    fn resolve(&self, alias: &str) -> Option<String>;
}

/// Resolver that knows no aliases
pub struct NoAliases;

impl AliasResolver for NoAliases {
    fn resolve(&self, _alias: &str) -> Option<String> {
        None
    }
}

impl AliasResolver for HashMap<String, String> {
    fn resolve(&self, alias: &str) -> Option<String> {
        self.get(alias).cloned()
    }
}

/// Parse a DSN in any accepted dialect into connection parameters
pub fn parse_dsn(dsn: &str, resolver: &dyn AliasResolver) -> Result<DsnParams> {
    parse_at_depth(dsn, resolver, 0)
}

fn parse_at_depth(dsn: &str, resolver: &dyn AliasResolver, depth: usize) -> Result<DsnParams> {
    if depth >= MAX_DEPTH {
        return Err(Error::Configuration(format!(
            "DSN indirection too deep (more than {} levels)",
            MAX_DEPTH
        )));
    }

    if let Some((driver, rest)) = dsn.split_once(':') {
        if driver == "uri" {
            let contents = fs::read_to_string(rest).map_err(|e| {
                Error::Configuration(format!("cannot read DSN file {}: {}", rest, e))
            })?;
            return parse_at_depth(contents.trim(), resolver, depth + 1);
        }
        return parse_descriptor(rest);
    }

    let alias = dsn.trim();
    if alias.is_empty() {
        return Err(Error::Configuration("empty DSN".to_string()));
    }
    match resolver.resolve(alias) {
        Some(resolved) => parse_at_depth(&resolved, resolver, depth + 1),
        None => Err(Error::Configuration(format!("unknown DSN alias: {}", alias))),
    }
}

/// Parse the `;`-delimited `key=value` section after the driver prefix
fn parse_descriptor(params: &str) -> Result<DsnParams> {
    let mut host = None;
    let mut port = None;
    let mut dbname = None;
    let mut charset = None;

    for pair in params.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key.trim() {
            "host" => host = Some(value.trim().to_string()),
            "port" => port = Some(value.trim().to_string()),
            "dbname" => dbname = Some(value.trim().to_string()),
            "charset" => charset = Some(value.trim().to_string()),
            // Unrecognized keys are ignored, matching the generic grammar
            _ => {}
        }
    }

    let dbname = match dbname {
        Some(d) if !d.is_empty() => d,
        _ => {
            return Err(Error::Configuration(
                "DSN descriptor is missing a dbname".to_string(),
            ))
        }
    };

    let connect_string = match (host, port) {
        (Some(h), Some(p)) if !h.is_empty() => format!("{}:{}/{}", h, p, dbname),
        (Some(h), None) if !h.is_empty() => format!("{}/{}", h, dbname),
        _ => dbname,
    };

    Ok(DsnParams {
        connect_string,
        charset,
    })
}

/// Resolve the session character set.
///
/// Precedence: charset named in the connect descriptor, then the charset
/// attribute, then [`DEFAULT_CHARSET`]. A `utf8` value (any case) is
/// canonicalized to `AL32UTF8`.
pub fn resolve_charset(descriptor: Option<&str>, attribute: Option<&str>) -> String {
    let chosen = descriptor
        .or(attribute)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CHARSET);
    if chosen.eq_ignore_ascii_case("utf8") {
        DEFAULT_CHARSET.to_string()
    } else {
        chosen.to_string()
    }
}
