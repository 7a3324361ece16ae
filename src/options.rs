//! Connection and statement attributes
//!
//! A connection carries one [`Attributes`] set; statements inherit a copy
//! at prepare time unless per-statement overrides are supplied. The
//! [`Attribute`] / [`AttrValue`] pair is the get/set surface of the
//! generic driver contract; the typed fields are what the adapter actually
//! consults.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::fetch::FetchMode;
use crate::native::SessionMode;

/// Engine identifier reported by the synthetic driver-name attribute
pub const DRIVER_NAME: &str = "oci";

/// Result-key case folding applied by the fetch engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFolding {
    /// Keys as reported by the engine (upper case, typically)
    #[default]
    Natural,
    /// Fold keys to lowercase
    Lower,
    /// Fold keys to uppercase
    Upper,
}

impl CaseFolding {
    /// Apply this folding to a field name
    pub fn apply(self, name: &str) -> String {
        match self {
            CaseFolding::Natural => name.to_string(),
            CaseFolding::Lower => name.to_lowercase(),
            CaseFolding::Upper => name.to_uppercase(),
        }
    }
}

/// Null/empty-string normalization applied in object-shaped fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullHandling {
    /// No conversion
    #[default]
    Natural,
    /// NULL values become empty strings
    NullToString,
    /// Empty strings become NULL values
    EmptyStringToNull,
}

/// Attribute set carried by connections and statements
#[derive(Debug, Clone)]
pub struct Attributes {
    /// Result-key case folding
    pub case: CaseFolding,
    /// Null/empty normalization for object-shaped fetches
    pub nulls: NullHandling,
    /// Return NUMBER columns as text instead of coercing to numerics
    pub stringify_fetches: bool,
    /// Fetch mode used when none is selected on the statement
    pub default_fetch_mode: FetchMode,
    /// Automatically load LOB column values during fetches
    pub return_lobs: bool,
    /// Request a shared persistent session
    pub persistent: bool,
    /// Bypass any session cache and force a new session
    pub force_new: bool,
    /// Session character set override
    pub charset: Option<String>,
    /// Session privilege mode
    pub session_mode: SessionMode,
    /// Connect-warning substrings that are swallowed instead of raised.
    /// Defaults to the password-expiry warning.
    pub ignore_error_messages: Vec<String>,
    /// Return numeric-looking strings unquoted from `quote`.
    /// Off by default: locale formatting and leading zeros make the
    /// passthrough unsafe as a blanket rule.
    pub numeric_quote_passthrough: bool,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            case: CaseFolding::Natural,
            nulls: NullHandling::Natural,
            stringify_fetches: false,
            default_fetch_mode: FetchMode::Both,
            return_lobs: true,
            persistent: false,
            force_new: false,
            charset: None,
            session_mode: SessionMode::Default,
            ignore_error_messages: vec!["ORA-28002".to_string()],
            numeric_quote_passthrough: false,
        }
    }
}

impl Attributes {
    /// Whether a connect warning message matches the ignore list
    pub fn ignores_connect_warning(&self, message: &str) -> bool {
        self.ignore_error_messages
            .iter()
            .any(|needle| !needle.is_empty() && message.contains(needle.as_str()))
    }
}

/// Attribute keys of the generic driver contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Result-key case folding
    Case,
    /// Null/empty normalization mode
    OracleNulls,
    /// Stringify-fetch flag
    StringifyFetches,
    /// Default fetch mode
    DefaultFetchMode,
    /// LOB auto-load flag
    ReturnLobs,
    /// Persistent-session flag
    Persistent,
    /// Force-new-session flag
    ForceNew,
    /// Session character set
    Charset,
    /// Session privilege mode
    SessionMode,
    /// Connect-warning ignore list
    IgnoreErrorMessages,
    /// Numeric quote-passthrough policy
    NumericQuotePassthrough,
    /// Synthetic read-only engine identifier
    DriverName,
}

/// Attribute values crossing the get/set surface
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean attribute
    Bool(bool),
    /// String attribute
    Str(String),
    /// String-list attribute
    List(Vec<String>),
    /// Case folding mode
    Case(CaseFolding),
    /// Null handling mode
    Nulls(NullHandling),
    /// Fetch mode
    FetchMode(FetchMode),
    /// Session mode
    SessionMode(SessionMode),
    /// Round-trip timeout
    Timeout(Duration),
    /// Attribute not set
    None,
}

impl Attributes {
    /// Read one attribute
    pub fn get(&self, attribute: Attribute) -> AttrValue {
        match attribute {
            Attribute::Case => AttrValue::Case(self.case),
            Attribute::OracleNulls => AttrValue::Nulls(self.nulls),
            Attribute::StringifyFetches => AttrValue::Bool(self.stringify_fetches),
            Attribute::DefaultFetchMode => AttrValue::FetchMode(self.default_fetch_mode),
            Attribute::ReturnLobs => AttrValue::Bool(self.return_lobs),
            Attribute::Persistent => AttrValue::Bool(self.persistent),
            Attribute::ForceNew => AttrValue::Bool(self.force_new),
            Attribute::Charset => match &self.charset {
                Some(c) => AttrValue::Str(c.clone()),
                None => AttrValue::None,
            },
            Attribute::SessionMode => AttrValue::SessionMode(self.session_mode),
            Attribute::IgnoreErrorMessages => {
                AttrValue::List(self.ignore_error_messages.clone())
            }
            Attribute::NumericQuotePassthrough => {
                AttrValue::Bool(self.numeric_quote_passthrough)
            }
            Attribute::DriverName => AttrValue::Str(DRIVER_NAME.to_string()),
        }
    }

    /// Write one attribute; the driver name is synthetic and read-only
    pub fn set(&mut self, attribute: Attribute, value: AttrValue) -> Result<()> {
        match (attribute, value) {
            (Attribute::Case, AttrValue::Case(v)) => self.case = v,
            (Attribute::OracleNulls, AttrValue::Nulls(v)) => self.nulls = v,
            (Attribute::StringifyFetches, AttrValue::Bool(v)) => self.stringify_fetches = v,
            (Attribute::DefaultFetchMode, AttrValue::FetchMode(v)) => {
                self.default_fetch_mode = v
            }
            (Attribute::ReturnLobs, AttrValue::Bool(v)) => self.return_lobs = v,
            (Attribute::Persistent, AttrValue::Bool(v)) => self.persistent = v,
            (Attribute::ForceNew, AttrValue::Bool(v)) => self.force_new = v,
            (Attribute::Charset, AttrValue::Str(v)) => self.charset = Some(v),
            (Attribute::Charset, AttrValue::None) => self.charset = None,
            (Attribute::SessionMode, AttrValue::SessionMode(v)) => self.session_mode = v,
            (Attribute::IgnoreErrorMessages, AttrValue::List(v)) => {
                self.ignore_error_messages = v
            }
            (Attribute::NumericQuotePassthrough, AttrValue::Bool(v)) => {
                self.numeric_quote_passthrough = v
            }
            (Attribute::DriverName, _) => {
                return Err(Error::Unsupported(
                    "the driver-name attribute is read-only".to_string(),
                ))
            }
            (attribute, value) => {
                return Err(Error::Configuration(format!(
                    "attribute {:?} does not accept {:?}",
                    attribute, value
                )))
            }
        }
        Ok(())
    }
}
