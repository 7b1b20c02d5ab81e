//! Conversion between cell text and typed field values.
//!
//! Every mappable field type implements [`Cell`], which tags it with a
//! [`Kind`] and carries both directions of the conversion:
//!
//! | kind | decode | encode |
//! |---|---|---|
//! | text | verbatim | verbatim |
//! | signed / unsigned | base-10 parse | base-10 |
//! | float | any `f64` literal | six decimal places |
//! | bool | `1 t T TRUE true True` / `0 f F FALSE false False` | `true` / `false` |
//! | optional | empty + omit-empty -> `None` | `None` -> empty cell |
//! | custom | `FromStr` | `Display` |
//! | unsupported | error | error |
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

/// Semantic storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Text,
    Signed,
    Unsigned,
    Float,
    Bool,
    Optional,
    Custom,
    Unsupported,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Text => "text",
            Kind::Signed => "signed integer",
            Kind::Unsigned => "unsigned integer",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Optional => "optional",
            Kind::Custom => "custom",
            Kind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Why a cell could not be converted.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("parsing {text:?}: {source}")]
    Int {
        text: String,
        #[source]
        source: ParseIntError,
    },
    #[error("parsing {text:?}: {source}")]
    Float {
        text: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("parsing {0:?}: invalid boolean")]
    Bool(String),
    #[error("parsing {text:?} as {type_name}: {message}")]
    Custom {
        type_name: &'static str,
        text: String,
        message: String,
    },
    #[error("can't map type {0}")]
    Unsupported(&'static str),
}

/// A field type that can be read from and written to a single cell.
///
/// Implement it through [`impl_text_cell!`](crate::impl_text_cell) to give a
/// type of your own a textual form; that form replaces any built-in handling.
pub trait Cell {
    fn kind(&self) -> Kind;

    /// Builds a fresh value from cell text.
    fn parse_cell(text: &str) -> Result<Self, CoerceError>
    where
        Self: Sized;

    /// Overwrites `self` from cell text.
    fn decode_cell(&mut self, text: &str, omit_empty: bool) -> Result<(), CoerceError>;

    fn encode_cell(&self, omit_empty: bool) -> Result<String, CoerceError>;
}

impl Cell for String {
    fn kind(&self) -> Kind {
        Kind::Text
    }

    fn parse_cell(text: &str) -> Result<Self, CoerceError> {
        Ok(text.to_string())
    }

    fn decode_cell(&mut self, text: &str, _omit_empty: bool) -> Result<(), CoerceError> {
        self.clear();
        self.push_str(text);
        Ok(())
    }

    fn encode_cell(&self, _omit_empty: bool) -> Result<String, CoerceError> {
        Ok(self.clone())
    }
}

macro_rules! impl_int_cell {
    ($kind:expr => $($t:ty),+) => {$(
        impl Cell for $t {
            fn kind(&self) -> Kind {
                $kind
            }

            fn parse_cell(text: &str) -> Result<Self, CoerceError> {
                text.parse::<$t>().map_err(|source| CoerceError::Int {
                    text: text.to_string(),
                    source,
                })
            }

            fn decode_cell(&mut self, text: &str, _omit_empty: bool) -> Result<(), CoerceError> {
                *self = Self::parse_cell(text)?;
                Ok(())
            }

            fn encode_cell(&self, _omit_empty: bool) -> Result<String, CoerceError> {
                Ok(self.to_string())
            }
        }
    )+};
}

impl_int_cell!(Kind::Signed => i8, i16, i32, i64, i128, isize);
impl_int_cell!(Kind::Unsigned => u8, u16, u32, u64, u128, usize);

impl Cell for f64 {
    fn kind(&self) -> Kind {
        Kind::Float
    }

    fn parse_cell(text: &str) -> Result<Self, CoerceError> {
        text.parse::<f64>().map_err(|source| CoerceError::Float {
            text: text.to_string(),
            source,
        })
    }

    fn decode_cell(&mut self, text: &str, _omit_empty: bool) -> Result<(), CoerceError> {
        *self = Self::parse_cell(text)?;
        Ok(())
    }

    // Fixed precision, not shortest round-trip.
    fn encode_cell(&self, _omit_empty: bool) -> Result<String, CoerceError> {
        Ok(format!("{self:.6}"))
    }
}

impl Cell for bool {
    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn parse_cell(text: &str) -> Result<Self, CoerceError> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(CoerceError::Bool(text.to_string())),
        }
    }

    fn decode_cell(&mut self, text: &str, _omit_empty: bool) -> Result<(), CoerceError> {
        *self = Self::parse_cell(text)?;
        Ok(())
    }

    fn encode_cell(&self, _omit_empty: bool) -> Result<String, CoerceError> {
        Ok(if *self { "true" } else { "false" }.to_string())
    }
}

// Omit-empty is checked before the wrapped type sees the cell, so a custom
// textual kind never parses an empty cell when the field omits empties.
impl<T: Cell> Cell for Option<T> {
    fn kind(&self) -> Kind {
        Kind::Optional
    }

    fn parse_cell(text: &str) -> Result<Self, CoerceError> {
        T::parse_cell(text).map(Some)
    }

    fn decode_cell(&mut self, text: &str, omit_empty: bool) -> Result<(), CoerceError> {
        if omit_empty && text.is_empty() {
            *self = None;
            return Ok(());
        }
        *self = Some(T::parse_cell(text)?);
        Ok(())
    }

    fn encode_cell(&self, omit_empty: bool) -> Result<String, CoerceError> {
        match self {
            Some(inner) => inner.encode_cell(omit_empty),
            None => Ok(String::new()),
        }
    }
}

/// Sequences have no single-cell form.
impl<T> Cell for Vec<T> {
    fn kind(&self) -> Kind {
        Kind::Unsupported
    }

    fn parse_cell(_text: &str) -> Result<Self, CoerceError> {
        Err(CoerceError::Unsupported(std::any::type_name::<Self>()))
    }

    fn decode_cell(&mut self, _text: &str, _omit_empty: bool) -> Result<(), CoerceError> {
        Err(CoerceError::Unsupported(std::any::type_name::<Self>()))
    }

    fn encode_cell(&self, _omit_empty: bool) -> Result<String, CoerceError> {
        Err(CoerceError::Unsupported(std::any::type_name::<Self>()))
    }
}

/// Implements [`Cell`] with [`Kind::Custom`] through the type's `FromStr` and
/// `Display` impls.
///
/// ```
/// use csv_records::impl_text_cell;
///
/// #[derive(Debug, PartialEq)]
/// struct Upper(String);
///
/// impl std::str::FromStr for Upper {
///     type Err = std::convert::Infallible;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         Ok(Upper(s.to_uppercase()))
///     }
/// }
///
/// impl std::fmt::Display for Upper {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str(&self.0.to_lowercase())
///     }
/// }
///
/// impl_text_cell!(Upper);
/// ```
#[macro_export]
macro_rules! impl_text_cell {
    ($($t:ty),+ $(,)?) => {$(
        impl $crate::Cell for $t {
            fn kind(&self) -> $crate::Kind {
                $crate::Kind::Custom
            }

            fn parse_cell(text: &str) -> ::std::result::Result<Self, $crate::CoerceError> {
                <$t as ::std::str::FromStr>::from_str(text).map_err(|e| {
                    $crate::CoerceError::Custom {
                        type_name: ::std::any::type_name::<$t>(),
                        text: text.to_string(),
                        message: e.to_string(),
                    }
                })
            }

            fn decode_cell(
                &mut self,
                text: &str,
                _omit_empty: bool,
            ) -> ::std::result::Result<(), $crate::CoerceError> {
                *self = <Self as $crate::Cell>::parse_cell(text)?;
                Ok(())
            }

            fn encode_cell(
                &self,
                _omit_empty: bool,
            ) -> ::std::result::Result<String, $crate::CoerceError> {
                Ok(::std::string::ToString::to_string(self))
            }
        }
    )+};
}

impl_text_cell!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

/// Dynamically typed map value accepted by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// Anything else, already printed.
    Other(String),
}

impl Value {
    pub fn printed(value: impl fmt::Display) -> Self {
        Value::Other(value.to_string())
    }
}

/// Generic print rule: floats use their shortest form here, unlike record
/// fields.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Other(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Uint(u.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
