//! The request/response contract with the remote engine.
//!
//! Every remote object is addressed by an opaque [`RemoteHandle`]; handles stay
//! valid for as long as the engine keeps the object, which for this layer is
//! the lifetime of the connection.

pub mod loopback;
pub mod tcp;
pub mod wire;

use std::fmt;

use thiserror::Error;

pub use loopback::LoopbackGateway;
pub use tcp::TcpGateway;

/// Opaque reference to an object living in the engine.
///
/// Deliberately not `Copy`: duplicating a handle is always an explicit clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteHandle(String);

impl RemoteHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An argument to a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Java `int`.
    Integer(i64),
    /// Java `long`.
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    Null,
    Object(RemoteHandle),
    IntArray(Vec<i64>),
    LongArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    BooleanArray(Vec<bool>),
}

impl Arg {
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Arg::IntArray(_) | Arg::LongArray(_) | Arg::DoubleArray(_) | Arg::BooleanArray(_)
        )
    }
}

impl From<&RemoteHandle> for Arg {
    fn from(h: &RemoteHandle) -> Self {
        Arg::Object(h.clone())
    }
}

/// A value returned by the engine. Arrays arrive fully materialized;
/// collections and iterators arrive as object references.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteValue {
    Void,
    Null,
    Integer(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    Object(RemoteHandle),
    Array(Vec<RemoteValue>),
}

impl RemoteValue {
    fn kind(&self) -> &'static str {
        match self {
            RemoteValue::Void => "void",
            RemoteValue::Null => "null",
            RemoteValue::Integer(_) => "integer",
            RemoteValue::Double(_) => "double",
            RemoteValue::Boolean(_) => "boolean",
            RemoteValue::String(_) => "string",
            RemoteValue::Object(_) => "object",
            RemoteValue::Array(_) => "array",
        }
    }

    fn unexpected(&self, expected: &'static str) -> GatewayError {
        GatewayError::UnexpectedReturn {
            expected,
            found: self.kind(),
        }
    }

    pub fn into_object(self) -> Result<RemoteHandle, GatewayError> {
        match self {
            RemoteValue::Object(h) => Ok(h),
            other => Err(other.unexpected("object")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, GatewayError> {
        match self {
            RemoteValue::Boolean(b) => Ok(*b),
            other => Err(other.unexpected("boolean")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, GatewayError> {
        match self {
            RemoteValue::Integer(v) => Ok(*v),
            other => Err(other.unexpected("integer")),
        }
    }

    pub fn as_f64(&self) -> Result<f64, GatewayError> {
        match self {
            RemoteValue::Double(v) => Ok(*v),
            RemoteValue::Integer(v) => Ok(*v as f64),
            other => Err(other.unexpected("double")),
        }
    }

    pub fn as_str(&self) -> Result<&str, GatewayError> {
        match self {
            RemoteValue::String(s) => Ok(s),
            other => Err(other.unexpected("string")),
        }
    }

    pub fn into_array(self) -> Result<Vec<RemoteValue>, GatewayError> {
        match self {
            RemoteValue::Array(items) => Ok(items),
            other => Err(other.unexpected("array")),
        }
    }

    pub fn into_longs(self) -> Result<Vec<i64>, GatewayError> {
        self.into_array()?.iter().map(RemoteValue::as_i64).collect()
    }
}

/// Transport and engine faults. These pass through the adapters unchanged.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed gateway message: {0}")]
    Protocol(String),

    #[error("remote engine raised: {0}")]
    Remote(String),

    #[error("unknown remote class: {0}")]
    UnknownClass(String),

    #[error("{class} has no method {method}")]
    UnknownMethod { class: String, method: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no remote object with id {0}")]
    UnknownObject(String),

    #[error("expected {expected} return value, got {found}")]
    UnexpectedReturn {
        expected: &'static str,
        found: &'static str,
    },
}

/// Call-by-reference access to the engine.
///
/// Implementations serialize their own I/O so a single gateway can back the
/// process-wide context.
pub trait Gateway: Send + Sync {
    /// Instantiate `class` with positional `args`.
    fn construct(&self, class: &str, args: &[Arg]) -> Result<RemoteHandle, GatewayError>;

    /// Call `method` on the object behind `target`.
    fn invoke(
        &self,
        target: &RemoteHandle,
        method: &str,
        args: &[Arg],
    ) -> Result<RemoteValue, GatewayError>;

    /// Call a static `method` on `class`.
    fn invoke_static(
        &self,
        class: &str,
        method: &str,
        args: &[Arg],
    ) -> Result<RemoteValue, GatewayError>;

    /// Open an iterator over a remote collection.
    fn iterator(&self, collection: &RemoteHandle) -> Result<RemoteHandle, GatewayError> {
        self.invoke(collection, "iterator", &[])?.into_object()
    }

    /// Advance a remote iterator; `None` once it is exhausted.
    fn next(&self, iterator: &RemoteHandle) -> Result<Option<RemoteValue>, GatewayError> {
        if !self.invoke(iterator, "hasNext", &[])?.as_bool()? {
            return Ok(None);
        }
        self.invoke(iterator, "next", &[]).map(Some)
    }

    /// Fully-qualified class name of a remote object.
    fn class_name(&self, target: &RemoteHandle) -> Result<String, GatewayError> {
        let class = self.invoke(target, "getClass", &[])?.into_object()?;
        Ok(self.invoke(&class, "getName", &[])?.as_str()?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_value_accessors() {
        assert!(RemoteValue::Boolean(true).as_bool().unwrap());
        assert_eq!(RemoteValue::Integer(3).as_f64().unwrap(), 3.0);
        assert_eq!(
            RemoteValue::Array(vec![RemoteValue::Integer(2), RemoteValue::Integer(3)])
                .into_longs()
                .unwrap(),
            vec![2, 3]
        );
        let err = RemoteValue::Void.into_object().unwrap_err();
        assert_eq!(err.to_string(), "expected object return value, got void");
    }
}
