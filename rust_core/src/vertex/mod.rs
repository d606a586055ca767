//! Engine vertices and the coercions that build them from host values.

pub mod graph;
pub mod kind;
mod ops;

use std::fmt;

use ndarray::ArrayD;
use tracing::debug;

pub use graph::{ConnectedGraph, ConnectedVertices};
pub use kind::VertexKind;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::gateway::{Arg, RemoteHandle, RemoteValue};
use crate::infer::infer;
use crate::proxy::{LocalOverrides, RemoteObject};
use crate::tensor::Tensor;
use crate::value::{HostArray, Series, Shape, Table, Value};

/// Engine-assigned vertex identity. Ordered like a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub Vec<i64>);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "({},)", single),
            parts => {
                let parts: Vec<String> = parts.iter().map(i64::to_string).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

/// One argument to a vertex constructor.
#[derive(Debug, Clone)]
pub enum VertexArg {
    Vertex(Vertex),
    /// Output shape, sent as `long[]`
    Shape(Shape),
    Value(Value),
}

impl From<Vertex> for VertexArg {
    fn from(v: Vertex) -> Self {
        VertexArg::Vertex(v)
    }
}

impl From<&Vertex> for VertexArg {
    fn from(v: &Vertex) -> Self {
        VertexArg::Vertex(v.clone())
    }
}

impl From<Shape> for VertexArg {
    fn from(s: Shape) -> Self {
        VertexArg::Shape(s)
    }
}

impl From<&Tensor> for VertexArg {
    fn from(t: &Tensor) -> Self {
        VertexArg::Value(t.into())
    }
}

macro_rules! value_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for VertexArg {
                fn from(v: $ty) -> Self {
                    VertexArg::Value(v.into())
                }
            }
        )*
    };
}

value_arg!(
    Value,
    i64,
    i32,
    f64,
    bool,
    HostArray,
    ArrayD<i64>,
    ArrayD<f64>,
    ArrayD<bool>,
    Series,
    Table,
    Tensor,
);

/// A vertex living in the engine.
#[derive(Clone)]
pub struct Vertex {
    object: RemoteObject,
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Vertex").field(self.handle()).finish()
    }
}

impl Vertex {
    /// Construct a `kind` vertex, coercing each argument.
    ///
    /// Vertices pass through. A leading list of non-negative integers is the
    /// output shape. Other host values become constant vertices of their
    /// inferred element type (or tensors, when `kind` is itself a constant).
    pub fn new<I, A>(ctx: &Context, kind: VertexKind, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<VertexArg>,
    {
        let mut remote = Vec::new();
        for (position, arg) in args.into_iter().enumerate() {
            remote.push(Self::coerce(ctx, kind, position, arg.into())?);
        }
        debug!(kind = kind.name(), args = remote.len(), "constructing vertex");
        let object = RemoteObject::construct(ctx, &kind.class_name(), &remote)?;
        Ok(Self { object })
    }

    fn coerce(ctx: &Context, kind: VertexKind, position: usize, arg: VertexArg) -> Result<Arg> {
        let value = match arg {
            VertexArg::Vertex(v) => return Ok(Arg::Object(v.handle().clone())),
            VertexArg::Shape(s) => return Ok(Arg::LongArray(s.to_longs())),
            VertexArg::Value(value) => value,
        };
        if position == 0 && !kind.is_constant() {
            if let Some(shape) = value.as_shape_literal() {
                return Ok(Arg::LongArray(shape.to_longs()));
            }
        }
        match value {
            Value::Remote(handle) => Ok(Arg::Object(handle)),
            Value::Opaque(name) => Err(BridgeError::ArgumentParse(name)),
            value if kind.is_constant() => Ok(Arg::Object(Tensor::wrap(ctx, value)?.into_handle())),
            value => Ok(Arg::Object(Self::constant(ctx, value)?.into_handle())),
        }
    }

    /// Constant vertex whose element type is inferred from `value`.
    pub fn constant(ctx: &Context, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        let (ty, _) = infer(&value)?;
        let tensor = Tensor::wrap(ctx, value)?;
        Self::new(ctx, VertexKind::constant_for(ty), [&tensor])
    }

    /// `predicate ? then : otherwise`, elementwise.
    pub fn if_then_else(
        ctx: &Context,
        predicate: impl Into<VertexArg>,
        then: impl Into<VertexArg>,
        otherwise: impl Into<VertexArg>,
    ) -> Result<Self> {
        Self::new(
            ctx,
            VertexKind::DoubleIf,
            [predicate.into(), then.into(), otherwise.into()],
        )
    }

    pub fn from_handle(ctx: &Context, handle: RemoteHandle) -> Self {
        Self {
            object: RemoteObject::new(ctx, handle),
        }
    }

    pub fn handle(&self) -> &RemoteHandle {
        self.object.handle()
    }

    pub fn into_handle(self) -> RemoteHandle {
        self.object.into_handle()
    }

    pub fn context(&self) -> &Context {
        self.object.context()
    }

    /// Proxy for engine methods this adapter does not wrap.
    pub fn remote(&self) -> &RemoteObject {
        &self.object
    }

    /// Call an engine method by its host-convention name.
    pub fn dispatch(&self, overrides: &dyn LocalOverrides, name: &str, args: &[Arg]) -> Result<RemoteValue> {
        self.object.dispatch(overrides, name, args)
    }

    /// Catalog entry for this vertex, if the engine class is one we know.
    pub fn kind(&self) -> Result<Option<VertexKind>> {
        Ok(VertexKind::from_class_name(&self.object.class_name()?))
    }

    fn tensor_call(&self, method: &str) -> Result<Tensor> {
        let handle = self.object.call(method, &[])?.into_object()?;
        Ok(Tensor::from_handle(self.context(), handle))
    }

    fn store(&self, method: &str, value: Value) -> Result<()> {
        let tensor = Tensor::wrap(self.context(), value)?;
        self.object.call(method, &[Arg::Object(tensor.into_handle())])?;
        Ok(())
    }

    pub fn get_value(&self) -> Result<Tensor> {
        self.tensor_call("getValue")
    }

    /// Replace the value without touching descendants.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        self.store("setValue", value.into())
    }

    /// Replace the value and recompute deterministic descendants.
    pub fn set_and_cascade(&self, value: impl Into<Value>) -> Result<()> {
        self.store("setAndCascade", value.into())
    }

    pub fn observe(&self, value: impl Into<Value>) -> Result<()> {
        self.store("observe", value.into())
    }

    pub fn is_observed(&self) -> Result<bool> {
        Ok(self.object.call("isObserved", &[])?.as_bool()?)
    }

    /// A fresh draw; the stored value is left alone.
    pub fn sample(&self) -> Result<Tensor> {
        self.tensor_call("sample")
    }

    pub fn id(&self) -> Result<VertexId> {
        let id = self.object.call("getId", &[])?.into_object()?;
        let parts = self.context().gateway().invoke(&id, "getValue", &[])?.into_longs()?;
        Ok(VertexId(parts))
    }

    pub fn connected_graph(&self) -> Result<ConnectedGraph> {
        let set = self.object.call("getConnectedGraph", &[])?.into_object()?;
        Ok(ConnectedGraph::new(self.context(), set))
    }

    pub fn parents(&self) -> Result<Vec<Vertex>> {
        self.members("getParents")
    }

    pub fn children(&self) -> Result<Vec<Vertex>> {
        self.members("getChildren")
    }

    fn members(&self, method: &str) -> Result<Vec<Vertex>> {
        let collection = self.object.call(method, &[])?.into_object()?;
        graph::Members::open(self.context(), &collection)?.collect()
    }
}
