//! Host values as engine tensors.

use std::fmt;

use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::gateway::{Arg, GatewayError, RemoteHandle, RemoteValue};
use crate::infer::{flatten, FlatBuffer};
use crate::proxy::RemoteObject;
use crate::value::{Element, ElementType, HostArray, Shape, Value};

const DOUBLE_TENSOR: &str = "io.improbable.keanu.tensor.dbl.DoubleTensor";
const INTEGER_TENSOR: &str = "io.improbable.keanu.tensor.intgr.IntegerTensor";
const BOOLEAN_TENSOR: &str = "io.improbable.keanu.tensor.bool.BooleanTensor";

/// Engine class whose static `scalar`/`create` build tensors of `ty`.
pub fn factory_class(ty: ElementType) -> &'static str {
    match ty {
        ElementType::Double => DOUBLE_TENSOR,
        ElementType::Integer => INTEGER_TENSOR,
        ElementType::Boolean => BOOLEAN_TENSOR,
    }
}

pub fn factory_element_type(class: &str) -> Option<ElementType> {
    ElementType::PRECEDENCE
        .into_iter()
        .find(|&ty| factory_class(ty) == class)
}

/// Element type of a concrete tensor class, judged by its package.
fn class_element_type(class: &str) -> Option<ElementType> {
    if class.contains(".tensor.dbl.") {
        Some(ElementType::Double)
    } else if class.contains(".tensor.intgr.") {
        Some(ElementType::Integer)
    } else if class.contains(".tensor.bool.") {
        Some(ElementType::Boolean)
    } else {
        None
    }
}

fn element(ty: ElementType, value: &RemoteValue) -> Result<Element> {
    Ok(match ty {
        ElementType::Double => Element::Double(value.as_f64()?),
        ElementType::Integer => Element::Integer(value.as_i64()?),
        ElementType::Boolean => Element::Boolean(value.as_bool()?),
    })
}

fn shape_from_longs(dims: &[i64]) -> Result<Shape> {
    dims.iter()
        .map(|&d| {
            usize::try_from(d).map_err(|_| {
                BridgeError::from(GatewayError::Protocol(format!(
                    "engine reported negative dimension {} in {:?}",
                    d, dims
                )))
            })
        })
        .collect::<Result<Vec<usize>>>()
        .map(Shape)
}

fn rebuild<T>(shape: &Shape, cells: Vec<T>) -> Result<ArrayD<T>> {
    let len = cells.len();
    ArrayD::from_shape_vec(IxDyn(shape.dims()), cells).map_err(|_| {
        GatewayError::Protocol(format!("{} tensor cells do not fill shape {}", len, shape)).into()
    })
}

/// A tensor living in the engine.
#[derive(Clone)]
pub struct Tensor {
    object: RemoteObject,
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tensor").field(self.handle()).finish()
    }
}

impl Tensor {
    /// Build an engine tensor from a host value. Handles are wrapped as-is.
    pub fn wrap(ctx: &Context, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        let scalar = match &value {
            Value::Remote(handle) => return Ok(Self::from_handle(ctx, handle.clone())),
            // A lone unknown object reads as a zero-dimensional object array.
            Value::Opaque(name) => return Err(BridgeError::UnsupportedElement(name.clone())),
            Value::Integer(v) => Some((ElementType::Integer, Arg::Integer(*v))),
            Value::Double(v) => Some((ElementType::Double, Arg::Double(*v))),
            Value::Boolean(v) => Some((ElementType::Boolean, Arg::Boolean(*v))),
            _ => None,
        };

        let created = match scalar {
            Some((ty, arg)) => ctx
                .gateway()
                .invoke_static(factory_class(ty), "scalar", &[arg])?,
            None => {
                let (buffer, shape) = flatten(&value)?;
                let ty = buffer.element_type();
                debug!(element_type = %ty, shape = %shape, "creating tensor");
                let values = match buffer {
                    FlatBuffer::Integer(v) => Arg::IntArray(v),
                    FlatBuffer::Double(v) => Arg::DoubleArray(v),
                    FlatBuffer::Boolean(v) => Arg::BooleanArray(v),
                };
                ctx.gateway().invoke_static(
                    factory_class(ty),
                    "create",
                    &[values, Arg::LongArray(shape.to_longs())],
                )?
            }
        };
        Ok(Self::from_handle(ctx, created.into_object()?))
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

    /// Proxy for calls this adapter does not wrap.
    pub fn remote(&self) -> &RemoteObject {
        &self.object
    }

    pub fn class_name(&self) -> Result<String> {
        self.object.class_name()
    }

    /// True for single-element tensors of any rank.
    pub fn is_scalar(&self) -> Result<bool> {
        Ok(self.object.call("isScalar", &[])?.as_bool()?)
    }

    pub fn shape(&self) -> Result<Shape> {
        let dims = self.object.call("getShape", &[])?.into_longs()?;
        shape_from_longs(&dims)
    }

    pub fn element_type(&self) -> Result<ElementType> {
        let class = self.class_name()?;
        class_element_type(&class).ok_or_else(|| BridgeError::cast(class, "a tensor"))
    }

    /// The single value of a scalar tensor.
    pub fn scalar(&self) -> Result<Element> {
        if !self.is_scalar()? {
            return Err(BridgeError::NotScalar(self.shape()?.0));
        }
        let ty = self.element_type()?;
        element(ty, &self.object.call("scalar", &[])?)
    }

    /// Copy the tensor back into a host array, row-major.
    pub fn to_local_array(&self) -> Result<HostArray> {
        let ty = self.element_type()?;
        let shape = self.shape()?;
        let flat = self.object.call("asFlatArray", &[])?.into_array()?;
        Ok(match ty {
            ElementType::Double => {
                let cells = flat.iter().map(RemoteValue::as_f64).collect::<std::result::Result<Vec<f64>, _>>()?;
                HostArray::Double(rebuild(&shape, cells)?)
            }
            ElementType::Integer => {
                let cells = flat.iter().map(RemoteValue::as_i64).collect::<std::result::Result<Vec<i64>, _>>()?;
                HostArray::Integer(rebuild(&shape, cells)?)
            }
            ElementType::Boolean => {
                let cells = flat.iter().map(RemoteValue::as_bool).collect::<std::result::Result<Vec<bool>, _>>()?;
                HostArray::Boolean(rebuild(&shape, cells)?)
            }
        })
    }
}

impl From<&Tensor> for Value {
    fn from(t: &Tensor) -> Self {
        Value::Remote(t.handle().clone())
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::Remote(t.into_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_scalars_keep_their_type() {
        let ctx = Context::loopback(42);
        let t = Tensor::wrap(&ctx, 3i64).unwrap();
        assert!(t.is_scalar().unwrap());
        assert_eq!(t.scalar().unwrap(), Element::Integer(3));
        assert_eq!(t.element_type().unwrap(), ElementType::Integer);

        let t = Tensor::wrap(&ctx, true).unwrap();
        assert_eq!(t.scalar().unwrap(), Element::Boolean(true));
        assert_eq!(
            t.class_name().unwrap(),
            "io.improbable.keanu.tensor.bool.SimpleBooleanTensor"
        );
    }

    #[test]
    fn test_array_round_trip() {
        let ctx = Context::loopback(42);
        let local: HostArray = arr2(&[[1.0f64, 2.0], [3.0, 4.0]]).into_dyn().into();
        let t = Tensor::wrap(&ctx, local.clone()).unwrap();
        assert!(!t.is_scalar().unwrap());
        assert_eq!(t.shape().unwrap(), Shape(vec![2, 2]));
        assert_eq!(t.to_local_array().unwrap(), local);
        assert!(matches!(t.scalar(), Err(BridgeError::NotScalar(ref s)) if s == &vec![2, 2]));
    }

    #[test]
    fn test_single_element_array_is_scalar() {
        let ctx = Context::loopback(42);
        let t = Tensor::wrap(&ctx, arr1(&[7i64]).into_dyn()).unwrap();
        assert!(t.is_scalar().unwrap());
        assert_eq!(t.scalar().unwrap(), Element::Integer(7));
    }

    #[test]
    fn test_handle_is_wrapped_unchanged() {
        let ctx = Context::loopback(42);
        let t = Tensor::wrap(&ctx, 1.5).unwrap();
        let again = Tensor::wrap(&ctx, &t).unwrap();
        assert_eq!(again.handle(), t.handle());
    }

    #[test]
    fn test_opaque_rejected_before_remote_call() {
        let ctx = Context::loopback(42);
        let err = Tensor::wrap(&ctx, Value::Opaque("<class 'object'>".into())).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedElement(ref t) if t == "<class 'object'>"));
    }

    #[test]
    fn test_negative_dimension_is_a_protocol_error() {
        assert_eq!(shape_from_longs(&[2, 3]).unwrap(), Shape(vec![2, 3]));
        let err = shape_from_longs(&[2, -1]).unwrap_err();
        assert!(matches!(err, BridgeError::Gateway(GatewayError::Protocol(ref m)) if m.contains("-1")));
    }

    #[test]
    fn test_factory_lookup() {
        for ty in ElementType::PRECEDENCE {
            assert_eq!(factory_element_type(factory_class(ty)), Some(ty));
        }
        assert_eq!(factory_element_type("java.lang.String"), None);
    }
}
