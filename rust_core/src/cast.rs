//! Explicit element-type casts for tensor and vertex arguments.

use ndarray::ArrayD;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::infer::{flatten, FlatBuffer};
use crate::value::{ElementType, HostArray, Shape, Value};
use crate::vertex::{Vertex, VertexArg, VertexKind};

fn convert(buffer: FlatBuffer, ty: ElementType) -> FlatBuffer {
    if buffer.element_type() == ty {
        return buffer;
    }
    let as_f64: Vec<f64> = match &buffer {
        FlatBuffer::Integer(v) => v.iter().map(|&x| x as f64).collect(),
        FlatBuffer::Double(v) => v.clone(),
        FlatBuffer::Boolean(v) => v.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect(),
    };
    match ty {
        ElementType::Double => FlatBuffer::Double(as_f64),
        // Truncates toward zero.
        ElementType::Integer => FlatBuffer::Integer(as_f64.into_iter().map(|x| x as i64).collect()),
        ElementType::Boolean => FlatBuffer::Boolean(as_f64.into_iter().map(|x| x != 0.0).collect()),
    }
}

fn rebuild(buffer: FlatBuffer, shape: &Shape) -> Result<Value> {
    if shape.is_scalar() {
        return Ok(match buffer {
            FlatBuffer::Integer(v) => Value::Integer(v[0]),
            FlatBuffer::Double(v) => Value::Double(v[0]),
            FlatBuffer::Boolean(v) => Value::Boolean(v[0]),
        });
    }
    let dims = ndarray::IxDyn(shape.dims());
    let array = match buffer {
        FlatBuffer::Integer(v) => ArrayD::from_shape_vec(dims, v).map(HostArray::Integer),
        FlatBuffer::Double(v) => ArrayD::from_shape_vec(dims, v).map(HostArray::Double),
        FlatBuffer::Boolean(v) => ArrayD::from_shape_vec(dims, v).map(HostArray::Boolean),
    };
    array
        .map(Value::Array)
        .map_err(|_| BridgeError::cast(format!("array of shape {}", shape), "its own shape"))
}

/// Cast a host value, element by element, to `ty`.
///
/// Vertices cannot be cast this way; pass them through [`cast_to_vertex`].
pub fn cast_tensor_arg(arg: &VertexArg, ty: ElementType) -> Result<Value> {
    let value = match arg {
        VertexArg::Vertex(_) => return Err(BridgeError::cast("Vertex", ty)),
        VertexArg::Shape(shape) => Value::Array(HostArray::Integer(
            ArrayD::from_shape_vec(ndarray::IxDyn(&[shape.rank()]), shape.to_longs())
                .map_err(|_| BridgeError::cast("Shape", ty))?,
        )),
        VertexArg::Value(value) => value.clone(),
    };
    if let Value::Remote(_) = value {
        return Err(BridgeError::cast("RemoteHandle", ty));
    }
    let (buffer, shape) = flatten(&value)?;
    rebuild(convert(buffer, ty), &shape)
}

/// Vertices pass through; anything else becomes a constant of `ty`.
pub fn cast_to_vertex(ctx: &Context, arg: impl Into<VertexArg>, ty: ElementType) -> Result<Vertex> {
    let arg = arg.into();
    if let VertexArg::Vertex(v) = arg {
        return Ok(v);
    }
    let value = cast_tensor_arg(&arg, ty)?;
    let tensor = crate::tensor::Tensor::wrap(ctx, value)?;
    Vertex::new(ctx, VertexKind::constant_for(ty), [&tensor])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_scalar_casts() {
        let cast = |v: Value, ty| cast_tensor_arg(&VertexArg::Value(v), ty).unwrap();
        assert_eq!(cast(Value::Integer(3), ElementType::Double), Value::Double(3.0));
        assert_eq!(cast(Value::Double(3.9), ElementType::Integer), Value::Integer(3));
        assert_eq!(cast(Value::Double(-3.9), ElementType::Integer), Value::Integer(-3));
        assert_eq!(cast(Value::Boolean(true), ElementType::Integer), Value::Integer(1));
        assert_eq!(cast(Value::Double(0.0), ElementType::Boolean), Value::Boolean(false));
        assert_eq!(cast(Value::Integer(2), ElementType::Boolean), Value::Boolean(true));
    }

    #[test]
    fn test_array_cast_keeps_shape() {
        let arg = VertexArg::from(arr1(&[1i64, 0, 2]).into_dyn());
        let cast = cast_tensor_arg(&arg, ElementType::Boolean).unwrap();
        assert_eq!(
            cast,
            Value::Array(HostArray::Boolean(arr1(&[true, false, true]).into_dyn()))
        );
    }

    #[test]
    fn test_vertex_cannot_be_cast() {
        let ctx = Context::loopback(42);
        let v = Vertex::constant(&ctx, 1.0).unwrap();
        let err = cast_tensor_arg(&VertexArg::from(&v), ElementType::Integer).unwrap_err();
        assert_eq!(err.to_string(), "Cannot cast Vertex to int");
    }

    #[test]
    fn test_cast_to_vertex() {
        let ctx = Context::loopback(42);
        let v = cast_to_vertex(&ctx, 3i64, ElementType::Double).unwrap();
        assert_eq!(v.kind().unwrap(), Some(VertexKind::ConstantDouble));

        let same = cast_to_vertex(&ctx, &v, ElementType::Integer).unwrap();
        assert_eq!(same.handle(), v.handle());
    }
}
