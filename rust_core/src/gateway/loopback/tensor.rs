use ndarray::{ArrayD, IxDyn};

use crate::gateway::{Arg, GatewayError, RemoteValue};
use crate::value::ElementType;

/// Engine-side tensor storage.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalTensor {
    Double(ArrayD<f64>),
    Integer(ArrayD<i64>),
    Boolean(ArrayD<bool>),
}

fn invalid(msg: impl Into<String>) -> GatewayError {
    GatewayError::InvalidArgument(msg.into())
}

fn dims(shape: &[i64]) -> Result<Vec<usize>, GatewayError> {
    shape
        .iter()
        .map(|&d| usize::try_from(d).map_err(|_| invalid(format!("negative dimension {}", d))))
        .collect()
}

fn build<T>(values: Vec<T>, shape: &[usize]) -> Result<ArrayD<T>, GatewayError> {
    let len = values.len();
    ArrayD::from_shape_vec(IxDyn(shape), values)
        .map_err(|_| invalid(format!("{} values do not fit shape {:?}", len, shape)))
}

impl LocalTensor {
    /// `<T>Tensor.scalar(value)`.
    pub fn scalar(ty: ElementType, value: &Arg) -> Result<Self, GatewayError> {
        let shape: [usize; 0] = [];
        Ok(match (ty, value) {
            (ElementType::Double, Arg::Double(v)) => LocalTensor::Double(build(vec![*v], &shape)?),
            (ElementType::Double, Arg::Integer(v) | Arg::Long(v)) => {
                LocalTensor::Double(build(vec![*v as f64], &shape)?)
            }
            (ElementType::Integer, Arg::Integer(v) | Arg::Long(v)) => {
                LocalTensor::Integer(build(vec![*v], &shape)?)
            }
            (ElementType::Boolean, Arg::Boolean(v)) => LocalTensor::Boolean(build(vec![*v], &shape)?),
            (ty, other) => return Err(invalid(format!("cannot make a {} scalar from {:?}", ty, other))),
        })
    }

    /// `<T>Tensor.create(values, shape)`.
    pub fn create(ty: ElementType, values: &Arg, shape: &Arg) -> Result<Self, GatewayError> {
        let Arg::LongArray(shape) = shape else {
            return Err(invalid("tensor shape must be a long[]"));
        };
        let shape = dims(shape)?;
        Ok(match (ty, values) {
            (ElementType::Double, Arg::DoubleArray(v)) => LocalTensor::Double(build(v.clone(), &shape)?),
            (ElementType::Integer, Arg::IntArray(v) | Arg::LongArray(v)) => {
                LocalTensor::Integer(build(v.clone(), &shape)?)
            }
            (ElementType::Boolean, Arg::BooleanArray(v)) => {
                LocalTensor::Boolean(build(v.clone(), &shape)?)
            }
            (ty, other) => return Err(invalid(format!("cannot fill a {} tensor from {:?}", ty, other))),
        })
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            LocalTensor::Double(_) => ElementType::Double,
            LocalTensor::Integer(_) => ElementType::Integer,
            LocalTensor::Boolean(_) => ElementType::Boolean,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            LocalTensor::Double(a) => a.shape().to_vec(),
            LocalTensor::Integer(a) => a.shape().to_vec(),
            LocalTensor::Boolean(a) => a.shape().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LocalTensor::Double(a) => a.len(),
            LocalTensor::Integer(a) => a.len(),
            LocalTensor::Boolean(a) => a.len(),
        }
    }

    /// Single-element tensors count as scalars whatever their rank.
    pub fn is_scalar(&self) -> bool {
        self.len() == 1
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            LocalTensor::Double(_) if self.is_scalar() => "io.improbable.keanu.tensor.dbl.ScalarDoubleTensor",
            LocalTensor::Double(_) => "io.improbable.keanu.tensor.dbl.Nd4jDoubleTensor",
            LocalTensor::Integer(_) if self.is_scalar() => "io.improbable.keanu.tensor.intgr.ScalarIntegerTensor",
            LocalTensor::Integer(_) => "io.improbable.keanu.tensor.intgr.Nd4jIntegerTensor",
            LocalTensor::Boolean(_) => "io.improbable.keanu.tensor.bool.SimpleBooleanTensor",
        }
    }

    pub fn flat(&self) -> Vec<RemoteValue> {
        match self {
            LocalTensor::Double(a) => a.iter().map(|&v| RemoteValue::Double(v)).collect(),
            LocalTensor::Integer(a) => a.iter().map(|&v| RemoteValue::Integer(v)).collect(),
            LocalTensor::Boolean(a) => a.iter().map(|&v| RemoteValue::Boolean(v)).collect(),
        }
    }

    pub fn first(&self) -> Option<RemoteValue> {
        self.flat().into_iter().next()
    }

    /// Numeric view; booleans read as 0/1.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            LocalTensor::Double(a) => a.clone(),
            LocalTensor::Integer(a) => a.mapv(|v| v as f64),
            LocalTensor::Boolean(a) => a.mapv(|v| if v { 1.0 } else { 0.0 }),
        }
    }

    pub fn to_bool(&self) -> ArrayD<bool> {
        match self {
            LocalTensor::Boolean(a) => a.clone(),
            other => other.to_f64().mapv(|v| v != 0.0),
        }
    }

    pub fn cast(&self, ty: ElementType) -> LocalTensor {
        match ty {
            _ if ty == self.element_type() => self.clone(),
            ElementType::Double => LocalTensor::Double(self.to_f64()),
            ElementType::Integer => LocalTensor::Integer(self.to_f64().mapv(|v| v as i64)),
            ElementType::Boolean => LocalTensor::Boolean(self.to_bool()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_flatten() {
        let t = LocalTensor::create(
            ElementType::Integer,
            &Arg::IntArray(vec![1, 2, 3, 4]),
            &Arg::LongArray(vec![2, 2]),
        )
        .unwrap();
        assert_eq!(t.shape(), vec![2, 2]);
        assert!(!t.is_scalar());
        assert_eq!(t.class_name(), "io.improbable.keanu.tensor.intgr.Nd4jIntegerTensor");
        assert_eq!(t.flat()[3], RemoteValue::Integer(4));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = LocalTensor::create(
            ElementType::Double,
            &Arg::DoubleArray(vec![1.0, 2.0, 3.0]),
            &Arg::LongArray(vec![2, 2]),
        );
        assert!(matches!(err, Err(GatewayError::InvalidArgument(_))));
    }

    #[test]
    fn test_scalar_and_cast() {
        let t = LocalTensor::scalar(ElementType::Boolean, &Arg::Boolean(true)).unwrap();
        assert!(t.is_scalar());
        assert_eq!(t.cast(ElementType::Integer).first(), Some(RemoteValue::Integer(1)));
        assert_eq!(t.class_name(), "io.improbable.keanu.tensor.bool.SimpleBooleanTensor");
    }
}
