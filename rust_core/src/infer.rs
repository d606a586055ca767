//! Element-type and shape inference for host values.
//!
//! Pure functions: nothing here talks to the gateway.

use crate::error::{BridgeError, Result};
use crate::value::{Element, ElementType, HostArray, Shape, Value};

/// A row-major buffer of one element type, ready to cross the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatBuffer {
    Integer(Vec<i64>),
    Double(Vec<f64>),
    Boolean(Vec<bool>),
}

impl FlatBuffer {
    pub fn element_type(&self) -> ElementType {
        match self {
            FlatBuffer::Integer(_) => ElementType::Integer,
            FlatBuffer::Double(_) => ElementType::Double,
            FlatBuffer::Boolean(_) => ElementType::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FlatBuffer::Integer(v) => v.len(),
            FlatBuffer::Double(v) => v.len(),
            FlatBuffer::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify `value` as an element type and shape.
pub fn infer(value: &Value) -> Result<(ElementType, Shape)> {
    match value {
        Value::Boolean(_) => Ok((ElementType::Boolean, Shape::scalar())),
        Value::Integer(_) => Ok((ElementType::Integer, Shape::scalar())),
        Value::Double(_) => Ok((ElementType::Double, Shape::scalar())),
        Value::Opaque(name) => Err(BridgeError::UnsupportedValue(name.clone())),
        Value::Remote(_) => Err(BridgeError::cast("RemoteHandle", "a raw value")),
        Value::Array(_) | Value::Series(_) | Value::Table(_) | Value::List(_) => {
            let array = value
                .as_array()
                .ok_or_else(|| BridgeError::UnsupportedValue(value.type_name()))?;
            infer_array(&array)
        }
    }
}

/// Classify an array. The declared element type wins when there is one;
/// object arrays are checked cell by cell for a single supported type.
pub fn infer_array(array: &HostArray) -> Result<(ElementType, Shape)> {
    if array.is_empty() {
        return Err(BridgeError::EmptyInput);
    }
    let shape = array.shape();
    if let Some(ty) = array.declared_type() {
        return Ok((ty, shape));
    }
    let HostArray::Mixed(cells) = array else {
        unreachable!("only object arrays lack a declared element type");
    };
    Ok((uniform_type(cells.iter())?, shape))
}

fn uniform_type<'a>(mut cells: impl Iterator<Item = &'a Element>) -> Result<ElementType> {
    let first = cells.next().ok_or(BridgeError::EmptyInput)?;
    let ty = first
        .classify()
        .ok_or_else(|| BridgeError::UnsupportedElement(first.type_name().to_string()))?;
    for cell in cells {
        if cell.classify() != Some(ty) {
            return Err(BridgeError::UnsupportedElement(cell.type_name().to_string()));
        }
    }
    Ok(ty)
}

/// Infer `value` and lay its elements out in row-major order.
pub fn flatten(value: &Value) -> Result<(FlatBuffer, Shape)> {
    let (ty, shape) = infer(value)?;
    let buffer = match value {
        Value::Integer(v) => FlatBuffer::Integer(vec![*v]),
        Value::Double(v) => FlatBuffer::Double(vec![*v]),
        Value::Boolean(v) => FlatBuffer::Boolean(vec![*v]),
        _ => {
            let array = value
                .as_array()
                .ok_or_else(|| BridgeError::UnsupportedValue(value.type_name()))?;
            flatten_array(&array, ty)
        }
    };
    Ok((buffer, shape))
}

fn flatten_array(array: &HostArray, ty: ElementType) -> FlatBuffer {
    match array {
        HostArray::Integer(a) => FlatBuffer::Integer(a.iter().copied().collect()),
        HostArray::Double(a) => FlatBuffer::Double(a.iter().copied().collect()),
        HostArray::Boolean(a) => FlatBuffer::Boolean(a.iter().copied().collect()),
        // Cells were validated against `ty` during inference.
        HostArray::Mixed(a) => match ty {
            ElementType::Integer => FlatBuffer::Integer(
                a.iter()
                    .filter_map(|e| match e {
                        Element::Integer(v) => Some(*v),
                        _ => None,
                    })
                    .collect(),
            ),
            ElementType::Double => FlatBuffer::Double(
                a.iter()
                    .filter_map(|e| match e {
                        Element::Double(v) => Some(*v),
                        _ => None,
                    })
                    .collect(),
            ),
            ElementType::Boolean => FlatBuffer::Boolean(
                a.iter()
                    .filter_map(|e| match e {
                        Element::Boolean(v) => Some(*v),
                        _ => None,
                    })
                    .collect(),
            ),
        },
    }
}
