use std::ops::{Add, Div, Mul, Neg, Sub};

use super::{Vertex, VertexArg, VertexKind};
use crate::error::Result;

impl Vertex {
    fn binary(&self, kind: VertexKind, other: impl Into<VertexArg>) -> Result<Vertex> {
        Vertex::new(self.context(), kind, [VertexArg::from(self), other.into()])
    }

    fn unary(&self, kind: VertexKind) -> Result<Vertex> {
        Vertex::new(self.context(), kind, [self])
    }

    pub fn add(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::Addition, other)
    }

    pub fn sub(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::Difference, other)
    }

    pub fn mul(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::Multiplication, other)
    }

    pub fn div(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::Division, other)
    }

    pub fn pow(&self, exponent: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::Power, exponent)
    }

    pub fn gt(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::GreaterThan, other)
    }

    pub fn ge(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::GreaterThanOrEqual, other)
    }

    pub fn lt(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::LessThan, other)
    }

    pub fn le(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::LessThanOrEqual, other)
    }

    pub fn equals(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::Equals, other)
    }

    pub fn not_equals(&self, other: impl Into<VertexArg>) -> Result<Vertex> {
        self.binary(VertexKind::NotEquals, other)
    }

    /// `0 - self`.
    pub fn neg(&self) -> Result<Vertex> {
        Vertex::new(self.context(), VertexKind::Difference, [VertexArg::from(0.0), self.into()])
    }

    pub fn abs(&self) -> Result<Vertex> {
        self.unary(VertexKind::Abs)
    }

    pub fn ceil(&self) -> Result<Vertex> {
        self.unary(VertexKind::Ceil)
    }

    pub fn floor(&self) -> Result<Vertex> {
        self.unary(VertexKind::Floor)
    }

    pub fn round(&self) -> Result<Vertex> {
        self.unary(VertexKind::Round)
    }

    pub fn cast_double(&self) -> Result<Vertex> {
        self.unary(VertexKind::CastDouble)
    }
}

macro_rules! vertex_op {
    ($trait:ident, $method:ident) => {
        impl<T: Into<VertexArg>> $trait<T> for &Vertex {
            type Output = Result<Vertex>;

            fn $method(self, rhs: T) -> Self::Output {
                Vertex::$method(self, rhs)
            }
        }

        impl<T: Into<VertexArg>> $trait<T> for Vertex {
            type Output = Result<Vertex>;

            fn $method(self, rhs: T) -> Self::Output {
                Vertex::$method(&self, rhs)
            }
        }
    };
}

vertex_op!(Add, add);
vertex_op!(Sub, sub);
vertex_op!(Mul, mul);
vertex_op!(Div, div);

impl Neg for &Vertex {
    type Output = Result<Vertex>;

    fn neg(self) -> Self::Output {
        Vertex::neg(self)
    }
}

impl Neg for Vertex {
    type Output = Result<Vertex>;

    fn neg(self) -> Self::Output {
        Vertex::neg(&self)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::value::Element;
    use crate::vertex::Vertex;

    fn value(v: &Vertex) -> Element {
        v.get_value().unwrap().scalar().unwrap()
    }

    #[test]
    fn test_arithmetic_operators() {
        let ctx = Context::loopback(42);
        let a = Vertex::constant(&ctx, 6.0).unwrap();
        let b = Vertex::constant(&ctx, 4.0).unwrap();
        assert_eq!(value(&(&a + &b).unwrap()), Element::Double(10.0));
        assert_eq!(value(&(&a - 1.0).unwrap()), Element::Double(5.0));
        assert_eq!(value(&(&a * &b).unwrap()), Element::Double(24.0));
        assert_eq!(value(&(a.clone() / 4.0).unwrap()), Element::Double(1.5));
        assert_eq!(value(&a.pow(2.0).unwrap()), Element::Double(36.0));
    }

    #[test]
    fn test_negation() {
        let ctx = Context::loopback(42);
        let a = Vertex::constant(&ctx, 2.5).unwrap();
        assert_eq!(value(&(-&a).unwrap()), Element::Double(-2.5));
        assert_eq!(value(&(-a).unwrap()), Element::Double(-2.5));
    }

    #[test]
    fn test_integer_operands_give_double_results() {
        let ctx = Context::loopback(42);
        let a = Vertex::constant(&ctx, 7i64).unwrap();
        assert_eq!(value(&(&a / 2i64).unwrap()), Element::Double(3.5));
    }

    #[test]
    fn test_comparisons_and_rounding() {
        let ctx = Context::loopback(42);
        let a = Vertex::constant(&ctx, -2.5).unwrap();
        assert_eq!(value(&a.lt(0.0).unwrap()), Element::Boolean(true));
        assert_eq!(value(&a.ge(0.0).unwrap()), Element::Boolean(false));
        assert_eq!(value(&a.equals(-2.5).unwrap()), Element::Boolean(true));
        assert_eq!(value(&a.abs().unwrap()), Element::Double(2.5));
        assert_eq!(value(&a.floor().unwrap()), Element::Double(-3.0));
        assert_eq!(value(&a.ceil().unwrap()), Element::Double(-2.0));
    }

    #[test]
    fn test_if_then_else() {
        let ctx = Context::loopback(42);
        let a = Vertex::constant(&ctx, 1.0).unwrap();
        let picked = Vertex::if_then_else(&ctx, a.gt(0.0).unwrap(), 10.0, -10.0).unwrap();
        assert_eq!(value(&picked), Element::Double(10.0));
    }
}
