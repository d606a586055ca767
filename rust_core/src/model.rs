use std::collections::BTreeMap;

use tracing::debug;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::value::{Element, Shape, Value};
use crate::vertex::{Vertex, VertexArg};

/// Collects named vertices into a [`Model`].
///
/// Raw values are turned into constants as they are added.
pub struct ModelBuilder {
    ctx: Context,
    vertices: BTreeMap<String, Vertex>,
}

impl ModelBuilder {
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            vertices: BTreeMap::new(),
        }
    }

    pub fn add(mut self, name: impl Into<String>, vertex: impl Into<VertexArg>) -> Result<Self> {
        let name = name.into();
        if self.vertices.contains_key(&name) {
            return Err(BridgeError::DuplicateName(name));
        }
        let vertex = match vertex.into() {
            VertexArg::Vertex(v) => v,
            VertexArg::Value(value) => Vertex::constant(&self.ctx, value)?,
            VertexArg::Shape(shape) => Vertex::constant(&self.ctx, shape_value(shape))?,
        };
        debug!(name = name.as_str(), vertex = %vertex.handle(), "registered model vertex");
        self.vertices.insert(name, vertex);
        Ok(self)
    }

    pub fn build(self) -> Model {
        Model {
            vertices: self.vertices,
        }
    }
}

fn shape_value(shape: Shape) -> Value {
    Value::List(shape.to_longs().into_iter().map(Element::Integer).collect())
}

/// An immutable set of named vertices, ordered by name.
#[derive(Debug, Clone)]
pub struct Model {
    vertices: BTreeMap<String, Vertex>,
}

impl Model {
    pub fn get(&self, name: &str) -> Option<&Vertex> {
        self.vertices.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vertices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vertex)> {
        self.vertices.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::VertexKind;

    #[test]
    fn test_builder_registers_in_name_order() {
        let ctx = Context::loopback(42);
        let mu = Vertex::constant(&ctx, 0.0).unwrap();
        let x = Vertex::new(&ctx, VertexKind::Gaussian, [VertexArg::from(&mu), 1.0.into()]).unwrap();
        let model = ModelBuilder::new(&ctx)
            .add("x", &x)
            .unwrap()
            .add("mu", mu)
            .unwrap()
            .add("offset", 2.5)
            .unwrap()
            .build();
        assert_eq!(model.names().collect::<Vec<_>>(), vec!["mu", "offset", "x"]);
        assert_eq!(model.get("x").unwrap().handle(), x.handle());
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let ctx = Context::loopback(42);
        let err = ModelBuilder::new(&ctx)
            .add("a", 1.0)
            .unwrap()
            .add("a", 2.0)
            .err()
            .unwrap();
        assert!(matches!(err, BridgeError::DuplicateName(ref n) if n == "a"));
    }
}
