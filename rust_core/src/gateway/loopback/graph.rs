use std::collections::{HashSet, VecDeque};

use ndarray::ArrayD;

use super::distributions::{draw, Broadcast};
use super::tensor::LocalTensor;
use super::{arg_at, longs, unknown_method, Heap, Object};
use crate::gateway::{Arg, GatewayError, RemoteHandle, RemoteValue};
use crate::network::BAYES_NET_CLASS;
use crate::vertex::VertexKind;

/// A vertex held by the loopback engine.
///
/// Parents and children are heap slots. Values are computed lazily and
/// cached until a parent is changed through a cascading set.
#[derive(Debug, Clone)]
pub struct VertexNode {
    pub id: i64,
    pub kind: VertexKind,
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
    pub shape: Option<Vec<usize>>,
    pub value: Option<LocalTensor>,
    pub observed: bool,
}

fn invalid(kind: VertexKind, msg: impl std::fmt::Display) -> GatewayError {
    GatewayError::InvalidArgument(format!("{}: {}", kind, msg))
}

/// Evaluate a non-probabilistic vertex from its parents' values.
pub fn apply(kind: VertexKind, parents: &[LocalTensor]) -> Result<LocalTensor, GatewayError> {
    use VertexKind::*;

    if kind == DoubleIf {
        let predicate = parents[0].to_bool();
        let params = [parents[1].to_f64(), parents[2].to_f64()];
        let mut all = vec![predicate.mapv(|p| if p { 1.0 } else { 0.0 })];
        all.extend(params);
        let b = Broadcast::new(kind, &all, None)?;
        return Ok(LocalTensor::Double(b.map(|i| {
            Ok(if b.at(0, i) != 0.0 { b.at(1, i) } else { b.at(2, i) })
        })?));
    }

    let params: Vec<ArrayD<f64>> = parents.iter().map(LocalTensor::to_f64).collect();
    let b = Broadcast::new(kind, &params, None)?;
    let tensor = match kind {
        Addition => LocalTensor::Double(b.map(|i| Ok(b.at(0, i) + b.at(1, i)))?),
        Difference => LocalTensor::Double(b.map(|i| Ok(b.at(0, i) - b.at(1, i)))?),
        Multiplication => LocalTensor::Double(b.map(|i| Ok(b.at(0, i) * b.at(1, i)))?),
        Division => LocalTensor::Double(b.map(|i| Ok(b.at(0, i) / b.at(1, i)))?),
        Power => LocalTensor::Double(b.map(|i| Ok(b.at(0, i).powf(b.at(1, i))))?),
        Abs => LocalTensor::Double(b.map(|i| Ok(b.at(0, i).abs()))?),
        Ceil => LocalTensor::Double(b.map(|i| Ok(b.at(0, i).ceil()))?),
        Floor => LocalTensor::Double(b.map(|i| Ok(b.at(0, i).floor()))?),
        Round => LocalTensor::Double(b.map(|i| Ok(b.at(0, i).round()))?),
        CastDouble => LocalTensor::Double(b.map(|i| Ok(b.at(0, i)))?),
        Equals => LocalTensor::Boolean(b.map(|i| Ok(b.at(0, i) == b.at(1, i)))?),
        NotEquals => LocalTensor::Boolean(b.map(|i| Ok(b.at(0, i) != b.at(1, i)))?),
        GreaterThan => LocalTensor::Boolean(b.map(|i| Ok(b.at(0, i) > b.at(1, i)))?),
        GreaterThanOrEqual => LocalTensor::Boolean(b.map(|i| Ok(b.at(0, i) >= b.at(1, i)))?),
        LessThan => LocalTensor::Boolean(b.map(|i| Ok(b.at(0, i) < b.at(1, i)))?),
        LessThanOrEqual => LocalTensor::Boolean(b.map(|i| Ok(b.at(0, i) <= b.at(1, i)))?),
        other => return Err(invalid(other, "has no deterministic rule")),
    };
    Ok(tensor)
}

impl Heap {
    fn vertex(&self, index: usize) -> Result<&VertexNode, GatewayError> {
        match &self.objects[index] {
            Object::Vertex(v) => Ok(v),
            _ => Err(GatewayError::InvalidArgument(format!("o{} is not a vertex", index))),
        }
    }

    fn vertex_mut(&mut self, index: usize) -> Result<&mut VertexNode, GatewayError> {
        match &mut self.objects[index] {
            Object::Vertex(v) => Ok(v),
            _ => Err(GatewayError::InvalidArgument(format!("o{} is not a vertex", index))),
        }
    }

    fn vertex_index(&self, arg: &Arg) -> Result<usize, GatewayError> {
        let Arg::Object(handle) = arg else {
            return Err(GatewayError::InvalidArgument(format!("expected a vertex, got {:?}", arg)));
        };
        let index = self.index(handle)?;
        self.vertex(index)?;
        Ok(index)
    }

    /// Construct a vertex: an optional leading `long[]` shape, then parameters.
    pub(super) fn add_vertex(&mut self, kind: VertexKind, args: &[Arg]) -> Result<RemoteHandle, GatewayError> {
        let (shape, params) = match args.split_first() {
            Some((Arg::LongArray(dims), rest)) if !kind.is_constant() => {
                let dims = dims
                    .iter()
                    .map(|&d| usize::try_from(d).map_err(|_| invalid(kind, format!("negative dimension {}", d))))
                    .collect::<Result<Vec<_>, _>>()?;
                (Some(dims), rest)
            }
            _ => (None, args),
        };
        if params.len() != kind.arity() {
            return Err(invalid(
                kind,
                format!("expected {} parameter(s), got {}", kind.arity(), params.len()),
            ));
        }

        let (parents, value) = if kind.is_constant() {
            let tensor = self.tensor_arg(&params[0])?.cast(kind.output_type());
            (Vec::new(), Some(tensor))
        } else {
            let parents = params
                .iter()
                .map(|p| self.vertex_index(p))
                .collect::<Result<Vec<_>, _>>()?;
            (parents, None)
        };

        let id = self.next_vertex_id;
        self.next_vertex_id += 1;
        let slot = self.objects.len();
        for &p in &parents {
            self.vertex_mut(p)?.children.push(slot);
        }
        Ok(self.alloc(Object::Vertex(VertexNode {
            id,
            kind,
            parents,
            children: Vec::new(),
            shape,
            value,
            observed: false,
        })))
    }

    fn parent_values(&mut self, index: usize, sample: bool) -> Result<Vec<LocalTensor>, GatewayError> {
        let parents = self.vertex(index)?.parents.clone();
        parents
            .into_iter()
            .map(|p| if sample { self.sample_of(p) } else { self.value_of(p) })
            .collect()
    }

    fn realize(&mut self, index: usize, sample: bool) -> Result<LocalTensor, GatewayError> {
        let node = self.vertex(index)?;
        let (kind, shape) = (node.kind, node.shape.clone());
        // A distribution is parameterized by its parents' current values;
        // only deterministic operations resample their inputs.
        let parents = self.parent_values(index, sample && !kind.is_probabilistic())?;
        if kind.is_probabilistic() {
            let params: Vec<ArrayD<f64>> = parents.iter().map(LocalTensor::to_f64).collect();
            draw(kind, &params, shape.as_deref(), &mut self.rng)
        } else {
            apply(kind, &parents)
        }
    }

    /// Current value, computing and caching it on first read.
    pub fn value_of(&mut self, index: usize) -> Result<LocalTensor, GatewayError> {
        if let Some(value) = &self.vertex(index)?.value {
            return Ok(value.clone());
        }
        let value = self.realize(index, false)?;
        self.vertex_mut(index)?.value = Some(value.clone());
        Ok(value)
    }

    /// Fresh draw for the vertex. Deterministic ancestors are resampled down to
    /// the nearest probabilistic or constant vertex, whose current value is used.
    /// Leaves cached values alone.
    pub fn sample_of(&mut self, index: usize) -> Result<LocalTensor, GatewayError> {
        let node = self.vertex(index)?;
        if node.kind.is_constant() {
            return self.value_of(index);
        }
        self.realize(index, true)
    }

    /// Store `tensor` as the vertex value; with `cascade`, deterministic
    /// descendants are recomputed on their next read.
    pub fn set_value(&mut self, index: usize, tensor: &LocalTensor, cascade: bool) -> Result<(), GatewayError> {
        let node = self.vertex_mut(index)?;
        node.value = Some(tensor.cast(node.kind.output_type()));
        if !cascade {
            return Ok(());
        }
        let mut queue: VecDeque<usize> = self.vertex(index)?.children.iter().copied().collect();
        while let Some(child) = queue.pop_front() {
            let node = self.vertex_mut(child)?;
            if node.kind.is_probabilistic() || node.kind.is_constant() {
                continue;
            }
            node.value = None;
            queue.extend(node.children.iter().copied());
        }
        Ok(())
    }

    /// Every vertex reachable through parent or child edges, `index` first.
    pub fn connected(&self, index: usize) -> Result<Vec<usize>, GatewayError> {
        let mut seen = HashSet::from([index]);
        let mut order = vec![index];
        let mut queue = VecDeque::from([index]);
        while let Some(current) = queue.pop_front() {
            let node = self.vertex(current)?;
            for &next in node.parents.iter().chain(&node.children) {
                if seen.insert(next) {
                    order.push(next);
                    queue.push_back(next);
                }
            }
        }
        Ok(order)
    }

    fn handles(&self, indices: &[usize]) -> Vec<RemoteValue> {
        indices
            .iter()
            .map(|i| RemoteValue::Object(RemoteHandle::new(format!("o{}", i))))
            .collect()
    }

    /// A network over the vertices of a list or set.
    pub(super) fn add_network(&mut self, args: &[Arg]) -> Result<RemoteHandle, GatewayError> {
        let collection = arg_at(args, 0, BAYES_NET_CLASS)?;
        let Arg::Object(handle) = collection else {
            return Err(GatewayError::InvalidArgument(format!(
                "expected a vertex collection, got {:?}",
                collection
            )));
        };
        let members = match &self.objects[self.index(handle)?] {
            Object::List(items) | Object::Set(items) => items.clone(),
            _ => {
                return Err(GatewayError::InvalidArgument(format!(
                    "{} is not a vertex collection",
                    handle
                )))
            }
        };
        let vertices = members
            .into_iter()
            .map(|member| match member {
                RemoteValue::Object(h) => self.vertex_index(&Arg::Object(h)),
                other => Err(GatewayError::InvalidArgument(format!("expected a vertex, got {:?}", other))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.alloc(Object::Network(vertices)))
    }

    pub(super) fn network_method(&mut self, index: usize, method: &str) -> Result<RemoteValue, GatewayError> {
        let Object::Network(vertices) = &self.objects[index] else {
            return Err(unknown_method(BAYES_NET_CLASS, method));
        };
        let keep: fn(&VertexNode) -> bool = match method {
            "getAllVertices" => |_| true,
            "getLatentVertices" => |v| v.kind.is_probabilistic() && !v.observed,
            "getObservedVertices" => |v| v.observed,
            "getLatentOrObservedVertices" => |v| v.kind.is_probabilistic() || v.observed,
            _ => return Err(unknown_method(BAYES_NET_CLASS, method)),
        };
        let mut selected = Vec::new();
        for &vertex in vertices {
            if keep(self.vertex(vertex)?) {
                selected.push(vertex);
            }
        }
        let members = self.handles(&selected);
        Ok(self.alloc_value(Object::List(members)))
    }

    pub(super) fn vertex_method(&mut self, index: usize, method: &str, args: &[Arg]) -> Result<RemoteValue, GatewayError> {
        let node = self.vertex(index)?;
        let kind = node.kind;
        match method {
            "getValue" => {
                let value = self.value_of(index)?;
                Ok(self.alloc_value(Object::Tensor(value)))
            }
            "sample" => {
                let value = self.sample_of(index)?;
                Ok(self.alloc_value(Object::Tensor(value)))
            }
            "setValue" | "setAndCascade" | "observe" => {
                let tensor = self.tensor_arg(arg_at(args, 0, method)?)?;
                self.set_value(index, &tensor, method == "setAndCascade")?;
                if method == "observe" {
                    self.vertex_mut(index)?.observed = true;
                }
                Ok(RemoteValue::Void)
            }
            "isObserved" => Ok(RemoteValue::Boolean(node.observed)),
            "isProbabilistic" => Ok(RemoteValue::Boolean(kind.is_probabilistic())),
            "getShape" => {
                let shape = self.value_of(index)?.shape();
                Ok(longs(&shape))
            }
            "getId" => {
                let id = node.id;
                Ok(self.alloc_value(Object::VertexId(vec![id])))
            }
            "getConnectedGraph" => {
                let members = self.handles(&self.connected(index)?);
                Ok(self.alloc_value(Object::Set(members)))
            }
            "getParents" => {
                let members = self.handles(&node.parents);
                Ok(self.alloc_value(Object::List(members)))
            }
            "getChildren" => {
                let members = self.handles(&node.children);
                Ok(self.alloc_value(Object::List(members)))
            }
            _ => Err(unknown_method(&kind.class_name(), method)),
        }
    }
}
