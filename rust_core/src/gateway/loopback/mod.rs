//! In-process stand-in for the engine.
//!
//! Speaks the same class and method names as the real gateway for the
//! subset this crate uses, so adapters can be exercised without a JVM.
//! Vertices are forward-sampled only; there is no inference here.

pub mod distributions;
pub mod graph;
pub mod tensor;

use std::sync::{Mutex, MutexGuard};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use self::graph::VertexNode;
use self::tensor::LocalTensor;
use super::{Arg, Gateway, GatewayError, RemoteHandle, RemoteValue};
use crate::network::BAYES_NET_CLASS;
use crate::sampling::KEANU_RANDOM_CLASS;
use crate::tensor::factory_element_type;
use crate::vertex::VertexKind;

const ARRAY_LIST: &str = "java.util.ArrayList";
const HASH_SET: &str = "java.util.HashSet";
const ITERATOR: &str = "java.util.Iterator";
const VERTEX_ID: &str = "io.improbable.keanu.vertices.VertexId";

enum Object {
    Tensor(LocalTensor),
    Vertex(VertexNode),
    VertexId(Vec<i64>),
    List(Vec<RemoteValue>),
    Set(Vec<RemoteValue>),
    Iterator { items: Vec<RemoteValue>, cursor: usize },
    /// Heap slots of the member vertices
    Network(Vec<usize>),
}

/// Object arena. Handle `o<n>` is slot `n`; slots are never reused.
struct Heap {
    objects: Vec<Object>,
    next_vertex_id: i64,
    rng: ChaCha8Rng,
}

fn unknown_method(class: &str, method: &str) -> GatewayError {
    GatewayError::UnknownMethod {
        class: class.to_string(),
        method: method.to_string(),
    }
}

fn arg_at<'a>(args: &'a [Arg], i: usize, method: &str) -> Result<&'a Arg, GatewayError> {
    args.get(i).ok_or_else(|| {
        GatewayError::InvalidArgument(format!("{} expects at least {} argument(s)", method, i + 1))
    })
}

fn index_arg(args: &[Arg], method: &str) -> Result<usize, GatewayError> {
    match arg_at(args, 0, method)? {
        Arg::Integer(i) | Arg::Long(i) if *i >= 0 => Ok(*i as usize),
        other => Err(GatewayError::InvalidArgument(format!(
            "{} expects a non-negative index, got {:?}",
            method, other
        ))),
    }
}

fn to_remote(arg: &Arg) -> Result<RemoteValue, GatewayError> {
    Ok(match arg {
        Arg::Integer(v) | Arg::Long(v) => RemoteValue::Integer(*v),
        Arg::Double(v) => RemoteValue::Double(*v),
        Arg::Boolean(v) => RemoteValue::Boolean(*v),
        Arg::String(s) => RemoteValue::String(s.clone()),
        Arg::Null => RemoteValue::Null,
        Arg::Object(h) => RemoteValue::Object(h.clone()),
        other => {
            return Err(GatewayError::InvalidArgument(format!(
                "cannot store {:?} in a collection",
                other
            )))
        }
    })
}

fn longs(values: &[usize]) -> RemoteValue {
    RemoteValue::Array(values.iter().map(|&d| RemoteValue::Integer(d as i64)).collect())
}

impl Heap {
    fn new(seed: u64) -> Self {
        Self {
            objects: Vec::new(),
            next_vertex_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn alloc(&mut self, object: Object) -> RemoteHandle {
        self.objects.push(object);
        RemoteHandle::new(format!("o{}", self.objects.len() - 1))
    }

    fn alloc_value(&mut self, object: Object) -> RemoteValue {
        RemoteValue::Object(self.alloc(object))
    }

    fn index(&self, handle: &RemoteHandle) -> Result<usize, GatewayError> {
        handle
            .as_str()
            .strip_prefix('o')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&n| n < self.objects.len())
            .ok_or_else(|| GatewayError::UnknownObject(handle.to_string()))
    }

    fn tensor_arg(&self, arg: &Arg) -> Result<LocalTensor, GatewayError> {
        if let Arg::Object(handle) = arg {
            if let Object::Tensor(t) = &self.objects[self.index(handle)?] {
                return Ok(t.clone());
            }
        }
        Err(GatewayError::InvalidArgument(format!("expected a tensor, got {:?}", arg)))
    }

    fn class_of(&self, index: usize) -> String {
        match &self.objects[index] {
            Object::Tensor(t) => t.class_name().to_string(),
            Object::Vertex(v) => v.kind.class_name(),
            Object::VertexId(_) => VERTEX_ID.to_string(),
            Object::List(_) => ARRAY_LIST.to_string(),
            Object::Set(_) => HASH_SET.to_string(),
            Object::Iterator { .. } => ITERATOR.to_string(),
            Object::Network(_) => BAYES_NET_CLASS.to_string(),
        }
    }

    fn construct(&mut self, class: &str, args: &[Arg]) -> Result<RemoteHandle, GatewayError> {
        if class == ARRAY_LIST {
            if !args.is_empty() {
                return Err(GatewayError::InvalidArgument(format!(
                    "{} is only constructed empty",
                    ARRAY_LIST
                )));
            }
            return Ok(self.alloc(Object::List(Vec::new())));
        }
        if class == BAYES_NET_CLASS {
            return self.add_network(args);
        }
        let kind = VertexKind::from_class_name(class)
            .ok_or_else(|| GatewayError::UnknownClass(class.to_string()))?;
        self.add_vertex(kind, args)
    }

    fn invoke_static(&mut self, class: &str, method: &str, args: &[Arg]) -> Result<RemoteValue, GatewayError> {
        if class == KEANU_RANDOM_CLASS {
            return self.reseed(method, args);
        }
        let ty = factory_element_type(class)
            .ok_or_else(|| GatewayError::UnknownClass(class.to_string()))?;
        let tensor = match method {
            "scalar" => LocalTensor::scalar(ty, arg_at(args, 0, method)?)?,
            "create" => LocalTensor::create(ty, arg_at(args, 0, method)?, arg_at(args, 1, method)?)?,
            _ => return Err(unknown_method(class, method)),
        };
        Ok(self.alloc_value(Object::Tensor(tensor)))
    }

    fn invoke(&mut self, index: usize, method: &str, args: &[Arg]) -> Result<RemoteValue, GatewayError> {
        match &self.objects[index] {
            Object::Tensor(t) => {
                return tensor_method(t, method).ok_or_else(|| unknown_method(t.class_name(), method))
            }
            Object::VertexId(id) => {
                return match method {
                    "getValue" => Ok(RemoteValue::Array(id.iter().map(|&v| RemoteValue::Integer(v)).collect())),
                    "toString" => Ok(RemoteValue::String(format!("{:?}", id))),
                    _ => Err(unknown_method(VERTEX_ID, method)),
                }
            }
            _ => {}
        }
        match self.objects[index] {
            Object::Vertex(_) => self.vertex_method(index, method, args),
            Object::Network(_) => self.network_method(index, method),
            Object::Iterator { .. } => self.iterator_method(index, method),
            _ => self.collection_method(index, method, args),
        }
    }

    fn reseed(&mut self, method: &str, args: &[Arg]) -> Result<RemoteValue, GatewayError> {
        if method != "setDefaultRandomSeed" {
            return Err(unknown_method(KEANU_RANDOM_CLASS, method));
        }
        let seed = match arg_at(args, 0, method)? {
            Arg::Integer(v) | Arg::Long(v) => *v,
            other => {
                return Err(GatewayError::InvalidArgument(format!(
                    "{} expects a long seed, got {:?}",
                    method, other
                )))
            }
        };
        self.rng = ChaCha8Rng::seed_from_u64(seed as u64);
        Ok(RemoteValue::Void)
    }

    fn collection_method(&mut self, index: usize, method: &str, args: &[Arg]) -> Result<RemoteValue, GatewayError> {
        let class = self.class_of(index);
        let (items, is_list) = match &mut self.objects[index] {
            Object::List(items) => (items, true),
            Object::Set(items) => (items, false),
            _ => return Err(unknown_method(&class, method)),
        };
        match method {
            "size" => Ok(RemoteValue::Integer(items.len() as i64)),
            "isEmpty" => Ok(RemoteValue::Boolean(items.is_empty())),
            "contains" => {
                let needle = to_remote(arg_at(args, 0, method)?)?;
                Ok(RemoteValue::Boolean(items.contains(&needle)))
            }
            "add" if is_list => {
                items.push(to_remote(arg_at(args, 0, method)?)?);
                Ok(RemoteValue::Boolean(true))
            }
            "get" if is_list => {
                let i = index_arg(args, method)?;
                items.get(i).cloned().ok_or_else(|| {
                    GatewayError::Remote(format!(
                        "java.lang.IndexOutOfBoundsException: Index {} out of bounds for length {}",
                        i,
                        items.len()
                    ))
                })
            }
            "indexOf" if is_list => {
                let needle = to_remote(arg_at(args, 0, method)?)?;
                let pos = items.iter().position(|x| *x == needle).map_or(-1, |p| p as i64);
                Ok(RemoteValue::Integer(pos))
            }
            "iterator" => {
                let items = items.clone();
                Ok(self.alloc_value(Object::Iterator { items, cursor: 0 }))
            }
            _ => Err(unknown_method(&class, method)),
        }
    }

    fn iterator_method(&mut self, index: usize, method: &str) -> Result<RemoteValue, GatewayError> {
        let Object::Iterator { items, cursor } = &mut self.objects[index] else {
            return Err(unknown_method(ITERATOR, method));
        };
        match method {
            "hasNext" => Ok(RemoteValue::Boolean(*cursor < items.len())),
            "next" => {
                let item = items
                    .get(*cursor)
                    .cloned()
                    .ok_or_else(|| GatewayError::Remote("java.util.NoSuchElementException".into()))?;
                *cursor += 1;
                Ok(item)
            }
            _ => Err(unknown_method(ITERATOR, method)),
        }
    }
}

fn tensor_method(t: &LocalTensor, method: &str) -> Option<RemoteValue> {
    Some(match method {
        "isScalar" => RemoteValue::Boolean(t.is_scalar()),
        "scalar" => t.first()?,
        "getShape" => longs(&t.shape()),
        "getRank" => RemoteValue::Integer(t.shape().len() as i64),
        "getLength" => RemoteValue::Integer(t.len() as i64),
        "asFlatArray" => RemoteValue::Array(t.flat()),
        "asFlatDoubleArray" => RemoteValue::Array(
            t.to_f64().iter().map(|&v| RemoteValue::Double(v)).collect(),
        ),
        "asFlatIntegerArray" => RemoteValue::Array(
            t.to_f64().iter().map(|&v| RemoteValue::Integer(v as i64)).collect(),
        ),
        _ => return None,
    })
}

/// Gateway backed by an in-process object heap.
pub struct LoopbackGateway {
    heap: Mutex<Heap>,
}

impl LoopbackGateway {
    pub fn new(seed: u64) -> Self {
        Self {
            heap: Mutex::new(Heap::new(seed)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Heap> {
        self.heap.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of objects the engine is holding.
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }
}

impl Default for LoopbackGateway {
    fn default() -> Self {
        Self::new(42)
    }
}

impl Gateway for LoopbackGateway {
    fn construct(&self, class: &str, args: &[Arg]) -> Result<RemoteHandle, GatewayError> {
        trace!(class, "loopback construct");
        self.lock().construct(class, args)
    }

    fn invoke(
        &self,
        target: &RemoteHandle,
        method: &str,
        args: &[Arg],
    ) -> Result<RemoteValue, GatewayError> {
        let mut heap = self.lock();
        let index = heap.index(target)?;
        trace!(object = target.as_str(), method, "loopback call");
        heap.invoke(index, method, args)
    }

    fn invoke_static(
        &self,
        class: &str,
        method: &str,
        args: &[Arg],
    ) -> Result<RemoteValue, GatewayError> {
        self.lock().invoke_static(class, method, args)
    }

    fn class_name(&self, target: &RemoteHandle) -> Result<String, GatewayError> {
        let heap = self.lock();
        let index = heap.index(target)?;
        Ok(heap.class_of(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_list_methods() {
        let gw = LoopbackGateway::default();
        let list = gw.construct(ARRAY_LIST, &[]).unwrap();
        for i in 1..=3 {
            gw.invoke(&list, "add", &[Arg::Integer(i)]).unwrap();
        }
        assert_eq!(gw.invoke(&list, "size", &[]).unwrap(), RemoteValue::Integer(3));
        assert_eq!(gw.invoke(&list, "isEmpty", &[]).unwrap(), RemoteValue::Boolean(false));
        assert_eq!(gw.invoke(&list, "get", &[Arg::Integer(0)]).unwrap(), RemoteValue::Integer(1));
        assert_eq!(gw.invoke(&list, "indexOf", &[Arg::Integer(3)]).unwrap(), RemoteValue::Integer(2));
        assert_eq!(gw.class_name(&list).unwrap(), "java.util.ArrayList");
        assert!(matches!(
            gw.invoke(&list, "get", &[Arg::Integer(9)]),
            Err(GatewayError::Remote(_))
        ));
        assert!(matches!(
            gw.invoke(&list, "is_empty", &[]),
            Err(GatewayError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_iteration_through_trait_defaults() {
        let gw = LoopbackGateway::default();
        let list = gw.construct(ARRAY_LIST, &[]).unwrap();
        gw.invoke(&list, "add", &[Arg::Double(0.5)]).unwrap();
        let it = gw.iterator(&list).unwrap();
        assert_eq!(gw.next(&it).unwrap(), Some(RemoteValue::Double(0.5)));
        assert_eq!(gw.next(&it).unwrap(), None);
    }

    #[test]
    fn test_static_tensor_factories() {
        let gw = LoopbackGateway::default();
        let t = gw
            .invoke_static("io.improbable.keanu.tensor.dbl.DoubleTensor", "scalar", &[Arg::Double(1.3)])
            .unwrap()
            .into_object()
            .unwrap();
        assert_eq!(gw.class_name(&t).unwrap(), "io.improbable.keanu.tensor.dbl.ScalarDoubleTensor");
        assert_eq!(gw.invoke(&t, "scalar", &[]).unwrap(), RemoteValue::Double(1.3));
        assert!(matches!(
            gw.invoke_static("java.lang.Math", "abs", &[]),
            Err(GatewayError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_reseeding_restarts_the_stream() {
        let gw = LoopbackGateway::new(9);
        let seed = |gw: &LoopbackGateway| {
            gw.invoke_static(KEANU_RANDOM_CLASS, "setDefaultRandomSeed", &[Arg::Long(3)])
                .unwrap()
        };
        assert_eq!(seed(&gw), RemoteValue::Void);
        let first: f64 = gw.lock().rng.gen();
        seed(&gw);
        let second: f64 = gw.lock().rng.gen();
        assert_eq!(first, second);
        assert!(matches!(
            gw.invoke_static(KEANU_RANDOM_CLASS, "nextDouble", &[]),
            Err(GatewayError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_unknown_handles_rejected() {
        let gw = LoopbackGateway::default();
        assert!(matches!(
            gw.invoke(&RemoteHandle::new("o99"), "size", &[]),
            Err(GatewayError::UnknownObject(_))
        ));
        assert!(matches!(
            gw.invoke(&RemoteHandle::new("bogus"), "size", &[]),
            Err(GatewayError::UnknownObject(_))
        ));
    }
}
