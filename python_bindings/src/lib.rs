use numpy::{
    IntoPyArray, PyArrayDescrMethods, PyReadonlyArrayDyn, PyUntypedArray, PyUntypedArrayMethods,
};
use pyo3::exceptions::{
    PyAttributeError, PyNotImplementedError, PyRuntimeError, PyTypeError, PyValueError,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use pyo3::basic::CompareOp;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use probgate_core::gateway::{Arg, RemoteValue};
use probgate_core::vertex::{ConnectedGraph, ConnectedVertices};
use probgate_core::{
    Algorithm, BayesNet, BridgeConfig, BridgeError, Context, Element, HostArray, RemoteObject,
    SampleConfig, Series, Shape, Table, Tensor, Value, Vertex, VertexArg, VertexKind,
};
use tracing::Level;

/// Raise the Python exception class matching each failure.
fn raise(err: BridgeError) -> PyErr {
    let msg = err.to_string();
    match err {
        BridgeError::UnsupportedElement(_) | BridgeError::UnsupportedValue(_) => {
            PyNotImplementedError::new_err(msg)
        }
        BridgeError::NamingConvention { .. } => PyAttributeError::new_err(msg),
        BridgeError::Cast { .. } => PyTypeError::new_err(msg),
        BridgeError::Gateway(_) => PyRuntimeError::new_err(msg),
        BridgeError::EmptyInput
        | BridgeError::ArgumentParse(_)
        | BridgeError::NotScalar(_)
        | BridgeError::DuplicateName(_)
        | BridgeError::Sampling(_)
        | BridgeError::Config(_) => PyValueError::new_err(msg),
    }
}

trait OrRaise<T> {
    fn or_raise(self) -> PyResult<T>;
}

impl<T> OrRaise<T> for Result<T, BridgeError> {
    fn or_raise(self) -> PyResult<T> {
        self.map_err(raise)
    }
}

fn context() -> PyResult<&'static Context> {
    Context::global().or_raise()
}

fn type_name(obj: &Bound<'_, PyAny>) -> PyResult<String> {
    Ok(obj.get_type().str()?.to_string())
}

fn is_numpy_scalar(obj: &Bound<'_, PyAny>) -> PyResult<bool> {
    let numpy = obj.py().import("numpy")?;
    obj.is_instance(&numpy.getattr("generic")?)
}

fn is_pandas(obj: &Bound<'_, PyAny>, class: &str) -> PyResult<bool> {
    let ty = obj.get_type();
    let module: String = ty.getattr("__module__")?.extract()?;
    Ok(module.starts_with("pandas") && ty.name()?.to_string() == class)
}

// ── Host value ingestion ─────────────────────────────────────────────

fn extract_element(obj: &Bound<'_, PyAny>) -> PyResult<Element> {
    // bool before int: Python bools are ints.
    if obj.is_instance_of::<PyBool>() {
        return Ok(Element::Boolean(obj.extract()?));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Element::Integer(obj.extract()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(Element::Double(obj.extract()?));
    }
    if is_numpy_scalar(obj)? {
        let item = obj.call_method0("item")?;
        if !is_numpy_scalar(&item)? {
            return extract_element(&item);
        }
    }
    Ok(Element::Other(type_name(obj)?))
}

fn typed<'py, T: numpy::Element + Clone>(array: &Bound<'py, PyAny>, dtype: &str) -> PyResult<ndarray::ArrayD<T>> {
    let converted = array.call_method1("astype", (dtype,))?;
    let view: PyReadonlyArrayDyn<'py, T> = converted.extract()?;
    Ok(view.as_array().to_owned())
}

fn extract_ndarray(obj: &Bound<'_, PyAny>, array: &Bound<'_, PyUntypedArray>) -> PyResult<HostArray> {
    let host = match array.dtype().kind() {
        b'b' => HostArray::Boolean(typed(obj, "bool")?),
        b'i' | b'u' => HostArray::Integer(typed(obj, "int64")?),
        b'f' => HostArray::Double(typed(obj, "float64")?),
        _ => {
            let shape = Shape(array.shape().to_vec());
            let cells = obj
                .call_method0("ravel")?
                .try_iter()?
                .map(|cell| extract_element(&cell?))
                .collect::<PyResult<Vec<_>>>()?;
            HostArray::from_elements(&shape, cells)
                .ok_or_else(|| PyValueError::new_err("object array cells do not fill its shape"))?
        }
    };
    Ok(host)
}

fn extract_array_like(obj: &Bound<'_, PyAny>) -> PyResult<HostArray> {
    match obj.downcast::<PyUntypedArray>() {
        Ok(array) => extract_ndarray(obj, array),
        Err(_) => Err(PyTypeError::new_err(format!("expected an ndarray, got {}", type_name(obj)?))),
    }
}

/// Convert any host object into the marshalling layer's value model.
fn extract_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if let Ok(tensor) = obj.downcast::<PyTensor>() {
        return Ok(Value::from(&tensor.borrow().inner));
    }
    if obj.is_instance_of::<PyBool>() {
        return Ok(Value::Boolean(obj.extract()?));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Value::Integer(obj.extract()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(Value::Double(obj.extract()?));
    }
    if let Ok(array) = obj.downcast::<PyUntypedArray>() {
        return Ok(Value::Array(extract_ndarray(obj, array)?));
    }
    if is_numpy_scalar(obj)? {
        return match extract_element(obj)? {
            Element::Integer(v) => Ok(Value::Integer(v)),
            Element::Double(v) => Ok(Value::Double(v)),
            Element::Boolean(v) => Ok(Value::Boolean(v)),
            Element::Other(name) => Ok(Value::Opaque(name)),
        };
    }
    if is_pandas(obj, "Series")? {
        let values = extract_array_like(&obj.getattr("values")?)?;
        return Ok(Value::Series(Series::new(values)));
    }
    if is_pandas(obj, "DataFrame")? {
        let mut columns = Vec::new();
        for label in obj.getattr("columns")?.try_iter()? {
            let label = label?;
            let column = obj.get_item(&label)?.getattr("values")?;
            columns.push((label.str()?.to_string(), extract_array_like(&column)?));
        }
        return Table::from_columns(columns)
            .map(Value::Table)
            .ok_or_else(|| PyValueError::new_err("DataFrame columns differ in length"));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        let elements = list
            .iter()
            .map(|item| extract_element(&item))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Value::List(elements));
    }
    Ok(Value::Opaque(type_name(obj)?))
}

fn extract_vertex_arg(obj: &Bound<'_, PyAny>) -> PyResult<VertexArg> {
    if let Ok(vertex) = obj.downcast::<PyVertex>() {
        return Ok(VertexArg::Vertex(vertex.borrow().inner.clone()));
    }
    Ok(VertexArg::Value(extract_value(obj)?))
}

fn extract_call_arg(obj: &Bound<'_, PyAny>) -> PyResult<Arg> {
    if let Ok(vertex) = obj.downcast::<PyVertex>() {
        return Ok(Arg::Object(vertex.borrow().inner.handle().clone()));
    }
    if let Ok(tensor) = obj.downcast::<PyTensor>() {
        return Ok(Arg::Object(tensor.borrow().inner.handle().clone()));
    }
    if let Ok(remote) = obj.downcast::<PyRemoteObject>() {
        return Ok(Arg::Object(remote.borrow().inner.handle().clone()));
    }
    if obj.is_none() {
        return Ok(Arg::Null);
    }
    if obj.is_instance_of::<PyBool>() {
        return Ok(Arg::Boolean(obj.extract()?));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Arg::Integer(obj.extract()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(Arg::Double(obj.extract()?));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(Arg::String(obj.extract()?));
    }
    Err(PyTypeError::new_err(format!(
        "cannot pass {} to a remote method",
        type_name(obj)?
    )))
}

// ── Conversions back to Python ───────────────────────────────────────

fn element_to_py<'py>(py: Python<'py>, element: Element) -> PyResult<Bound<'py, PyAny>> {
    Ok(match element {
        Element::Integer(v) => v.into_pyobject(py)?.into_any(),
        Element::Double(v) => v.into_pyobject(py)?.into_any(),
        Element::Boolean(v) => v.into_pyobject(py)?.to_owned().into_any(),
        Element::Other(name) => name.into_pyobject(py)?.into_any(),
    })
}

fn remote_to_py<'py>(py: Python<'py>, ctx: &Context, value: RemoteValue) -> PyResult<Bound<'py, PyAny>> {
    Ok(match value {
        RemoteValue::Void | RemoteValue::Null => py.None().into_bound(py),
        RemoteValue::Integer(v) => element_to_py(py, Element::Integer(v))?,
        RemoteValue::Double(v) => element_to_py(py, Element::Double(v))?,
        RemoteValue::Boolean(v) => element_to_py(py, Element::Boolean(v))?,
        RemoteValue::String(s) => s.into_pyobject(py)?.into_any(),
        RemoteValue::Object(handle) => Bound::new(
            py,
            PyRemoteObject {
                inner: RemoteObject::new(ctx, handle),
            },
        )?
        .into_any(),
        RemoteValue::Array(items) => {
            let items = items
                .into_iter()
                .map(|item| remote_to_py(py, ctx, item))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new(py, items)?.into_any()
        }
    })
}

/// Scalars come back as Python numbers, anything else as an ndarray.
fn tensor_to_py<'py>(py: Python<'py>, tensor: &Tensor) -> PyResult<Bound<'py, PyAny>> {
    if tensor.is_scalar().or_raise()? {
        element_to_py(py, tensor.scalar().or_raise()?)
    } else {
        host_array_to_py(py, tensor.to_local_array().or_raise()?)
    }
}

fn host_array_to_py<'py>(py: Python<'py>, array: HostArray) -> PyResult<Bound<'py, PyAny>> {
    Ok(match array {
        HostArray::Double(a) => a.into_pyarray(py).into_any(),
        HostArray::Integer(a) => a.into_pyarray(py).into_any(),
        HostArray::Boolean(a) => a.into_pyarray(py).into_any(),
        HostArray::Mixed(a) => {
            let cells = a
                .into_iter()
                .map(|e| element_to_py(py, e))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new(py, cells)?.into_any()
        }
    })
}

// ── Classes ──────────────────────────────────────────────────────────

/// Any engine object, reached by host-convention method names.
#[pyclass(name = "RemoteObject")]
struct PyRemoteObject {
    inner: RemoteObject,
}

#[pymethods]
impl PyRemoteObject {
    #[pyo3(signature = (name, *args))]
    fn invoke<'py>(&self, py: Python<'py>, name: &str, args: &Bound<'py, PyTuple>) -> PyResult<Bound<'py, PyAny>> {
        let args = args.iter().map(|a| extract_call_arg(&a)).collect::<PyResult<Vec<_>>>()?;
        let result = self.inner.invoke(name, &args).or_raise()?;
        remote_to_py(py, self.inner.context(), result)
    }

    fn class_name(&self) -> PyResult<String> {
        self.inner.class_name().or_raise()
    }

    fn __repr__(&self) -> String {
        format!("RemoteObject({})", self.inner.handle())
    }
}

#[pyclass(name = "Tensor")]
struct PyTensor {
    inner: Tensor,
}

#[pymethods]
impl PyTensor {
    #[new]
    fn new(t: &Bound<'_, PyAny>) -> PyResult<Self> {
        let value = extract_value(t)?;
        let inner = Tensor::wrap(context()?, value).or_raise()?;
        Ok(Self { inner })
    }

    fn is_scalar(&self) -> PyResult<bool> {
        self.inner.is_scalar().or_raise()
    }

    fn scalar<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        element_to_py(py, self.inner.scalar().or_raise()?)
    }

    fn get_shape<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyTuple>> {
        PyTuple::new(py, self.inner.shape().or_raise()?.0)
    }

    fn element_type(&self) -> PyResult<&'static str> {
        Ok(self.inner.element_type().or_raise()?.name())
    }

    fn to_numpy<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        host_array_to_py(py, self.inner.to_local_array().or_raise()?)
    }

    fn class_name(&self) -> PyResult<String> {
        self.inner.class_name().or_raise()
    }

    #[pyo3(signature = (name, *args))]
    fn invoke<'py>(&self, py: Python<'py>, name: &str, args: &Bound<'py, PyTuple>) -> PyResult<Bound<'py, PyAny>> {
        let remote = PyRemoteObject {
            inner: self.inner.remote().clone(),
        };
        remote.invoke(py, name, args)
    }

    fn __repr__(&self) -> String {
        format!("Tensor({})", self.inner.handle())
    }
}

#[pyclass(name = "Vertex")]
#[derive(Clone)]
struct PyVertex {
    inner: Vertex,
}

impl PyVertex {
    fn wrap(inner: Vertex) -> Self {
        Self { inner }
    }

    fn build(kind: VertexKind, args: Vec<VertexArg>) -> PyResult<Self> {
        Ok(Self::wrap(Vertex::new(context()?, kind, args).or_raise()?))
    }

    fn operands(&self, other: &Bound<'_, PyAny>, swap: bool) -> PyResult<Vec<VertexArg>> {
        let this = VertexArg::from(&self.inner);
        let other = extract_vertex_arg(other)?;
        Ok(if swap { vec![other, this] } else { vec![this, other] })
    }
}

#[pymethods]
impl PyVertex {
    /// `Vertex("Gaussian", mu, sigma)`; a leading list of ints sets the shape.
    #[new]
    #[pyo3(signature = (kind, *args))]
    fn new(kind: &str, args: &Bound<'_, PyTuple>) -> PyResult<Self> {
        let kind = VertexKind::from_name(kind)
            .ok_or_else(|| PyValueError::new_err(format!("unknown vertex kind: {}", kind)))?;
        let args = args
            .iter()
            .map(|a| extract_vertex_arg(&a))
            .collect::<PyResult<Vec<_>>>()?;
        Self::build(kind, args)
    }

    fn get_value(&self) -> PyResult<PyTensor> {
        Ok(PyTensor {
            inner: self.inner.get_value().or_raise()?,
        })
    }

    fn set_value(&self, v: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.set_value(extract_value(v)?).or_raise()
    }

    fn set_and_cascade(&self, v: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.set_and_cascade(extract_value(v)?).or_raise()
    }

    fn observe(&self, v: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.observe(extract_value(v)?).or_raise()
    }

    fn is_observed(&self) -> PyResult<bool> {
        self.inner.is_observed().or_raise()
    }

    fn sample(&self) -> PyResult<PyTensor> {
        Ok(PyTensor {
            inner: self.inner.sample().or_raise()?,
        })
    }

    fn get_id<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyTuple>> {
        PyTuple::new(py, self.inner.id().or_raise()?.0)
    }

    fn get_connected_graph(&self) -> PyResult<PyConnectedGraph> {
        Ok(PyConnectedGraph {
            inner: self.inner.connected_graph().or_raise()?,
        })
    }

    #[pyo3(signature = (name, *args))]
    fn invoke<'py>(&self, py: Python<'py>, name: &str, args: &Bound<'py, PyTuple>) -> PyResult<Bound<'py, PyAny>> {
        let remote = PyRemoteObject {
            inner: self.inner.remote().clone(),
        };
        remote.invoke(py, name, args)
    }

    fn __add__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Addition, self.operands(other, false)?)
    }

    fn __radd__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Addition, self.operands(other, true)?)
    }

    fn __sub__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Difference, self.operands(other, false)?)
    }

    fn __rsub__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Difference, self.operands(other, true)?)
    }

    fn __mul__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Multiplication, self.operands(other, false)?)
    }

    fn __rmul__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Multiplication, self.operands(other, true)?)
    }

    fn __truediv__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Division, self.operands(other, false)?)
    }

    fn __rtruediv__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Division, self.operands(other, true)?)
    }

    fn __pow__(&self, other: &Bound<'_, PyAny>, _modulo: Option<&Bound<'_, PyAny>>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Power, self.operands(other, false)?)
    }

    fn __rpow__(&self, other: &Bound<'_, PyAny>, _modulo: Option<&Bound<'_, PyAny>>) -> PyResult<PyVertex> {
        Self::build(VertexKind::Power, self.operands(other, true)?)
    }

    fn __neg__(&self) -> PyResult<PyVertex> {
        Ok(Self::wrap(self.inner.neg().or_raise()?))
    }

    /// Every comparison, `==` and `!=` included, builds a boolean vertex.
    fn __richcmp__(&self, other: &Bound<'_, PyAny>, op: CompareOp) -> PyResult<PyVertex> {
        let kind = match op {
            CompareOp::Lt => VertexKind::LessThan,
            CompareOp::Le => VertexKind::LessThanOrEqual,
            CompareOp::Eq => VertexKind::Equals,
            CompareOp::Ne => VertexKind::NotEquals,
            CompareOp::Gt => VertexKind::GreaterThan,
            CompareOp::Ge => VertexKind::GreaterThanOrEqual,
        };
        Self::build(kind, self.operands(other, false)?)
    }

    /// Vertices hash by engine id, so they can key dicts despite `==`.
    fn __hash__(&self) -> PyResult<u64> {
        let mut hasher = DefaultHasher::new();
        self.inner.id().or_raise()?.hash(&mut hasher);
        Ok(hasher.finish())
    }

    fn equals(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Ok(Self::wrap(self.inner.equals(extract_vertex_arg(other)?).or_raise()?))
    }

    fn not_equals(&self, other: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
        Ok(Self::wrap(self.inner.not_equals(extract_vertex_arg(other)?).or_raise()?))
    }

    fn __abs__(&self) -> PyResult<PyVertex> {
        Ok(Self::wrap(self.inner.abs().or_raise()?))
    }

    fn floor(&self) -> PyResult<PyVertex> {
        Ok(Self::wrap(self.inner.floor().or_raise()?))
    }

    fn ceil(&self) -> PyResult<PyVertex> {
        Ok(Self::wrap(self.inner.ceil().or_raise()?))
    }

    fn round(&self) -> PyResult<PyVertex> {
        Ok(Self::wrap(self.inner.round().or_raise()?))
    }

    fn __repr__(&self) -> String {
        format!("Vertex({})", self.inner.handle())
    }
}

/// Vertices reachable from one vertex. Iterating again restarts the walk.
#[pyclass(name = "ConnectedGraph")]
struct PyConnectedGraph {
    inner: ConnectedGraph,
}

#[pymethods]
impl PyConnectedGraph {
    fn __iter__(&self) -> PyResult<PyConnectedIter> {
        Ok(PyConnectedIter {
            inner: self.inner.iter().or_raise()?,
        })
    }

    fn __repr__(&self) -> String {
        format!("ConnectedGraph({})", self.inner.collection())
    }
}

#[pyclass(name = "ConnectedIter")]
struct PyConnectedIter {
    inner: ConnectedVertices,
}

#[pymethods]
impl PyConnectedIter {
    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(&mut self) -> PyResult<Option<PyVertex>> {
        match self.inner.next() {
            Some(vertex) => Ok(Some(PyVertex::wrap(vertex.or_raise()?))),
            None => Ok(None),
        }
    }
}

fn wrap_all(vertices: Vec<Vertex>) -> Vec<PyVertex> {
    vertices.into_iter().map(PyVertex::wrap).collect()
}

fn extract_vertices(obj: &Bound<'_, PyAny>) -> PyResult<Vec<Vertex>> {
    obj.try_iter()?
        .map(|item| -> PyResult<Vertex> { Ok(item?.downcast::<PyVertex>()?.borrow().inner.clone()) })
        .collect()
}

#[pyclass(name = "BayesNet")]
struct PyBayesNet {
    inner: BayesNet,
}

#[pymethods]
impl PyBayesNet {
    /// From a connected graph, or any iterable of vertices.
    #[new]
    fn new(vertices: &Bound<'_, PyAny>) -> PyResult<Self> {
        let inner = match vertices.downcast::<PyConnectedGraph>() {
            Ok(graph) => BayesNet::from_connected_graph(&graph.borrow().inner),
            Err(_) => BayesNet::new(context()?, &extract_vertices(vertices)?),
        }
        .or_raise()?;
        Ok(Self { inner })
    }

    fn get_latent_vertices(&self) -> PyResult<Vec<PyVertex>> {
        Ok(wrap_all(self.inner.latent_vertices().or_raise()?))
    }

    fn get_observed_vertices(&self) -> PyResult<Vec<PyVertex>> {
        Ok(wrap_all(self.inner.observed_vertices().or_raise()?))
    }

    fn get_latent_or_observed_vertices(&self) -> PyResult<Vec<PyVertex>> {
        Ok(wrap_all(self.inner.latent_or_observed_vertices().or_raise()?))
    }

    fn get_all_vertices(&self) -> PyResult<Vec<PyVertex>> {
        Ok(wrap_all(self.inner.all_vertices().or_raise()?))
    }

    fn __repr__(&self) -> String {
        format!("BayesNet({})", self.inner.handle())
    }
}

/// Posterior draws as `{vertex id: [draw, ...]}`.
#[pyfunction]
#[pyo3(signature = (net, sample_from, algo="metropolis", draws=500, drop=0, down_sample_interval=1))]
fn sample<'py>(
    py: Python<'py>,
    net: &PyBayesNet,
    sample_from: &Bound<'py, PyAny>,
    algo: &str,
    draws: usize,
    drop: usize,
    down_sample_interval: usize,
) -> PyResult<Bound<'py, PyDict>> {
    let algorithm = Algorithm::from_name(algo)
        .ok_or_else(|| PyValueError::new_err(format!("unknown sampling algorithm: {}", algo)))?;
    let config = SampleConfig {
        algorithm,
        draws,
        drop,
        down_sample_interval,
    };
    let vertices = extract_vertices(sample_from)?;
    let samples = probgate_core::sample(&net.inner, &vertices, &config).or_raise()?;
    let result = PyDict::new(py);
    for (id, tensors) in samples {
        let values = tensors
            .iter()
            .map(|t| tensor_to_py(py, t))
            .collect::<PyResult<Vec<_>>>()?;
        result.set_item(PyTuple::new(py, id.0)?, PyList::new(py, values)?)?;
    }
    Ok(result)
}

#[pyclass(name = "KeanuRandom")]
struct PyKeanuRandom;

#[pymethods]
impl PyKeanuRandom {
    #[staticmethod]
    fn set_default_random_seed(seed: i64) -> PyResult<()> {
        probgate_core::set_default_random_seed(context()?, seed).or_raise()
    }
}

/// Constant vertex of the value's inferred element type.
#[pyfunction]
#[pyo3(name = "Const")]
fn constant(t: &Bound<'_, PyAny>) -> PyResult<PyVertex> {
    let value = extract_value(t)?;
    Ok(PyVertex::wrap(Vertex::constant(context()?, value).or_raise()?))
}

#[pyfunction]
#[pyo3(signature = (config_path=None, verbose=false))]
fn connect(config_path: Option<&str>, verbose: bool) -> PyResult<()> {
    if verbose {
        // A subscriber may already be installed by the embedding process.
        let _ = tracing_subscriber::fmt().with_max_level(Level::DEBUG).try_init();
    }
    let config = match config_path {
        Some(path) => BridgeConfig::from_file(std::path::Path::new(path)),
        None => BridgeConfig::from_env(),
    }
    .map_err(|e| raise(e.into()))?;
    Context::init_global(&config).or_raise()?;
    Ok(())
}

#[pymodule]
fn probgate(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTensor>()?;
    m.add_class::<PyVertex>()?;
    m.add_class::<PyRemoteObject>()?;
    m.add_class::<PyConnectedGraph>()?;
    m.add_class::<PyConnectedIter>()?;
    m.add_class::<PyBayesNet>()?;
    m.add_class::<PyKeanuRandom>()?;
    m.add_function(wrap_pyfunction!(sample, m)?)?;
    m.add_function(wrap_pyfunction!(constant, m)?)?;
    m.add_function(wrap_pyfunction!(connect, m)?)?;
    Ok(())
}
