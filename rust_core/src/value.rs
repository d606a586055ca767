use std::fmt;

use ndarray::{Array2, ArrayD, IxDyn};

use crate::gateway::RemoteHandle;

/// Element types a remote tensor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Boolean,
    Integer,
    Double,
}

impl ElementType {
    /// Classification order for loosely typed elements. A boolean also passes
    /// the integer and double predicates, so it has to be tested first.
    pub const PRECEDENCE: [ElementType; 3] =
        [ElementType::Boolean, ElementType::Integer, ElementType::Double];

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Boolean => "bool",
            ElementType::Integer => "int",
            ElementType::Double => "float",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell of an untyped host container.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Integer(i64),
    Double(f64),
    Boolean(bool),
    /// Host object of a type with no tensor counterpart; holds its type name.
    Other(String),
}

impl Element {
    /// Whether this element can stand in for a value of type `ty`.
    pub fn satisfies(&self, ty: ElementType) -> bool {
        match (self, ty) {
            (Element::Boolean(_), _) => true,
            (Element::Integer(_), ElementType::Integer | ElementType::Double) => true,
            (Element::Double(_), ElementType::Double) => true,
            _ => false,
        }
    }

    /// First element type in `PRECEDENCE` this element satisfies.
    pub fn classify(&self) -> Option<ElementType> {
        ElementType::PRECEDENCE
            .into_iter()
            .find(|ty| self.satisfies(*ty))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Element::Integer(_) => "int",
            Element::Double(_) => "float",
            Element::Boolean(_) => "bool",
            Element::Other(name) => name,
        }
    }
}

impl From<i64> for Element {
    fn from(v: i64) -> Self {
        Element::Integer(v)
    }
}

impl From<f64> for Element {
    fn from(v: f64) -> Self {
        Element::Double(v)
    }
}

impl From<bool> for Element {
    fn from(v: bool) -> Self {
        Element::Boolean(v)
    }
}

/// Ordered dimension sizes. Empty means scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(pub Vec<usize>);

impl Shape {
    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn element_count(&self) -> usize {
        self.0.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Dimensions as the signed longs the engine expects.
    pub fn to_longs(&self) -> Vec<i64> {
        self.0.iter().map(|&d| d as i64).collect()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

/// N-dimensional host array. The typed variants carry a declared element
/// type; `Mixed` is an object array whose cells must be inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum HostArray {
    Integer(ArrayD<i64>),
    Double(ArrayD<f64>),
    Boolean(ArrayD<bool>),
    Mixed(ArrayD<Element>),
}

impl HostArray {
    pub fn shape(&self) -> Shape {
        let dims = match self {
            HostArray::Integer(a) => a.shape(),
            HostArray::Double(a) => a.shape(),
            HostArray::Boolean(a) => a.shape(),
            HostArray::Mixed(a) => a.shape(),
        };
        Shape(dims.to_vec())
    }

    pub fn len(&self) -> usize {
        match self {
            HostArray::Integer(a) => a.len(),
            HostArray::Double(a) => a.len(),
            HostArray::Boolean(a) => a.len(),
            HostArray::Mixed(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn declared_type(&self) -> Option<ElementType> {
        match self {
            HostArray::Integer(_) => Some(ElementType::Integer),
            HostArray::Double(_) => Some(ElementType::Double),
            HostArray::Boolean(_) => Some(ElementType::Boolean),
            HostArray::Mixed(_) => None,
        }
    }

    /// Cells in logical row-major order, whatever the memory layout.
    pub fn elements(&self) -> Vec<Element> {
        match self {
            HostArray::Integer(a) => a.iter().map(|&v| Element::Integer(v)).collect(),
            HostArray::Double(a) => a.iter().map(|&v| Element::Double(v)).collect(),
            HostArray::Boolean(a) => a.iter().map(|&v| Element::Boolean(v)).collect(),
            HostArray::Mixed(a) => a.iter().cloned().collect(),
        }
    }

    pub fn from_elements(shape: &Shape, elements: Vec<Element>) -> Option<Self> {
        ArrayD::from_shape_vec(IxDyn(shape.dims()), elements)
            .ok()
            .map(HostArray::Mixed)
    }
}

impl From<ArrayD<i64>> for HostArray {
    fn from(a: ArrayD<i64>) -> Self {
        HostArray::Integer(a)
    }
}

impl From<ArrayD<f64>> for HostArray {
    fn from(a: ArrayD<f64>) -> Self {
        HostArray::Double(a)
    }
}

impl From<ArrayD<bool>> for HostArray {
    fn from(a: ArrayD<bool>) -> Self {
        HostArray::Boolean(a)
    }
}

/// One-dimensional labelled sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub index: Vec<String>,
    pub values: HostArray,
}

impl Series {
    /// Labels default to the row positions.
    pub fn new(values: HostArray) -> Self {
        let index = (0..values.len()).map(|i| i.to_string()).collect();
        Self { index, values }
    }
}

/// Two-dimensional labelled table, stored rows × columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub values: HostArray,
}

impl Table {
    /// Assemble a table from named columns of equal length.
    ///
    /// Columns that disagree on element type end up in a `Mixed` array and
    /// are rejected at inference rather than upcast.
    pub fn from_columns(columns: Vec<(String, HostArray)>) -> Option<Self> {
        let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        if columns.iter().any(|(_, c)| c.len() != rows || c.shape().rank() != 1) {
            return None;
        }
        let names: Vec<String> = columns.iter().map(|(n, _)| n.clone()).collect();
        let ncols = columns.len();

        let first_type = columns.first().and_then(|(_, c)| c.declared_type());
        let uniform = columns.iter().all(|(_, c)| c.declared_type() == first_type);

        let cells: Vec<Vec<Element>> = columns.iter().map(|(_, c)| c.elements()).collect();
        let row_major: Vec<Element> = (0..rows)
            .flat_map(|r| cells.iter().map(move |col| col[r].clone()))
            .collect();

        let mixed = Array2::from_shape_vec((rows, ncols), row_major).ok()?.into_dyn();
        let values = match (uniform, first_type) {
            (true, Some(ElementType::Integer)) => HostArray::Integer(mixed.mapv(|e| match e {
                Element::Integer(v) => v,
                _ => 0,
            })),
            (true, Some(ElementType::Double)) => HostArray::Double(mixed.mapv(|e| match e {
                Element::Double(v) => v,
                _ => 0.0,
            })),
            (true, Some(ElementType::Boolean)) => HostArray::Boolean(mixed.mapv(|e| match e {
                Element::Boolean(v) => v,
                _ => false,
            })),
            _ => HostArray::Mixed(mixed),
        };
        Some(Self {
            columns: names,
            values,
        })
    }
}

/// Everything the ingestion surface can hand to the marshalling layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Array(HostArray),
    Series(Series),
    Table(Table),
    /// A plain host list (not an ndarray).
    List(Vec<Element>),
    Remote(RemoteHandle),
    /// A host object this layer does not recognise, by type name.
    Opaque(String),
}

impl Value {
    pub fn type_name(&self) -> String {
        match self {
            Value::Integer(_) => "int".to_string(),
            Value::Double(_) => "float".to_string(),
            Value::Boolean(_) => "bool".to_string(),
            Value::Array(_) => "ndarray".to_string(),
            Value::Series(_) => "Series".to_string(),
            Value::Table(_) => "DataFrame".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Remote(_) => "RemoteHandle".to_string(),
            Value::Opaque(name) => name.clone(),
        }
    }

    /// The array behind any array-like variant. Lists become 1-D object arrays.
    pub fn as_array(&self) -> Option<HostArray> {
        match self {
            Value::Array(a) => Some(a.clone()),
            Value::Series(s) => Some(s.values.clone()),
            Value::Table(t) => Some(t.values.clone()),
            Value::List(items) => {
                HostArray::from_elements(&Shape(vec![items.len()]), items.clone())
            }
            _ => None,
        }
    }

    /// A list of integers reads as dimension sizes.
    pub fn as_shape_literal(&self) -> Option<Shape> {
        match self {
            Value::List(items) if !items.is_empty() => items
                .iter()
                .map(|e| match e {
                    Element::Integer(v) if *v >= 0 => Some(*v as usize),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Shape),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<HostArray> for Value {
    fn from(a: HostArray) -> Self {
        Value::Array(a)
    }
}

impl From<ArrayD<i64>> for Value {
    fn from(a: ArrayD<i64>) -> Self {
        Value::Array(a.into())
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(a: ArrayD<f64>) -> Self {
        Value::Array(a.into())
    }
}

impl From<ArrayD<bool>> for Value {
    fn from(a: ArrayD<bool>) -> Self {
        Value::Array(a.into())
    }
}

impl From<Series> for Value {
    fn from(s: Series) -> Self {
        Value::Series(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<RemoteHandle> for Value {
    fn from(h: RemoteHandle) -> Self {
        Value::Remote(h)
    }
}
