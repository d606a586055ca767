use std::fmt;

use crate::value::ElementType;

const BOOL_PKG: &str = "io.improbable.keanu.vertices.bool.nonprobabilistic";
const COMPARE_PKG: &str = "io.improbable.keanu.vertices.bool.nonprobabilistic.operators.binary.compare";
const DOUBLE_PKG: &str = "io.improbable.keanu.vertices.dbl.nonprobabilistic";
const DOUBLE_BINARY_PKG: &str = "io.improbable.keanu.vertices.dbl.nonprobabilistic.operators.binary";
const DOUBLE_UNARY_PKG: &str = "io.improbable.keanu.vertices.dbl.nonprobabilistic.operators.unary";
const DOUBLE_RANDOM_PKG: &str = "io.improbable.keanu.vertices.dbl.probabilistic";
const INTEGER_PKG: &str = "io.improbable.keanu.vertices.intgr.nonprobabilistic";
const INTEGER_RANDOM_PKG: &str = "io.improbable.keanu.vertices.intgr.probabilistic";

/// Engine vertex classes this layer can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    ConstantBool,
    Equals,
    GreaterThanOrEqual,
    GreaterThan,
    LessThanOrEqual,
    LessThan,
    NotEquals,
    CastDouble,
    ConstantDouble,
    DoubleIf,
    Addition,
    Difference,
    Division,
    Multiplication,
    Power,
    Abs,
    Ceil,
    Floor,
    Round,
    Cauchy,
    Exponential,
    Gamma,
    Gaussian,
    Uniform,
    ConstantInteger,
    Poisson,
    UniformInt,
}

impl VertexKind {
    pub const ALL: [VertexKind; 27] = [
        VertexKind::ConstantBool,
        VertexKind::Equals,
        VertexKind::GreaterThanOrEqual,
        VertexKind::GreaterThan,
        VertexKind::LessThanOrEqual,
        VertexKind::LessThan,
        VertexKind::NotEquals,
        VertexKind::CastDouble,
        VertexKind::ConstantDouble,
        VertexKind::DoubleIf,
        VertexKind::Addition,
        VertexKind::Difference,
        VertexKind::Division,
        VertexKind::Multiplication,
        VertexKind::Power,
        VertexKind::Abs,
        VertexKind::Ceil,
        VertexKind::Floor,
        VertexKind::Round,
        VertexKind::Cauchy,
        VertexKind::Exponential,
        VertexKind::Gamma,
        VertexKind::Gaussian,
        VertexKind::Uniform,
        VertexKind::ConstantInteger,
        VertexKind::Poisson,
        VertexKind::UniformInt,
    ];

    /// Short name without the `Vertex` suffix, e.g. `Gaussian`.
    pub fn name(self) -> &'static str {
        match self {
            VertexKind::ConstantBool => "ConstantBool",
            VertexKind::Equals => "Equals",
            VertexKind::GreaterThanOrEqual => "GreaterThanOrEqual",
            VertexKind::GreaterThan => "GreaterThan",
            VertexKind::LessThanOrEqual => "LessThanOrEqual",
            VertexKind::LessThan => "LessThan",
            VertexKind::NotEquals => "NotEquals",
            VertexKind::CastDouble => "CastDouble",
            VertexKind::ConstantDouble => "ConstantDouble",
            VertexKind::DoubleIf => "DoubleIf",
            VertexKind::Addition => "Addition",
            VertexKind::Difference => "Difference",
            VertexKind::Division => "Division",
            VertexKind::Multiplication => "Multiplication",
            VertexKind::Power => "Power",
            VertexKind::Abs => "Abs",
            VertexKind::Ceil => "Ceil",
            VertexKind::Floor => "Floor",
            VertexKind::Round => "Round",
            VertexKind::Cauchy => "Cauchy",
            VertexKind::Exponential => "Exponential",
            VertexKind::Gamma => "Gamma",
            VertexKind::Gaussian => "Gaussian",
            VertexKind::Uniform => "Uniform",
            VertexKind::ConstantInteger => "ConstantInteger",
            VertexKind::Poisson => "Poisson",
            VertexKind::UniformInt => "UniformInt",
        }
    }

    fn package(self) -> &'static str {
        use VertexKind::*;
        match self {
            ConstantBool => BOOL_PKG,
            Equals | GreaterThanOrEqual | GreaterThan | LessThanOrEqual | LessThan | NotEquals => {
                COMPARE_PKG
            }
            CastDouble | ConstantDouble | DoubleIf => DOUBLE_PKG,
            Addition | Difference | Division | Multiplication | Power => DOUBLE_BINARY_PKG,
            Abs | Ceil | Floor | Round => DOUBLE_UNARY_PKG,
            Cauchy | Exponential | Gamma | Gaussian | Uniform => DOUBLE_RANDOM_PKG,
            ConstantInteger => INTEGER_PKG,
            Poisson | UniformInt => INTEGER_RANDOM_PKG,
        }
    }

    /// Engine class simple name, e.g. `GaussianVertex`.
    pub fn simple_class_name(self) -> String {
        format!("{}Vertex", self.name())
    }

    /// Fully-qualified engine class name.
    pub fn class_name(self) -> String {
        format!("{}.{}Vertex", self.package(), self.name())
    }

    pub fn from_class_name(fqn: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.class_name() == fqn)
    }

    /// Accepts `Gaussian`, `GaussianVertex` or the fully-qualified class name.
    pub fn from_name(name: &str) -> Option<Self> {
        let short = name.rsplit('.').next().unwrap_or(name);
        let short = short.strip_suffix("Vertex").unwrap_or(short);
        Self::ALL.into_iter().find(|k| k.name() == short)
    }

    /// Constant vertex holding values of `ty`.
    pub fn constant_for(ty: ElementType) -> Self {
        match ty {
            ElementType::Boolean => VertexKind::ConstantBool,
            ElementType::Integer => VertexKind::ConstantInteger,
            ElementType::Double => VertexKind::ConstantDouble,
        }
    }

    pub fn is_constant(self) -> bool {
        matches!(
            self,
            VertexKind::ConstantBool | VertexKind::ConstantInteger | VertexKind::ConstantDouble
        )
    }

    pub fn is_probabilistic(self) -> bool {
        use VertexKind::*;
        matches!(
            self,
            Cauchy | Exponential | Gamma | Gaussian | Uniform | Poisson | UniformInt
        )
    }

    /// Element type of the values this vertex produces.
    pub fn output_type(self) -> ElementType {
        use VertexKind::*;
        match self {
            ConstantBool | Equals | GreaterThanOrEqual | GreaterThan | LessThanOrEqual
            | LessThan | NotEquals => ElementType::Boolean,
            ConstantInteger | Poisson | UniformInt => ElementType::Integer,
            _ => ElementType::Double,
        }
    }

    /// Number of vertex parameters, not counting a leading shape.
    pub fn arity(self) -> usize {
        use VertexKind::*;
        match self {
            ConstantBool | ConstantDouble | ConstantInteger => 1,
            CastDouble | Abs | Ceil | Floor | Round | Exponential | Poisson => 1,
            DoubleIf => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
