pub mod cast;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod infer;
pub mod model;
pub mod network;
pub mod proxy;
pub mod sampling;
pub mod tensor;
pub mod value;
pub mod vertex;

pub use config::BridgeConfig;
pub use context::Context;
pub use error::{BridgeError, Result};
pub use model::{Model, ModelBuilder};
pub use network::BayesNet;
pub use proxy::{Conventions, LocalOverrides, NamingConvention, RemoteObject};
pub use sampling::{sample, set_default_random_seed, Algorithm, SampleConfig, Samples};
pub use tensor::Tensor;
pub use value::{Element, ElementType, HostArray, Series, Shape, Table, Value};
pub use vertex::{Vertex, VertexArg, VertexId, VertexKind};
