//! Engine-side Bayesian networks.
//!
//! A network is built from a set of vertices (usually a connected graph) and
//! answers which of them are latent or observed. Inference itself runs in
//! the engine; see [`crate::sampling`].

use std::fmt;

use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::gateway::{Arg, RemoteHandle};
use crate::proxy::RemoteObject;
use crate::vertex::graph::Members;
use crate::vertex::{ConnectedGraph, Vertex};

pub const BAYES_NET_CLASS: &str = "io.improbable.keanu.network.BayesianNetwork";
const ARRAY_LIST: &str = "java.util.ArrayList";

/// Copy `vertices` into a fresh engine-side list.
pub(crate) fn vertex_list(ctx: &Context, vertices: &[Vertex]) -> Result<RemoteHandle> {
    let list = RemoteObject::construct(ctx, ARRAY_LIST, &[])?;
    for vertex in vertices {
        list.call("add", &[Arg::Object(vertex.handle().clone())])?;
    }
    Ok(list.into_handle())
}

#[derive(Clone)]
pub struct BayesNet {
    object: RemoteObject,
}

impl fmt::Debug for BayesNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BayesNet").field(self.handle()).finish()
    }
}

impl BayesNet {
    pub fn new(ctx: &Context, vertices: &[Vertex]) -> Result<Self> {
        let list = vertex_list(ctx, vertices)?;
        debug!(vertices = vertices.len(), "constructing bayes net");
        Self::from_collection(ctx, list)
    }

    /// Network over a connected graph, passing the engine collection as-is.
    pub fn from_connected_graph(graph: &ConnectedGraph) -> Result<Self> {
        Self::from_collection(graph.context(), graph.collection().clone())
    }

    fn from_collection(ctx: &Context, collection: RemoteHandle) -> Result<Self> {
        let object = RemoteObject::construct(ctx, BAYES_NET_CLASS, &[Arg::Object(collection)])?;
        Ok(Self { object })
    }

    pub fn handle(&self) -> &RemoteHandle {
        self.object.handle()
    }

    pub fn context(&self) -> &Context {
        self.object.context()
    }

    pub fn remote(&self) -> &RemoteObject {
        &self.object
    }

    fn members(&self, method: &str) -> Result<Vec<Vertex>> {
        let collection = self.object.call(method, &[])?.into_object()?;
        Members::open(self.context(), &collection)?.collect()
    }

    /// Probabilistic vertices that have not been observed.
    pub fn latent_vertices(&self) -> Result<Vec<Vertex>> {
        self.members("getLatentVertices")
    }

    pub fn observed_vertices(&self) -> Result<Vec<Vertex>> {
        self.members("getObservedVertices")
    }

    pub fn latent_or_observed_vertices(&self) -> Result<Vec<Vertex>> {
        self.members("getLatentOrObservedVertices")
    }

    pub fn all_vertices(&self) -> Result<Vec<Vertex>> {
        self.members("getAllVertices")
    }
}
