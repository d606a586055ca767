use std::collections::HashSet;

use crate::context::Context;
use crate::error::Result;
use crate::gateway::RemoteHandle;

use super::{Vertex, VertexId};

/// The vertices reachable from one vertex, as an engine-side collection.
///
/// Nothing is fetched until iteration starts, and each call to
/// [`ConnectedGraph::iter`] walks the collection again from the start.
#[derive(Clone)]
pub struct ConnectedGraph {
    ctx: Context,
    collection: RemoteHandle,
}

impl ConnectedGraph {
    pub(crate) fn new(ctx: &Context, collection: RemoteHandle) -> Self {
        Self {
            ctx: ctx.clone(),
            collection,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The engine-side collection backing this graph.
    pub fn collection(&self) -> &RemoteHandle {
        &self.collection
    }

    /// Distinct vertices, in engine iteration order. The walk owns its
    /// context, so it may outlive the graph.
    pub fn iter(&self) -> Result<ConnectedVertices> {
        Ok(ConnectedVertices {
            members: Members::open(&self.ctx, &self.collection)?,
            seen: HashSet::new(),
        })
    }

    pub fn vertices(&self) -> Result<Vec<Vertex>> {
        self.iter()?.collect()
    }

    /// Number of distinct vertices. Walks the whole collection.
    pub fn count(&self) -> Result<usize> {
        self.iter()?.try_fold(0, |n, v| v.map(|_| n + 1))
    }
}

/// Raw walk over an engine collection of vertices.
pub(crate) struct Members {
    ctx: Context,
    iterator: Option<RemoteHandle>,
}

impl Members {
    pub(crate) fn open(ctx: &Context, collection: &RemoteHandle) -> Result<Self> {
        let iterator = ctx.gateway().iterator(collection)?;
        Ok(Self {
            ctx: ctx.clone(),
            iterator: Some(iterator),
        })
    }

    fn advance(&mut self) -> Result<Option<Vertex>> {
        let Some(iterator) = &self.iterator else {
            return Ok(None);
        };
        match self.ctx.gateway().next(iterator)? {
            Some(item) => Ok(Some(Vertex::from_handle(&self.ctx, item.into_object()?))),
            None => Ok(None),
        }
    }
}

impl Iterator for Members {
    type Item = Result<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.advance();
        if !matches!(item, Ok(Some(_))) {
            self.iterator = None;
        }
        item.transpose()
    }
}

pub struct ConnectedVertices {
    members: Members,
    seen: HashSet<VertexId>,
}

impl Iterator for ConnectedVertices {
    type Item = Result<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let vertex = match self.members.next()? {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            match vertex.id() {
                Ok(id) => {
                    if self.seen.insert(id) {
                        return Some(Ok(vertex));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
