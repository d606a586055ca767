//! Posterior sampling, forwarded to the engine's MCMC algorithms.
//!
//! Nothing is sampled on this side: the engine runs the chain and the
//! resulting draws stay engine tensors until the caller reads them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::gateway::{Arg, RemoteHandle};
use crate::network::{vertex_list, BayesNet};
use crate::proxy::RemoteObject;
use crate::tensor::Tensor;
use crate::vertex::{Vertex, VertexId};

pub const KEANU_RANDOM_CLASS: &str = "io.improbable.keanu.vertices.dbl.KeanuRandom";

/// Engine-side MCMC algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    MetropolisHastings,
    Nuts,
}

impl Algorithm {
    pub fn class_name(self) -> &'static str {
        match self {
            Algorithm::MetropolisHastings => "io.improbable.keanu.algorithms.mcmc.MetropolisHastings",
            Algorithm::Nuts => "io.improbable.keanu.algorithms.mcmc.NUTS",
        }
    }

    /// Host-side spelling: `metropolis` or `NUTS`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "metropolis" => Some(Algorithm::MetropolisHastings),
            "NUTS" => Some(Algorithm::Nuts),
            _ => None,
        }
    }
}

/// How many draws to take and which of them to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub algorithm: Algorithm,
    pub draws: usize,
    /// Leading draws discarded as burn-in
    pub drop: usize,
    /// Keep every n-th draw after the burn-in
    pub down_sample_interval: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            draws: 500,
            drop: 0,
            down_sample_interval: 1,
        }
    }
}

impl SampleConfig {
    fn validate(&self) -> Result<()> {
        if self.down_sample_interval == 0 {
            return Err(BridgeError::Sampling("down_sample_interval must be at least 1".into()));
        }
        if self.drop > self.draws {
            return Err(BridgeError::Sampling(format!(
                "cannot drop {} of {} draws",
                self.drop, self.draws
            )));
        }
        Ok(())
    }
}

fn count_arg(n: usize) -> Arg {
    Arg::Integer(n as i64)
}

/// Posterior draws keyed by vertex id, in draw order.
pub type Samples = HashMap<VertexId, Vec<Tensor>>;

/// Run the engine's sampler over `net`, recording the vertices in `sample_from`.
pub fn sample(net: &BayesNet, sample_from: &[Vertex], config: &SampleConfig) -> Result<Samples> {
    config.validate()?;
    let ctx = net.context();
    let gateway = ctx.gateway();

    let algorithm = gateway
        .invoke_static(config.algorithm.class_name(), "withDefaultConfig", &[])?
        .into_object()?;
    let vertices = vertex_list(ctx, sample_from)?;
    info!(
        algorithm = ?config.algorithm,
        draws = config.draws,
        vertices = sample_from.len(),
        "sampling posterior"
    );
    let posterior = gateway
        .invoke(
            &algorithm,
            "getPosteriorSamples",
            &[
                Arg::Object(net.handle().clone()),
                Arg::Object(vertices),
                count_arg(config.draws),
            ],
        )?
        .into_object()?;
    let posterior = gateway
        .invoke(&posterior, "drop", &[count_arg(config.drop)])?
        .into_object()?;
    let posterior = gateway
        .invoke(&posterior, "downSample", &[count_arg(config.down_sample_interval)])?
        .into_object()?;

    let mut samples = Samples::with_capacity(sample_from.len());
    for vertex in sample_from {
        let id = vertex.id()?;
        let draws = vertex_draws(ctx, &posterior, vertex)?;
        debug!(vertex = %id, draws = draws.len(), "collected samples");
        samples.insert(id, draws);
    }
    Ok(samples)
}

fn vertex_draws(ctx: &Context, posterior: &RemoteHandle, vertex: &Vertex) -> Result<Vec<Tensor>> {
    let samples = RemoteObject::new(ctx, posterior.clone())
        .call("get", &[Arg::Object(vertex.handle().clone())])?
        .into_object()?;
    let list = ctx.gateway().invoke(&samples, "asList", &[])?.into_object()?;
    let iterator = ctx.gateway().iterator(&list)?;
    let mut draws = Vec::new();
    while let Some(item) = ctx.gateway().next(&iterator)? {
        draws.push(Tensor::from_handle(ctx, item.into_object()?));
    }
    Ok(draws)
}

/// Seed the engine's default random source.
pub fn set_default_random_seed(ctx: &Context, seed: i64) -> Result<()> {
    debug!(seed, "seeding engine random source");
    ctx.gateway()
        .invoke_static(KEANU_RANDOM_CLASS, "setDefaultRandomSeed", &[Arg::Long(seed)])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::vertex::VertexKind;

    #[test]
    fn test_bad_configs_fail_before_any_remote_call() {
        let ctx = Context::loopback(42);
        let g = Vertex::new(&ctx, VertexKind::Gaussian, [0.0, 1.0]).unwrap();
        let net = BayesNet::new(&ctx, &[g.clone()]).unwrap();
        for config in [
            SampleConfig {
                down_sample_interval: 0,
                ..SampleConfig::default()
            },
            SampleConfig {
                draws: 10,
                drop: 11,
                ..SampleConfig::default()
            },
        ] {
            let err = sample(&net, &[g.clone()], &config).unwrap_err();
            assert!(matches!(err, BridgeError::Sampling(_)));
        }
    }

    #[test]
    fn test_loopback_has_no_mcmc() {
        let ctx = Context::loopback(42);
        let g = Vertex::new(&ctx, VertexKind::Gaussian, [0.0, 1.0]).unwrap();
        let net = BayesNet::new(&ctx, &[g.clone()]).unwrap();
        let err = sample(&net, &[g], &SampleConfig::default()).unwrap_err();
        assert!(matches!(err, BridgeError::Gateway(GatewayError::UnknownClass(_))));
    }

    #[test]
    fn test_seed_makes_loopback_draws_repeat() {
        let ctx = Context::loopback(42);
        let g = Vertex::new(&ctx, VertexKind::Gaussian, [0.0, 1.0]).unwrap();
        set_default_random_seed(&ctx, 1).unwrap();
        let first = g.sample().unwrap().scalar().unwrap();
        set_default_random_seed(&ctx, 1).unwrap();
        assert_eq!(g.sample().unwrap().scalar().unwrap(), first);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(Algorithm::from_name("metropolis"), Some(Algorithm::MetropolisHastings));
        assert_eq!(Algorithm::from_name("NUTS"), Some(Algorithm::Nuts));
        assert_eq!(Algorithm::from_name("gibbs"), None);
    }
}
