use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::config::{BridgeConfig, GatewayConfig};
use crate::error::Result;
use crate::gateway::{Gateway, LoopbackGateway, TcpGateway};
use crate::proxy::Conventions;

static GLOBAL: OnceLock<Global> = OnceLock::new();

struct Global {
    ctx: Context,
    config: BridgeConfig,
}

/// A connection to the engine plus the naming rules for proxied calls.
///
/// Cheap to clone; every adapter object carries one.
#[derive(Clone)]
pub struct Context {
    gateway: Arc<dyn Gateway>,
    conventions: Conventions,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("conventions", &self.conventions)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(gateway: Arc<dyn Gateway>, conventions: Conventions) -> Self {
        Self {
            gateway,
            conventions,
        }
    }

    /// Fresh in-process engine with default conventions.
    pub fn loopback(seed: u64) -> Self {
        Self::new(Arc::new(LoopbackGateway::new(seed)), Conventions::default())
    }

    pub fn connect(config: &BridgeConfig) -> Result<Self> {
        let gateway: Arc<dyn Gateway> = match &config.gateway {
            GatewayConfig::Loopback { seed } => {
                info!(seed, "using in-process loopback engine");
                Arc::new(LoopbackGateway::new(*seed))
            }
            GatewayConfig::Tcp {
                host,
                port,
                auth_token,
            } => Arc::new(TcpGateway::connect(host, *port, auth_token.as_deref())?),
        };
        Ok(Self::new(gateway, config.naming))
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    pub fn conventions(&self) -> Conventions {
        self.conventions
    }

    /// The process-wide context, connecting from `PROBGATE_CONFIG` on first use.
    pub fn global() -> Result<&'static Context> {
        if let Some(global) = GLOBAL.get() {
            return Ok(&global.ctx);
        }
        Self::init_global(&BridgeConfig::from_env()?)
    }

    /// Connect the process-wide context from `config`. A context that is
    /// already established is returned unchanged, with a warning when it
    /// was built from a different config.
    pub fn init_global(config: &BridgeConfig) -> Result<&'static Context> {
        if let Some(global) = GLOBAL.get() {
            if global.config != *config {
                warn!(
                    active = ?global.config,
                    requested = ?config,
                    "engine context already connected; ignoring new config"
                );
            }
            return Ok(&global.ctx);
        }
        // Racing initializers may each connect; only the first is kept.
        let ctx = Self::connect(config)?;
        let global = GLOBAL.get_or_init(|| Global {
            ctx,
            config: config.clone(),
        });
        Ok(&global.ctx)
    }

    /// Config the process-wide context was connected with, if any.
    pub fn global_config() -> Option<&'static BridgeConfig> {
        GLOBAL.get().map(|global| &global.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_shared() {
        let a = Context::global().unwrap() as *const Context;
        let b = Context::init_global(&BridgeConfig::default()).unwrap() as *const Context;
        assert_eq!(a, b);
    }

    #[test]
    fn test_later_config_does_not_replace_global() {
        let first = Context::init_global(&BridgeConfig::default()).unwrap() as *const Context;
        let active = Context::global_config().unwrap().clone();

        let mut other = active.clone();
        other.gateway = GatewayConfig::Loopback { seed: 7 };
        if other == active {
            other.gateway = GatewayConfig::Loopback { seed: 8 };
        }
        let second = Context::init_global(&other).unwrap() as *const Context;
        assert_eq!(first, second);
        assert_eq!(Context::global_config(), Some(&active));
    }

    #[test]
    fn test_clones_share_gateway() {
        let ctx = Context::loopback(1);
        let other = ctx.clone();
        other.gateway().construct("java.util.ArrayList", &[]).unwrap();
        assert!(Arc::ptr_eq(&ctx.gateway, &other.gateway));
    }
}
