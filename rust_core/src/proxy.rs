//! Forwarding of host-convention method names to remote objects.
//!
//! A call is resolved in three steps: the name must follow the local
//! convention, a local override registered under that name wins, and
//! anything else is translated to the remote convention and invoked on
//! the engine object.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::gateway::{Arg, RemoteHandle, RemoteValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// `index_of`
    SnakeCase,
    /// `indexOf`
    CamelCase,
}

impl NamingConvention {
    pub fn name(self) -> &'static str {
        match self {
            NamingConvention::SnakeCase => "snake_case",
            NamingConvention::CamelCase => "camelCase",
        }
    }

    /// Whether `name` is spelled in this convention.
    pub fn admits(self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        match self {
            // Single underscores between words only.
            NamingConvention::SnakeCase => {
                first.is_ascii_lowercase()
                    && name.split('_').all(|word| {
                        !word.is_empty() && word.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                    })
            }
            NamingConvention::CamelCase => {
                first.is_ascii_lowercase() && chars.all(|c| c.is_ascii_alphanumeric())
            }
        }
    }

    /// Respell `name`, assumed to be in this convention, in `target`.
    pub fn translate(self, name: &str, target: NamingConvention) -> String {
        match (self, target) {
            (NamingConvention::SnakeCase, NamingConvention::CamelCase) => {
                let mut out = String::with_capacity(name.len());
                let mut upper = false;
                for c in name.chars() {
                    if c == '_' {
                        upper = !out.is_empty();
                    } else if upper {
                        out.push(c.to_ascii_uppercase());
                        upper = false;
                    } else {
                        out.push(c);
                    }
                }
                out
            }
            (NamingConvention::CamelCase, NamingConvention::SnakeCase) => {
                let mut out = String::with_capacity(name.len() + 4);
                for c in name.chars() {
                    if c.is_ascii_uppercase() {
                        out.push('_');
                        out.push(c.to_ascii_lowercase());
                    } else {
                        out.push(c);
                    }
                }
                out
            }
            _ => name.to_string(),
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host-side and engine-side method naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    pub local: NamingConvention,
    pub remote: NamingConvention,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            local: NamingConvention::SnakeCase,
            remote: NamingConvention::CamelCase,
        }
    }
}

/// Methods implemented on the host side that shadow remote ones.
pub trait LocalOverrides {
    /// `None` when `name` is not overridden.
    fn call_local(&self, target: &RemoteObject, name: &str, args: &[Arg]) -> Option<Result<RemoteValue>>;
}

impl LocalOverrides for () {
    fn call_local(&self, _: &RemoteObject, _: &str, _: &[Arg]) -> Option<Result<RemoteValue>> {
        None
    }
}

/// A remote object plus the context it lives in.
#[derive(Clone)]
pub struct RemoteObject {
    ctx: Context,
    handle: RemoteHandle,
}

impl fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemoteObject").field(&self.handle).finish()
    }
}

impl RemoteObject {
    pub fn new(ctx: &Context, handle: RemoteHandle) -> Self {
        Self {
            ctx: ctx.clone(),
            handle,
        }
    }

    /// Instantiate `class` in the engine.
    pub fn construct(ctx: &Context, class: &str, args: &[Arg]) -> Result<Self> {
        let handle = ctx.gateway().construct(class, args)?;
        Ok(Self::new(ctx, handle))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn handle(&self) -> &RemoteHandle {
        &self.handle
    }

    pub fn into_handle(self) -> RemoteHandle {
        self.handle
    }

    /// Resolve `name` against `overrides`, then the remote object.
    pub fn dispatch(&self, overrides: &dyn LocalOverrides, name: &str, args: &[Arg]) -> Result<RemoteValue> {
        let conventions = self.ctx.conventions();
        let convention_error = || BridgeError::NamingConvention {
            name: name.to_string(),
            expected: conventions.local.to_string(),
        };
        if !conventions.local.admits(name) {
            return Err(convention_error());
        }
        if let Some(result) = overrides.call_local(self, name, args) {
            return result;
        }
        // Two host names must never reach the same remote method.
        let remote = conventions.local.translate(name, conventions.remote);
        if conventions.remote.translate(&remote, conventions.local) != name {
            return Err(convention_error());
        }
        debug!(local = name, remote = remote.as_str(), "forwarding to remote object");
        self.call(&remote, args)
    }

    /// `dispatch` with nothing overridden.
    pub fn invoke(&self, name: &str, args: &[Arg]) -> Result<RemoteValue> {
        self.dispatch(&(), name, args)
    }

    /// Call an engine method by its engine-side name.
    pub fn call(&self, method: &str, args: &[Arg]) -> Result<RemoteValue> {
        Ok(self.ctx.gateway().invoke(&self.handle, method, args)?)
    }

    pub fn class_name(&self) -> Result<String> {
        Ok(self.ctx.gateway().class_name(&self.handle)?)
    }
}
