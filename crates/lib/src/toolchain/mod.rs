//! Toolchain resolution.
//!
//! A [`ToolchainRequest`] ("stable, latest" or a pinned version) is resolved once
//! per evaluation into a [`Toolchain`], which is then passed explicitly to every
//! build. A changed pin changes every build hash.

mod rustup;
mod types;

pub use rustup::RustupResolver;
pub use types::*;

use std::future::Future;

/// Resolves a toolchain request into a concrete, pinned toolchain.
pub trait ToolchainResolver {
  fn resolve(&self, request: &ToolchainRequest) -> impl Future<Output = Result<Toolchain, ResolutionError>> + Send;
}

/// Resolver that always answers with the same toolchain.
#[derive(Debug, Clone)]
pub struct FixedResolver {
  toolchain: Toolchain,
}

impl FixedResolver {
  pub fn new(toolchain: Toolchain) -> Self {
    Self { toolchain }
  }
}

impl ToolchainResolver for FixedResolver {
  async fn resolve(&self, request: &ToolchainRequest) -> Result<Toolchain, ResolutionError> {
    let mut toolchain = self.toolchain.clone();
    toolchain.components = request.components.clone();
    Ok(toolchain)
  }
}
