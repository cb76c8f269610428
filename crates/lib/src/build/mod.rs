//! Package building.
//!
//! [`PackageBuilder`] compiles one package for one platform through a
//! [`Compiler`], classifying failures and sealing the result in the store.

mod classify;
mod compiler;
mod execute;
mod sandbox;
mod types;

pub use classify::{FailureKind, classify};
pub use compiler::{CargoCompiler, CompileFailure, CompileJob, CompileOutput, Compiler};
pub use execute::PackageBuilder;
pub use sandbox::{PkgConfigSandbox, parse_requires, stage_pkg_config};
pub use types::*;
