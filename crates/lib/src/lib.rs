//! ptpack-lib: packaging engine for photo-turntable.
//!
//! This crate provides the pieces that turn a source tree into reproducible,
//! per-platform binaries:
//! - `toolchain`: resolves a pinned compiler/build-tool pair
//! - `native`: declares link-time and build-time-only native dependencies
//! - `lock`: the lock-hash integrity gate over the dependency manifest
//! - `build`: the package builder writing into a content-addressed store
//! - `publish`: lazy per-platform output mapping with a `default` alias
//! - `devshell`: development environment derived from the build inputs

pub mod build;
pub mod config;
pub mod consts;
pub mod devshell;
pub mod lock;
pub mod native;
pub mod package;
pub mod platform;
pub mod publish;
pub mod store;
pub mod toolchain;
pub mod util;
