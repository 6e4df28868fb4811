//! abrforge: adaptive-bitrate packaging pipeline.
//!
//! The binary wires configuration and CLI flags into [`af_pipeline::Pipeline`].
//! The library target exposes the configuration layer for tests and
//! embedders.

pub mod config;
