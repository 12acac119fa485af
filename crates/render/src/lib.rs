// crates/render/src/lib.rs
//! Render job orchestration: process supervision, progress extraction,
//! and lifecycle event fan-out.
//!
//! The render engine is an external executable treated as a black box:
//! it takes an input and an output path, prints `Bundling: N%` and
//! `Rendering: N%` markers on stdout, and signals success with exit
//! code 0. This crate turns one invocation of that executable into a
//! supervised job with a single terminal outcome, tracked in a
//! [`JobRegistry`] and broadcast over an [`EventBridge`].

pub mod bridge;
pub mod progress;
pub mod registry;
pub mod supervisor;

pub use bridge::EventBridge;
pub use progress::{ProgressExtractor, ProgressObservation};
pub use registry::{JobEntry, JobRegistry, RegistryError};
pub use supervisor::{CancelOutcome, RenderManager, RendererConfig, StartRenderError};
