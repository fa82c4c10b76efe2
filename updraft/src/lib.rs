//! Device-side firmware update agent.
//!
//! `updraft` drives over-the-air firmware updates on a dual-bank device:
//! it validates signed update manifests from an update service, downloads
//! the new image in bounded byte-range chunks, verifies it against the
//! manifest digest, and flips the boot bank only after verification
//! passes. A failed update never leaves the device unbootable.
//!
//! # Architecture
//!
//! ```text
//! Hub (trait) ──► UpdateWorkflow ──► ChunkedDownloader ──► RangeFetcher
//!                       │                    │
//!                       │                    └──► ChunkSink
//!                       ├──► ManifestVerifier (trait)
//!                       ├──► DecisionPolicy (trait, optional)
//!                       └──► ImageStore (trait) ──► FileImageStore
//! ```
//!
//! The workflow is a pollable state machine: the hosting application
//! feeds it manifests via
//! [`process_update_request`](workflow::UpdateWorkflow::process_update_request)
//! and ticks it with [`process`](workflow::UpdateWorkflow::process), each
//! call performing one bounded unit of work. All collaborators are trait
//! seams, so hosts supply their own hub transport and signature scheme
//! and tests script every side of the machine.

pub mod config;
pub mod download;
pub mod error;
pub mod hub;
pub mod locator;
pub mod manifest;
pub mod store;
pub mod verify;
pub mod workflow;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use hub::{AgentState, DeviceProperties, Hub, InstallResult, RequestDecision};
pub use manifest::{UpdateAction, UpdateRequest};
pub use store::{FileImageStore, ImageStore};
pub use verify::ManifestVerifier;
pub use workflow::{UpdateWorkflow, WorkflowState};
