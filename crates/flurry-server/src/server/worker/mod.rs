//! The issuing worker.
//!
//! A single task owns the [`Generator`](flurry_proto::types::Generator) and
//! answers [`WorkRequest`](request::WorkRequest)s one at a time, in arrival
//! order. Sessions talk to it through a [`WorkerHandle`](manager::WorkerHandle).
//!
//! ## Structure
//!
//! - [`request`] - Messages accepted by the worker.
//! - [`task`] - The worker loop and its wait strategy.
//! - [`manager`] - Handle used to submit requests and to stop the worker.

pub mod manager;
pub mod request;
pub mod task;
