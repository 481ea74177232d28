//! Launch Module
//!
//! This module drives the external token-creation capability:
//! - LaunchService: the creation endpoint as a trait, with an HTTP adapter
//! - LaunchInvoker: per-wallet bounded retry and outcome classification
//!
//! The invoker's contract is the load-bearing one: `launch` always resolves
//! to a terminal `LaunchOutcome`; one wallet's failure never propagates as
//! an error into the batch.

mod invoker;
mod service;

pub use invoker::LaunchInvoker;
pub use service::{HttpLaunchService, LaunchReceipt, LaunchService};
