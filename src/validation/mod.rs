//! Request Validation Module
//!
//! This module validates batch requests before they enter the pipeline.
//! Performs shape checks: wallet count bounds, amount bounds, metadata
//! presence, and total-cost overflow.

mod validator;
pub use validator::Validator;
