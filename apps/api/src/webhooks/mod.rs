// PayFast payment notifications: verify, classify, reconcile billing state, audit.
// Order of stages is fixed; see `processor` for the pipeline.

pub mod audit;
pub mod classifier;
pub mod credits;
pub mod handlers;
pub mod payload;
pub mod processor;
pub mod signature;
pub mod subscription;
