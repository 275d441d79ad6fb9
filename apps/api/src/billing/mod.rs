// Recruiter billing state: subscriptions, job-posting credits, payment audit trail.
// All reads and writes go through `BillingStore`; handlers never touch SQL directly.

pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod store;
