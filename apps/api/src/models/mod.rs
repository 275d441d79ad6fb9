pub mod audit;
pub mod recruiter;
pub mod subscription;
