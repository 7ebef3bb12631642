pub mod pool;
pub mod request;

pub use pool::JobPool;
pub use request::{GenerationRequest, JobOutcome};
