pub mod apply_flow;
pub mod job_ctx;
pub mod job_flow;

pub use apply_flow::ApplyFlow;
pub use job_ctx::JobCtx;
pub use job_flow::JobFlow;
