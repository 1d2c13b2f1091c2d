pub mod row_ctx;
pub mod row_flow;

pub use row_ctx::RowCtx;
pub use row_flow::RowProcessor;
