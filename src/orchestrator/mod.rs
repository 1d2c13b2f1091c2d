//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责分批和并发调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载输入表并按固定大小分批
//! - 每批新建一个有界 worker 池（Semaphore + JoinSet）
//! - 按完成顺序把结果写入输出表
//! - 输出批次与全局统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<InputRow>)
//!     ↓
//! workflow::RowProcessor (处理单个 InputRow)
//!     ↓
//! services (能力层：watcher / classifier / writer)
//!     ↓
//! infrastructure (基础设施：BrowserLauncher / Sleeper)
//! ```

pub mod batch_processor;

pub use batch_processor::{App, RunStats};
