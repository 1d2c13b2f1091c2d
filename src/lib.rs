//! # Invoice Checker
//!
//! 批量下载输入表中每一行对应的发票文档，判断文档里是否出现"无发票"标记，
//! 并把每行的结果追加到输出表中。
//!
//! ## 架构设计
//!
//! 本系统沿用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露能力，不认识业务数据
//! - `BrowserLauncher` / `BrowserSession` - 打开链接、点击下载、关闭
//! - `Sleeper` - 所有固定等待的唯一入口
//! - `browser/` - 基于 chromiumoxide 的无头 Chromium 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件或单行
//! - `DownloadWatcher` - 发现新下载的文件
//! - `DocumentClassifier` - HTML / PDF 文本分类
//! - `ResultWriter` - 追加写输出表
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行"的完整处理流程
//! - `RowCtx` - 上下文封装（批次 + 行号）
//! - `RowProcessor` - 流程编排（下载 → 分类 → 清理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分批、并发、按完成顺序写结果
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::ChromiumLauncher;
pub use config::Config;
pub use error::{RowError, RowResult};
pub use infrastructure::{BrowserLauncher, BrowserSession, Sleeper, TokioSleeper};
pub use models::{InputRecord, InputRow, InvoiceStatus, MalformedRow, OutcomeKind, ResultRow};
pub use orchestrator::{App, RunStats};
pub use workflow::{RowCtx, RowProcessor};
