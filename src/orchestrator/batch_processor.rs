//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量行的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：准备下载目录、创建浏览器启动器
//! 2. **批量加载**：读取输入表并跳过起始行（`Vec<InputRecord>`），无法解析的行同样占一个结果
//! 3. **分批处理**：按 `batch_size` 切分，批与批之间严格串行
//! 4. **并发控制**：每批新建 Semaphore，worker 数为 min(CPU 数, max_workers)
//! 5. **结果写入**：按完成顺序逐行写入输出表并立即 flush
//! 6. **全局统计**：汇总所有行的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单行的细节，委托 `RowProcessor`
//! - **唯一写者**：只有本模块持有 `ResultWriter`，worker 之间没有共享可变状态

use crate::browser::ChromiumLauncher;
use crate::config::Config;
use crate::error::RowError;
use crate::infrastructure::{BrowserLauncher, Sleeper, TokioSleeper};
use crate::models::{load_input_rows, InputRecord, OutcomeKind, ResultRow};
use crate::services::ResultWriter;
use crate::utils::logging::{
    log_batch_complete, log_batch_start, log_rows_loaded, log_startup, print_final_stats,
};
use crate::workflow::{RowCtx, RowProcessor};
use anyhow::{Context, Result};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    processor: Arc<RowProcessor>,
}

impl App {
    /// 初始化应用：使用真实的无头浏览器
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(config.pool_size(), config.batch_size, config.start_row);

        tokio::fs::create_dir_all(&config.download_dir)
            .await
            .with_context(|| format!("无法创建下载目录: {}", config.download_dir.display()))?;

        let launcher = Arc::new(ChromiumLauncher::new(&config));
        Ok(Self::with_components(config, launcher, Arc::new(TokioSleeper)))
    }

    /// 使用指定的浏览器启动器和睡眠实现构建应用
    pub fn with_components(
        config: Config,
        launcher: Arc<dyn BrowserLauncher>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let processor = Arc::new(RowProcessor::new(&config, launcher, sleeper));
        Self { config, processor }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        // 读取输入表失败是唯一的致命错误
        let input_path = self.config.input_path();
        let start_row = self.config.start_row;
        let all_rows = tokio::task::spawn_blocking(move || load_input_rows(&input_path, start_row))
            .await
            .context("读取输入表的任务异常退出")??;

        if all_rows.is_empty() {
            warn!("⚠️ 跳过起始行后没有待处理的行，程序结束");
            return Ok(RunStats::default());
        }

        log_rows_loaded(all_rows.len(), self.config.batch_size);

        let mut writer = ResultWriter::open(self.config.output_path())?;

        let stats = self.process_all_rows(&all_rows, &mut writer).await?;

        print_final_stats(
            stats.invoice_present,
            stats.no_invoice,
            stats.failed,
            stats.total,
            writer.path(),
        );

        Ok(stats)
    }

    /// 分批处理所有行
    async fn process_all_rows(
        &self,
        all_rows: &[InputRecord],
        writer: &mut ResultWriter,
    ) -> Result<RunStats> {
        let batch_size = self.config.batch_size;
        let total_rows = all_rows.len();
        let total_batches = total_rows.div_ceil(batch_size);
        let mut stats = RunStats {
            total: total_rows,
            ..Default::default()
        };

        for (batch_idx, batch_rows) in all_rows.chunks(batch_size).enumerate() {
            let batch_num = batch_idx + 1;
            let batch_start = batch_idx * batch_size;

            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch_rows.len(),
                total_rows,
            );

            let batch_result = self
                .process_batch(batch_rows, batch_num, batch_start, total_rows, writer)
                .await?;

            log_batch_complete(
                batch_num,
                batch_result.invoice_present + batch_result.no_invoice,
                batch_rows.len(),
            );
            stats.merge(&batch_result);
        }

        info!("Processing complete.");
        Ok(stats)
    }

    /// 处理单个批次
    ///
    /// 每批新建一个 worker 池，整批一次性派发；结果按完成顺序写出。
    async fn process_batch(
        &self,
        batch_rows: &[InputRecord],
        batch_num: usize,
        batch_start: usize,
        total_rows: usize,
        writer: &mut ResultWriter,
    ) -> Result<RunStats> {
        let pool = Arc::new(Semaphore::new(self.config.pool_size()));
        let mut tasks = JoinSet::new();
        // 已派发但尚未写出结果的行：序号 -> filehash
        let mut pending = BTreeMap::new();

        for (idx, record) in batch_rows.iter().enumerate() {
            let ctx = RowCtx::new(batch_num, batch_start + idx + 1, total_rows);
            let record = record.clone();
            let pool = pool.clone();
            let processor = self.processor.clone();
            pending.insert(idx, record_filehash(&record).to_string());

            tasks.spawn(async move {
                let row = match record {
                    Ok(row) => row,
                    Err(malformed) => {
                        error!("{} [ERROR] 输入行无法解析: {}", ctx, malformed.cause);
                        let result = ResultRow::failed(
                            malformed.filehash.as_str(),
                            "",
                            &malformed.to_error(),
                        );
                        return (idx, result);
                    }
                };
                let _permit = pool.acquire_owned().await;
                let result = match AssertUnwindSafe(processor.run(&row, &ctx))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(panic) => {
                        let cause = format!("worker panicked: {}", panic_message(panic.as_ref()));
                        error!("{} ❌ {}", ctx, cause);
                        ResultRow::failed(row.filehash.as_str(), "", &RowError::session(cause))
                    }
                };
                (idx, result)
            });
        }

        collect_batch(tasks, pending, batch_rows.len(), writer).await
    }
}

fn record_filehash(record: &InputRecord) -> &str {
    match record {
        Ok(row) => &row.filehash,
        Err(malformed) => &malformed.filehash,
    }
}

/// 按完成顺序收集一批的结果并逐行写出
///
/// 任务本身没能交回结果（被取消或在 catch_unwind 之外崩溃）的行，
/// 在整批结束后补写一条 `Error:` 结果，保证每个输入行恰好对应一行输出。
async fn collect_batch(
    mut tasks: JoinSet<(usize, ResultRow)>,
    mut pending: BTreeMap<usize, String>,
    batch_len: usize,
    writer: &mut ResultWriter,
) -> Result<RunStats> {
    let mut result = RunStats {
        total: batch_len,
        ..Default::default()
    };

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, row_result)) => {
                pending.remove(&idx);
                writer.write(&row_result)?;
                info!("[WRITTEN] {} -> {}", row_result.filehash, row_result.status);
                result.record(row_result.kind);
            }
            Err(e) => error!("任务执行失败: {}", e),
        }
    }

    for (_, filehash) in pending {
        let lost = ResultRow::failed(
            filehash,
            "",
            &RowError::session("worker task did not complete"),
        );
        writer.write(&lost)?;
        warn!("[WRITTEN] {} -> {}", lost.filehash, lost.status);
        result.record(lost.kind);
    }

    Ok(result)
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub invoice_present: usize,
    pub no_invoice: usize,
    pub failed: usize,
}

impl RunStats {
    fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::InvoicePresent => self.invoice_present += 1,
            OutcomeKind::NoInvoiceFound => self.no_invoice += 1,
            _ => self.failed += 1,
        }
    }

    fn merge(&mut self, batch: &RunStats) {
        self.invoice_present += batch.invoice_present;
        self.no_invoice += batch.no_invoice;
        self.failed += batch.failed;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
