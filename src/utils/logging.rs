use anyhow::{Context, Result};
/// 日志工具模块
///
/// 初始化 tracing（终端 + 调试日志文件），并提供批处理各阶段的日志输出函数
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志
///
/// - 终端输出带颜色的日志
/// - 同时以追加方式写入调试日志文件，每个事件一行
/// - 日志级别由 `RUST_LOG` 控制，默认 `info`
pub fn init(debug_log_file: &Path) -> Result<()> {
    if let Some(parent) = debug_log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(debug_log_file)
        .with_context(|| format!("无法打开调试日志: {}", debug_log_file.display()))?;
    writeln!(
        file,
        "{} 发票检查日志 - {} {}",
        "=".repeat(20),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(20)
    )?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(pool_size: usize, batch_size: usize, start_row: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量发票检查模式");
    info!("📊 每批并发 worker 数: {}", pool_size);
    info!("📦 每批行数: {}, 起始行: {}", batch_size, start_row);
    info!("{}", "=".repeat(60));
}

/// 记录输入加载信息
pub fn log_rows_loaded(total: usize, batch_size: usize) {
    info!("✓ 跳过起始行后共 {} 行待处理", total);
    info!("📋 将以每批 {} 行的方式处理", batch_size);
    info!("💡 每批完成后再开始下一批\n");
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始行编号
/// - `end`: 结束行编号
/// - `total`: 总行数
pub fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批行: {}-{} / 共 {} 行", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, classified: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 完成分类 {}/{}", batch_num, classified, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(
    invoice_present: usize,
    no_invoice: usize,
    failed: usize,
    total: usize,
    output_path: &Path,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🧾 Invoice Present: {}/{}", invoice_present, total);
    info!("🚫 No Invoice Found: {}", no_invoice);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path.display());
}
