use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::poll::PollSchedule;

/// 程序配置
///
/// 所有路径、批大小、等待时长都集中在这里，显式传给驱动器和单行处理器。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 工作区根目录，相对路径的输入/输出表都以它为基准
    pub workspace_root: PathBuf,
    /// 输入表（需要表头 filehash, assetlink）
    pub input_csv: PathBuf,
    /// 输出表（filehash, filename, status），追加写入
    pub output_csv: PathBuf,
    /// 下载暂存目录，每行在其下拥有 `<filehash>` 子目录
    pub download_dir: PathBuf,
    /// 调试日志文件（追加写入）
    pub debug_log_file: PathBuf,
    /// 跳过输入表前 N 行，用于断点续跑
    pub start_row: usize,
    /// 每批行数
    pub batch_size: usize,
    /// 并发 worker 上限（实际取 min(CPU 数, max_workers)）
    pub max_workers: usize,
    /// 打开页面后的等待时间
    pub page_settle_secs: u64,
    /// 等待下载文件出现的总时长
    pub download_timeout_secs: u64,
    /// 轮询下载目录的间隔
    pub poll_interval_ms: u64,
    /// 发现新文件后等待写入完成的时间
    pub download_settle_secs: u64,
    /// 判定"没有发票"的标记文本
    pub invoice_marker: String,
    /// 浏览器可执行文件路径，不设置则由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            input_csv: PathBuf::from("indigo_input.csv"),
            output_csv: PathBuf::from("output4.csv"),
            download_dir: PathBuf::from("/tmp/Downloads"),
            debug_log_file: PathBuf::from("/tmp/debug_log.txt"),
            start_row: 160_000,
            batch_size: 500,
            max_workers: 8,
            page_settle_secs: 5,
            download_timeout_secs: 70,
            poll_interval_ms: 1000,
            download_settle_secs: 3,
            invoice_marker: "No Invoice".to_string(),
            chrome_executable: None,
        }
    }
}

impl Config {
    /// 读取配置：若设置了 `INVOICE_CONFIG` 则先加载该 TOML 文件，再叠加环境变量
    pub fn load() -> Result<Self> {
        let base = match std::env::var("INVOICE_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            workspace_root: env_path("GITHUB_WORKSPACE").unwrap_or(self.workspace_root),
            input_csv: env_path("INPUT_CSV").unwrap_or(self.input_csv),
            output_csv: env_path("OUTPUT_CSV").unwrap_or(self.output_csv),
            download_dir: env_path("DOWNLOAD_DIR").unwrap_or(self.download_dir),
            debug_log_file: env_path("DEBUG_LOG_FILE").unwrap_or(self.debug_log_file),
            start_row: env_parse("START_ROW").unwrap_or(self.start_row),
            batch_size: env_parse("BATCH_SIZE").unwrap_or(self.batch_size),
            max_workers: env_parse("MAX_WORKERS").unwrap_or(self.max_workers),
            page_settle_secs: env_parse("PAGE_SETTLE_SECS").unwrap_or(self.page_settle_secs),
            download_timeout_secs: env_parse("DOWNLOAD_TIMEOUT_SECS").unwrap_or(self.download_timeout_secs),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS").unwrap_or(self.poll_interval_ms),
            download_settle_secs: env_parse("DOWNLOAD_SETTLE_SECS").unwrap_or(self.download_settle_secs),
            invoice_marker: std::env::var("INVOICE_MARKER").unwrap_or(self.invoice_marker),
            chrome_executable: env_path("CHROME_EXECUTABLE").or(self.chrome_executable),
        }
    }

    /// 检查会导致驱动器无法工作的取值
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size 必须大于 0");
        }
        if self.max_workers == 0 {
            anyhow::bail!("max_workers 必须大于 0");
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms 必须大于 0");
        }
        if self.invoice_marker.is_empty() {
            anyhow::bail!("invoice_marker 不能为空");
        }
        Ok(())
    }

    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.input_csv)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_csv)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    /// 某一行的私有下载目录
    pub fn row_download_dir(&self, filehash: &str) -> PathBuf {
        self.download_dir.join(filehash)
    }

    /// 每批的 worker 数：min(可用并行度, max_workers)
    pub fn pool_size(&self) -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cpus.min(self.max_workers).max(1)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_secs(self.page_settle_secs)
    }

    pub fn download_settle(&self) -> Duration {
        Duration::from_secs(self.download_settle_secs)
    }

    /// 下载轮询计划：每 `poll_interval_ms` 检查一次，总共不超过 `download_timeout_secs`
    pub fn download_poll(&self) -> PollSchedule {
        let interval = Duration::from_millis(self.poll_interval_ms.max(1));
        let timeout_ms = self.download_timeout_secs.saturating_mul(1000);
        let attempts = (timeout_ms / interval.as_millis() as u64).max(1);
        PollSchedule::new(interval, attempts.min(u32::MAX as u64) as u32)
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
