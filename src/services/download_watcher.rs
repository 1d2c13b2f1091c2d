//! 下载目录监视 - 业务能力层
//!
//! 点击下载之前记录目录快照，之后轮询目录，找出新出现且已经写完的文件。

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::infrastructure::Sleeper;
use crate::utils::poll::{poll_until, PollSchedule};

/// Chromium 下载过程中的临时文件后缀
const PARTIAL_SUFFIX: &str = ".crdownload";
/// Chromium 写入前的占位文件前缀
const PARTIAL_PREFIX: &str = ".com.google.Chrome";

pub struct DownloadWatcher {
    dir: PathBuf,
    snapshot: BTreeSet<String>,
}

impl DownloadWatcher {
    /// 记录 `dir` 当前的文件列表
    pub async fn snapshot(dir: &Path) -> Result<Self> {
        let snapshot = list_entries(dir)
            .await
            .with_context(|| format!("无法读取下载目录: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            snapshot,
        })
    }

    /// 当前目录中不在快照里、且不是半成品的第一个文件
    pub async fn find_new_file(&self) -> Option<PathBuf> {
        // 轮询期间目录读失败按"暂无新文件"处理
        let current = list_entries(&self.dir).await.ok()?;
        current
            .difference(&self.snapshot)
            .find(|name| !is_partial_download(name))
            .map(|name| self.dir.join(name))
    }

    /// 按计划轮询，发现新文件后再等待 `settle` 让写入收尾
    ///
    /// 超时返回 `None`
    pub async fn wait_for_new_file(
        &self,
        schedule: PollSchedule,
        settle: Duration,
        sleeper: &dyn Sleeper,
    ) -> Option<PathBuf> {
        let found = poll_until(schedule, sleeper, || self.find_new_file()).await?;
        debug!("发现新下载文件: {}", found.display());
        sleeper.sleep(settle).await;
        Some(found)
    }
}

pub fn is_partial_download(name: &str) -> bool {
    name.ends_with(PARTIAL_SUFFIX) || name.starts_with(PARTIAL_PREFIX)
}

async fn list_entries(dir: &Path) -> std::io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}
