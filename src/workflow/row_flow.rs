//! 单行处理流程 - 流程层
//!
//! 核心职责：定义"一行"的完整处理流程
//!
//! 流程顺序：
//! 1. 准备本行下载目录并记录快照
//! 2. 启动浏览器 → 打开链接 → 点击第一个 `<a>`
//! 3. 轮询下载目录，等待新文件
//! 4. 关闭浏览器（无论成功与否）
//! 5. 分类文件 → 删除文件 → 生成 ResultRow

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{RowError, RowResult};
use crate::infrastructure::{BrowserLauncher, BrowserSession, Sleeper};
use crate::models::{InputRow, InvoiceStatus, ResultRow};
use crate::services::{Classification, DocumentClassifier, DownloadWatcher};
use crate::workflow::row_ctx::RowCtx;

/// 单行处理器
///
/// - 每行使用独立的浏览器会话和下载目录
/// - 所有失败都在行边界内转换成 ResultRow，不向上抛出
pub struct RowProcessor {
    config: Config,
    launcher: Arc<dyn BrowserLauncher>,
    sleeper: Arc<dyn Sleeper>,
    classifier: DocumentClassifier,
}

impl RowProcessor {
    pub fn new(config: &Config, launcher: Arc<dyn BrowserLauncher>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            config: config.clone(),
            launcher,
            sleeper,
            classifier: DocumentClassifier::new(config.invoice_marker.clone()),
        }
    }

    /// 处理一行，恰好产出一个 ResultRow
    pub async fn run(&self, row: &InputRow, ctx: &RowCtx) -> ResultRow {
        info!("{} [START] {}", ctx, row.filehash);

        let result = match self.download(row).await {
            Ok(file) => self.classify_and_cleanup(row, &file).await,
            Err(e) => ResultRow::failed(row.filehash.as_str(), "", &e),
        };

        if result.kind.is_classified() {
            info!("{} [DONE] {} - {}", ctx, row.filehash, result.status);
        } else {
            error!("{} [ERROR] {} - {}", ctx, row.filehash, result.status);
            if let Some(detail) = &result.diagnostic {
                debug!("{} 诊断信息: {}", ctx, detail);
            }
        }

        result
    }

    /// 下载阶段：返回新下载文件的路径
    async fn download(&self, row: &InputRow) -> RowResult<PathBuf> {
        let row_dir = self.prepare_row_dir(&row.filehash).await?;
        let watcher = DownloadWatcher::snapshot(&row_dir)
            .await
            .map_err(|e| RowError::session(format!("{:#}", e)))?;

        let mut session = self
            .launcher
            .launch(&row_dir)
            .await
            .map_err(|e| RowError::session(format!("{:#}", e)))?;

        let outcome = self.drive(session.as_mut(), row, &watcher).await;

        // 无论上面哪一步失败，都要释放浏览器
        session.close().await;

        outcome
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        row: &InputRow,
        watcher: &DownloadWatcher,
    ) -> RowResult<PathBuf> {
        session
            .goto(&row.assetlink)
            .await
            .map_err(|e| RowError::session(format!("{:#}", e)))?;

        self.sleeper.sleep(self.config.page_settle()).await;

        if !session.click_first_anchor().await {
            return Err(RowError::DownloadButtonNotFound);
        }

        watcher
            .wait_for_new_file(
                self.config.download_poll(),
                self.config.download_settle(),
                self.sleeper.as_ref(),
            )
            .await
            .ok_or(RowError::DownloadTimeout)
    }

    /// 分类阶段：分类后删除文件，删除失败忽略
    async fn classify_and_cleanup(&self, row: &InputRow, file: &Path) -> ResultRow {
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let classifier = self.classifier.clone();
        let path = file.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || classifier.classify(&path))
            .await
            .unwrap_or_else(|e| Err(RowError::classification(format!("解析任务异常退出: {}", e))));

        let _ = tokio::fs::remove_file(file).await;

        match outcome {
            Ok(classification) => {
                flag_empty_text(&row.filehash, &classification);
                ResultRow::classified(row.filehash.as_str(), filename, classification.status)
            }
            Err(e) => ResultRow::failed(row.filehash.as_str(), filename, &e),
        }
    }

    async fn prepare_row_dir(&self, filehash: &str) -> RowResult<PathBuf> {
        if filehash.is_empty()
            || filehash.contains(['/', '\\'])
            || filehash == "."
            || filehash == ".."
        {
            return Err(RowError::session(format!("filehash 不能作为目录名: {:?}", filehash)));
        }
        let dir = self.config.row_download_dir(filehash);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RowError::session(format!("无法创建下载目录 {}: {}", dir.display(), e)))?;
        Ok(dir)
    }
}

/// 没有提取到任何文本却判为"有发票"，多半是扫描件，单独记一条警告
fn flag_empty_text(filehash: &str, classification: &Classification) {
    if classification.status == InvoiceStatus::InvoicePresent && classification.extracted_chars == 0 {
        warn!(
            "⚠️ {} 的 {:?} 文档没有可提取的文本，\"{}\" 仅表示未找到标记",
            filehash,
            classification.kind,
            classification.status
        );
    }
}
