use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::infrastructure::{BrowserLauncher, BrowserSession};

/// 无头 Chromium 启动器
///
/// 每行启动一个独立的浏览器进程，使用各自的 user-data 目录，互不干扰。
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    profile_root: PathBuf,
    chrome_executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            profile_root: config.download_dir.join(".profiles"),
            chrome_executable: config.chrome_executable.clone(),
        }
    }

    fn profile_dir_for(&self, download_dir: &Path) -> PathBuf {
        let name = download_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string());
        self.profile_root.join(name)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn BrowserSession>> {
        let download_dir = tokio::fs::canonicalize(download_dir)
            .await
            .with_context(|| format!("下载目录不可用: {}", download_dir.display()))?;
        let profile_dir = self.profile_dir_for(&download_dir);
        tokio::fs::create_dir_all(&profile_dir)
            .await
            .with_context(|| format!("无法创建浏览器配置目录: {}", profile_dir.display()))?;

        debug!("启动无头浏览器, 下载目录: {}", download_dir.display());

        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .user_data_dir(&profile_dir)
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ]);
        if let Some(executable) = &self.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let browser_config = builder.build().map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            anyhow!("配置无头浏览器失败: {}", e)
        })?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            anyhow!("启动无头浏览器失败: {}", e)
        })?;

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let mut session = ChromiumSession {
            browser,
            page: None,
            handler_task,
            profile_dir,
        };

        // 允许自动下载到本行目录，不弹窗
        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.to_string_lossy().into_owned())
            .build()
            .map_err(|e| anyhow!("构造下载行为参数失败: {}", e))?;
        if let Err(e) = session.browser.execute(behavior).await {
            Box::new(session).close().await;
            return Err(anyhow!("设置下载目录失败: {}", e));
        }

        // 添加短暂延迟以等待浏览器状态同步
        sleep(tokio::time::Duration::from_millis(300)).await;

        Ok(Box::new(session))
    }
}

/// 一个 Chromium 进程及其 CDP 事件循环
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        let page = self.browser.new_page("about:blank").await.map_err(|e| {
            error!("创建新页面失败: {}", e);
            e
        })?;
        page.goto(url).await.map_err(|e| {
            error!("导航到 {} 失败: {}", url, e);
            e
        })?;
        debug!("已导航到: {}", url);
        self.page = Some(page);
        Ok(())
    }

    async fn click_first_anchor(&mut self) -> bool {
        let Some(page) = &self.page else {
            return false;
        };
        let anchor = match page.find_element("a").await {
            Ok(anchor) => anchor,
            Err(e) => {
                debug!("页面上没有 <a> 元素: {}", e);
                return false;
            }
        };
        match anchor.click().await {
            Ok(_) => true,
            Err(e) => {
                debug!("点击下载链接失败: {}", e);
                false
            }
        }
    }

    async fn close(mut self: Box<Self>) {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        self.handler_task.abort();
        let _ = tokio::fs::remove_dir_all(&self.profile_dir).await;
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser 自身的 Drop 会结束子进程，这里只需停掉事件循环
        self.handler_task.abort();
    }
}
