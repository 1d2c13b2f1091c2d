//! 浏览器会话能力 - 基础设施层
//!
//! 只描述"打开链接、点击下载、关闭"这几种能力，
//! 不认识 InputRow，也不关心下载之后的处理。

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

/// 浏览器启动器
///
/// 每次调用都得到一个相互隔离的会话，下载文件落到 `download_dir`，不弹出确认框。
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn BrowserSession>>;
}

/// 单个浏览器会话
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到指定链接
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// 点击页面上第一个 `<a>` 元素
    ///
    /// 找不到元素或点击失败时返回 `false`
    async fn click_first_anchor(&mut self) -> bool;

    /// 释放会话持有的全部资源
    async fn close(self: Box<Self>);
}
