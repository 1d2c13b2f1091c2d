//! 测试用的浏览器替身
//!
//! 按链接决定"点击后会下载什么"，并记录启动/关闭次数、同时存活的会话数
//! 以及启动和关闭的先后顺序。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use super::{BrowserLauncher, BrowserSession};

/// 点击下载链接后的行为
#[derive(Debug, Clone)]
pub enum FakeDownload {
    /// 页面上没有 `<a>`
    NoAnchor,
    /// 点击成功但什么都没下载
    Nothing,
    /// 只留下一个未完成的临时文件
    Partial(String),
    /// 下载得到一个文件
    File { name: String, bytes: Vec<u8> },
    /// 点击时崩溃
    Panic,
}

impl FakeDownload {
    pub fn file(name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        FakeDownload::File {
            name: name.to_string(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeStats {
    pub launched: AtomicUsize,
    pub closed: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
    /// `launch:<目录名>` / `close:<目录名>`，按发生顺序
    pub events: Mutex<Vec<String>>,
}

impl FakeStats {
    fn on_launch(&self, label: &str) {
        self.launched.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("launch:{}", label));
    }

    fn on_close(&self, label: &str) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("close:{}", label));
    }

    /// 同一时刻存活的会话数的最大值
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct FakeLauncher {
    by_link: HashMap<String, FakeDownload>,
    fallback: FakeDownload,
    fail_launch: bool,
    pub stats: Arc<FakeStats>,
}

impl FakeLauncher {
    pub fn new(fallback: FakeDownload) -> Self {
        Self {
            by_link: HashMap::new(),
            fallback,
            fail_launch: false,
            stats: Arc::new(FakeStats::default()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(FakeDownload::Nothing)
        }
    }

    pub fn with_link(mut self, link: &str, download: FakeDownload) -> Self {
        self.by_link.insert(link.to_string(), download);
        self
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            anyhow::bail!("chrome not found");
        }
        let label = dir_label(download_dir);
        self.stats.on_launch(&label);
        Ok(Box::new(FakeSession {
            label,
            download_dir: download_dir.to_path_buf(),
            by_link: self.by_link.clone(),
            fallback: self.fallback.clone(),
            current: None,
            stats: self.stats.clone(),
        }))
    }
}

fn dir_label(download_dir: &Path) -> String {
    download_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct FakeSession {
    label: String,
    download_dir: PathBuf,
    by_link: HashMap<String, FakeDownload>,
    fallback: FakeDownload,
    current: Option<FakeDownload>,
    stats: Arc<FakeStats>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.stats.visited.lock().unwrap().push(url.to_string());
        self.current = Some(
            self.by_link
                .get(url)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
        );
        Ok(())
    }

    async fn click_first_anchor(&mut self) -> bool {
        match self.current.clone() {
            None | Some(FakeDownload::NoAnchor) => false,
            Some(FakeDownload::Nothing) => true,
            Some(FakeDownload::Partial(name)) => {
                std::fs::write(self.download_dir.join(name), b"partial").unwrap();
                true
            }
            Some(FakeDownload::File { name, bytes }) => {
                std::fs::write(self.download_dir.join(name), bytes).unwrap();
                true
            }
            Some(FakeDownload::Panic) => panic!("renderer crashed"),
        }
    }

    async fn close(self: Box<Self>) {
        self.stats.on_close(&self.label);
    }
}
