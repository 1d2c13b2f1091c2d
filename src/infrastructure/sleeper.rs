//! 睡眠能力
//!
//! 处理流程里所有固定等待（页面稳定、下载轮询、写入收尾）都走这里。

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 生产环境使用的 tokio 定时器
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 测试用：不真正睡眠，只记录每次请求的时长
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    calls: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.calls().iter().sum()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}
