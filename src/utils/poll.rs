//! 固定间隔轮询
//!
//! 把"每隔一段时间检查一次，最多检查 N 次"抽成一个原语，
//! 睡眠通过 [`Sleeper`] 注入，测试里不需要真实等待。

use std::future::Future;
use std::time::Duration;

use crate::infrastructure::Sleeper;

/// 轮询计划：间隔 + 最大尝试次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSchedule {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// 反复执行 `check` 直到它返回 `Some`，每次落空后睡眠一个间隔。
///
/// 最多执行 `max_attempts` 次；全部落空时返回 `None`。
pub async fn poll_until<T, F, Fut>(
    schedule: PollSchedule,
    sleeper: &dyn Sleeper,
    mut check: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for _ in 0..schedule.max_attempts {
        if let Some(found) = check().await {
            return Some(found);
        }
        sleeper.sleep(schedule.interval).await;
    }
    None
}
