//! 行处理上下文
//!
//! 封装"我正在处理第几批的第几行"这一信息

use std::fmt::Display;

/// 行处理上下文（仅用于日志）
#[derive(Debug, Clone, Copy)]
pub struct RowCtx {
    /// 批次编号（从1开始）
    pub batch: usize,
    /// 行在本次运行中的序号（从1开始）
    pub index: usize,
    /// 本次运行的总行数
    pub total: usize,
}

impl RowCtx {
    pub fn new(batch: usize, index: usize, total: usize) -> Self {
        Self {
            batch,
            index,
            total,
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {} 行 {}/{}]", self.batch, self.index, self.total)
    }
}
