use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RowError;

/// 输入表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputRow {
    /// 唯一标识
    pub filehash: String,
    /// 需要打开的下载页面链接
    pub assetlink: String,
}

/// 无法解析的输入行
///
/// 不会中断整个程序，而是在输出表中记为一条 `Error:` 结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    /// 输入表中的行号（表头为第 1 行）
    pub line: u64,
    /// 能读到的 filehash，读不到时为空
    pub filehash: String,
    pub cause: String,
}

impl MalformedRow {
    pub fn to_error(&self) -> RowError {
        RowError::MalformedInput {
            cause: format!("malformed input row {}: {}", self.line, self.cause),
        }
    }
}

/// 加载器产出的一条记录：正常行或无法解析的行
pub type InputRecord = Result<InputRow, MalformedRow>;

/// 成功分类后的发票状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    InvoicePresent,
    NoInvoiceFound,
}

impl InvoiceStatus {
    /// 根据文本中是否包含标记判定状态
    pub fn from_text(text: &str, marker: &str) -> Self {
        if text.contains(marker) {
            InvoiceStatus::NoInvoiceFound
        } else {
            InvoiceStatus::InvoicePresent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::InvoicePresent => "Invoice Present",
            InvoiceStatus::NoInvoiceFound => "No Invoice Found",
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            InvoiceStatus::InvoicePresent => OutcomeKind::InvoicePresent,
            InvoiceStatus::NoInvoiceFound => OutcomeKind::NoInvoiceFound,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一行处理结果的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    InvoicePresent,
    NoInvoiceFound,
    DownloadButtonNotFound,
    DownloadTimeout,
    UnsupportedFileType,
    Error,
}

impl OutcomeKind {
    /// 是否完成了分类（有发票或确认无发票）
    pub fn is_classified(&self) -> bool {
        matches!(self, OutcomeKind::InvoicePresent | OutcomeKind::NoInvoiceFound)
    }
}

/// 输出表中的一行
///
/// 只有 `filehash`, `filename`, `status` 三列会被写出。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub filehash: String,
    /// 下载到的文件名，在分类之前就失败时为空
    pub filename: String,
    pub status: String,
    #[serde(skip)]
    pub kind: OutcomeKind,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl ResultRow {
    pub fn classified(filehash: impl Into<String>, filename: impl Into<String>, status: InvoiceStatus) -> Self {
        Self {
            filehash: filehash.into(),
            filename: filename.into(),
            status: status.as_str().to_string(),
            kind: status.kind(),
            diagnostic: None,
        }
    }

    pub fn failed(filehash: impl Into<String>, filename: impl Into<String>, error: &RowError) -> Self {
        Self {
            filehash: filehash.into(),
            filename: filename.into(),
            status: error.status_text(),
            kind: error.kind(),
            diagnostic: error.diagnostic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_decides_status() {
        assert_eq!(
            InvoiceStatus::from_text("Sorry, No Invoice available", "No Invoice"),
            InvoiceStatus::NoInvoiceFound
        );
        assert_eq!(
            InvoiceStatus::from_text("Tax Invoice #42", "No Invoice"),
            InvoiceStatus::InvoicePresent
        );
        // 空文本视为"有发票"
        assert_eq!(
            InvoiceStatus::from_text("", "No Invoice"),
            InvoiceStatus::InvoicePresent
        );
    }

    #[test]
    fn test_malformed_row_becomes_error_status() {
        let malformed = MalformedRow {
            line: 3,
            filehash: "h2".into(),
            cause: "missing field `assetlink`".into(),
        };
        let row = ResultRow::failed(malformed.filehash.as_str(), "", &malformed.to_error());
        assert_eq!(row.filehash, "h2");
        assert_eq!(row.kind, OutcomeKind::Error);
        assert_eq!(
            row.status,
            "Error: malformed input row 3: missing field `assetlink`"
        );
    }

    #[test]
    fn test_failed_row_keeps_cause_separately() {
        let row = ResultRow::failed("abc", "bill.pdf", &RowError::classification("broken xref"));
        assert_eq!(row.status, "Error: broken xref");
        assert_eq!(row.filename, "bill.pdf");
        assert_eq!(row.kind, OutcomeKind::Error);
        assert_eq!(row.diagnostic.as_deref(), Some("broken xref"));
    }
}
