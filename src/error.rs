//! 行级错误分类
//!
//! 每一行的所有失败都在这里落地，最终转换成输出表里的 status 文本；
//! 原始原因单独保存在 `diagnostic` 中，方便程序判断。

use thiserror::Error;

use crate::models::OutcomeKind;

/// 单行处理失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// 页面上找不到可点击的下载链接
    #[error("Download Button Not Found")]
    DownloadButtonNotFound,

    /// 超时仍未出现新的下载文件
    #[error("Download Timeout")]
    DownloadTimeout,

    /// 下载到的文件类型无法识别
    #[error("Unsupported File Type")]
    UnsupportedFileType { extension: String },

    /// 读取或解析下载文件时出错
    #[error("Error: {cause}")]
    Classification { cause: String },

    /// 浏览器启动、导航等会话层面的失败
    #[error("Error: {cause}")]
    Session { cause: String },

    /// 输入表中该行无法解析
    #[error("Error: {cause}")]
    MalformedInput { cause: String },
}

impl RowError {
    pub fn classification(cause: impl ToString) -> Self {
        RowError::Classification {
            cause: cause.to_string(),
        }
    }

    pub fn session(cause: impl ToString) -> Self {
        RowError::Session {
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            RowError::DownloadButtonNotFound => OutcomeKind::DownloadButtonNotFound,
            RowError::DownloadTimeout => OutcomeKind::DownloadTimeout,
            RowError::UnsupportedFileType { .. } => OutcomeKind::UnsupportedFileType,
            RowError::Classification { .. }
            | RowError::Session { .. }
            | RowError::MalformedInput { .. } => OutcomeKind::Error,
        }
    }

    /// 写入输出表的 status 文本
    pub fn status_text(&self) -> String {
        self.to_string()
    }

    /// 额外的诊断信息（不写入输出表）
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            RowError::DownloadButtonNotFound | RowError::DownloadTimeout => None,
            RowError::UnsupportedFileType { extension } => {
                Some(format!("extension: {}", extension))
            }
            RowError::Classification { cause }
            | RowError::Session { cause }
            | RowError::MalformedInput { cause } => Some(cause.clone()),
        }
    }
}

/// 行级结果类型
pub type RowResult<T> = Result<T, RowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_texts_are_exact() {
        assert_eq!(
            RowError::DownloadButtonNotFound.status_text(),
            "Download Button Not Found"
        );
        assert_eq!(RowError::DownloadTimeout.status_text(), "Download Timeout");
        assert_eq!(
            RowError::UnsupportedFileType {
                extension: "txt".into()
            }
            .status_text(),
            "Unsupported File Type"
        );
        assert_eq!(
            RowError::classification("bad xref").status_text(),
            "Error: bad xref"
        );
    }

    #[test]
    fn test_kind_and_diagnostic() {
        let err = RowError::session("launch failed");
        assert_eq!(err.kind(), OutcomeKind::Error);
        assert_eq!(err.diagnostic().as_deref(), Some("launch failed"));
        assert_eq!(RowError::DownloadTimeout.diagnostic(), None);
    }
}
