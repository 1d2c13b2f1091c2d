//! 文档分类 - 业务能力层
//!
//! 只负责"这个文件里有没有发票"，不关心文件是怎么来的。

use std::path::Path;

use lopdf::Document;
use scraper::{Html, Node};
use tracing::debug;

use crate::error::{RowError, RowResult};
use crate::models::InvoiceStatus;

/// 不计入可见文本的元素（脚本、样式、模板内容）
const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "template"];

/// 支持的文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Pdf,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "html" => Some(DocumentKind::Html),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: DocumentKind,
    pub status: InvoiceStatus,
    /// 提取到的文本字符数，为 0 时"有发票"的结论并不可靠
    pub extracted_chars: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    marker: String,
}

impl DocumentClassifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// 按扩展名读取文件文本并判断是否包含"无发票"标记
    pub fn classify(&self, path: &Path) -> RowResult<Classification> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| RowError::UnsupportedFileType {
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })?;

        let text = match kind {
            DocumentKind::Html => {
                let content = std::fs::read_to_string(path).map_err(RowError::classification)?;
                html_visible_text(&content)
            }
            DocumentKind::Pdf => pdf_text(path)?,
        };

        let extracted_chars = text.chars().count();
        debug!(
            "{} 提取文本 {} 字符",
            path.display(),
            extracted_chars
        );

        Ok(Classification {
            kind,
            status: InvoiceStatus::from_text(&text, &self.marker),
            extracted_chars,
        })
    }
}

/// 提取 HTML 的可见文本，各文本片段去掉首尾空白后以单个空格连接
pub fn html_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut pieces: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed);
        }
    }

    pieces.join(" ")
}

/// 逐页提取 PDF 文本并拼接，单页失败按空文本处理
pub fn pdf_text(path: &Path) -> RowResult<String> {
    let document = Document::load(path).map_err(RowError::classification)?;

    let pages = document
        .get_pages()
        .into_keys()
        .map(|page_number| (page_number, document.extract_text(&[page_number])));
    Ok(join_page_texts(pages))
}

fn join_page_texts<E: std::fmt::Display>(
    pages: impl IntoIterator<Item = (u32, Result<String, E>)>,
) -> String {
    let mut text = String::new();
    for (page_number, page_text) in pages {
        match page_text {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!("第 {} 页无法提取文本: {}", page_number, e),
        }
    }
    text
}
