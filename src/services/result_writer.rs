//! 结果写入服务 - 业务能力层
//!
//! 只负责"往输出表追加一行"能力，不关心行是怎么处理出来的

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::ResultRow;

/// 输出表表头
pub const OUTPUT_HEADER: [&str; 3] = ["filehash", "filename", "status"];

/// 结果写入服务
///
/// 职责：
/// - 以追加方式打开输出表，只在新文件时写表头
/// - 每写一行立即 flush，进程中途退出也不会丢已完成的结果
pub struct ResultWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    written: usize,
}

impl ResultWriter {
    /// 打开（或创建）输出表
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建输出目录: {}", parent.display()))?;
        }

        let needs_header = std::fs::metadata(&path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("无法打开输出表: {}", path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(OUTPUT_HEADER)?;
            writer.flush()?;
            debug!("输出表为新文件，已写入表头: {}", path.display());
        }

        Ok(Self {
            path,
            writer,
            written: 0,
        })
    }

    /// 追加一行结果并立即落盘
    pub fn write(&mut self, row: &ResultRow) -> Result<()> {
        self.writer
            .serialize(row)
            .with_context(|| format!("写入结果失败: {}", self.path.display()))?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// 本次打开后写入的行数
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowError;
    use crate::models::InvoiceStatus;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_written_once_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("output.csv");

        {
            let mut writer = ResultWriter::open(&path).unwrap();
            writer
                .write(&ResultRow::classified("h1", "a.pdf", InvoiceStatus::InvoicePresent))
                .unwrap();
            assert_eq!(writer.written(), 1);
        }
        {
            let mut writer = ResultWriter::open(&path).unwrap();
            writer
                .write(&ResultRow::failed("h2", "", &RowError::DownloadTimeout))
                .unwrap();
        }

        assert_eq!(
            read_lines(&path),
            vec![
                "filehash,filename,status",
                "h1,a.pdf,Invoice Present",
                "h2,,Download Timeout",
            ]
        );
    }

    #[test]
    fn test_rows_visible_before_writer_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut writer = ResultWriter::open(&path).unwrap();
        writer
            .write(&ResultRow::classified("h1", "a.html", InvoiceStatus::NoInvoiceFound))
            .unwrap();

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_error_status_is_quoted_when_needed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut writer = ResultWriter::open(&path).unwrap();
        writer
            .write(&ResultRow::failed(
                "h1",
                "a.pdf",
                &RowError::classification("invalid file header, expected %PDF"),
            ))
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[2], "Error: invalid file header, expected %PDF");
    }
}
