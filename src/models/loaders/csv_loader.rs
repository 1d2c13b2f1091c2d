use crate::models::{InputRecord, InputRow, MalformedRow};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// 必须存在的表头
const REQUIRED_COLUMNS: [&str; 2] = ["filehash", "assetlink"];

/// 读取输入表，并跳过前 `start_row` 行
///
/// 表头必须包含 `filehash` 和 `assetlink` 两列，多余的列会被忽略。
/// 文件打不开或缺少必需的表头是致命错误；单行字段数不对或无法解析时，
/// 该行以 [`MalformedRow`] 的形式返回，交给调用方记为一条失败结果。
pub fn load_input_rows(csv_path: &Path, start_row: usize) -> Result<Vec<InputRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("无法读取输入表: {}", csv_path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("无法读取输入表表头: {}", csv_path.display()))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!("输入表缺少 `{}` 列: {}", column, csv_path.display());
        }
    }
    let filehash_index = headers.iter().position(|h| h == "filehash");

    let mut rows = Vec::new();
    let mut malformed = 0usize;
    for (index, record) in reader.records().enumerate() {
        if index < start_row {
            continue;
        }
        let line = index as u64 + 2;
        let parsed = match record {
            Ok(record) => record.deserialize::<InputRow>(Some(&headers)).map_err(|e| {
                MalformedRow {
                    line,
                    filehash: filehash_index
                        .and_then(|i| record.get(i))
                        .unwrap_or_default()
                        .to_string(),
                    cause: e.to_string(),
                }
            }),
            Err(e) => Err(MalformedRow {
                line,
                filehash: String::new(),
                cause: e.to_string(),
            }),
        };
        if let Err(bad) = &parsed {
            malformed += 1;
            tracing::warn!("⚠️ 输入表第 {} 行无法解析: {}", bad.line, bad.cause);
        }
        rows.push(parsed);
    }

    tracing::info!(
        "输入表共读取 {} 行（已跳过前 {} 行，其中 {} 行无法解析）",
        rows.len(),
        start_row,
        malformed
    );

    Ok(rows)
}
