// ==========================================
// CSV 导入系统 - 源文件读取器
// ==========================================
// 格式: UTF-8 分隔文本，无表头，每行一个实体
// 约定: 整个文件读完后才返回（不做流式处理）
// 约定: 单元格首尾空白已去除，列数不做校验（交给行解析器）
// 约定: 空行保留为空 RawRow，与其他行一样占用行号
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// 原始行（按列顺序）
pub type RawRow = Vec<String>;

// ==========================================
// RowReader Trait
// ==========================================
// 实现者: DelimitedFileReader
pub trait RowReader {
    /// 读取整个源文件为原始行列表
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 全部行（文件顺序）
    /// - Err(SourceUnavailable): 文件不存在、无法打开、编码或格式错误
    fn read_rows(&self, path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// DelimitedFileReader - 分隔文本读取器
// ==========================================
pub struct DelimitedFileReader {
    delimiter: u8,
}

impl DelimitedFileReader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    fn builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .trim(Trim::All)
            .delimiter(self.delimiter);
        builder
    }

    // csv 解析器会吞掉空行，这里按物理行切分记录:
    // 引号未闭合时续接下一行（字段内换行），闭合后整条交给 csv 解析
    fn read_all(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        let text = fs::read_to_string(path)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        let builder = self.builder();

        let mut rows = Vec::new();
        let mut pending = String::new();
        for line in text.lines() {
            if pending.is_empty() && line.is_empty() {
                rows.push(RawRow::new());
                continue;
            }
            if !pending.is_empty() {
                pending.push('\n');
            }
            pending.push_str(line);

            if has_open_quote(&pending) {
                continue;
            }
            rows.push(parse_record(&builder, &pending)?);
            pending.clear();
        }

        // 文件结尾引号仍未闭合: 按现有内容解析
        if !pending.is_empty() {
            rows.push(parse_record(&builder, &pending)?);
        }
        Ok(rows)
    }
}

fn has_open_quote(record: &str) -> bool {
    record.bytes().filter(|b| *b == b'"').count() % 2 == 1
}

fn parse_record(builder: &ReaderBuilder, record: &str) -> ImportResult<RawRow> {
    let mut reader = builder.from_reader(record.as_bytes());
    let mut fields = StringRecord::new();
    reader.read_record(&mut fields)?;
    Ok(fields.iter().map(str::to_string).collect())
}

impl RowReader for DelimitedFileReader {
    fn read_rows(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        debug!(file = %path.display(), delimiter = %(self.delimiter as char), "读取源文件");

        let rows = self
            .read_all(path)
            .map_err(|e| ImportError::SourceUnavailable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        info!(file = %path.display(), rows = rows.len(), "源文件读取完成");
        Ok(rows)
    }
}
