// ==========================================
// CSV 导入系统 - 诊断通道
// ==========================================
// 职责: 接收逐行校验产生的诊断条目（仅追加）
// 红线: 诊断只用于运维可见性，引擎从不回读，不参与控制流
// 实现:
// - TracingSink: 输出为 tracing warn 事件
// - JsonLinesSink: 追加写入错误日志文件（每行一个 JSON）
// - MemorySink: 内存收集（测试与嵌入调用）
// ==========================================

use crate::domain::Diagnostic;
use crate::importer::error::ImportResult;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, warn};

/// 诊断事件的 tracing target
pub const DIAGNOSTICS_TARGET: &str = "csv_import_errors";

/// 默认错误日志目录（相对于根目录）
pub const DEFAULT_ERRORS_DIR: &str = "csv_import_errors";

/// 默认错误日志文件名
pub const DEFAULT_ERRORS_FILE: &str = "errors.log";

// ==========================================
// DiagnosticsSink Trait
// ==========================================
pub trait DiagnosticsSink: Send + Sync {
    /// 追加一条诊断（失败不得影响导入）
    fn record(&self, diagnostic: Diagnostic);
}

fn emit_event(diagnostic: &Diagnostic) {
    warn!(
        target: DIAGNOSTICS_TARGET,
        row_number = diagnostic.row_number,
        entity = %diagnostic.entity,
        field = %diagnostic.field,
        raw_value = %diagnostic.raw_value,
        reason = ?diagnostic.reason,
        row_rejected = diagnostic.reason.rejects_row(),
        "{}",
        diagnostic
    );
}

// ==========================================
// TracingSink
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        emit_event(&diagnostic);
    }
}

// ==========================================
// JsonLinesSink
// ==========================================
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// 打开（或创建）错误日志文件，父目录不存在时自动创建
    pub fn open(path: &Path) -> ImportResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// 默认位置: <root>/csv_import_errors/errors.log
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(DEFAULT_ERRORS_DIR).join(DEFAULT_ERRORS_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, diagnostic: &Diagnostic) -> Result<(), String> {
        let line = serde_json::to_string(diagnostic).map_err(|e| e.to_string())?;
        let mut writer = self.writer.lock().map_err(|e| e.to_string())?;
        writeln!(writer, "{}", line).map_err(|e| e.to_string())?;
        writer.flush().map_err(|e| e.to_string())
    }
}

impl DiagnosticsSink for JsonLinesSink {
    fn record(&self, diagnostic: Diagnostic) {
        emit_event(&diagnostic);
        if let Err(e) = self.append(&diagnostic) {
            error!(path = %self.path.display(), error = %e, "写入错误日志失败");
        }
    }
}

// ==========================================
// MemorySink
// ==========================================
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集条目的快照
    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, diagnostic: Diagnostic) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
