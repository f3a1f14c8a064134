// ==========================================
// CSV 导入系统 - 导入过程领域模型
// ==========================================
// 职责: 诊断条目 / 对账决策 / 导入报告 / 导入运行台账
// ==========================================

use crate::domain::types::EntityKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// DiagnosticReason - 诊断原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticReason {
    TooFewColumns,     // 列数不足（整行拒绝）
    InvalidId,         // ID 非纯数字（整行拒绝）
    InvalidLength,     // 文本长度越界
    EmptyValue,        // 必须非空的文本为空
    DuplicateCode,     // 编码已被其他设备占用
    UnparsableDate,    // 日期无法解析
    UnknownStatus,     // 状态名未知
    InvalidReference,  // 设备引用不是合法 ID
    MissingReference,  // 设备引用指向不存在的设备
}

impl DiagnosticReason {
    /// 是否导致整行被拒绝
    pub fn rejects_row(self) -> bool {
        matches!(self, DiagnosticReason::TooFewColumns | DiagnosticReason::InvalidId)
    }

    pub fn describe(self) -> &'static str {
        match self {
            DiagnosticReason::TooFewColumns => "列数不足",
            DiagnosticReason::InvalidId => "ID 非法",
            DiagnosticReason::InvalidLength => "长度越界",
            DiagnosticReason::EmptyValue => "值为空",
            DiagnosticReason::DuplicateCode => "编码重复",
            DiagnosticReason::UnparsableDate => "日期无法解析",
            DiagnosticReason::UnknownStatus => "状态未知",
            DiagnosticReason::InvalidReference => "设备引用非法",
            DiagnosticReason::MissingReference => "引用的设备不存在",
        }
    }
}

impl fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

// ==========================================
// Diagnostic - 诊断条目
// ==========================================
// 仅追加写入，供运维查看；引擎从不回读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub row_number: usize,        // 原始文件行号（1 起，含被拒绝行）
    pub entity: EntityKind,       // 实体种类
    pub field: String,            // 字段名
    pub raw_value: String,        // 原始值
    pub reason: DiagnosticReason, // 原因
}

impl Diagnostic {
    pub fn new(
        row_number: usize,
        entity: EntityKind,
        field: &str,
        raw_value: &str,
        reason: DiagnosticReason,
    ) -> Self {
        Self {
            row_number,
            entity,
            field: field.to_string(),
            raw_value: raw_value.to_string(),
            reason,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 第 {} 行字段 {} {}: {:?}",
            self.entity, self.row_number, self.field, self.reason, self.raw_value
        )
    }
}

// ==========================================
// ReconcileAction - 对账决策
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    Insert,        // 新建
    UpdateIfNewer, // 过期时间更晚，覆写
    NoOp,          // 保持不变
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileAction::Insert => write!(f, "INSERT"),
            ReconcileAction::UpdateIfNewer => write!(f, "UPDATE"),
            ReconcileAction::NoOp => write!(f, "NOOP"),
        }
    }
}

// ==========================================
// ActionTally - 决策计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTally {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl ActionTally {
    pub fn record(&mut self, action: ReconcileAction) {
        match action {
            ReconcileAction::Insert => self.inserted += 1,
            ReconcileAction::UpdateIfNewer => self.updated += 1,
            ReconcileAction::NoOp => self.unchanged += 1,
        }
    }

    /// 是否产生了存储变更
    pub fn has_mutations(&self) -> bool {
        self.inserted > 0 || self.updated > 0
    }
}

// ==========================================
// FileTally - 单文件处理结果
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTally {
    pub processed: usize, // 完成对账的行数
    pub failed: usize,    // 结构性拒绝的行数
    pub actions: ActionTally,
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: String,                  // 运行 ID（UUID）
    pub started_at: NaiveDateTime,       // 开始时间
    pub finished_at: NaiveDateTime,      // 结束时间
    pub devices_processed: usize,
    pub devices_failed: usize,
    pub content_processed: usize,
    pub content_failed: usize,
    pub device_actions: ActionTally,
    pub content_actions: ActionTally,
    pub unavailable_sources: Vec<String>, // 无法读取的源文件
}

impl ImportReport {
    pub fn new(run_id: String, started_at: NaiveDateTime) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            devices_processed: 0,
            devices_failed: 0,
            content_processed: 0,
            content_failed: 0,
            device_actions: ActionTally::default(),
            content_actions: ActionTally::default(),
            unavailable_sources: Vec::new(),
        }
    }

    pub fn apply_devices(&mut self, tally: FileTally) {
        self.devices_processed = tally.processed;
        self.devices_failed = tally.failed;
        self.device_actions = tally.actions;
    }

    pub fn apply_content(&mut self, tally: FileTally) {
        self.content_processed = tally.processed;
        self.content_failed = tally.failed;
        self.content_actions = tally.actions;
    }

    /// 本次运行是否对存储产生了任何变更
    pub fn has_mutations(&self) -> bool {
        self.device_actions.has_mutations() || self.content_actions.has_mutations()
    }
}

// ==========================================
// ImportRun - 导入运行台账记录
// ==========================================
// 对齐: import_run 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRun {
    pub run_id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub devices_processed: i64,
    pub devices_failed: i64,
    pub content_processed: i64,
    pub content_failed: i64,
    pub report_json: String,
}
