// ==========================================
// CSV 导入系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、导入过程产物
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod device;
pub mod import;
pub mod types;

// 重导出核心类型
pub use device::{Device, DeviceContent, Expiring, ValidatedContent, ValidatedDevice, INVALID_DATA};
pub use import::{
    ActionTally, Diagnostic, DiagnosticReason, FileTally, ImportReport, ImportRun,
    ReconcileAction,
};
pub use types::{DeviceStatus, EntityKind};
