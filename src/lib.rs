// ==========================================
// CSV 导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 设备 / 设备内容 CSV 导入与对账引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析、校验、对账
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DeviceStatus, EntityKind};

// 领域实体
pub use domain::{
    Device, DeviceContent, Diagnostic, DiagnosticReason, ImportReport, ImportRun,
    ReconcileAction, ValidatedContent, ValidatedDevice,
};

// 配置
pub use config::{ImporterSettings, SettingsManager, SettingsProvider};

// 导入
pub use importer::{CsvImporter, DiagnosticsSink, ImportError, ImportResult};

// 存储
pub use repository::{RecordStore, SqliteRecordStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "CSV 导入系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
