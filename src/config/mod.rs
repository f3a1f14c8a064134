// ==========================================
// CSV 导入系统 - 配置层
// ==========================================
// 职责: 导入配置值对象、读取接口、持久化管理
// 存储: importer_settings 表
// ==========================================

pub mod error;
pub mod settings;
pub mod settings_manager;
pub mod settings_provider;

// 重导出核心配置类型
pub use error::{ConfigError, ConfigResult};
pub use settings::ImporterSettings;
pub use settings_manager::{SettingsManager, SettingsUpdate};
pub use settings_provider::SettingsProvider;
