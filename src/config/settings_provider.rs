// ==========================================
// CSV 导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入编排器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::config::settings::ImporterSettings;

// ==========================================
// SettingsProvider Trait
// ==========================================
// 实现者: SettingsManager（从 importer_settings 表读取）
//         ImporterSettings 本身（固定配置，便于测试与嵌入调用）
pub trait SettingsProvider: Send + Sync {
    /// 读取完整导入配置
    ///
    /// # 返回
    /// - Ok(ImporterSettings): 已通过完整性校验的配置
    /// - Err(SettingsMissing): 尚未初始化
    fn load_settings(&self) -> ConfigResult<ImporterSettings>;
}

impl SettingsProvider for ImporterSettings {
    fn load_settings(&self) -> ConfigResult<ImporterSettings> {
        self.validate()?;
        Ok(self.clone())
    }
}
