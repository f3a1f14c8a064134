// ==========================================
// CSV 导入系统 - 导入配置值对象
// ==========================================
// 存储: importer_settings 表（单行，id = 1）
// 默认: csv_store / devices.csv / content.csv / ','
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 文件名最大长度（字符）
pub const MAX_FILE_NAME_LEN: usize = 100;

// ==========================================
// ImporterSettings - 导入配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterSettings {
    pub csv_store_path: String,      // CSV 存放目录（相对于根目录）
    pub device_file_name: String,    // 设备文件名
    pub content_file_name: String,   // 设备内容文件名
    pub default_csv_delimiter: char, // 字段分隔符
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            csv_store_path: "csv_store".to_string(),
            device_file_name: "devices.csv".to_string(),
            content_file_name: "content.csv".to_string(),
            default_csv_delimiter: ',',
        }
    }
}

impl ImporterSettings {
    /// 校验配置完整性
    ///
    /// # 规则
    /// - csv_store_path 非空
    /// - 文件名长度 1..=100
    /// - 分隔符必须是单个 ASCII 字符（换行/引号除外）
    pub fn validate(&self) -> ConfigResult<()> {
        if self.csv_store_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "csv_store_path".to_string(),
                value: self.csv_store_path.clone(),
                message: "目录不能为空".to_string(),
            });
        }

        check_file_name("device_file_name", &self.device_file_name)?;
        check_file_name("content_file_name", &self.content_file_name)?;
        self.delimiter_byte()?;
        Ok(())
    }

    /// 分隔符的字节形式（csv 读取器要求单字节）
    pub fn delimiter_byte(&self) -> ConfigResult<u8> {
        let c = self.default_csv_delimiter;
        if !c.is_ascii() || matches!(c, '\n' | '\r' | '"') {
            return Err(ConfigError::InvalidDelimiter(c.to_string()));
        }
        Ok(c as u8)
    }

    /// CSV 存放目录: <root>/<csv_store_path>
    pub fn store_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.csv_store_path)
    }

    pub fn device_file_path(&self, root: &Path) -> PathBuf {
        self.store_dir(root).join(&self.device_file_name)
    }

    pub fn content_file_path(&self, root: &Path) -> PathBuf {
        self.store_dir(root).join(&self.content_file_name)
    }
}

/// 从文本解析分隔符（必须恰好一个字符）
pub fn parse_delimiter(raw: &str) -> ConfigResult<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidDelimiter(raw.to_string())),
    }
}

fn check_file_name(key: &str, value: &str) -> ConfigResult<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_FILE_NAME_LEN {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: format!("文件名长度必须在 1..={} 之间", MAX_FILE_NAME_LEN),
        });
    }
    Ok(())
}
