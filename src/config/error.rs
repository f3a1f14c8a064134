// ==========================================
// CSV 导入系统 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("导入配置不存在（请先执行初始化）")]
    SettingsMissing,

    #[error("分隔符非法: {0:?}（必须是单个 ASCII 字符）")]
    InvalidDelimiter(String),

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置读取失败: {0}")]
    ReadError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::ReadError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
