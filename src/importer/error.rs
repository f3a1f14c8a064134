// ==========================================
// CSV 导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级:
// - 行级（RowRejected）: 本行跳过并计入失败，不中断运行
// - 文件级（SourceUnavailable / CsvParseError）: 本文件放弃，另一文件不受影响
// - 运行级（Store / Config）: 回滚事务，返回给调用方
// ==========================================

use crate::config::ConfigError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 结构性行错误（整行拒绝）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowRejected {
    #[error("列数不足: 需要至少 {required} 列，实际 {found} 列")]
    TooFewColumns { found: usize, required: usize },

    #[error("ID 非法: {raw:?}")]
    InvalidId { raw: String },
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("源文件不可用 ({path}): {message}")]
    SourceUnavailable { path: String, message: String },

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    // ===== 行级错误 =====
    #[error("第 {row_number} 行被拒绝: {reason}")]
    RowRejected {
        row_number: usize,
        reason: RowRejected,
    },

    // ===== 存储 / 配置错误 =====
    #[error("存储操作失败: {0}")]
    Store(#[from] RepositoryError),

    #[error("导入配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl ImportError {
    /// 是否只影响单行（调用方应继续处理后续行）
    pub fn is_row_level(&self) -> bool {
        matches!(self, ImportError::RowRejected { .. })
    }

    /// 是否只影响单个源文件
    pub fn is_source_level(&self) -> bool {
        matches!(
            self,
            ImportError::SourceUnavailable { .. }
                | ImportError::CsvParseError(_)
                | ImportError::FileReadError(_)
        )
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Store(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_levels() {
        let row = ImportError::RowRejected {
            row_number: 3,
            reason: RowRejected::InvalidId {
                raw: "abc".to_string(),
            },
        };
        assert!(row.is_row_level());
        assert!(!row.is_source_level());

        let source = ImportError::SourceUnavailable {
            path: "csv_store/devices.csv".to_string(),
            message: "No such file".to_string(),
        };
        assert!(source.is_source_level());

        let store = ImportError::from(RepositoryError::LockError("poisoned".to_string()));
        assert!(!store.is_row_level());
        assert!(!store.is_source_level());
    }

    #[test]
    fn test_row_rejected_message() {
        let err = ImportError::RowRejected {
            row_number: 7,
            reason: RowRejected::TooFewColumns {
                found: 4,
                required: 6,
            },
        };
        let text = err.to_string();
        assert!(text.contains("第 7 行"));
        assert!(text.contains("实际 4 列"));
    }
}
