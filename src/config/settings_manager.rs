// ==========================================
// CSV 导入系统 - 导入配置管理器
// ==========================================
// 职责: 导入配置的加载、初始化、修改
// 存储: importer_settings 表（单行，id = 1）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::settings::{parse_delimiter, ImporterSettings};
use crate::config::settings_provider::SettingsProvider;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// 单例配置行的主键
const SETTINGS_ROW_ID: i64 = 1;

// ==========================================
// SettingsUpdate - 配置修改请求
// ==========================================
// None 表示该项保持不变
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub csv_store_path: Option<String>,
    pub device_file_name: Option<String>,
    pub content_file_name: Option<String>,
    pub default_csv_delimiter: Option<String>,
}

// ==========================================
// SettingsManager - 配置管理器
// ==========================================
pub struct SettingsManager {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsManager {
    /// 创建新的 SettingsManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 SettingsManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 确保默认配置存在（仅首次写入，已有配置不覆盖）
    ///
    /// # 返回
    /// - Ok(true): 本次新建了默认配置
    /// - Ok(false): 配置已存在
    pub fn ensure_default(&self) -> ConfigResult<bool> {
        let conn = self.get_conn()?;
        let inserted = insert_default_settings(&conn)?;

        if inserted {
            info!("已写入默认导入配置");
        }
        Ok(inserted)
    }

    /// 读取当前配置（不做完整性校验）
    pub fn get(&self) -> ConfigResult<Option<ImporterSettings>> {
        let conn = self.get_conn()?;

        let row = conn
            .query_row(
                r#"
                SELECT csv_store_path, device_file_name, content_file_name, default_csv_delimiter
                FROM importer_settings
                WHERE id = ?1
                "#,
                params![SETTINGS_ROW_ID],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((csv_store_path, device_file_name, content_file_name, delimiter)) => {
                Ok(Some(ImporterSettings {
                    csv_store_path,
                    device_file_name,
                    content_file_name,
                    default_csv_delimiter: parse_delimiter(&delimiter)?,
                }))
            }
        }
    }

    /// 修改配置（校验通过后整体写回）
    ///
    /// # 返回
    /// - Ok(ImporterSettings): 修改后的配置
    /// - Err: 配置缺失或新值非法（不写入任何字段）
    pub fn update(&self, update: SettingsUpdate) -> ConfigResult<ImporterSettings> {
        let mut settings = self.get()?.ok_or(ConfigError::SettingsMissing)?;

        if let Some(path) = update.csv_store_path {
            settings.csv_store_path = path;
        }
        if let Some(name) = update.device_file_name {
            settings.device_file_name = name;
        }
        if let Some(name) = update.content_file_name {
            settings.content_file_name = name;
        }
        if let Some(delimiter) = update.default_csv_delimiter {
            settings.default_csv_delimiter = parse_delimiter(&delimiter)?;
        }

        settings.validate()?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE importer_settings SET
                csv_store_path = ?2,
                device_file_name = ?3,
                content_file_name = ?4,
                default_csv_delimiter = ?5
            WHERE id = ?1
            "#,
            params![
                SETTINGS_ROW_ID,
                settings.csv_store_path,
                settings.device_file_name,
                settings.content_file_name,
                settings.default_csv_delimiter.to_string(),
            ],
        )?;

        info!(
            csv_store_path = %settings.csv_store_path,
            device_file_name = %settings.device_file_name,
            content_file_name = %settings.content_file_name,
            delimiter = %settings.default_csv_delimiter,
            "导入配置已更新"
        );
        Ok(settings)
    }
}

/// 写入默认配置行（INSERT OR IGNORE，已有配置不覆盖）
pub(crate) fn insert_default_settings(conn: &Connection) -> rusqlite::Result<bool> {
    let defaults = ImporterSettings::default();
    let inserted = conn.execute(
        r#"
        INSERT OR IGNORE INTO importer_settings (
            id, csv_store_path, device_file_name, content_file_name, default_csv_delimiter
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            SETTINGS_ROW_ID,
            defaults.csv_store_path,
            defaults.device_file_name,
            defaults.content_file_name,
            defaults.default_csv_delimiter.to_string(),
        ],
    )?;
    Ok(inserted > 0)
}

impl SettingsProvider for SettingsManager {
    fn load_settings(&self) -> ConfigResult<ImporterSettings> {
        let settings = self.get()?.ok_or(ConfigError::SettingsMissing)?;
        settings.validate()?;
        Ok(settings)
    }
}
