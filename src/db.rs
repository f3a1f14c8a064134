// ==========================================
// CSV 导入系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键必须每个连接单独开启）
// - 统一 busy_timeout
// - 建表幂等（CREATE TABLE IF NOT EXISTS），不做迁移
// ==========================================

use crate::config::settings_manager::insert_default_settings;
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 默认数据库文件名
pub const DEFAULT_DB_FILE_NAME: &str = "csvimporter.db";

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建全部表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS device (
            id INTEGER PRIMARY KEY,
            name TEXT,
            description TEXT,
            code TEXT,
            date_created TEXT,
            date_updated TEXT,
            expire_date TEXT,
            status INTEGER,
            CONSTRAINT uq_device_code UNIQUE (code)
        );

        CREATE TABLE IF NOT EXISTS devicecontent (
            id INTEGER PRIMARY KEY,
            name TEXT,
            description TEXT,
            date_created TEXT,
            date_updated TEXT,
            expire_date TEXT,
            status INTEGER,
            device_id INTEGER,
            CONSTRAINT fk_devicecontent_device_id
                FOREIGN KEY (device_id) REFERENCES device(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS ix_devicecontent_device_id ON devicecontent(device_id);

        CREATE TABLE IF NOT EXISTS importer_settings (
            id INTEGER PRIMARY KEY,
            csv_store_path TEXT NOT NULL DEFAULT 'csv_store',
            device_file_name TEXT NOT NULL DEFAULT 'devices.csv',
            content_file_name TEXT NOT NULL DEFAULT 'content.csv',
            default_csv_delimiter TEXT NOT NULL DEFAULT ','
        );

        CREATE TABLE IF NOT EXISTS import_run (
            run_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            devices_processed INTEGER NOT NULL,
            devices_failed INTEGER NOT NULL,
            content_processed INTEGER NOT NULL,
            content_failed INTEGER NOT NULL,
            report_json TEXT NOT NULL
        );
        "#,
    )
}

/// 系统初始化: 建表 + 写入唯一一条默认导入配置
///
/// 已存在的配置不会被覆盖
pub fn initialize_database(conn: &Connection) -> rusqlite::Result<()> {
    init_schema(conn)?;

    insert_default_settings(conn)?;

    tracing::debug!("数据库初始化完成");
    Ok(())
}

/// 默认数据库路径
///
/// 优先级: 环境变量 CSV_IMPORTER_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("CSV_IMPORTER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(".").join(DEFAULT_DB_FILE_NAME);

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("csv-importer");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DEFAULT_DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}
