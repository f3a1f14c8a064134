// ==========================================
// CSV 导入系统 - SQLite 记录存储实现
// ==========================================
// 职责: 实现 RecordStore（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 说明: 借用调用方的连接/事务，事务边界由导入编排器持有
// ==========================================

use crate::domain::types::{format_timestamp, parse_stored_timestamp};
use crate::domain::{Device, DeviceContent, DeviceStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::RecordStore;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

const DEVICE_COLUMNS: &str =
    "id, name, description, code, date_created, date_updated, expire_date, status";

const CONTENT_COLUMNS: &str =
    "id, name, description, date_created, date_updated, expire_date, status, device_id";

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRecordStore<'c> {
    /// 基于已有连接（通常是 Transaction 解引用）创建存储
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn map_device(row: &Row<'_>) -> rusqlite::Result<Device> {
        Ok(Device {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            code: row.get(3)?,
            date_created: read_timestamp(row, 4)?,
            date_updated: read_timestamp(row, 5)?,
            expire_date: read_timestamp(row, 6)?,
            status: read_status(row, 7)?,
        })
    }

    fn map_content(row: &Row<'_>) -> rusqlite::Result<DeviceContent> {
        Ok(DeviceContent {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            date_created: read_timestamp(row, 3)?,
            date_updated: read_timestamp(row, 4)?,
            expire_date: read_timestamp(row, 5)?,
            status: read_status(row, 6)?,
            device_id: row.get(7)?,
        })
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn find_device(&self, id: i64) -> RepositoryResult<Option<Device>> {
        let sql = format!("SELECT {} FROM device WHERE id = ?1", DEVICE_COLUMNS);
        let device = self
            .conn
            .query_row(&sql, params![id], Self::map_device)
            .optional()?;
        Ok(device)
    }

    fn find_device_by_code(&self, code: &str) -> RepositoryResult<Option<Device>> {
        let sql = format!("SELECT {} FROM device WHERE code = ?1", DEVICE_COLUMNS);
        let device = self
            .conn
            .query_row(&sql, params![code], Self::map_device)
            .optional()?;
        Ok(device)
    }

    fn insert_device(&self, device: &Device) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO device (
                id, name, description, code,
                date_created, date_updated, expire_date, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                device.id,
                device.name,
                device.description,
                device.code,
                device.date_created.as_ref().map(format_timestamp),
                device.date_updated.as_ref().map(format_timestamp),
                device.expire_date.as_ref().map(format_timestamp),
                device.status.map(DeviceStatus::code),
            ],
        )?;
        Ok(())
    }

    fn update_device(&self, device: &Device) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE device SET
                name = ?2,
                description = ?3,
                code = ?4,
                date_updated = ?5,
                expire_date = ?6,
                status = ?7
            WHERE id = ?1
            "#,
            params![
                device.id,
                device.name,
                device.description,
                device.code,
                device.date_updated.as_ref().map(format_timestamp),
                device.expire_date.as_ref().map(format_timestamp),
                device.status.map(DeviceStatus::code),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Device".to_string(),
                id: device.id.to_string(),
            });
        }
        Ok(())
    }

    fn list_devices(&self) -> RepositoryResult<Vec<Device>> {
        let sql = format!("SELECT {} FROM device ORDER BY id", DEVICE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let devices = stmt
            .query_map([], Self::map_device)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(devices)
    }

    fn find_content(&self, id: i64) -> RepositoryResult<Option<DeviceContent>> {
        let sql = format!("SELECT {} FROM devicecontent WHERE id = ?1", CONTENT_COLUMNS);
        let content = self
            .conn
            .query_row(&sql, params![id], Self::map_content)
            .optional()?;
        Ok(content)
    }

    fn insert_content(&self, content: &DeviceContent) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO devicecontent (
                id, name, description,
                date_created, date_updated, expire_date, status, device_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                content.id,
                content.name,
                content.description,
                content.date_created.as_ref().map(format_timestamp),
                content.date_updated.as_ref().map(format_timestamp),
                content.expire_date.as_ref().map(format_timestamp),
                content.status.map(DeviceStatus::code),
                content.device_id,
            ],
        )?;
        Ok(())
    }

    fn update_content(&self, content: &DeviceContent) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE devicecontent SET
                name = ?2,
                description = ?3,
                date_updated = ?4,
                expire_date = ?5,
                status = ?6,
                device_id = ?7
            WHERE id = ?1
            "#,
            params![
                content.id,
                content.name,
                content.description,
                content.date_updated.as_ref().map(format_timestamp),
                content.expire_date.as_ref().map(format_timestamp),
                content.status.map(DeviceStatus::code),
                content.device_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "DeviceContent".to_string(),
                id: content.id.to_string(),
            });
        }
        Ok(())
    }

    fn list_contents(&self) -> RepositoryResult<Vec<DeviceContent>> {
        let sql = format!("SELECT {} FROM devicecontent ORDER BY id", CONTENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let contents = stmt
            .query_map([], Self::map_content)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contents)
    }
}

/// 读取时间戳列（无法解析的历史值视为缺失）
fn read_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_stored_timestamp(&s)))
}

fn read_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DeviceStatus>> {
    Ok(row.get::<_, Option<i32>>(idx)?.and_then(DeviceStatus::from_code))
}
