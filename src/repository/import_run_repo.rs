// ==========================================
// CSV 导入系统 - 导入运行台账仓储
// ==========================================
// 职责: import_run 表的写入与查询
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::types::{format_timestamp, parse_stored_timestamp};
use crate::domain::{ImportReport, ImportRun};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};

/// 导入运行台账仓储
///
/// 与 SqliteRecordStore 一样借用调用方连接，写入落在导入事务内
pub struct ImportRunRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ImportRunRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 记录一次导入运行（报告整体序列化为 JSON 一并保存）
    pub fn insert(&self, report: &ImportReport) -> RepositoryResult<()> {
        let report_json = serde_json::to_string(report)?;
        self.conn.execute(
            r#"
            INSERT INTO import_run (
                run_id, started_at, finished_at,
                devices_processed, devices_failed,
                content_processed, content_failed,
                report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                report.run_id,
                format_timestamp(&report.started_at),
                format_timestamp(&report.finished_at),
                report.devices_processed as i64,
                report.devices_failed as i64,
                report.content_processed as i64,
                report.content_failed as i64,
                report_json,
            ],
        )?;
        Ok(())
    }

    /// 查询最近的导入运行（按开始时间倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ImportRun>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT run_id, started_at, finished_at,
                   devices_processed, devices_failed,
                   content_processed, content_failed,
                   report_json
            FROM import_run
            ORDER BY started_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt
            .query_map(params![limit as i64], map_run_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().collect()
    }
}

fn map_run_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<ImportRun>> {
    let started_raw: String = row.get(1)?;
    let finished_raw: String = row.get(2)?;

    let started_at = match parse_stored_timestamp(&started_raw) {
        Some(ts) => ts,
        None => return Ok(Err(bad_timestamp("started_at", &started_raw))),
    };
    let finished_at = match parse_stored_timestamp(&finished_raw) {
        Some(ts) => ts,
        None => return Ok(Err(bad_timestamp("finished_at", &finished_raw))),
    };

    Ok(Ok(ImportRun {
        run_id: row.get(0)?,
        started_at,
        finished_at,
        devices_processed: row.get(3)?,
        devices_failed: row.get(4)?,
        content_processed: row.get(5)?,
        content_failed: row.get(6)?,
        report_json: row.get(7)?,
    }))
}

fn bad_timestamp(field: &str, value: &str) -> RepositoryError {
    RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("无法解析时间戳: {}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_insert_and_list_recent() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = ImportRunRepository::new(&conn);

        let base = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        for i in 0..3 {
            let mut report = ImportReport::new(format!("run-{}", i), base + Duration::minutes(i));
            report.devices_processed = i as usize;
            repo.insert(&report).unwrap();
        }

        let runs = repo.list_recent(2).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, "run-2");
        assert_eq!(runs[0].devices_processed, 2);
        assert_eq!(runs[1].run_id, "run-1");

        let parsed: ImportReport = serde_json::from_str(&runs[0].report_json).unwrap();
        assert_eq!(parsed.run_id, "run-2");
    }
}
