// ==========================================
// CsvImporter 集成测试
// ==========================================
// 测试目标: 验证从 CSV 文件到数据库的完整导入流程
// ==========================================


use chrono::NaiveDate;
use csv_importer::config::{SettingsManager, SettingsProvider, SettingsUpdate};
use csv_importer::domain::{DeviceStatus, DiagnosticReason, EntityKind, ImportReport};
use csv_importer::importer::ImportError;
use csv_importer::logging;
use csv_importer::repository::{ImportRunRepository, RecordStore, SqliteRecordStore};
use csv_importer::{Device, DeviceContent};
use std::sync::Arc;
use test_helpers::ImportFixture;

fn ymd(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn find_device(fx: &ImportFixture, id: i64) -> Option<Device> {
    fx.with_conn(|conn| SqliteRecordStore::new(conn).find_device(id).unwrap())
}

fn find_content(fx: &ImportFixture, id: i64) -> Option<DeviceContent> {
    fx.with_conn(|conn| SqliteRecordStore::new(conn).find_content(id).unwrap())
}

fn import(fx: &ImportFixture) -> ImportReport {
    fx.importer().import_all(&fx.settings).unwrap()
}

#[test]
fn test_sensor_example_insert_update_and_stale_row() {
    logging::init_test();
    let fx = ImportFixture::new().unwrap();

    // 首次导入: 新建
    fx.write_devices(&["1,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled"])
        .unwrap();
    let report = import(&fx);
    assert_eq!(report.devices_processed, 1);
    assert_eq!(report.device_actions.inserted, 1);

    let device = find_device(&fx, 1).unwrap();
    assert_eq!(device.name.as_deref(), Some("Sensor-A"));
    assert_eq!(device.code.as_deref(), Some("DEV-001"));
    assert_eq!(device.status, Some(DeviceStatus::Enabled));
    assert_eq!(device.expire_date, Some(ymd(2030, 1, 1)));

    // 过期时间更晚: 覆写
    fx.write_devices(&["1,Sensor-A2,Updated,DEV-001,2031-01-01,enabled"])
        .unwrap();
    let report = import(&fx);
    assert_eq!(report.device_actions.updated, 1);

    let updated = find_device(&fx, 1).unwrap();
    assert_eq!(updated.name.as_deref(), Some("Sensor-A2"));
    assert_eq!(updated.description.as_deref(), Some("Updated"));
    assert_eq!(updated.code.as_deref(), Some("DEV-001"));
    assert_eq!(updated.expire_date, Some(ymd(2031, 1, 1)));
    assert_eq!(updated.date_created, device.date_created);

    // 过期时间更早: 不变
    fx.write_devices(&["1,X,Y,DEV-001,2020-01-01,enabled"]).unwrap();
    let report = import(&fx);
    assert_eq!(report.device_actions.unchanged, 1);
    assert_eq!(find_device(&fx, 1).unwrap(), updated);
}

#[test]
fn test_second_run_on_unchanged_files_is_noop() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&[
        "1,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled",
        "2,Sensor-B,Pressure sensor,DEV-002,2030-02-01,disabled",
    ])
    .unwrap();
    fx.write_contents(&["10,Manual,PDF manual,1,2030-01-01,enabled"])
        .unwrap();

    import(&fx);
    let devices_before = fx.with_conn(|c| SqliteRecordStore::new(c).list_devices().unwrap());
    let contents_before = fx.with_conn(|c| SqliteRecordStore::new(c).list_contents().unwrap());

    let second = import(&fx);
    assert!(!second.has_mutations());
    assert_eq!(second.device_actions.unchanged, 2);
    assert_eq!(second.content_actions.unchanged, 1);

    let devices_after = fx.with_conn(|c| SqliteRecordStore::new(c).list_devices().unwrap());
    let contents_after = fx.with_conn(|c| SqliteRecordStore::new(c).list_contents().unwrap());
    assert_eq!(devices_before, devices_after);
    assert_eq!(contents_before, contents_after);
}

#[test]
fn test_structural_rows_are_rejected_without_mutation() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&[
        "1,Short,row",
        "abc,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled",
        "3,Sensor-C,Valid,DEV-003,2030-01-01,enabled",
    ])
    .unwrap();

    let report = import(&fx);
    assert_eq!(report.devices_processed, 1);
    assert_eq!(report.devices_failed, 2);
    assert!(find_device(&fx, 1).is_none());
    assert!(find_device(&fx, 3).is_some());

    let reasons: Vec<(usize, DiagnosticReason)> = fx
        .sink
        .entries()
        .iter()
        .map(|d| (d.row_number, d.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (1, DiagnosticReason::TooFewColumns),
            (2, DiagnosticReason::InvalidId)
        ]
    );
}

#[test]
fn test_newer_row_overwrites_fields_with_absent_values() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&["5,Pump,Water pump,P-5,2030-01-01,enabled"])
        .unwrap();
    import(&fx);

    // 名称过长、描述为空、日期可解析且更晚、状态未知
    let long_name = "n".repeat(40);
    let line = format!("5,{},,P-5,2030-06-01,broken", long_name);
    fx.write_devices(&[line.as_str()]).unwrap();
    let report = import(&fx);
    assert_eq!(report.device_actions.updated, 1);

    let device = find_device(&fx, 5).unwrap();
    assert!(device.name.is_none());
    assert!(device.description.is_none());
    assert!(device.status.is_none());
    assert_eq!(device.code.as_deref(), Some("P-5"));
    assert_eq!(device.display_name(), "Invalid data");
}

#[test]
fn test_unparsable_expiration_never_updates() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&["5,Pump,Water pump,P-5,2030-01-01,enabled"])
        .unwrap();
    import(&fx);
    let stored = find_device(&fx, 5).unwrap();

    fx.write_devices(&["5,Other,Other pump,P-5,someday,deleted"])
        .unwrap();
    let report = import(&fx);

    assert_eq!(report.device_actions.unchanged, 1);
    assert_eq!(find_device(&fx, 5).unwrap(), stored);
}

#[test]
fn test_blank_lines_are_numbered_and_counted_as_failed() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&[
        "1,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled",
        "",
        "3,Sensor-C,desc,DEV-003,2030-01-01,archived",
    ])
    .unwrap();
    fx.write_contents(&["", "10,Manual,PDF,1,2030-01-01,enabled"])
        .unwrap();

    let report = import(&fx);
    assert_eq!(report.devices_processed, 2);
    assert_eq!(report.devices_failed, 1);
    assert_eq!(report.content_processed, 1);
    assert_eq!(report.content_failed, 1);

    let entries: Vec<_> = fx
        .sink
        .entries()
        .iter()
        .map(|d| (d.entity, d.row_number, d.reason))
        .collect();
    assert_eq!(
        entries,
        vec![
            (EntityKind::Device, 2, DiagnosticReason::TooFewColumns),
            (EntityKind::Device, 3, DiagnosticReason::UnknownStatus),
            (EntityKind::DeviceContent, 1, DiagnosticReason::TooFewColumns),
        ]
    );
    assert_eq!(find_device(&fx, 3).unwrap().status, None);
    assert_eq!(find_content(&fx, 10).unwrap().device_id, Some(1));
}

#[test]
fn test_short_year_expiration_is_absent_not_ancient() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&[
        "5,Pump,Water pump,P-5,2030-01-01,enabled",
        "6,Valve,Inlet valve,V-6,1/1/30,enabled",
    ])
    .unwrap();
    import(&fx);

    assert_eq!(find_device(&fx, 6).unwrap().expire_date, None);
    let entries = fx.sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].row_number, 2);
    assert_eq!(entries[0].reason, DiagnosticReason::UnparsableDate);

    // 短年份不能充当更新依据
    let stored = find_device(&fx, 5).unwrap();
    fx.write_devices(&["5,Other,Other pump,P-5,12/25/30,deleted"])
        .unwrap();
    let report = import(&fx);

    assert_eq!(report.device_actions.unchanged, 1);
    assert_eq!(find_device(&fx, 5).unwrap(), stored);
}

#[test]
fn test_duplicate_code_is_dropped_and_original_untouched() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&[
        "1,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled",
        "2,Sensor-B,Pressure sensor,DEV-001,2030-01-01,enabled",
    ])
    .unwrap();

    let report = import(&fx);
    assert_eq!(report.devices_processed, 2);

    assert_eq!(find_device(&fx, 1).unwrap().code.as_deref(), Some("DEV-001"));
    let second = find_device(&fx, 2).unwrap();
    assert!(second.code.is_none());
    assert_eq!(second.name.as_deref(), Some("Sensor-B"));

    let entries = fx.sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].row_number, 2);
    assert_eq!(entries[0].reason, DiagnosticReason::DuplicateCode);
}

#[test]
fn test_content_with_missing_device_is_still_inserted() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&["1,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled"])
        .unwrap();
    fx.write_contents(&[
        "10,Manual,PDF manual,1,2030-01-01,enabled",
        "11,Datasheet,Specs,42,2030-01-01,enabled",
    ])
    .unwrap();

    let report = import(&fx);
    assert_eq!(report.content_processed, 2);
    assert_eq!(report.content_failed, 0);

    assert_eq!(find_content(&fx, 10).unwrap().device_id, Some(1));
    let orphan = find_content(&fx, 11).unwrap();
    assert!(orphan.device_id.is_none());
    assert_eq!(orphan.name.as_deref(), Some("Datasheet"));

    let entries = fx.sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entity, EntityKind::DeviceContent);
    assert_eq!(entries[0].field, "device_id");
    assert_eq!(entries[0].reason, DiagnosticReason::MissingReference);
}

#[test]
fn test_disabled_status_round_trips_as_zero() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&["2,Sensor-B,Pressure sensor,DEV-002,2030-01-01,disabled"])
        .unwrap();
    import(&fx);

    let device = find_device(&fx, 2).unwrap();
    assert_eq!(device.status, Some(DeviceStatus::Disabled));
    assert_eq!(device.display_status(), "disabled");

    let raw: Option<i32> = fx.with_conn(|c| {
        c.query_row("SELECT status FROM device WHERE id = 2", [], |r| r.get(0))
            .unwrap()
    });
    assert_eq!(raw, Some(0));
    assert!(fx.sink.is_empty());
}

#[test]
fn test_missing_device_file_does_not_block_content() {
    let fx = ImportFixture::new().unwrap();
    fx.write_contents(&["10,Manual,PDF manual,1,2030-01-01,enabled"])
        .unwrap();

    let report = import(&fx);
    assert_eq!(report.devices_processed, 0);
    assert_eq!(report.devices_failed, 0);
    assert_eq!(report.content_processed, 1);
    assert_eq!(report.unavailable_sources.len(), 1);
    assert!(report.unavailable_sources[0].ends_with("devices.csv"));

    assert!(find_content(&fx, 10).unwrap().device_id.is_none());
}

#[test]
fn test_store_failure_rolls_back_whole_run() {
    let fx = ImportFixture::new().unwrap();
    fx.with_conn(|c| {
        c.execute_batch(
            r#"
            CREATE TRIGGER reject_content_999 BEFORE INSERT ON devicecontent
            WHEN NEW.id = 999
            BEGIN
                SELECT RAISE(ABORT, 'content 999 rejected');
            END;
            "#,
        )
        .unwrap()
    });

    fx.write_devices(&["1,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled"])
        .unwrap();
    fx.write_contents(&[
        "10,Manual,PDF manual,1,2030-01-01,enabled",
        "999,Broken,Never stored,1,2030-01-01,enabled",
    ])
    .unwrap();

    let result = fx.importer().import_all(&fx.settings);
    assert!(matches!(result, Err(ImportError::Store(_))));

    // 同一次运行中先写入的设备与内容均已回滚
    assert!(find_device(&fx, 1).is_none());
    assert!(find_content(&fx, 10).is_none());
    let runs = fx.with_conn(|c| ImportRunRepository::new(c).list_recent(10).unwrap());
    assert!(runs.is_empty());
}

#[test]
fn test_run_ledger_records_report() {
    let fx = ImportFixture::new().unwrap();
    fx.write_devices(&[
        "1,Sensor-A,Temperature sensor,DEV-001,2030-01-01,enabled",
        "bad",
    ])
    .unwrap();

    let report = import(&fx);
    let runs = fx.with_conn(|c| ImportRunRepository::new(c).list_recent(10).unwrap());

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, report.run_id);
    assert_eq!(runs[0].devices_processed, 1);
    assert_eq!(runs[0].devices_failed, 1);

    let stored: ImportReport = serde_json::from_str(&runs[0].report_json).unwrap();
    assert_eq!(stored, report);
}

#[test]
fn test_run_with_persisted_settings_and_custom_delimiter() {
    let (_db_file, db_path) = test_helpers::create_test_db().unwrap();
    let manager = SettingsManager::new(&db_path).unwrap();
    manager
        .update(SettingsUpdate {
            csv_store_path: Some("incoming".to_string()),
            device_file_name: Some("dev.txt".to_string()),
            default_csv_delimiter: Some(";".to_string()),
            ..Default::default()
        })
        .unwrap();
    let settings = manager.load_settings().unwrap();

    let root = tempfile::tempdir().unwrap();
    test_helpers::write_lines(
        &root.path().join("incoming").join("dev.txt"),
        &["1;Sensor, with comma;Temperature sensor;DEV-001;2030-01-01;enabled"],
    )
    .unwrap();

    let sink = Arc::new(csv_importer::importer::MemorySink::new());
    let importer = csv_importer::CsvImporter::open(&db_path, root.path(), sink).unwrap();
    let report = importer.run(&manager).unwrap();

    assert_eq!(settings.device_file_path(root.path()), root.path().join("incoming/dev.txt"));
    assert_eq!(report.devices_processed, 1);
    assert_eq!(report.unavailable_sources.len(), 1);

    let conn = csv_importer::db::open_sqlite_connection(&db_path).unwrap();
    let device = SqliteRecordStore::new(&conn).find_device(1).unwrap().unwrap();
    assert_eq!(device.name.as_deref(), Some("Sensor, with comma"));
}
