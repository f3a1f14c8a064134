// ==========================================
// 测试数据生成器
// ==========================================
// 用途: 生成设备 / 设备内容 CSV 样例（含各类异常行）
// 输出: <目录>/devices.csv, <目录>/content.csv
// 用法: generate_test_data [输出目录] [设备数]
//       默认 tests/fixtures/datasets/csv_store, 100
// ==========================================

use chrono::{Duration, Utc};
use csv::WriterBuilder;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const STATUSES: &[&str] = &["enabled", "disabled", "deleted"];

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/datasets/csv_store"));
    let device_count: usize = match args.next() {
        Some(raw) => raw.parse()?,
        None => 100,
    };

    fs::create_dir_all(&out_dir)?;
    println!("开始生成测试数据: {}", out_dir.display());

    generate_devices(&out_dir.join("devices.csv"), device_count)?;
    generate_contents(&out_dir.join("content.csv"), device_count)?;

    println!("✓ 测试数据生成完成");
    Ok(())
}

fn expire_date(index: usize) -> String {
    let base = Utc::now().date_naive() + Duration::days(365);
    (base + Duration::days(index as i64)).format("%Y-%m-%d").to_string()
}

fn generate_devices(path: &Path, count: usize) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;

    for i in 1..=count {
        wtr.write_record([
            i.to_string(),
            format!("Device-{:04}", i),
            format!("Generated device {}", i),
            format!("DEV-{:04}", i),
            expire_date(i),
            STATUSES[i % STATUSES.len()].to_string(),
        ])?;
    }

    // 异常行
    let flexible_rows: Vec<Vec<String>> = vec![
        // 列数不足
        vec!["9001".into(), "Short".into(), "row".into()],
        // ID 非数字
        vec!["X-1".into(), "Bad id".into(), "desc".into(), "DEV-X1".into(), expire_date(1), "enabled".into()],
        // 名称超长 + 未知状态
        vec![(count + 1).to_string(), "N".repeat(40), "desc".into(), format!("DEV-{:04}", count + 1), expire_date(1), "archived".into()],
        // 编码重复
        vec![(count + 2).to_string(), "Dup code".into(), "desc".into(), "DEV-0001".into(), expire_date(2), "enabled".into()],
        // 日期无法解析
        vec![(count + 3).to_string(), "No date".into(), "desc".into(), format!("DEV-{:04}", count + 3), "someday".into(), "enabled".into()],
    ];
    wtr.flush()?;
    drop(wtr);

    append_rows(path, &flexible_rows)?;
    println!("✓ 生成 {} ({} 条正常 + {} 条异常)", path.display(), count, flexible_rows.len());
    Ok(())
}

fn generate_contents(path: &Path, device_count: usize) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;

    for i in 1..=device_count * 2 {
        let device_ref = (i + 1) / 2;
        wtr.write_record([
            (1000 + i).to_string(),
            format!("Content-{:04}", i),
            format!("Content item {} of device {}", i, device_ref),
            device_ref.to_string(),
            expire_date(i),
            STATUSES[i % STATUSES.len()].to_string(),
        ])?;
    }
    wtr.flush()?;
    drop(wtr);

    let flexible_rows: Vec<Vec<String>> = vec![
        // 引用不存在的设备
        vec!["9100".into(), "Orphan".into(), "desc".into(), "999999".into(), expire_date(1), "enabled".into()],
        // 引用非法
        vec!["9101".into(), "Bad ref".into(), "desc".into(), "dev-1".into(), expire_date(1), "enabled".into()],
        // 列数不足
        vec!["9102".into()],
    ];
    append_rows(path, &flexible_rows)?;
    println!("✓ 生成 {} ({} 条正常 + {} 条异常)", path.display(), device_count * 2, flexible_rows.len());
    Ok(())
}

// 追加长度不一的行
fn append_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), Box<dyn Error>> {
    let file = fs::OpenOptions::new().append(true).open(path)?;
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(file);
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
