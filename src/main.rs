// ==========================================
// CSV 导入系统 - 命令行入口
// ==========================================
// 命令:
// - init                       建表 + 写入默认导入配置
// - import [--errors-log PATH] 执行一次导入，输出报告 JSON
// - settings show | set        查看 / 修改导入配置
// - list devices | content     只读展示
// - runs [--limit N]           最近的导入运行
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use csv_importer::config::{SettingsManager, SettingsProvider, SettingsUpdate};
use csv_importer::db::{get_default_db_path, initialize_database, open_sqlite_connection};
use csv_importer::domain::types::format_timestamp;
use csv_importer::importer::{CsvImporter, DiagnosticsSink, JsonLinesSink, TracingSink};
use csv_importer::logging::{self, LogFormat};
use csv_importer::repository::{ImportRunRepository, RecordStore, SqliteRecordStore};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum LogFormatArg {
    #[default]
    Text,
    Json,
}

/// 设备 / 设备内容 CSV 导入与对账
#[derive(Parser, Debug)]
#[command(name = "csv-importer", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 数据库路径（默认: 用户数据目录/csv-importer/csvimporter.db）
    #[arg(long, global = true, env = "CSV_IMPORTER_DB_PATH")]
    db: Option<PathBuf>,

    /// 根目录（csv_store_path 相对于此）
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// 日志格式
    #[arg(long, value_enum, global = true, default_value_t)]
    log_format: LogFormatArg,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 建表并写入默认导入配置（已有配置不覆盖）
    Init,

    /// 执行一次导入
    Import {
        /// 诊断日志文件（默认: <root>/csv_import_errors/errors.log）
        #[arg(long)]
        errors_log: Option<PathBuf>,

        /// 诊断只输出到日志，不写文件
        #[arg(long, conflicts_with = "errors_log")]
        no_errors_log: bool,
    },

    /// 导入配置
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// 只读展示已导入数据
    List {
        #[command(subcommand)]
        command: ListCommands,
    },

    /// 最近的导入运行
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    /// 输出当前配置（JSON）
    Show,

    /// 修改配置（未指定的项保持不变）
    Set {
        #[arg(long)]
        store_path: Option<String>,

        #[arg(long)]
        device_file: Option<String>,

        #[arg(long)]
        content_file: Option<String>,

        #[arg(long)]
        delimiter: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ListCommands {
    Devices,
    Content,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(match cli.log_format {
        LogFormatArg::Text => LogFormat::Text,
        LogFormatArg::Json => LogFormat::Json,
    });

    let db_path = cli
        .db
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    tracing::debug!("{} v{} 使用数据库: {}", csv_importer::APP_NAME, csv_importer::VERSION, db_path);

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;

    match cli.command {
        Commands::Init => cmd_init(&conn, &db_path),
        Commands::Import {
            errors_log,
            no_errors_log,
        } => cmd_import(conn, cli.root, errors_log, no_errors_log),
        Commands::Settings { command } => cmd_settings(conn, command),
        Commands::List { command } => cmd_list(&conn, command),
        Commands::Runs { limit } => cmd_runs(&conn, limit),
    }
}

fn cmd_init(conn: &Connection, db_path: &str) -> Result<()> {
    initialize_database(conn).context("数据库初始化失败")?;
    println!("initialized {}", db_path);
    Ok(())
}

fn cmd_import(
    conn: Connection,
    root: PathBuf,
    errors_log: Option<PathBuf>,
    no_errors_log: bool,
) -> Result<()> {
    initialize_database(&conn).context("数据库初始化失败")?;

    let sink: Arc<dyn DiagnosticsSink> = if no_errors_log {
        Arc::new(TracingSink)
    } else {
        let path = errors_log.unwrap_or_else(|| JsonLinesSink::default_path(&root));
        Arc::new(
            JsonLinesSink::open(&path)
                .with_context(|| format!("无法打开诊断日志: {}", path.display()))?,
        )
    };

    let shared = Arc::new(Mutex::new(conn));
    let settings = SettingsManager::from_connection(shared.clone()).load_settings()?;
    let importer = CsvImporter::new(shared, root, sink);

    let report = importer.import_all(&settings).context("导入失败，本次运行已回滚")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_settings(conn: Connection, command: SettingsCommands) -> Result<()> {
    let manager = SettingsManager::from_connection(Arc::new(Mutex::new(conn)));

    let settings = match command {
        SettingsCommands::Show => manager.load_settings()?,
        SettingsCommands::Set {
            store_path,
            device_file,
            content_file,
            delimiter,
        } => manager.update(SettingsUpdate {
            csv_store_path: store_path,
            device_file_name: device_file,
            content_file_name: content_file,
            default_csv_delimiter: delimiter,
        })?,
    };

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn cmd_list(conn: &Connection, command: ListCommands) -> Result<()> {
    let store = SqliteRecordStore::new(conn);

    match command {
        ListCommands::Devices => {
            println!("id\tname\tdescription\tcode\texpire_date\tstatus\tdate_updated");
            for device in store.list_devices()? {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    device.id,
                    device.display_name(),
                    device.display_description(),
                    device.display_code(),
                    device.display_expire_date(),
                    device.display_status(),
                    device.display_date_updated(),
                );
            }
        }
        ListCommands::Content => {
            println!("id\tname\tdescription\tdevice_id\texpire_date\tstatus");
            for content in store.list_contents()? {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    content.id,
                    content.display_name(),
                    content.display_description(),
                    content.display_device_id(),
                    content.display_expire_date(),
                    content.display_status(),
                );
            }
        }
    }
    Ok(())
}

fn cmd_runs(conn: &Connection, limit: usize) -> Result<()> {
    let runs = ImportRunRepository::new(conn).list_recent(limit)?;

    println!("run_id\tstarted_at\tfinished_at\tdevices\tdevices_failed\tcontent\tcontent_failed");
    for run in runs {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            run.run_id,
            format_timestamp(&run.started_at),
            format_timestamp(&run.finished_at),
            run.devices_processed,
            run.devices_failed,
            run.content_processed,
            run.content_failed,
        );
    }
    Ok(())
}
