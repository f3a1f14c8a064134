// ==========================================
// CSV 导入系统 - 导入编排器
// ==========================================
// 职责: 读取配置 → 读取两个源文件 → 解析 → 引用解析 → 对账 → 落库 → 报告
// 流程:
// 1. 设备文件、内容文件先后整体读入（不可用的文件记录后跳过）
// 2. 开启单一事务
// 3. 设备行全部处理完毕后才处理内容行（内容可引用本次新建的设备）
// 4. 写入运行台账，提交事务
// 红线: 行级问题就地消化；只有存储失败会中断运行（事务回滚）
// ==========================================

use crate::config::{ImporterSettings, SettingsProvider};
use crate::db::open_sqlite_connection;
use crate::domain::types::now_utc;
use crate::domain::{EntityKind, FileTally, ImportReport, ReconcileAction};
use crate::importer::diagnostics::DiagnosticsSink;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_reader::{DelimitedFileReader, RawRow, RowReader};
use crate::importer::reconciler::Reconciler;
use crate::importer::row_parser::RowParser;
use crate::repository::{ImportRunRepository, RecordStore, RepositoryError, SqliteRecordStore};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, instrument, Span};
use uuid::Uuid;

// ==========================================
// CsvImporter - 导入编排器
// ==========================================
pub struct CsvImporter {
    conn: Arc<Mutex<Connection>>,
    root: PathBuf,                   // 根目录（csv_store_path 相对于此）
    sink: Arc<dyn DiagnosticsSink>, // 诊断通道
}

impl CsvImporter {
    /// 创建新的 CsvImporter 实例
    ///
    /// # 参数
    /// - conn: 共享数据库连接（表结构需已初始化）
    /// - root: 根目录
    /// - sink: 诊断通道
    pub fn new(conn: Arc<Mutex<Connection>>, root: impl Into<PathBuf>, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            conn,
            root: root.into(),
            sink,
        }
    }

    /// 按数据库路径打开
    pub fn open(db_path: &str, root: impl Into<PathBuf>, sink: Arc<dyn DiagnosticsSink>) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::new(Arc::new(Mutex::new(conn)), root, sink))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn get_conn(&self) -> ImportResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ImportError::Store(RepositoryError::LockError(e.to_string())))
    }

    /// 从配置提供者读取配置后执行导入
    pub fn run(&self, provider: &dyn SettingsProvider) -> ImportResult<ImportReport> {
        let settings = provider.load_settings()?;
        self.import_all(&settings)
    }

    /// 执行一次完整导入
    ///
    /// # 返回
    /// - Ok(ImportReport): 各文件处理/失败计数（不可用的文件计为 0）
    /// - Err(Config): 配置非法，未做任何读取
    /// - Err(Store): 存储失败，本次运行的全部写入已回滚
    #[instrument(skip(self, settings), fields(run_id))]
    pub fn import_all(&self, settings: &ImporterSettings) -> ImportResult<ImportReport> {
        settings.validate()?;
        let reader = DelimitedFileReader::new(settings.delimiter_byte()?);

        let run_id = Uuid::new_v4().to_string();
        Span::current().record("run_id", run_id.as_str());
        let started_at = now_utc();
        let mut report = ImportReport::new(run_id, started_at);

        info!(
            root = %self.root.display(),
            store = %settings.csv_store_path,
            "开始导入"
        );

        // === 步骤 1: 读取源文件 ===
        let device_rows = load_source(&reader, &settings.device_file_path(&self.root), &mut report)?;
        let content_rows = load_source(&reader, &settings.content_file_path(&self.root), &mut report)?;

        // === 步骤 2: 事务内对账 ===
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let store = SqliteRecordStore::new(&tx);
            let sink = self.sink.as_ref();

            if let Some(rows) = device_rows {
                report.apply_devices(process_devices(&store, sink, &rows, started_at)?);
            }
            if let Some(rows) = content_rows {
                report.apply_content(process_contents(&store, sink, &rows, started_at)?);
            }

            report.finished_at = now_utc();
            ImportRunRepository::new(&tx).insert(&report)?;
        }
        tx.commit()?;

        info!(
            devices_processed = report.devices_processed,
            devices_failed = report.devices_failed,
            content_processed = report.content_processed,
            content_failed = report.content_failed,
            "导入完成，事务已提交"
        );
        Ok(report)
    }
}

// 读取单个源文件；文件级错误记入报告并返回 None，其余错误上抛
fn load_source(
    reader: &dyn RowReader,
    path: &Path,
    report: &mut ImportReport,
) -> ImportResult<Option<Vec<RawRow>>> {
    match reader.read_rows(path) {
        Ok(rows) => Ok(Some(rows)),
        Err(e) if e.is_source_level() => {
            error!(file = %path.display(), error = %e, "源文件不可用，跳过该文件");
            report.unavailable_sources.push(path.display().to_string());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// 处理设备文件的全部行（文件顺序）
///
/// # 返回
/// - Ok(FileTally): 成功对账行数 / 结构性拒绝行数 / 决策计数
/// - Err(Store): 存储失败，调用方负责回滚
pub fn process_devices(
    store: &dyn RecordStore,
    sink: &dyn DiagnosticsSink,
    rows: &[RawRow],
    now: NaiveDateTime,
) -> ImportResult<FileTally> {
    let parser = RowParser::new(store, sink);
    let reconciler = Reconciler::new(store, now);

    process_rows(EntityKind::Device, rows, |row, row_number| {
        let record = parser.parse_device_row(row, row_number)?;
        Ok(reconciler.apply_device(&record)?)
    })
}

/// 处理设备内容文件的全部行（须在设备文件之后）
pub fn process_contents(
    store: &dyn RecordStore,
    sink: &dyn DiagnosticsSink,
    rows: &[RawRow],
    now: NaiveDateTime,
) -> ImportResult<FileTally> {
    let parser = RowParser::new(store, sink);
    let reconciler = Reconciler::new(store, now);

    process_rows(EntityKind::DeviceContent, rows, |row, row_number| {
        let record = parser.parse_content_row(row, row_number)?;
        Ok(reconciler.apply_content(&record)?)
    })
}

fn process_rows<F>(entity: EntityKind, rows: &[RawRow], mut handle: F) -> ImportResult<FileTally>
where
    F: FnMut(&[String], usize) -> ImportResult<ReconcileAction>,
{
    let mut tally = FileTally::default();

    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        match handle(row, row_number) {
            Ok(action) => {
                tally.processed += 1;
                tally.actions.record(action);
            }
            Err(e) if e.is_row_level() => {
                debug!(%entity, row_number, error = %e, "行被拒绝");
                tally.failed += 1;
            }
            Err(e) => {
                error!(%entity, row_number, error = %e, "存储失败，中断导入");
                return Err(e);
            }
        }
    }

    info!(
        %entity,
        processed = tally.processed,
        failed = tally.failed,
        inserted = tally.actions.inserted,
        updated = tally.actions.updated,
        unchanged = tally.actions.unchanged,
        "文件处理完成"
    );
    Ok(tally)
}
