// ==========================================
// CSV 导入系统 - 导入层
// ==========================================
// 职责: 源文件 → 校验后记录 → 对账决策 → 存储变更
// 流程: 读取 → 行解析（字段校验 + 引用解析）→ 对账 → 落库
// ==========================================

// 模块声明
pub mod csv_importer;
pub mod diagnostics;
pub mod error;
pub mod field_validator;
pub mod file_reader;
pub mod reconciler;
pub mod reference_resolver;
pub mod row_parser;

// 重导出核心类型
pub use csv_importer::{process_contents, process_devices, CsvImporter};
pub use diagnostics::{DiagnosticsSink, JsonLinesSink, MemorySink, TracingSink};
pub use error::{ImportError, ImportResult, RowRejected};
pub use file_reader::{DelimitedFileReader, RawRow, RowReader};
pub use reconciler::{is_strictly_later, reconcile, Reconciler};
pub use reference_resolver::ReferenceResolver;
pub use row_parser::RowParser;
