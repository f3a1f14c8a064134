// ==========================================
// CSV 导入系统 - 行解析器
// ==========================================
// 职责: 原始行 + 行号 → 校验后的记录
// 列顺序:
// - 设备:     [id, name, description, code, expire_date, status]
// - 设备内容: [id, name, description, device_id, expire_date, status]
// 规则:
// - 列数不足 / ID 非法 → 整行拒绝
// - 其余字段独立校验，失败只置为 None
// - 每个失败都写入诊断通道（行号、字段、原始值）
// ==========================================

use crate::domain::{
    Diagnostic, DiagnosticReason, EntityKind, ValidatedContent, ValidatedDevice,
};
use crate::importer::diagnostics::DiagnosticsSink;
use crate::importer::error::{ImportError, ImportResult, RowRejected};
use crate::importer::field_validator::{
    code_taken_by_other, parse_status, parse_timestamp, validate_bounded_text,
    validate_free_text, validate_identifier, FieldCheck, CONTENT_NAME_MAX, DEVICE_CODE_MAX,
    DEVICE_NAME_MAX, MIN_COLUMNS,
};
use crate::importer::reference_resolver::ReferenceResolver;
use crate::repository::RecordStore;
use tracing::debug;

// 列下标
const COL_ID: usize = 0;
const COL_NAME: usize = 1;
const COL_DESCRIPTION: usize = 2;
const COL_CODE_OR_REF: usize = 3;
const COL_EXPIRE_DATE: usize = 4;
const COL_STATUS: usize = 5;

pub struct RowParser<'a> {
    store: &'a dyn RecordStore,
    sink: &'a dyn DiagnosticsSink,
}

impl<'a> RowParser<'a> {
    pub fn new(store: &'a dyn RecordStore, sink: &'a dyn DiagnosticsSink) -> Self {
        Self { store, sink }
    }

    /// 解析设备行
    ///
    /// # 参数
    /// - row: 原始行（单元格已去空白）
    /// - row_number: 文件内行号（1 起，含被拒绝行）
    ///
    /// # 返回
    /// - Ok(ValidatedDevice): 可能含 None 字段
    /// - Err(RowRejected): 结构性错误，已写入诊断
    /// - Err(Store): 唯一编码查询失败
    pub fn parse_device_row(&self, row: &[String], row_number: usize) -> ImportResult<ValidatedDevice> {
        let entity = EntityKind::Device;
        let id = self.check_structure(row, row_number, entity)?;

        let name = self.soft(
            row_number,
            entity,
            "name",
            &row[COL_NAME],
            validate_bounded_text(&row[COL_NAME], DEVICE_NAME_MAX),
        );
        let description = self.soft(
            row_number,
            entity,
            "description",
            &row[COL_DESCRIPTION],
            validate_free_text(&row[COL_DESCRIPTION]),
        );

        let raw_code = &row[COL_CODE_OR_REF];
        let code = match self.soft(
            row_number,
            entity,
            "code",
            raw_code,
            validate_bounded_text(raw_code, DEVICE_CODE_MAX),
        ) {
            Some(code) if code_taken_by_other(self.store, &code, id)? => {
                self.report(row_number, entity, "code", raw_code, DiagnosticReason::DuplicateCode);
                None
            }
            other => other,
        };

        let expire_date = self.soft(
            row_number,
            entity,
            "expire_date",
            &row[COL_EXPIRE_DATE],
            parse_timestamp(&row[COL_EXPIRE_DATE]),
        );
        let status = self.soft(
            row_number,
            entity,
            "status",
            &row[COL_STATUS],
            parse_status(&row[COL_STATUS]),
        );

        debug!(row_number, id, "设备行解析完成");
        Ok(ValidatedDevice {
            row_number,
            id,
            name,
            description,
            code,
            expire_date,
            status,
        })
    }

    /// 解析设备内容行（第 4 列为设备引用，经引用解析器校验）
    pub fn parse_content_row(&self, row: &[String], row_number: usize) -> ImportResult<ValidatedContent> {
        let entity = EntityKind::DeviceContent;
        let id = self.check_structure(row, row_number, entity)?;

        let name = self.soft(
            row_number,
            entity,
            "name",
            &row[COL_NAME],
            validate_bounded_text(&row[COL_NAME], CONTENT_NAME_MAX),
        );
        let description = self.soft(
            row_number,
            entity,
            "description",
            &row[COL_DESCRIPTION],
            validate_free_text(&row[COL_DESCRIPTION]),
        );

        let raw_ref = &row[COL_CODE_OR_REF];
        let resolved = ReferenceResolver::new(self.store).resolve_device_ref(raw_ref)?;
        let device_id = self.soft(row_number, entity, "device_id", raw_ref, resolved);

        let expire_date = self.soft(
            row_number,
            entity,
            "expire_date",
            &row[COL_EXPIRE_DATE],
            parse_timestamp(&row[COL_EXPIRE_DATE]),
        );
        let status = self.soft(
            row_number,
            entity,
            "status",
            &row[COL_STATUS],
            parse_status(&row[COL_STATUS]),
        );

        debug!(row_number, id, ?device_id, "设备内容行解析完成");
        Ok(ValidatedContent {
            row_number,
            id,
            name,
            description,
            device_id,
            expire_date,
            status,
        })
    }

    // 列数与 ID 校验，失败即整行拒绝
    fn check_structure(&self, row: &[String], row_number: usize, entity: EntityKind) -> ImportResult<i64> {
        if row.len() < MIN_COLUMNS {
            self.report(
                row_number,
                entity,
                "row",
                &row.join(","),
                DiagnosticReason::TooFewColumns,
            );
            return Err(ImportError::RowRejected {
                row_number,
                reason: RowRejected::TooFewColumns {
                    found: row.len(),
                    required: MIN_COLUMNS,
                },
            });
        }

        let raw_id = &row[COL_ID];
        validate_identifier(raw_id).map_err(|reason| {
            self.report(row_number, entity, "id", raw_id, reason);
            ImportError::RowRejected {
                row_number,
                reason: RowRejected::InvalidId {
                    raw: raw_id.clone(),
                },
            }
        })
    }

    // 软失败: 记录诊断，字段置为 None
    fn soft<T>(
        &self,
        row_number: usize,
        entity: EntityKind,
        field: &str,
        raw: &str,
        check: FieldCheck<T>,
    ) -> Option<T> {
        match check {
            Ok(value) => Some(value),
            Err(reason) => {
                self.report(row_number, entity, field, raw, reason);
                None
            }
        }
    }

    fn report(&self, row_number: usize, entity: EntityKind, field: &str, raw: &str, reason: DiagnosticReason) {
        self.sink
            .record(Diagnostic::new(row_number, entity, field, raw, reason));
    }
}
