// ==========================================
// CSV 导入系统 - 跨实体引用解析
// ==========================================
// 职责: 设备内容行的设备引用必须指向已存在的设备
// 约定: 引用缺失不是错误，只返回失败原因（内容行照常导入，引用置空）
// 约束: 依赖存储"写后可读"，同一次运行中先导入的设备可见
// ==========================================

use crate::domain::DiagnosticReason;
use crate::importer::field_validator::{validate_identifier, FieldCheck};
use crate::repository::{RecordStore, RepositoryResult};

pub struct ReferenceResolver<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// 解析设备引用
    ///
    /// # 返回
    /// - Ok(Ok(id)): 设备存在
    /// - Ok(Err(InvalidReference)): 引用文本不是合法 ID
    /// - Ok(Err(MissingReference)): 设备不存在
    /// - Err: 存储查询失败
    pub fn resolve_device_ref(&self, raw: &str) -> RepositoryResult<FieldCheck<i64>> {
        let device_id = match validate_identifier(raw) {
            Ok(id) => id,
            Err(_) => return Ok(Err(DiagnosticReason::InvalidReference)),
        };

        match self.store.find_device(device_id)? {
            Some(_) => Ok(Ok(device_id)),
            None => Ok(Err(DiagnosticReason::MissingReference)),
        }
    }
}
