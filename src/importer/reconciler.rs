// ==========================================
// CSV 导入系统 - 对账引擎
// ==========================================
// 职责: 对每条校验后的记录决定 INSERT / UPDATE / NOOP 并落库
// 规则: 过期时间作为新鲜度标记
// - 无同 ID 记录 → Insert
// - 传入过期时间严格晚于已存值 → UpdateIfNewer（覆写全部可变字段，含 None）
// - 其余情况 → NoOp（已存记录原样不动）
// 红线: 不做字段校验，不写诊断
// ==========================================

use crate::domain::{
    Device, DeviceContent, Expiring, ReconcileAction, ValidatedContent, ValidatedDevice,
};
use crate::repository::{RecordStore, RepositoryResult};
use chrono::NaiveDateTime;
use tracing::debug;

/// 传入过期时间是否严格晚于已存值
///
/// - (Some, Some): 比较大小
/// - (Some, None): 视为更晚
/// - (None, _): 永不更晚
pub fn is_strictly_later(incoming: Option<NaiveDateTime>, stored: Option<NaiveDateTime>) -> bool {
    match (incoming, stored) {
        (Some(incoming), Some(stored)) => incoming > stored,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// 对账决策（纯函数）
pub fn reconcile<E, I>(existing: Option<&E>, incoming: &I) -> ReconcileAction
where
    E: Expiring,
    I: Expiring,
{
    match existing {
        None => ReconcileAction::Insert,
        Some(stored) if is_strictly_later(incoming.expire_date(), stored.expire_date()) => {
            ReconcileAction::UpdateIfNewer
        }
        Some(_) => ReconcileAction::NoOp,
    }
}

// ==========================================
// Reconciler - 决策 + 落库
// ==========================================
pub struct Reconciler<'a> {
    store: &'a dyn RecordStore,
    now: NaiveDateTime, // 本次运行统一时钟
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn RecordStore, now: NaiveDateTime) -> Self {
        Self { store, now }
    }

    /// 对账并落库一条设备记录
    pub fn apply_device(&self, record: &ValidatedDevice) -> RepositoryResult<ReconcileAction> {
        let existing = self.store.find_device(record.id)?;
        let action = reconcile(existing.as_ref(), record);

        match (action, existing) {
            (ReconcileAction::Insert, _) => {
                self.store
                    .insert_device(&Device::from_validated(record, self.now))?;
            }
            (ReconcileAction::UpdateIfNewer, Some(mut device)) => {
                device.overwrite_from(record, self.now);
                self.store.update_device(&device)?;
            }
            _ => {}
        }

        debug!(row_number = record.row_number, id = record.id, %action, "设备对账");
        Ok(action)
    }

    /// 对账并落库一条设备内容记录
    pub fn apply_content(&self, record: &ValidatedContent) -> RepositoryResult<ReconcileAction> {
        let existing = self.store.find_content(record.id)?;
        let action = reconcile(existing.as_ref(), record);

        match (action, existing) {
            (ReconcileAction::Insert, _) => {
                self.store
                    .insert_content(&DeviceContent::from_validated(record, self.now))?;
            }
            (ReconcileAction::UpdateIfNewer, Some(mut content)) => {
                content.overwrite_from(record, self.now);
                self.store.update_content(&content)?;
            }
            _ => {}
        }

        debug!(row_number = record.row_number, id = record.id, %action, "设备内容对账");
        Ok(action)
    }
}
