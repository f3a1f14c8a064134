// ==========================================
// CSV 导入系统 - 设备领域模型
// ==========================================
// 职责: Device / DeviceContent 实体 + 导入中间结构体
// 约定: 所有可选字段用 Option 表达"缺失"（校验失败即为 None）
// ==========================================

use crate::domain::types::{format_timestamp, DeviceStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 展示层对缺失字段的占位文本
pub const INVALID_DATA: &str = "Invalid data";

// ==========================================
// Expiring - 带过期时间的记录
// ==========================================
// 过期时间同时充当版本/新鲜度标记，对账引擎只依赖此接口
pub trait Expiring {
    fn expire_date(&self) -> Option<NaiveDateTime>;
}

// ==========================================
// Device - 设备
// ==========================================
// 主键由 CSV 提供（非自增）
// 对齐: device 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,                              // 外部提供的设备 ID
    pub name: Option<String>,                 // 名称（≤32 字符）
    pub description: Option<String>,          // 描述
    pub code: Option<String>,                 // 编码（≤30 字符，全局唯一）
    pub date_created: Option<NaiveDateTime>,  // 创建时间
    pub date_updated: Option<NaiveDateTime>,  // 更新时间
    pub expire_date: Option<NaiveDateTime>,   // 过期时间
    pub status: Option<DeviceStatus>,         // 状态
}

impl Device {
    /// 由校验后的记录新建设备（创建/更新时间均取 now）
    pub fn from_validated(record: &ValidatedDevice, now: NaiveDateTime) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            code: record.code.clone(),
            date_created: Some(now),
            date_updated: Some(now),
            expire_date: record.expire_date,
            status: record.status,
        }
    }

    /// 用更新鲜的记录覆写全部可变字段
    ///
    /// 缺失字段同样覆写为 None；date_created 保持不变
    pub fn overwrite_from(&mut self, record: &ValidatedDevice, now: NaiveDateTime) {
        self.name = record.name.clone();
        self.description = record.description.clone();
        self.code = record.code.clone();
        self.expire_date = record.expire_date;
        self.status = record.status;
        self.date_updated = Some(now);
    }

    pub fn display_name(&self) -> &str {
        display_text(&self.name)
    }

    pub fn display_description(&self) -> &str {
        display_text(&self.description)
    }

    pub fn display_code(&self) -> &str {
        display_text(&self.code)
    }

    pub fn display_status(&self) -> &'static str {
        display_status(self.status)
    }

    pub fn display_expire_date(&self) -> String {
        display_timestamp(self.expire_date)
    }

    pub fn display_date_created(&self) -> String {
        display_timestamp(self.date_created)
    }

    pub fn display_date_updated(&self) -> String {
        display_timestamp(self.date_updated)
    }
}

impl Expiring for Device {
    fn expire_date(&self) -> Option<NaiveDateTime> {
        self.expire_date
    }
}

// ==========================================
// DeviceContent - 设备内容
// ==========================================
// device_id 可空；被引用设备删除时置空（ON DELETE SET NULL）
// 对齐: devicecontent 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceContent {
    pub id: i64,                              // 外部提供的内容 ID
    pub name: Option<String>,                 // 名称（≤100 字符）
    pub description: Option<String>,          // 描述
    pub date_created: Option<NaiveDateTime>,  // 创建时间
    pub date_updated: Option<NaiveDateTime>,  // 更新时间
    pub expire_date: Option<NaiveDateTime>,   // 过期时间
    pub status: Option<DeviceStatus>,         // 状态
    pub device_id: Option<i64>,               // 关联设备
}

impl DeviceContent {
    pub fn from_validated(record: &ValidatedContent, now: NaiveDateTime) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            date_created: Some(now),
            date_updated: Some(now),
            expire_date: record.expire_date,
            status: record.status,
            device_id: record.device_id,
        }
    }

    pub fn overwrite_from(&mut self, record: &ValidatedContent, now: NaiveDateTime) {
        self.name = record.name.clone();
        self.description = record.description.clone();
        self.expire_date = record.expire_date;
        self.status = record.status;
        self.device_id = record.device_id;
        self.date_updated = Some(now);
    }

    pub fn display_name(&self) -> &str {
        display_text(&self.name)
    }

    pub fn display_description(&self) -> &str {
        display_text(&self.description)
    }

    pub fn display_status(&self) -> &'static str {
        display_status(self.status)
    }

    pub fn display_expire_date(&self) -> String {
        display_timestamp(self.expire_date)
    }

    pub fn display_device_id(&self) -> String {
        self.device_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| INVALID_DATA.to_string())
    }
}

impl Expiring for DeviceContent {
    fn expire_date(&self) -> Option<NaiveDateTime> {
        self.expire_date
    }
}

// ==========================================
// ValidatedDevice - 设备导入中间结构体
// ==========================================
// 用途: 行解析器输出，对账引擎输入
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedDevice {
    pub row_number: usize, // 原始文件行号（1 起）
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub expire_date: Option<NaiveDateTime>,
    pub status: Option<DeviceStatus>,
}

impl Expiring for ValidatedDevice {
    fn expire_date(&self) -> Option<NaiveDateTime> {
        self.expire_date
    }
}

// ==========================================
// ValidatedContent - 设备内容导入中间结构体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedContent {
    pub row_number: usize,
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub device_id: Option<i64>, // 已通过引用解析确认存在的设备 ID
    pub expire_date: Option<NaiveDateTime>,
    pub status: Option<DeviceStatus>,
}

impl Expiring for ValidatedContent {
    fn expire_date(&self) -> Option<NaiveDateTime> {
        self.expire_date
    }
}

fn display_text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(INVALID_DATA)
}

fn display_status(status: Option<DeviceStatus>) -> &'static str {
    status.map(DeviceStatus::name).unwrap_or(INVALID_DATA)
}

fn display_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| INVALID_DATA.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn validated_device(id: i64) -> ValidatedDevice {
        ValidatedDevice {
            row_number: 1,
            id,
            name: Some("Sensor-A".to_string()),
            description: Some("Temperature sensor".to_string()),
            code: Some("DEV-001".to_string()),
            expire_date: Some(ts(2030, 1, 1)),
            status: Some(DeviceStatus::Enabled),
        }
    }

    #[test]
    fn test_device_from_validated_stamps_both_dates() {
        let now = ts(2026, 10, 19);
        let device = Device::from_validated(&validated_device(1), now);

        assert_eq!(device.id, 1);
        assert_eq!(device.code.as_deref(), Some("DEV-001"));
        assert_eq!(device.date_created, Some(now));
        assert_eq!(device.date_updated, Some(now));
    }

    #[test]
    fn test_device_overwrite_blanks_absent_fields() {
        let created = ts(2026, 1, 1);
        let mut device = Device::from_validated(&validated_device(1), created);

        let mut newer = validated_device(1);
        newer.description = None;
        newer.code = None;
        newer.expire_date = Some(ts(2031, 1, 1));

        let now = ts(2026, 10, 19);
        device.overwrite_from(&newer, now);

        assert_eq!(device.description, None);
        assert_eq!(device.code, None);
        assert_eq!(device.expire_date, Some(ts(2031, 1, 1)));
        assert_eq!(device.date_created, Some(created));
        assert_eq!(device.date_updated, Some(now));
    }

    #[test]
    fn test_display_disabled_status_is_not_invalid() {
        let mut device = Device::from_validated(&validated_device(1), ts(2026, 1, 1));
        device.status = Some(DeviceStatus::Disabled);
        assert_eq!(device.display_status(), "disabled");

        device.status = None;
        assert_eq!(device.display_status(), INVALID_DATA);
    }

    #[test]
    fn test_display_placeholders_for_missing_values() {
        let content = DeviceContent {
            id: 5,
            name: None,
            description: Some("Firmware".to_string()),
            date_created: None,
            date_updated: None,
            expire_date: None,
            status: None,
            device_id: None,
        };

        assert_eq!(content.display_name(), INVALID_DATA);
        assert_eq!(content.display_description(), "Firmware");
        assert_eq!(content.display_expire_date(), INVALID_DATA);
        assert_eq!(content.display_device_id(), INVALID_DATA);
    }
}
