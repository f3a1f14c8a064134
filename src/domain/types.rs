// ==========================================
// CSV 导入系统 - 领域类型定义
// ==========================================
// 职责: 状态枚举、实体种类
// 红线: 状态缺失必须用 None 表达，不能用 0 充当"无值"
// ==========================================

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 时间戳存储/展示格式（UTC，精确到秒）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_stored_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

/// 当前 UTC 时间（截断到秒，与存储精度一致）
pub fn now_utc() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

// ==========================================
// 设备状态 (Device Status)
// ==========================================
// 数据库存储为整数码: disabled=0, enabled=1, deleted=-1
// Disabled 的存储码为 0，读取端一律经 Option<DeviceStatus> 判定，不做真值判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Disabled, // 停用
    Enabled,  // 启用
    Deleted,  // 已删除
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 3] = [
        DeviceStatus::Disabled,
        DeviceStatus::Enabled,
        DeviceStatus::Deleted,
    ];

    /// 数据库存储码
    pub fn code(self) -> i32 {
        match self {
            DeviceStatus::Disabled => 0,
            DeviceStatus::Enabled => 1,
            DeviceStatus::Deleted => -1,
        }
    }

    /// 从存储码解析（未知码返回 None）
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// 从 CSV 中的状态名解析
    ///
    /// 比映射表的精确匹配更宽: 名称比较忽略首尾空白与大小写，
    /// "Enabled" 与 " enabled " 都识别为 Enabled；未知名称返回 None
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.name() == normalized)
    }

    pub fn name(self) -> &'static str {
        match self {
            DeviceStatus::Disabled => "disabled",
            DeviceStatus::Enabled => "enabled",
            DeviceStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ==========================================
// 实体种类 (Entity Kind)
// ==========================================
// 用于诊断条目与日志字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Device,        // 设备
    DeviceContent, // 设备内容
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Device => write!(f, "device"),
            EntityKind::DeviceContent => write!(f, "device_content"),
        }
    }
}
