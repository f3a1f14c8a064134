// ==========================================
// CSV 导入系统 - 字段校验器
// ==========================================
// 职责: 按语义类型逐列校验，输出净化值或失败原因
// 红线: 纯函数，无状态；唯一编码检查只读存储，不做写入
// 红线: 任何失败都止步于此（日期解析错误不得向上抛出）
// ==========================================

use crate::domain::{DeviceStatus, DiagnosticReason};
use crate::repository::{RecordStore, RepositoryResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// 每行最少列数
pub const MIN_COLUMNS: usize = 6;

/// 设备名称最大长度（字符）
pub const DEVICE_NAME_MAX: usize = 32;

/// 设备编码最大长度（字符）
pub const DEVICE_CODE_MAX: usize = 30;

/// 设备内容名称最大长度（字符）
pub const CONTENT_NAME_MAX: usize = 100;

/// 单字段校验结果: Ok(净化值) / Err(诊断原因)
pub type FieldCheck<T> = Result<T, DiagnosticReason>;

/// 可接受的最小年份
///
/// chrono 的 %Y 接受 1~4 位年份，"1/1/30" 会被读成公元 1 年；
/// 不足四位的年份一律视为无法解析
pub const MIN_YEAR: i32 = 1000;

// 带时间的格式（按优先级）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y%m%d%H%M%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %H:%M",
    "%B %d %Y %H:%M",
    "%b %d %Y %H:%M",
    "%b %d %Y %I:%M %p",
    "%d %b %Y %H:%M",
];

// 仅日期的格式（时间取 00:00:00）
// 斜杠格式先按月/日/年，失败再按日/月/年
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
];

/// 标识符: 去空白后必须全部为数字，且在 i64 范围内
///
/// # 返回
/// - Err(InvalidId): 整行应被拒绝
pub fn validate_identifier(raw: &str) -> FieldCheck<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(DiagnosticReason::InvalidId);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| DiagnosticReason::InvalidId)
}

/// 有界文本（名称、编码）: 字符数必须在 [1, max] 内
pub fn validate_bounded_text(raw: &str, max: usize) -> FieldCheck<String> {
    let len = raw.chars().count();
    if len == 0 {
        return Err(DiagnosticReason::EmptyValue);
    }
    if len > max {
        return Err(DiagnosticReason::InvalidLength);
    }
    Ok(raw.to_string())
}

/// 自由文本（描述）: 非空即可
pub fn validate_free_text(raw: &str) -> FieldCheck<String> {
    if raw.is_empty() {
        return Err(DiagnosticReason::EmptyValue);
    }
    Ok(raw.to_string())
}

/// 唯一编码: 编码是否已被其他设备占用
///
/// 设备自身持有该编码不算冲突（重复导入同一设备时保留编码）
pub fn code_taken_by_other(
    store: &dyn RecordStore,
    code: &str,
    device_id: i64,
) -> RepositoryResult<bool> {
    let owner = store.find_device_by_code(code)?;
    Ok(matches!(owner, Some(device) if device.id != device_id))
}

/// 过期时间: 宽松解析
///
/// 依次尝试 RFC 3339 / RFC 2822 / 常见日期时间格式 / 仅日期格式；
/// 带时区的输入统一换算为 UTC
pub fn parse_timestamp(raw: &str) -> FieldCheck<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DiagnosticReason::UnparsableDate);
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|dt| dt.naive_utc())
        .and_then(full_year)
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|format| {
                NaiveDateTime::parse_from_str(value, format)
                    .ok()
                    .and_then(full_year)
            })
        })
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .map(|date| date.and_time(NaiveTime::MIN))
                    .and_then(full_year)
            })
        })
        .ok_or(DiagnosticReason::UnparsableDate)
}

fn full_year(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    (dt.year() >= MIN_YEAR).then_some(dt)
}

/// 状态名: 查固定映射表（disabled→0, enabled→1, deleted→-1）
///
/// 注意 disabled 的编码为 0，但仍是合法值
pub fn parse_status(raw: &str) -> FieldCheck<DeviceStatus> {
    DeviceStatus::from_name(raw).ok_or(DiagnosticReason::UnknownStatus)
}
