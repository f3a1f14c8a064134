// ==========================================
// CSV 导入系统 - 记录存储 Trait
// ==========================================
// 职责: 定义导入引擎所需的数据访问接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 实现必须保证同一次运行内"写后可读"
// ==========================================

use crate::domain::{Device, DeviceContent};
use crate::repository::error::RepositoryResult;

// ==========================================
// RecordStore Trait
// ==========================================
// 用途: 字段校验（唯一编码）、引用解析、对账引擎共用
// 实现者: SqliteRecordStore（运行于导入事务之内）
pub trait RecordStore {
    // ===== Device =====

    /// 按 ID 查询设备
    ///
    /// # 返回
    /// - Ok(Some(Device)): 找到
    /// - Ok(None): 未找到
    fn find_device(&self, id: i64) -> RepositoryResult<Option<Device>>;

    /// 按唯一编码查询设备
    fn find_device_by_code(&self, code: &str) -> RepositoryResult<Option<Device>>;

    /// 插入设备（ID 由调用方提供）
    fn insert_device(&self, device: &Device) -> RepositoryResult<()>;

    /// 按 ID 更新设备全部可变字段
    ///
    /// # 返回
    /// - Err(NotFound): 记录不存在
    fn update_device(&self, device: &Device) -> RepositoryResult<()>;

    /// 按 ID 升序列出全部设备（只读展示）
    fn list_devices(&self) -> RepositoryResult<Vec<Device>>;

    // ===== DeviceContent =====

    fn find_content(&self, id: i64) -> RepositoryResult<Option<DeviceContent>>;

    fn insert_content(&self, content: &DeviceContent) -> RepositoryResult<()>;

    fn update_content(&self, content: &DeviceContent) -> RepositoryResult<()>;

    fn list_contents(&self) -> RepositoryResult<Vec<DeviceContent>>;
}
