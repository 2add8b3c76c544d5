use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// 单元数据来源
///
/// 检查周期只通过这个接口读取上游数据，测试中可替换为内存实现。
#[async_trait]
pub trait UnitSource: Send + Sync {
    /// 单元详情（温度、矿机、状态码等）
    async fn fetch_detail(&self, unit_id: u32) -> Result<Value, FetchError>;

    /// 单元功率
    async fn fetch_power(&self, unit_id: u32) -> Result<Value, FetchError>;
}
