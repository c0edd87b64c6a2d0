//! 键值存储后端抽象接口
//!
//! 网关只依赖三个原语：分页列举 key、按 key 读取、按 key 写入。

use crate::error::StoreResult;
use async_trait::async_trait;

/// 一页 key 列举结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// 本页的 key
    pub keys: Vec<String>,
    /// 下一页游标，`None` 表示已列举完毕
    pub cursor: Option<String>,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }
}

/// 键值存储后端抽象接口
///
/// 所有存储后端（Memory, SQLite, Redis）都实现此 trait。
/// 网关以 `Arc<dyn KvStore>` 持有，测试可以注入任意实现。
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 列举一页 key
    ///
    /// # Arguments
    /// * `cursor` - 上一页返回的游标，首页传 `None`
    /// * `limit` - 本页最多返回的 key 数量（后端可以少返回）
    async fn list(&self, cursor: Option<&str>, limit: usize) -> StoreResult<ListPage>;

    /// 根据 key 读取值
    ///
    /// # Returns
    /// * `Ok(Some(value))` - 找到
    /// * `Ok(None)` - key 不存在
    /// * `Err(...)` - 存储错误
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// 写入 key，已存在则覆盖
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// 后端类型名称
    fn backend_name(&self) -> &'static str;
}
