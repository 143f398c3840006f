//! JSON 文件存储 - 基础设施层
//!
//! 每个实体集合对应一个文件，文件内容是带唯一 `id` 的记录组成的 JSON 数组。
//! 读取时容忍文件不存在：按空集合处理并惰性创建文件。
//! 没有持久性保证，单进程单线程使用。

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppError, Result, StorageError};

/// 可存储的记录
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// 记录的唯一标识
    fn id(&self) -> &str;
}

/// 单个集合的 JSON 文件存储
pub struct JsonStore<T> {
    collection: String,
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Record> JsonStore<T> {
    /// 打开集合存储（目录不存在时创建）
    pub fn open(dir: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::storage_write_failed(dir.display().to_string(), e))?;

        Ok(Self {
            collection: collection.to_string(),
            path: dir.join(format!("{}.json", collection)),
            _marker: PhantomData,
        })
    }

    /// 读取整个集合
    ///
    /// 文件不存在时写入空数组并返回空集合。
    async fn read_all(&self) -> Result<Vec<T>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("集合文件不存在，惰性创建: {}", self.path.display());
                self.write_all(&[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::storage_read_failed(
                    self.path.display().to_string(),
                    e,
                ));
            }
        };

        serde_json::from_str(&data).map_err(|e| {
            AppError::Storage(StorageError::ParseFailed {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })
        })
    }

    /// 写回整个集合
    async fn write_all(&self, items: &[T]) -> Result<()> {
        let data = serde_json::to_string_pretty(items).map_err(|e| {
            AppError::Storage(StorageError::ParseFailed {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })
        })?;

        tokio::fs::write(&self.path, data)
            .await
            .map_err(|e| AppError::storage_write_failed(self.path.display().to_string(), e))
    }

    /// 按条件查找多条记录
    pub async fn find_many(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        let items = self.read_all().await?;
        Ok(items.into_iter().filter(|item| predicate(item)).collect())
    }

    /// 按 id 查找单条记录
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        let items = self.read_all().await?;
        Ok(items.into_iter().find(|item| item.id() == id))
    }

    /// 追加一条记录
    pub async fn create(&self, item: T) -> Result<T> {
        let mut items = self.read_all().await?;
        items.push(item.clone());
        self.write_all(&items).await?;
        debug!("集合 {} 新增记录: {}", self.collection, item.id());
        Ok(item)
    }

    /// 按 id 删除一条记录
    ///
    /// # 返回
    /// 记录存在并被删除时返回 true
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let items = self.read_all().await?;
        let before = items.len();
        let remaining: Vec<T> = items.into_iter().filter(|item| item.id() != id).collect();
        if remaining.len() == before {
            return Ok(false);
        }
        self.write_all(&remaining).await?;
        debug!("集合 {} 删除记录: {}", self.collection, id);
        Ok(true)
    }

    /// 集合名称
    pub fn collection(&self) -> &str {
        &self.collection
    }
}
