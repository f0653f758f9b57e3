//! 键值存储后端 - 本地 "localStorage" 的抽象
//!
//! - `MemoryBackend`: 进程内 HashMap，可设置字节配额（模拟 quota exceeded）
//! - `FileBackend`: 每个 key 一个 JSON 文件，写入时加文件锁并原子替换

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tracing::debug;

use super::error::StorageError;

/// 同步键值存储
pub trait KeyValueBackend: Send + Sync {
    /// 读取 key，不存在时返回 None
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// 整体覆盖写入
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// 内存后端
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    /// 单个 value 的最大字节数
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带配额的后端，超过配额的写入返回 `StorageError::Quota`
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(limit),
        }
    }

    /// 直接写入原始值（不检查配额，用于构造损坏数据）
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StorageError::Quota {
                    needed: value.len(),
                    limit,
                });
            }
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// 文件后端：`<dir>/<sanitized key>.json`
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// key 对应的文件路径（`aquadash:notif:v1` -> `aquadash_notif_v1.json`）
    ///
    /// `:` 写成 `_`，其余保留字符（包括 `_` 和 `%`）按字节转义为 `%XX`，
    /// 不同的 key 不会落到同一个文件。
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for c in key.chars() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                name.push(c);
            } else if c == ':' {
                name.push('_');
            } else {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    name.push_str(&format!("%{:02X}", byte));
                }
            }
        }
        self.dir.join(format!("{}.json", name))
    }

    fn lock_path(path: &Path) -> PathBuf {
        path.with_extension("lock")
    }

    fn open_lock(&self, path: &Path) -> Result<fs::File, StorageError> {
        fs::create_dir_all(&self.dir)?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(Self::lock_path(path))?;
        Ok(lock)
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.open_lock(&path)?;
        lock.lock_shared()?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => Some(c),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                let _ = lock.unlock();
                return Err(e.into());
            }
        };
        lock.unlock()?;
        Ok(content)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let lock = self.open_lock(&path)?;
        lock.lock_exclusive()?;

        // 先写临时文件再原子替换，避免读到写了一半的数据
        let temp_path = path.with_extension("tmp");
        let result = fs::write(&temp_path, value).and_then(|_| fs::rename(&temp_path, &path));
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }

        lock.unlock()?;
        result?;
        debug!(path = %path.display(), bytes = value.len(), "Wrote storage key");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
