//! プレビューハンドル
//!
//! ブラウザの `URL.createObjectURL` / `revokeObjectURL` に相当する。
//! ハンドルが破棄された時点で登録が解除されるので、スロットのクリア・差し替え・
//! ウィザードのリセットのどの経路でも解放漏れが起きない。

use crate::image_file::ImageFile;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    live: HashSet<u64>,
}

/// プレビューの発行元
///
/// クローンは同じ登録簿を共有する。
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// プレビューを発行
    pub fn acquire(&self, file: &ImageFile) -> PreviewHandle {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.live.insert(id);
        PreviewHandle {
            id,
            url: format!("blob:wardrobe/{}/{}", id, file.name()),
            registry: self.clone(),
        }
    }

    /// 未解放のハンドル数
    pub fn outstanding(&self) -> usize {
        self.lock().live.len()
    }

    fn release(&self, id: u64) {
        self.lock().live.remove(&id);
    }
}

/// 発行済みプレビュー。drop で解放される。
pub struct PreviewHandle {
    id: u64,
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("url", &self.url).finish()
    }
}

impl PartialEq for PreviewHandle {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}
