//! ダッシュボードのアイテム選択
//!
//! カテゴリごとに最大1つ。選択中のアイテムをもう一度選ぶと解除、
//! 同カテゴリの別アイテムを選ぶと置き換える（他カテゴリは変化しない）。

use crate::types::{ClothingCategory, SavedItem};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    items: BTreeMap<ClothingCategory, SavedItem>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 選択を切り替える
    pub fn toggle(&mut self, item: &SavedItem) {
        let category = item.category;
        if self.items.get(&category).is_some_and(|current| current.id == item.id) {
            self.items.remove(&category);
        } else {
            self.items.insert(category, item.clone());
        }
    }

    pub fn get(&self, category: ClothingCategory) -> Option<&SavedItem> {
        self.items.get(&category)
    }

    pub fn is_selected(&self, item: &SavedItem) -> bool {
        self.get(item.category).is_some_and(|current| current.id == item.id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 頭 → 上 → 下 の順
    pub fn iter(&self) -> impl Iterator<Item = &SavedItem> {
        self.items.values()
    }

    /// 保存済みリストに存在しない選択を外す（一覧の再取得後に呼ぶ）
    pub fn retain_known(&mut self, known: &[SavedItem]) {
        self.items
            .retain(|_, selected| known.iter().any(|item| item.id == selected.id));
    }
}
