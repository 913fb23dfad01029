//! 응답 캐시
//!
//! 용량이 고정된 삽입 순서 캐시입니다.
//! 용량을 넘으면 가장 먼저 삽입된 키부터 버립니다.
//! 조회는 순서를 갱신하지 않으며, 기존 키를 덮어써도
//! 최초 삽입 위치가 유지됩니다.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

/// 삽입 순서 기반 고정 용량 캐시
///
/// `LruCache`를 쓰되 조회는 `peek`, 덮어쓰기는 `peek_mut`으로 처리해
/// 최근 사용 순서가 곧 삽입 순서가 되도록 유지합니다.
#[derive(Debug)]
pub struct BoundedCache<K: Hash + Eq, V> {
    capacity: usize,
    /// 용량 0이면 `None`
    entries: Option<LruCache<K, V>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// 용량을 지정하여 생성 (0이면 아무것도 저장하지 않음)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.as_ref()?.peek(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries
            .as_ref()
            .is_some_and(|entries| entries.contains(key))
    }

    /// 값 저장
    ///
    /// 새 키면 가장 최근 위치에 추가하고, 넘치면 가장 오래된 항목을 버립니다.
    pub fn insert(&mut self, key: K, value: V) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };

        if let Some(slot) = entries.peek_mut(&key) {
            *slot = value;
            return;
        }

        if entries.push(key, value).is_some() {
            tracing::debug!("Cache evicted oldest entry (capacity {})", self.capacity);
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.as_mut()?.pop(key)
    }

    /// 조건에 맞는 항목만 유지
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };

        let doomed: Vec<K> = entries
            .iter()
            .filter(|&(k, v)| !keep(k, v))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 삽입 순서대로 키 반환 (오래된 것부터)
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries
            .iter()
            .flat_map(|entries| entries.iter().rev().map(|(k, _)| k))
    }
}

// ============================================================================
// Tests
// ============================================================================
