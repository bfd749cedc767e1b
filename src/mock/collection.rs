use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::engine::LocalStorage;
use crate::model::{Collection, Singleton};
use crate::{CollectionBackend, Error, Result, SingletonBackend};

async fn simulate_round_trip(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// An in-memory collection persisted to [`LocalStorage`] on every mutation.
///
/// The array is loaded lazily: from the stored snapshot when one exists,
/// otherwise from [`Collection::seed`]. Mutations run on a copy, which is
/// written through to storage and only then committed, so a failed write
/// leaves both memory and storage as they were.
pub struct MockCollection<E: Collection> {
    storage: Arc<LocalStorage>,
    latency: Duration,
    items: Mutex<Option<Vec<E>>>,
}

impl<E: Collection> MockCollection<E> {
    pub fn new(storage: Arc<LocalStorage>, latency: Duration) -> Self {
        Self {
            storage,
            latency,
            items: Mutex::new(None),
        }
    }

    fn load(&self) -> Vec<E> {
        match self.storage.get_item(E::STORAGE_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable {} snapshot: {}", E::NAME, e);
                E::seed()
            }),
            None => E::seed(),
        }
    }

    fn snapshot(&self) -> Vec<E> {
        let mut guard = lock(&self.items);
        guard.get_or_insert_with(|| self.load()).clone()
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<E>) -> Result<R>) -> Result<R> {
        let mut guard = lock(&self.items);
        let current = guard.get_or_insert_with(|| self.load());
        let mut next = current.clone();
        let out = f(&mut next)?;
        self.storage.set_item(E::STORAGE_KEY, &serde_json::to_string(&next)?)?;
        *current = next;
        Ok(out)
    }

    /// Drops the cached array and the stored snapshot; the next access reseeds.
    pub fn reset(&self) {
        *lock(&self.items) = None;
        self.storage.remove_item(E::STORAGE_KEY);
    }

    /// `max(id) + 1`; ids freed by deletes are never reused while a higher id exists.
    fn next_id(items: &[E]) -> u64 {
        items.iter().map(|e| e.id()).max().unwrap_or(0) + 1
    }
}

#[async_trait]
impl<E: Collection> CollectionBackend<E> for MockCollection<E> {
    async fn list(&self) -> Result<Vec<E>> {
        simulate_round_trip(self.latency).await;
        Ok(self.snapshot())
    }

    async fn get(&self, id: u64) -> Result<E> {
        simulate_round_trip(self.latency).await;
        self.snapshot()
            .into_iter()
            .find(|e| e.id() == id)
            .ok_or_else(|| Error::not_found(E::NAME, id))
    }

    async fn create(&self, draft: E::Draft) -> Result<E> {
        simulate_round_trip(self.latency).await;
        self.mutate(|items| {
            let entity = E::from_draft(Self::next_id(items), draft);
            items.push(entity.clone());
            Ok(entity)
        })
    }

    async fn update(&self, id: u64, patch: E::Patch) -> Result<E> {
        simulate_round_trip(self.latency).await;
        self.mutate(|items| {
            let entity = items
                .iter_mut()
                .find(|e| e.id() == id)
                .ok_or_else(|| Error::not_found(E::NAME, id))?;
            entity.apply(patch);
            Ok(entity.clone())
        })
    }

    async fn delete(&self, id: u64) -> Result<()> {
        simulate_round_trip(self.latency).await;
        self.mutate(|items| {
            let pos = items
                .iter()
                .position(|e| e.id() == id)
                .ok_or_else(|| Error::not_found(E::NAME, id))?;
            items.remove(pos);
            Ok(())
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<E>> {
        simulate_round_trip(self.latency).await;
        let needle = query.trim().to_lowercase();
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|e| needle.is_empty() || e.matches_query(&needle))
            .collect())
    }

    async fn filter(&self, filter: E::Filter) -> Result<Vec<E>> {
        simulate_round_trip(self.latency).await;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|e| e.matches_filter(&filter))
            .collect())
    }
}

/// A single persisted document with the same latency and write-through rules.
pub struct MockSingleton<D: Singleton> {
    storage: Arc<LocalStorage>,
    latency: Duration,
    doc: Mutex<Option<D>>,
}

impl<D: Singleton> MockSingleton<D> {
    pub fn new(storage: Arc<LocalStorage>, latency: Duration) -> Self {
        Self {
            storage,
            latency,
            doc: Mutex::new(None),
        }
    }

    fn load(&self) -> D {
        match self.storage.get_item(D::STORAGE_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable {} snapshot: {}", D::NAME, e);
                D::seed()
            }),
            None => D::seed(),
        }
    }

    pub fn reset(&self) {
        *lock(&self.doc) = None;
        self.storage.remove_item(D::STORAGE_KEY);
    }
}

#[async_trait]
impl<D: Singleton> SingletonBackend<D> for MockSingleton<D> {
    async fn fetch(&self) -> Result<D> {
        simulate_round_trip(self.latency).await;
        let mut guard = lock(&self.doc);
        Ok(guard.get_or_insert_with(|| self.load()).clone())
    }

    async fn update(&self, patch: D::Patch) -> Result<D> {
        simulate_round_trip(self.latency).await;
        let mut guard = lock(&self.doc);
        let mut next = guard.get_or_insert_with(|| self.load()).clone();
        next.apply(patch);
        self.storage.set_item(D::STORAGE_KEY, &serde_json::to_string(&next)?)?;
        *guard = Some(next.clone());
        Ok(next)
    }
}
