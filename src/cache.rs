//! Memoization of completed runs.
//!
//! [`SimulationCache`] is owned by the caller and wraps [`run_simulation`]: results are keyed
//! by the canonical JSON form of the parameters and evicted least-recently-used first. The
//! engine itself stays stateless; two equal parameter sets map to the same key.
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;

use crate::{engine::run_simulation, params::SimulationParameters, result::SimulationResult};

/// Default number of results kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

struct CacheEntry {
    result: Arc<SimulationResult>,
    last_used: u64,
}

/// Bounded LRU cache of simulation results.
pub struct SimulationCache {
    capacity: usize,
    entries: AHashMap<String, CacheEntry>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl Default for SimulationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl SimulationCache {
    /// Cache holding at most `capacity` results (a zero capacity disables storage).
    pub fn new(capacity: usize) -> Self {
        SimulationCache {
            capacity,
            entries: AHashMap::with_capacity(capacity),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Cached result for `params`, refreshing its recency.
    pub fn get(&mut self, params: &SimulationParameters) -> Option<Arc<SimulationResult>> {
        let key = params.to_json().ok()?;
        let now = self.tick();
        self.entries.get_mut(&key).map(|entry| {
            entry.last_used = now;
            Arc::clone(&entry.result)
        })
    }

    pub fn contains(&self, params: &SimulationParameters) -> bool {
        params
            .to_json()
            .map(|key| self.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Return the cached result for `params`, running the simulation on a miss.
    ///
    /// Failed runs are cached as well: the engine is deterministic, so rerunning them
    /// would fail the same way.
    pub fn get_or_run(&mut self, params: &SimulationParameters) -> Arc<SimulationResult> {
        let key = match params.to_json() {
            Ok(key) => key,
            // not representable as a key: run uncached
            Err(_) => return Arc::new(run_simulation(params)),
        };

        let now = self.tick();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = now;
            self.hits += 1;
            return Arc::clone(&entry.result);
        }

        self.misses += 1;
        let result = Arc::new(run_simulation(params));
        self.insert(key, Arc::clone(&result), now);
        result
    }

    fn insert(&mut self, key: String, result: Arc<SimulationResult>, now: u64) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                debug!("evicting least recently used simulation result");
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                result,
                last_used: now,
            },
        );
    }
}
