use crate::engine::{Move, Score};
use crate::logic::board::{Board, Color};
use crate::logic::game::{CastlingRights, GameState};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Everything a cached evaluation or move list depends on.
/// Position history is left out: repetition is decided by the search, not cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub board: Board,
    pub side: Color,
    pub half_moves: u32,
    pub full_moves: u32,
    pub castling: CastlingRights,
    pub last_move: Option<Move>,
}

impl CacheKey {
    pub fn new(board: &Board, side: Color, state: &GameState) -> Self {
        Self {
            board: *board,
            side,
            half_moves: state.half_moves,
            full_moves: state.full_moves,
            castling: state.castling,
            last_move: state.last_move,
        }
    }
}

/// Bounded map that evicts the oldest inserted key first.
pub struct FifoCache<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> FifoCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evaluations: usize,
    pub move_lists: usize,
}

/// Evaluation and legal-move caches owned by one engine.
pub struct SearchCache {
    evaluations: FifoCache<CacheKey, Score>,
    moves: FifoCache<CacheKey, Vec<Move>>,
    hits: u64,
    misses: u64,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            evaluations: FifoCache::new(capacity),
            moves: FifoCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn evaluation(&mut self, key: &CacheKey) -> Option<Score> {
        let found = self.evaluations.get(key).copied();
        self.count(found.is_some());
        found
    }

    pub fn store_evaluation(&mut self, key: CacheKey, score: Score) {
        self.evaluations.insert(key, score);
    }

    pub fn moves(&mut self, key: &CacheKey) -> Option<Vec<Move>> {
        let found = self.moves.get(key).cloned();
        self.count(found.is_some());
        found
    }

    pub fn store_moves(&mut self, key: CacheKey, moves: Vec<Move>) {
        self.moves.insert(key, moves);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evaluations: self.evaluations.len(),
            move_lists: self.moves.len(),
        }
    }

    pub fn clear(&mut self) {
        self.evaluations.clear();
        self.moves.clear();
        self.hits = 0;
        self.misses = 0;
    }

    fn count(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}
