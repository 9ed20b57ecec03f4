// Reachability checker
//
// Breadth-first proof that an agent's head can get back to its own tail.
// A body segment is an obstacle only until it has slid away: the segment at
// index i (0 = head) clears after `len - 1 - i` ticks.
//
// The same configuration shows up again and again across sibling branches of
// both planners, so results are memoized in a bounded LRU table. The cache is
// purely an optimization; `can_reach_tail` is a pure function of its inputs.

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Coord, World};

/// Ticks a body segment at `index` keeps its cell blocked
pub fn vacate_threshold(body_len: usize, index: usize) -> usize {
    body_len.saturating_sub(1 + index)
}

/// Returns true if `head` can reach `tail` through open cells
///
/// `body` is ordered head to tail. The head cell itself is consumed and never
/// revisited; a body cell is only enterable at a BFS depth strictly greater
/// than its vacate threshold.
pub fn can_reach_tail(
    head: Coord,
    tail: Coord,
    body: &[Coord],
    walls: &BTreeSet<Coord>,
    width: i32,
    height: i32,
) -> bool {
    if head == tail {
        return true;
    }

    let body_index: HashMap<Coord, usize> = body
        .iter()
        .enumerate()
        .map(|(index, &cell)| (cell, index))
        .collect();

    let mut visited = HashSet::new();
    visited.insert(head);
    let mut queue = VecDeque::new();
    queue.push_back((head, 0usize));

    while let Some((cell, depth)) = queue.pop_front() {
        if cell == tail {
            return true;
        }

        for next in cell.neighbors() {
            let next_depth = depth + 1;

            if next == tail {
                return true;
            }
            if visited.contains(&next) {
                continue;
            }
            if next.x < 0 || next.x >= width || next.y < 0 || next.y >= height {
                continue;
            }
            if walls.contains(&next) {
                continue;
            }
            if let Some(&index) = body_index.get(&next) {
                if next_depth <= vacate_threshold(body.len(), index) {
                    continue;
                }
            }

            visited.insert(next);
            queue.push_back((next, next_depth));
        }
    }

    false
}

/// Everything `can_reach_tail` depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReachabilityKey {
    pub head: Coord,
    pub tail: Coord,
    pub body: Vec<Coord>,
    pub walls: Vec<Coord>,
    pub width: i32,
    pub height: i32,
}

struct LruTable {
    entries: HashMap<ReachabilityKey, (bool, u64)>,
    recency: BTreeMap<u64, ReachabilityKey>,
    clock: u64,
}

impl LruTable {
    fn new() -> Self {
        LruTable {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    fn touch(&mut self, key: &ReachabilityKey) -> Option<bool> {
        let (value, stamp) = *self.entries.get(key)?;
        self.clock += 1;
        self.recency.remove(&stamp);
        self.recency.insert(self.clock, key.clone());
        self.entries.insert(key.clone(), (value, self.clock));
        Some(value)
    }

    fn insert(&mut self, key: ReachabilityKey, value: bool, capacity: usize) {
        if let Some(&(_, stamp)) = self.entries.get(&key) {
            self.recency.remove(&stamp);
        } else if self.entries.len() >= capacity {
            if let Some((_, oldest)) = self.recency.pop_first() {
                self.entries.remove(&oldest);
            }
        }
        self.clock += 1;
        self.recency.insert(self.clock, key.clone());
        self.entries.insert(key, (value, self.clock));
    }
}

/// Fixed-capacity, least-recently-used memo of reachability results
///
/// Safe to share between rayon workers: lookups and inserts take a short
/// lock, the search itself runs unlocked. Capacity 0 disables caching.
pub struct ReachabilityCache {
    capacity: usize,
    table: Mutex<LruTable>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReachabilityCache {
    pub fn new(capacity: usize) -> Self {
        ReachabilityCache {
            capacity,
            table: Mutex::new(LruTable::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Memoized `can_reach_tail`
    pub fn can_reach_tail(
        &self,
        head: Coord,
        tail: Coord,
        body: &[Coord],
        walls: &BTreeSet<Coord>,
        width: i32,
        height: i32,
    ) -> bool {
        if !self.is_enabled() {
            return can_reach_tail(head, tail, body, walls, width, height);
        }

        let key = ReachabilityKey {
            head,
            tail,
            body: body.to_vec(),
            walls: walls.iter().copied().collect(),
            width,
            height,
        };

        if let Some(hit) = self.table.lock().touch(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = can_reach_tail(head, tail, body, walls, width, height);
        self.table.lock().insert(key, result, self.capacity);
        result
    }

    /// Whether the world's controlled agent can reach its own tail
    pub fn agent_can_reach_tail(&self, world: &World) -> bool {
        if world.agent.is_empty() {
            return false;
        }
        self.can_reach_tail(
            world.agent.head(),
            world.agent.tail(),
            &world.agent.body,
            &world.walls,
            world.width,
            world.height,
        )
    }
}

impl Default for ReachabilityCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}
