// Distance oracle
//
// Shortest arrival time from the controlled agent's head to a set of target
// cells. Body segments are not treated as permanent walls: each occupied cell
// carries the earliest tick at which the head could be standing on it, so
// paths that wait for a tail to slide away are still found.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use crate::types::{Coord, Move, World};

/// Calculates Manhattan distance between two coordinates
pub fn manhattan_distance(a: Coord, b: Coord) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Earliest tick at which each occupied cell may be entered
///
/// For the agent's own body the head-to-tail clearance is its length rounded
/// up to even, minus the segment index. Opponent bodies use length + 1, bumped
/// by one when its parity disagrees with the Manhattan distance between the two
/// heads, since a head can only stand on cells of matching parity at any tick.
pub fn vacate_times(world: &World) -> HashMap<Coord, i32> {
    let mut times = HashMap::new();
    let head = world.agent.head();

    let mut own_clearance = world.agent.len() as i32;
    if own_clearance % 2 != 0 {
        own_clearance += 1;
    }
    for (index, &cell) in world.agent.body.iter().enumerate() {
        times.insert(cell, own_clearance - index as i32);
    }

    for opponent in world.live_opponents() {
        if opponent.is_empty() {
            continue;
        }
        let mut clearance = opponent.len() as i32 + 1;
        if clearance % 2 != manhattan_distance(head, opponent.head()) % 2 {
            clearance += 1;
        }
        for (index, &cell) in opponent.body.iter().enumerate() {
            times.insert(cell, clearance - index as i32);
        }
    }

    times
}

/// Minimum ticks for the agent's head to reach any of `targets`, or None
///
/// The first step is restricted to the three relative moves; later steps may
/// go in any direction. The frontier pops the smallest distance first, and
/// equal distances in the order they were discovered.
pub fn distance_to_nearest(world: &World, targets: &BTreeSet<Coord>) -> Option<u32> {
    if targets.is_empty() || world.agent.is_empty() {
        return None;
    }

    let times = vacate_times(world);
    let head = world.agent.head();

    let mut frontier = BinaryHeap::new();
    let mut seq: u64 = 0;
    let mut push = |frontier: &mut BinaryHeap<Reverse<(i32, u64, Coord)>>, cell: Coord, d: i32| {
        frontier.push(Reverse((d, seq, cell)));
        seq += 1;
    };

    let mut visited = HashSet::new();
    visited.insert(head);
    push(&mut frontier, head, times.get(&head).copied().unwrap_or(0));

    for mv in Move::all() {
        let next = world.agent.next_head(mv);
        if !world.in_bounds(&next) || world.walls.contains(&next) {
            continue;
        }
        let d = times.get(&next).copied().unwrap_or(1);
        push(&mut frontier, next, d);
        visited.insert(next);
    }

    while let Some(Reverse((distance, _, cell))) = frontier.pop() {
        if targets.contains(&cell) {
            return Some(distance.max(0) as u32);
        }

        for next in cell.neighbors() {
            if !world.in_bounds(&next) || world.walls.contains(&next) || visited.contains(&next) {
                continue;
            }

            let mut d = distance + 1;
            if let Some(&earliest) = times.get(&next) {
                d = d.max(earliest);
            }

            push(&mut frontier, next, d);
            visited.insert(next);
        }
    }

    None
}

/// Distance from the agent's head to the closest food, if any is reachable
pub fn distance_to_nearest_food(world: &World) -> Option<u32> {
    distance_to_nearest(world, &world.food)
}

/// Manhattan distance from `from` to the closest live opponent head
pub fn closest_opponent_distance(world: &World, from: Coord) -> Option<i32> {
    world
        .live_opponents()
        .filter(|o| !o.is_empty())
        .map(|o| manhattan_distance(from, o.head()))
        .min()
}
