// Move legality and world advancement
//
// One rule set serves every agent: the planners use `is_legal` as a predicate
// before committing anything, and `advance` is the only way a simulated world
// moves forward a tick.

use crate::policy::OpponentPolicy;
use crate::types::{Agent, Coord, Move, World};

/// Which agent of a world is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Primary,
    Opponent(usize),
}

fn agent_of(world: &World, mover: Mover) -> &Agent {
    match mover {
        Mover::Primary => &world.agent,
        Mover::Opponent(idx) => &world.opponents[idx],
    }
}

/// Returns the cell `mover` would enter with `mv`, or None if the move is illegal
///
/// A move is illegal when the next head:
/// - is outside the board or on a wall
/// - is inside the mover's own body, except its current tail
/// - is anywhere in the primary agent's body (opponent movers only)
/// - is inside any other live opponent's body
pub fn legal_target(world: &World, mover: Mover, mv: Move) -> Option<Coord> {
    let agent = agent_of(world, mover);
    if agent.is_empty() {
        return None;
    }

    let next = agent.next_head(mv);

    if world.walls.contains(&next) || !world.in_bounds(&next) {
        return None;
    }

    if next != agent.tail() && agent.body.contains(&next) {
        return None;
    }

    if mover != Mover::Primary && world.agent.body.contains(&next) {
        return None;
    }

    let blocked_by_opponent = world
        .opponents
        .iter()
        .enumerate()
        .filter(|(idx, o)| o.alive && mover != Mover::Opponent(*idx))
        .any(|(_, o)| o.body.contains(&next));
    if blocked_by_opponent {
        return None;
    }

    Some(next)
}

pub fn is_legal(world: &World, mover: Mover, mv: Move) -> bool {
    legal_target(world, mover, mv).is_some()
}

/// Moves that `mover` can legally make, in `Move::all()` order
pub fn legal_moves(world: &World, mover: Mover) -> Vec<Move> {
    Move::all()
        .iter()
        .copied()
        .filter(|&mv| is_legal(world, mover, mv))
        .collect()
}

/// Applies a move to one agent, returning whether it survived
///
/// Eating removes the food cell, grows the agent and bumps its score (and the
/// world score for the primary agent). An opponent that cannot move dies and
/// its body turns into food; a failed primary move leaves the world untouched.
pub fn apply_move(world: &mut World, mover: Mover, mv: Move) -> bool {
    let next = match legal_target(world, mover, mv) {
        Some(next) => next,
        None => {
            if let Mover::Opponent(idx) = mover {
                let opponent = &mut world.opponents[idx];
                opponent.alive = false;
                let remains = opponent.body.clone();
                world.food.extend(remains);
            }
            return false;
        }
    };

    let will_eat = world.food.remove(&next);

    let agent = match mover {
        Mover::Primary => &mut world.agent,
        Mover::Opponent(idx) => &mut world.opponents[idx],
    };
    agent.advance(mv, will_eat);

    if will_eat {
        agent.score += 1;
        if mover == Mover::Primary {
            world.score += 1;
        }
    }

    true
}

/// The world as opponent `idx` perceives it: itself as the primary agent and
/// the real primary agent first among its opponents
pub fn opponent_view(world: &World, idx: usize) -> World {
    let me = &world.opponents[idx];

    let mut opponents = Vec::with_capacity(world.opponents.len());
    opponents.push(world.agent.clone());
    opponents.extend(
        world
            .opponents
            .iter()
            .enumerate()
            .filter(|(other, o)| *other != idx && o.alive)
            .map(|(_, o)| o.clone()),
    );

    World {
        width: world.width,
        height: world.height,
        walls: world.walls.clone(),
        food: world.food.clone(),
        agent: me.clone(),
        opponents,
        score: me.score,
    }
}

/// Advances a simulated world by one tick
///
/// The primary agent moves first; if that fails the tick is abandoned and
/// false is returned. Otherwise every live opponent, in order, is asked for a
/// move through `policy` against its own view and moved in this world.
pub fn advance(world: &mut World, mv: Move, policy: &dyn OpponentPolicy) -> bool {
    world.agent.alive = apply_move(world, Mover::Primary, mv);
    if !world.agent.alive {
        return false;
    }

    for idx in 0..world.opponents.len() {
        if !world.opponents[idx].alive {
            continue;
        }
        let choice = policy.choose(&opponent_view(world, idx));
        apply_move(world, Mover::Opponent(idx), choice);
    }

    true
}
