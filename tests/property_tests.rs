//! Randomized property checks over seeded boards
//!
//! Every board is generated from a fixed seed, so failures are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::Arc;

use tail_safe_snake::beam::BeamPlanner;
use tail_safe_snake::config::{BeamConfig, Config};
use tail_safe_snake::lookahead::{Decision, LookaheadPlanner};
use tail_safe_snake::planner::Planner;
use tail_safe_snake::policy::{GreedyFoodPolicy, SeededRandomPolicy};
use tail_safe_snake::reachability::{can_reach_tail, vacate_threshold, ReachabilityCache};
use tail_safe_snake::simulation::{legal_moves, Mover};
use tail_safe_snake::types::{Agent, Coord, Direction, World};

const SEEDS: u64 = 40;

fn random_free_cell(rng: &mut StdRng, width: i32, height: i32, taken: &BTreeSet<Coord>) -> Option<Coord> {
    for _ in 0..50 {
        let cell = Coord::new(rng.random_range(0..width), rng.random_range(0..height));
        if !taken.contains(&cell) {
            return Some(cell);
        }
    }
    None
}

/// Random self-avoiding walk; the last step becomes the head
fn random_agent(rng: &mut StdRng, width: i32, height: i32, len: usize, taken: &BTreeSet<Coord>) -> Option<Agent> {
    let start = random_free_cell(rng, width, height, taken)?;
    let mut cells = vec![start];

    while cells.len() < len {
        let last = cells[cells.len() - 1];
        let options: Vec<Coord> = last
            .neighbors()
            .iter()
            .copied()
            .filter(|c| c.x >= 0 && c.x < width && c.y >= 0 && c.y < height)
            .filter(|c| !taken.contains(c) && !cells.contains(c))
            .collect();
        if options.is_empty() {
            break;
        }
        cells.push(options[rng.random_range(0..options.len())]);
    }

    cells.reverse();
    let direction = if cells.len() >= 2 {
        Direction::all()
            .iter()
            .copied()
            .find(|d| d.apply(&cells[1]) == cells[0])
            .unwrap_or(Direction::Up)
    } else {
        Direction::all()[rng.random_range(0..4)]
    };

    Some(Agent::new(cells, direction))
}

fn random_world(seed: u64) -> World {
    let mut rng = StdRng::seed_from_u64(seed);
    let width = rng.random_range(5..10);
    let height = rng.random_range(5..10);

    let mut taken = BTreeSet::new();
    let len = rng.random_range(1..7);
    let agent = random_agent(&mut rng, width, height, len, &taken)
        .unwrap_or_else(|| Agent::new(vec![Coord::new(0, 0)], Direction::Up));
    taken.extend(agent.body.iter().copied());

    let mut world = World::new(width, height, agent);

    for _ in 0..rng.random_range(0..3) {
        let len = rng.random_range(1..5);
        if let Some(opponent) = random_agent(&mut rng, width, height, len, &taken) {
            taken.extend(opponent.body.iter().copied());
            world.opponents.push(opponent);
        }
    }

    for _ in 0..(width * height / 10) {
        if let Some(cell) = random_free_cell(&mut rng, width, height, &taken) {
            taken.insert(cell);
            world.walls.insert(cell);
        }
    }

    for _ in 0..rng.random_range(0..4) {
        if let Some(cell) = random_free_cell(&mut rng, width, height, &taken) {
            taken.insert(cell);
            world.food.insert(cell);
        }
    }

    world
}

fn lookahead(cache: Arc<ReachabilityCache>) -> LookaheadPlanner {
    LookaheadPlanner::new(
        Config::default_hardcoded().lookahead,
        Box::new(GreedyFoodPolicy),
        cache,
    )
}

fn beam_settings(beam_width: usize, max_depth: usize) -> BeamConfig {
    let mut settings = Config::default_hardcoded().beam;
    settings.beam_width = beam_width;
    settings.max_depth = max_depth;
    settings
}

fn beam(settings: BeamConfig, cache: Arc<ReachabilityCache>) -> BeamPlanner {
    BeamPlanner::new(settings, cache)
}

#[test]
fn test_head_on_tail_is_reachable_for_any_walls() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..200 {
        let width = rng.random_range(1..8);
        let height = rng.random_range(1..8);
        let cell = Coord::new(rng.random_range(0..width), rng.random_range(0..height));
        let walls: BTreeSet<Coord> = (0..rng.random_range(0..20))
            .map(|_| Coord::new(rng.random_range(-1..width + 1), rng.random_range(-1..height + 1)))
            .chain(std::iter::once(cell))
            .collect();
        assert!(can_reach_tail(cell, cell, &[cell], &walls, width, height));
    }
}

#[test]
fn test_vacate_thresholds_drop_by_one_when_tail_removed() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..200 {
        let len = rng.random_range(2..40);
        let index = rng.random_range(0..len - 1);
        assert_eq!(vacate_threshold(len, index), len - 1 - index);
        assert_eq!(vacate_threshold(len - 1, index) + 1, vacate_threshold(len, index));
    }
}

/// 4x2 board, wall at (2,1). The only way to the tail runs through the neck
/// at (1,0), which the head can first reach at depth 3.
#[test]
fn test_body_cell_passable_only_after_threshold() {
    let walls: BTreeSet<Coord> = [Coord::new(2, 1)].iter().copied().collect();

    // Length 5: the neck's threshold is 3, so depth 3 is still too early
    let long = vec![
        Coord::new(0, 0),
        Coord::new(1, 0),
        Coord::new(2, 0),
        Coord::new(3, 0),
        Coord::new(3, 1),
    ];
    assert!(!can_reach_tail(long[0], long[4], &long, &walls, 4, 2));

    // Drop the tail: every threshold shrinks by one and depth 3 now clears the neck
    let short = &long[..4];
    assert!(can_reach_tail(short[0], short[3], short, &walls, 4, 2));
}

#[test]
fn test_planners_only_return_legal_moves() {
    for seed in 0..SEEDS {
        let world = random_world(seed);
        let legal = legal_moves(&world, Mover::Primary);

        let outcome = lookahead(Arc::new(ReachabilityCache::default())).plan_detailed(&world);
        if legal.is_empty() {
            assert_eq!(outcome.decision, Decision::Default, "seed {}", seed);
        } else {
            assert!(legal.contains(&outcome.chosen), "seed {}: lookahead chose illegal move", seed);
        }

        let chosen = beam(beam_settings(6, 8), Arc::new(ReachabilityCache::default())).plan(&world);
        match chosen {
            Some(mv) => assert!(legal.contains(&mv), "seed {}: beam chose illegal move", seed),
            None => assert!(legal.is_empty(), "seed {}: beam gave up with legal moves", seed),
        }
    }
}

#[test]
fn test_identical_snapshots_give_identical_moves() {
    for seed in 0..SEEDS {
        let a = random_world(seed);
        let b = random_world(seed);
        assert_eq!(a, b);

        let first = lookahead(Arc::new(ReachabilityCache::default())).plan_detailed(&a);
        let second = lookahead(Arc::new(ReachabilityCache::default())).plan_detailed(&b);
        assert_eq!(first, second, "seed {}", seed);

        let first = beam(beam_settings(6, 8), Arc::new(ReachabilityCache::default())).search(&a);
        let second = beam(beam_settings(6, 8), Arc::new(ReachabilityCache::default())).search(&b);
        assert_eq!(first, second, "seed {}", seed);
    }
}

#[test]
fn test_seeded_random_opponents_are_reproducible() {
    let cache = Arc::new(ReachabilityCache::default());
    for seed in 0..SEEDS {
        let world = random_world(seed);
        let run = || {
            LookaheadPlanner::new(
                Config::default_hardcoded().lookahead,
                Box::new(SeededRandomPolicy::new(99)),
                cache.clone(),
            )
            .plan_detailed(&world)
        };
        assert_eq!(run(), run(), "seed {}", seed);
    }
}

#[test]
fn test_reachability_cache_never_changes_results() {
    let shared = Arc::new(ReachabilityCache::new(10_000));
    let tiny = Arc::new(ReachabilityCache::new(3));

    for seed in 0..SEEDS {
        let world = random_world(seed);

        let uncached = lookahead(Arc::new(ReachabilityCache::disabled())).plan_detailed(&world);
        assert_eq!(uncached, lookahead(shared.clone()).plan_detailed(&world), "seed {}", seed);
        assert_eq!(uncached, lookahead(tiny.clone()).plan_detailed(&world), "seed {}", seed);

        let uncached = beam(beam_settings(6, 10), Arc::new(ReachabilityCache::disabled())).search(&world);
        assert_eq!(uncached, beam(beam_settings(6, 10), shared.clone()).search(&world), "seed {}", seed);
        assert_eq!(uncached, beam(beam_settings(6, 10), tiny.clone()).search(&world), "seed {}", seed);
    }

    // Second pass over the same boards is served from the shared cache
    let hits_before = shared.hits();
    for seed in 0..SEEDS {
        let world = random_world(seed);
        let uncached = beam(beam_settings(6, 10), Arc::new(ReachabilityCache::disabled())).search(&world);
        assert_eq!(uncached, beam(beam_settings(6, 10), shared.clone()).search(&world), "seed {}", seed);
    }
    assert!(shared.hits() > hits_before);
    assert!(tiny.len() <= 3);
}

#[test]
fn test_deeper_beam_never_scores_lower() {
    let cache = Arc::new(ReachabilityCache::default());
    for seed in 0..SEEDS {
        let world = random_world(seed);
        let mut previous: Option<f64> = None;
        for depth in 1..9 {
            let best = beam(beam_settings(4, depth), cache.clone())
                .search(&world)
                .best_seen_score;
            if let (Some(prev), Some(best)) = (previous, best) {
                assert!(best >= prev, "seed {}: depth {} scored {} < {}", seed, depth, best, prev);
            }
            if previous.is_some() {
                assert!(best.is_some(), "seed {}: deeper search lost its candidates", seed);
            }
            previous = best;
        }
    }
}

#[test]
fn test_exhaustive_beam_bounds_narrow_beams() {
    let cache = Arc::new(ReachabilityCache::default());
    for seed in 0..SEEDS {
        let world = random_world(seed);
        // 3^3 = 27 keeps every sequence up to depth 3
        let exhaustive = beam(beam_settings(27, 3), cache.clone()).search(&world).best_seen_score;
        for width in 1..7 {
            let narrow = beam(beam_settings(width, 3), cache.clone()).search(&world).best_seen_score;
            match (narrow, exhaustive) {
                (Some(narrow), Some(exhaustive)) => assert!(
                    exhaustive >= narrow,
                    "seed {}: width {} scored {} above exhaustive {}",
                    seed,
                    width,
                    narrow,
                    exhaustive
                ),
                (None, _) => {}
                (Some(_), None) => panic!("seed {}: exhaustive search found nothing", seed),
            }
        }
    }
}
