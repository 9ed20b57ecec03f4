// Offline replay of JSONL decision logs
//
// Re-plans every logged world and reports whether the planner still picks the
// logged move. Planners are deterministic, so a mismatch means behavior changed.
//
//   replay <log_file> (--all | --turns 3,8 | --validate 3:left|right) [--planner beam]
//          [--config Snake.toml] [--verbose]

use std::env;
use std::process;

use tail_safe_snake::config::Config;
use tail_safe_snake::planner::PlannerKind;
use tail_safe_snake::replay::ReplayEngine;
use tail_safe_snake::types::Move;

const USAGE: &str = "\
Snake decision log replay

usage: replay <log_file> <mode> [options]

modes:
  --all                     replay every logged turn
  --turns <T1,T2,...>       replay the listed turns only
  --validate <T:M|M,...>    check that each turn logged one of the given moves

options:
  --planner <lookahead|beam>  replay with this planner instead of the logged one
  --config <path>             planner settings (default: Snake.toml)
  --verbose                   log every turn, not just the summary
  --help                      print this text

example:
  replay snake_debug.jsonl --turns 5,10 --planner beam";

enum Mode {
    All,
    Turns(Vec<i32>),
    Validate(Vec<(i32, Vec<Move>)>),
}

struct Options {
    log_file: String,
    config_path: String,
    planner: Option<PlannerKind>,
    verbose: bool,
    mode: Mode,
}

fn turn_number(raw: &str) -> Result<i32, String> {
    raw.trim()
        .parse::<i32>()
        .map_err(|e| format!("bad turn '{}': {}", raw, e))
}

fn turn_list(raw: &str) -> Result<Vec<i32>, String> {
    raw.split(',').map(turn_number).collect()
}

/// `3:left,7:left|straight` -> [(3, [Left]), (7, [Left, Straight])]
fn expectations(raw: &str) -> Result<Vec<(i32, Vec<Move>)>, String> {
    raw.split(',')
        .map(|item| {
            let (turn, moves) = item
                .split_once(':')
                .ok_or_else(|| format!("expected turn:move, got '{}'", item))?;
            let moves = moves
                .split('|')
                .map(Move::parse)
                .collect::<Result<Vec<_>, _>>()?;
            Ok((turn_number(turn)?, moves))
        })
        .collect()
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut rest = args.iter().skip(1);
    let log_file = rest
        .next()
        .ok_or_else(|| "missing log file".to_string())?
        .clone();

    let mut options = Options {
        log_file,
        config_path: "Snake.toml".to_string(),
        planner: None,
        verbose: false,
        mode: Mode::All,
    };
    let mut mode_given = false;

    while let Some(flag) = rest.next() {
        let mut value = || {
            rest.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match flag.as_str() {
            "--all" => {
                options.mode = Mode::All;
                mode_given = true;
            }
            "--turns" => {
                options.mode = Mode::Turns(turn_list(&value()?)?);
                mode_given = true;
            }
            "--validate" => {
                options.mode = Mode::Validate(expectations(&value()?)?);
                mode_given = true;
            }
            "--planner" => options.planner = Some(PlannerKind::parse(&value()?)?),
            "--config" => options.config_path = value()?,
            "--verbose" => options.verbose = true,
            other => return Err(format!("unknown option '{}'", other)),
        }
    }

    if !mode_given {
        return Err("pick one of --all, --turns or --validate".to_string());
    }
    Ok(options)
}

fn run(options: Options) -> Result<(), String> {
    let config = Config::from_file(&options.config_path).unwrap_or_else(|e| {
        eprintln!("warning: {} unusable ({}), using built-in defaults", options.config_path, e);
        Config::default_hardcoded()
    });

    let mut engine = ReplayEngine::new(config, options.verbose);
    if let Some(kind) = options.planner {
        engine = engine.with_planner(kind);
    }

    let entries = engine.load_log_file(&options.log_file)?;
    if entries.is_empty() {
        return Err(format!("{} has no entries", options.log_file));
    }
    println!("{}: {} decisions", options.log_file, entries.len());

    match options.mode {
        Mode::All => {
            let results = engine.replay_all(&entries);
            engine.print_report(&results);
        }
        Mode::Turns(turns) => {
            let results = engine.replay_turns(&entries, &turns)?;
            engine.print_report(&results);
        }
        Mode::Validate(expected) => {
            engine.validate_expected_moves(&entries, &expected)?;
            println!("✓ {} expected move(s) confirmed", expected.len());
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help") {
        println!("{}", USAGE);
        return;
    }

    let outcome = parse_args(&args).and_then(run);
    if let Err(e) = outcome {
        eprintln!("error: {}\n\n{}", e, USAGE);
        process::exit(1);
    }
}
