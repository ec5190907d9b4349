//! Tiny worlds CLI - generate examples or explore a world interactively.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::io;
use tinyworld::logic::RuleApplications;
use tinyworld::{
    next_rel_distr_stats, parse_rel, parse_rule, Result, Story, TinyWorldConfig, TinyWorldError,
    TinyWorldTask,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut config_path = None;
    let mut repl = false;
    let mut n_examples = 1;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--repl" => repl = true,
            "--examples" => {
                n_examples = iter
                    .next()
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| TinyWorldError::Config("--examples needs a count".to_string()))?;
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            path => config_path = Some(path.to_string()),
        }
    }

    let config = match &config_path {
        Some(path) => TinyWorldConfig::from_json_file(path)?,
        None => TinyWorldConfig::default(),
    };
    let mut task = TinyWorldTask::new(config)?;

    if repl {
        println!("tinyworld - {}", task.config().name);
        println!("Type :help for commands, :quit to exit\n");
        return run_repl(task);
    }

    for example in task.examples().take(n_examples) {
        println!("{}", serde_json::to_string(&example?)?);
    }
    Ok(())
}

fn run_repl(mut task: TinyWorldTask) -> Result<()> {
    let mut rl = DefaultEditor::new().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let mut story = task.init_story().clone();

    loop {
        match rl.readline("tw> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(trimmed);

                if trimmed.starts_with(':') {
                    if !handle_command(trimmed, &mut task, &mut story) {
                        break;
                    }
                } else {
                    handle_fact(trimmed, &mut story);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Bye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Handle REPL commands (starting with :)
/// Returns false if REPL should exit
fn handle_command(cmd: &str, task: &mut TinyWorldTask, story: &mut Story) -> bool {
    let (command, rest) = cmd.split_once(char::is_whitespace).unwrap_or((cmd, ""));
    let rest = rest.trim();

    match command {
        ":quit" | ":q" | ":exit" => {
            println!("Bye!");
            return false;
        }

        ":help" | ":h" | ":?" => {
            print_help();
        }

        ":scene" | ":s" => {
            if story.scene().is_empty() {
                println!("Scene is empty");
            }
            for (i, fact) in story.scene().iter().enumerate() {
                println!("  {:>3}  {}", i, fact);
            }
        }

        ":types" | ":t" => {
            let types = story.types();
            for name in types.type_names() {
                let members: Vec<&str> = types
                    .closure(name)
                    .map(|c| c.iter().map(String::as_str).collect())
                    .unwrap_or_default();
                println!("  {} : {}", name, members.join(" "));
            }
        }

        ":relations" | ":rel" => {
            let relations = story.relations();
            for name in relations.rel_names() {
                let arg_types = relations.arg_types(name).unwrap_or_default();
                let shown: Vec<&str> = arg_types
                    .iter()
                    .map(|t| if t.is_empty() { "*" } else { t.as_str() })
                    .collect();
                println!("  {}({})", name, shown.join(", "));
            }
        }

        ":rules" => {
            for (i, rule) in task.rules().iter().enumerate() {
                println!("  {:>3}  {}", i, rule);
            }
        }

        ":rule" => match parse_rule(rest).and_then(|rule| task.add_rule(rule)) {
            Ok(()) => println!("Added rule {}", task.rules().len() - 1),
            Err(e) => eprintln!("Error: {}", e),
        },

        ":match" | ":m" => match parse_rule(rest).and_then(|rule| story.match_rule(&rule)) {
            Ok(matches) if matches.is_empty() => println!("No matches"),
            Ok(matches) => {
                for m in matches {
                    let fresh: Vec<&str> = m.fresh_vars.keys().map(String::as_str).collect();
                    println!("  {}  {}  fresh=[{}]", m.head, m.weight, fresh.join(", "));
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        },

        ":distr" | ":d" => match task.candidates(story) {
            Ok(candidates) => print_distribution(&candidates),
            Err(e) => eprintln!("Error: {}", e),
        },

        ":step" => match task.step(story) {
            Ok(Some(next)) => {
                if let Some(fact) = next.scene().last() {
                    println!("+ {}", fact);
                }
                *story = next;
            }
            Ok(None) => println!("No fact can follow"),
            Err(e) => eprintln!("Error: {}", e),
        },

        ":reset" => {
            *story = task.init_story().clone();
            println!("Story reset");
        }

        ":example" | ":e" => match task.gen_rand_example() {
            Ok(example) => {
                println!("#{}", example.id);
                println!("  input:  {}", example.input.concat());
                println!("  output: {}", example.output.concat());
            }
            Err(e) => eprintln!("Error: {}", e),
        },

        _ => {
            println!("Unknown command: {}. Type :help for commands.", command);
        }
    }

    true
}

/// Append a relation literal to the scene
fn handle_fact(input: &str, story: &mut Story) {
    match parse_rel(input).and_then(|fact| story.extend_scene(&[fact])) {
        Ok(next) => {
            *story = next;
            println!("OK ({} facts)", story.scene().len());
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn print_distribution(candidates: &RuleApplications) {
    let distr = next_rel_distr_stats(candidates);
    if distr.is_empty() {
        println!("No candidates");
        return;
    }
    let mut rows: Vec<_> = distr.iter().collect();
    rows.sort_by(|a, b| b.1.prob.total_cmp(&a.1.prob));
    for (fact, stats) in rows {
        let n_matches = candidates.get(fact).map_or(0, Vec::len);
        println!(
            "  {:>6.3}  {:>8.3}  {}  ({} matches)",
            stats.prob, stats.total_score, fact, n_matches
        );
    }
}

fn print_usage() {
    println!(
        r#"Usage:
  tinyworld [CONFIG.json] [--examples N]   Print N examples as JSON lines (default 1)
  tinyworld [CONFIG.json] --repl           Explore the world interactively

Without a config file the built-in animals world is used.
Set RUST_LOG=debug to trace matching and sampling."#
    );
}

fn print_help() {
    println!(
        r#"Commands:
  :help, :h, :?        Show this help
  :quit, :q            Exit the REPL
  :scene, :s           Show the current scene
  :types, :t           List types and the concrete types they cover
  :relations, :rel     List relation kinds and their argument types
  :rules               List rules
  :rule <rule>         Add a rule
  :match, :m <rule>    Show every match of a rule on the scene
  :distr, :d           Show the next-fact distribution
  :step                Sample and append the next fact
  :reset               Go back to the initial story
  :example, :e         Generate an example

Syntax:
  jumps _a:monkey                      Append a fact to the scene
  S(jumps ?x | is ?x:animal) += 2      Rule with additive weight
  S(jumps ?y | squishes ?x ?y) *= 0    Rule with multiplicative weight
  S(is ?x:cat | runs-away ?x, -is ?x:cat) += 1
                                       Negated condition
"#
    );
}
