use crate::commands::inspect::print_tree;
use crate::commands::{extract_code, link_for};
use crate::config::Config;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{EditorSession, Mutation};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Mutation fields that name a component and may use an `@alias`
const ID_FIELDS: [&str; 3] = ["id", "parent_id", "new_parent_id"];

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON script: an array of mutations, "undo" and "redo"
    pub script: PathBuf,

    /// Start from this share link instead of an empty page
    #[arg(long)]
    pub from: Option<String>,

    /// Stop at the first step that fails
    #[arg(long)]
    pub strict: bool,
}

/// One parsed script step
#[derive(Debug, PartialEq)]
enum Step {
    Undo,
    Redo,
    Apply {
        mutation: Mutation,
        alias: Option<String>,
    },
}

pub fn replay(args: ReplayArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;

    let content = fs::read_to_string(&args.script)
        .with_context(|| format!("Cannot read {}", args.script.display()))?;
    let steps: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array", args.script.display()))?;

    let mut session = match &args.from {
        Some(link) => EditorSession::open_link("cli", &extract_code(link), config.editor.clone())?,
        None => EditorSession::new("cli", config.editor.clone()),
    };

    let mut aliases = HashMap::new();
    let mut failed = 0;

    for (index, raw) in steps.into_iter().enumerate() {
        let result = parse_step(raw, &aliases).and_then(|step| run_step(&mut session, step, &mut aliases));
        match result {
            Ok(summary) => println!("  {} {:>3} {}", "✓".green(), index + 1, summary),
            Err(err) if args.strict => return Err(err.context(format!("Step {} failed", index + 1))),
            Err(err) => {
                failed += 1;
                println!("  {} {:>3} {:#}", "✗".red(), index + 1, err);
            }
        }
    }

    println!();
    print_tree(session.document(), false);
    println!();

    let history = session.history();
    println!(
        "   Undo levels: {}  Redo levels: {}  Revision: {}",
        history.undo_levels(),
        history.redo_levels(),
        session.revision()
    );
    if failed > 0 {
        println!("   {} {}", "Failed steps:".yellow(), failed);
    }

    let code = session.share_link()?;
    match config.base_url {
        Some(base_url) => println!("{}", link_for(&base_url, &code)),
        None => println!("{}", code),
    }

    Ok(())
}

fn run_step(
    session: &mut EditorSession,
    step: Step,
    aliases: &mut HashMap<String, String>,
) -> Result<String> {
    match step {
        Step::Undo => {
            let label = session.history().undo_label();
            if !session.undo() {
                bail!("Nothing to undo");
            }
            Ok(format!("undo {}", label.unwrap_or_default()))
        }
        Step::Redo => {
            let label = session.history().redo_label();
            if !session.redo() {
                bail!("Nothing to redo");
            }
            Ok(format!("redo {}", label.unwrap_or_default()))
        }
        Step::Apply { mutation, alias } => {
            let name = mutation.name();
            let outcome = session.apply(mutation)?;
            match (outcome.created, alias) {
                (Some(id), Some(alias)) => {
                    let summary = format!("{name} {id} as @{alias}");
                    aliases.insert(alias, id);
                    Ok(summary)
                }
                (Some(id), None) => Ok(format!("{name} {id}")),
                (None, _) if !outcome.recorded => Ok(format!("{name} (no change)")),
                (None, _) => Ok(name.to_string()),
            }
        }
    }
}

/// Parse `"undo"`, `"redo"` or a mutation object with an optional `"as"`
/// alias for the component it creates
fn parse_step(raw: Value, aliases: &HashMap<String, String>) -> Result<Step> {
    match raw {
        Value::String(command) => match command.as_str() {
            "undo" => Ok(Step::Undo),
            "redo" => Ok(Step::Redo),
            other => bail!("Unknown command {other:?}"),
        },
        Value::Object(mut object) => {
            let alias = match object.remove("as") {
                Some(Value::String(alias)) => Some(alias),
                Some(other) => bail!("Alias must be a string, got {other}"),
                None => None,
            };

            for body in object.values_mut() {
                if let Value::Object(fields) = body {
                    for field in ID_FIELDS {
                        if let Some(value) = fields.get_mut(field) {
                            resolve_alias(value, aliases)?;
                        }
                    }
                }
            }

            let mutation = serde_json::from_value(Value::Object(object))?;
            Ok(Step::Apply { mutation, alias })
        }
        other => bail!("Unsupported step {other}"),
    }
}

fn resolve_alias(value: &mut Value, aliases: &HashMap<String, String>) -> Result<()> {
    if let Value::String(text) = value {
        if let Some(alias) = text.strip_prefix('@') {
            match aliases.get(alias) {
                Some(id) => *text = id.clone(),
                None => bail!("Unknown alias @{alias}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_editor::EditorConfig;
    use serde_json::json;

    fn run_script(script: Value) -> (EditorSession, Vec<Result<String>>) {
        let mut session = EditorSession::new("test", EditorConfig::default());
        let mut aliases = HashMap::new();
        let Value::Array(steps) = script else {
            panic!("script must be an array");
        };

        let results = steps
            .into_iter()
            .map(|raw| parse_step(raw, &aliases).and_then(|step| run_step(&mut session, step, &mut aliases)))
            .collect();
        (session, results)
    }

    #[test]
    fn test_parse_history_commands() {
        let aliases = HashMap::new();
        assert_eq!(parse_step(json!("undo"), &aliases).unwrap(), Step::Undo);
        assert_eq!(parse_step(json!("redo"), &aliases).unwrap(), Step::Redo);
        assert!(parse_step(json!("rewind"), &aliases).is_err());
        assert!(parse_step(json!(42), &aliases).is_err());
    }

    #[test]
    fn test_aliases_resolve_to_created_ids() {
        let (session, results) = run_script(json!([
            { "as": "hero", "AddComponent": { "component_type": "hero" } },
            { "AddComponent": { "component_type": "button", "parent_id": "@hero" } },
        ]));

        assert!(results.iter().all(Result::is_ok));
        let roots = session.document().roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(session.document().children(Some(&roots[0].id)).len(), 1);
    }

    #[test]
    fn test_unknown_alias_fails_step() {
        let (session, results) = run_script(json!([
            { "RemoveComponent": { "id": "@missing" } },
        ]));

        assert!(results[0].is_err());
        assert!(session.document().is_empty());
    }

    #[test]
    fn test_undo_redo_steps() {
        let (session, results) = run_script(json!([
            { "AddComponent": { "component_type": "text" } },
            { "AddComponent": { "component_type": "text" } },
            "undo",
            "undo",
            "undo",
            "redo",
        ]));

        assert!(results[2].is_ok());
        assert!(results[4].is_err());
        assert_eq!(session.document().len(), 1);
        assert!(session.can_redo());
    }

    #[test]
    fn test_failed_mutation_does_not_stop_script() {
        let (session, results) = run_script(json!([
            { "as": "a", "AddComponent": { "component_type": "box" } },
            { "as": "b", "AddComponent": { "component_type": "box", "parent_id": "@a" } },
            { "MoveComponent": { "id": "@a", "new_parent_id": "@b" } },
            { "AddComponent": { "component_type": "box" } },
        ]));

        assert!(results[2].is_err());
        assert!(results[3].is_ok());
        assert_eq!(session.document().len(), 3);
    }
}
