//! YAML test modules.
//!
//! # Format
//!
//! A module is a mapping from test name to a list of steps:
//!
//! ```yaml
//! tables compare structurally:
//!   - equal: [[1, 2, 3], [1, 2, 3]]
//!   - not_equal: [{a: 1}, {a: 2}]
//!   - ok: !call {equal: [1, 1]}
//! raising is captured:
//!   - throws: !raise boom
//!   - not_throws: !fn 42
//!   - is_callable: !object {call: !fn 1}
//! uncaught errors fail the test:
//!   - !raise unexpected
//! ```
//!
//! A step is either a single `predicate: arguments` entry or `!raise payload`.
//! A sequence of arguments is spread into the call; anything else is a single
//! argument, and `~` means no arguments. To pass a list as one argument, wrap
//! it: `is_array: [[10, 20]]`.
//!
//! Sequences become positional tables and mappings associative tables.
//! Tags build the values YAML has no syntax for:
//!
//! - `!fn value`: a function returning `value`
//! - `!raise payload`: a function raising `payload`
//! - `!object {call: target, ...}`: a table delegating calls to `target`
//! - `!call {predicate: arguments}`: the raw verdict of a predicate (step arguments only)
//!
//! After its last step the test calls `done`.

use std::fs;
use std::path::Path;

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value as Yaml};

use crate::diagnostics::HarnessError;
use crate::loader::{ModuleLoader, TestModule};
use crate::predicates::PredicateRegistry;
use crate::runtime::{Context, SourceLocation};
use crate::value::{Key, Table, Value};

const MODULE_HELP: &str =
    "a test module maps each test name to a list of `predicate: [arguments]` steps";

/// Loads `.yaml`/`.yml` test modules from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlModuleLoader;

impl ModuleLoader for YamlModuleLoader {
    fn load(&self, path: &Path) -> Result<TestModule, HarnessError> {
        let source = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        parse_module(&path.display().to_string(), &source)
    }
}

// =============================================================================
// COMPILED STEPS
// =============================================================================

struct Step {
    location: SourceLocation,
    action: Action,
}

enum Action {
    Assert { predicate: String, args: Vec<Arg> },
    Raise(Value),
}

enum Arg {
    Value(Value),
    Call { predicate: String, args: Vec<Arg> },
}

impl Arg {
    fn evaluate(&self, registry: &PredicateRegistry) -> Result<Value, Value> {
        match self {
            Arg::Value(value) => Ok(value.clone()),
            Arg::Call { predicate, args } => {
                let values = evaluate_all(args, registry)?;
                registry
                    .check(predicate, &values)
                    .map(|outcome| Value::from(outcome.passed))
                    .ok_or_else(|| Value::from(format!("unknown predicate `{predicate}`")))
            }
        }
    }
}

fn evaluate_all(args: &[Arg], registry: &PredicateRegistry) -> Result<Vec<Value>, Value> {
    args.iter().map(|arg| arg.evaluate(registry)).collect()
}

fn run_steps(steps: &[Step], ctx: &Context) -> Result<(), Value> {
    for step in steps {
        match &step.action {
            Action::Assert { predicate, args } => {
                let values = evaluate_all(args, ctx.registry())?;
                ctx.check_at(step.location.clone(), predicate, &values);
            }
            Action::Raise(payload) => return Err(payload.clone()),
        }
    }
    ctx.done();
    Ok(())
}

// =============================================================================
// PARSING
// =============================================================================

/// Parses YAML `source` into a test module. `origin` names the source in
/// diagnostics and failure locations.
pub fn parse_module(origin: &str, source: &str) -> Result<TestModule, HarnessError> {
    let document: Yaml =
        serde_yaml::from_str(source).map_err(|e| HarnessError::parse(origin, source, &e))?;
    let tests = match document {
        Yaml::Null => return Ok(TestModule::new()),
        Yaml::Mapping(tests) => tests,
        other => {
            return Err(HarnessError::invalid_module(
                origin,
                format!("expected a mapping of test names, found {}", describe(&other)),
            )
            .with_help(MODULE_HELP))
        }
    };

    let mut module = TestModule::new();
    for (name, steps) in tests {
        let Yaml::String(name) = name else {
            return Err(HarnessError::invalid_module(
                origin,
                format!("test names must be strings, found {}", describe(&name)),
            ));
        };
        let steps = compile_steps(origin, &name, steps)?;
        module.insert(name, move |ctx: &Context| run_steps(&steps, ctx));
    }
    Ok(module)
}

fn compile_steps(origin: &str, name: &str, steps: Yaml) -> Result<Vec<Step>, HarnessError> {
    let items = match steps {
        Yaml::Null => Vec::new(),
        Yaml::Sequence(items) => items,
        other => {
            return Err(HarnessError::invalid_module(
                origin,
                format!("test `{name}` must be a list of steps, found {}", describe(&other)),
            )
            .with_help(MODULE_HELP))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let location = SourceLocation::new(format!("{origin}: {name} step {}", index + 1));
            compile_action(item)
                .map(|action| Step { location, action })
                .map_err(|reason| {
                    HarnessError::invalid_module(
                        origin,
                        format!("test `{name}` step {}: {reason}", index + 1),
                    )
                })
        })
        .collect()
}

fn compile_action(item: Yaml) -> Result<Action, String> {
    match item {
        Yaml::Tagged(tagged) if tagged.tag == "raise" => to_value(tagged.value).map(Action::Raise),
        Yaml::Mapping(entry) => {
            let (predicate, args) = single_entry(entry)?;
            Ok(Action::Assert { predicate, args })
        }
        other => Err(format!(
            "expected `predicate: arguments` or `!raise payload`, found {}",
            describe(&other)
        )),
    }
}

/// Splits `{predicate: arguments}` into the name and its compiled arguments.
fn single_entry(entry: Mapping) -> Result<(String, Vec<Arg>), String> {
    if entry.len() != 1 {
        return Err(format!(
            "a step names exactly one predicate, found {} entries",
            entry.len()
        ));
    }
    let Some((key, args)) = entry.into_iter().next() else {
        return Err("empty step".to_string());
    };
    let Yaml::String(predicate) = key else {
        return Err(format!("predicate names must be strings, found {}", describe(&key)));
    };
    let args = match args {
        Yaml::Null => Vec::new(),
        Yaml::Sequence(items) => items.into_iter().map(to_arg).collect::<Result<_, _>>()?,
        single => vec![to_arg(single)?],
    };
    Ok((predicate, args))
}

fn to_arg(yaml: Yaml) -> Result<Arg, String> {
    match yaml {
        Yaml::Tagged(tagged) if tagged.tag == "call" => {
            let Yaml::Mapping(entry) = tagged.value else {
                return Err("`!call` expects `{predicate: arguments}`".to_string());
            };
            let (predicate, args) = single_entry(entry)?;
            Ok(Arg::Call { predicate, args })
        }
        other => to_value(other).map(Arg::Value),
    }
}

fn to_value(yaml: Yaml) -> Result<Value, String> {
    match yaml {
        Yaml::Null => Ok(Value::Nil),
        Yaml::Bool(b) => Ok(Value::from(b)),
        Yaml::Number(n) => n
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| format!("unsupported number {n}")),
        Yaml::String(s) => Ok(Value::from(s)),
        Yaml::Sequence(items) => {
            let items = items.into_iter().map(to_value).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::from(Table::from_seq(items)))
        }
        Yaml::Mapping(map) => to_table(map).map(Value::from),
        Yaml::Tagged(tagged) => tagged_value(*tagged),
    }
}

fn to_table(map: Mapping) -> Result<Table, String> {
    let mut table = Table::new();
    for (key, value) in map {
        let key = to_value(key)?;
        let key = Key::from_value(&key)
            .ok_or_else(|| format!("{} cannot be used as a table key", key.repr()))?;
        table.insert(key, to_value(value)?);
    }
    Ok(table)
}

fn tagged_value(tagged: TaggedValue) -> Result<Value, String> {
    let TaggedValue { tag, value } = tagged;
    if tag == "fn" {
        let result = to_value(value)?;
        return Ok(Value::function(move |_| Ok(result.clone())));
    }
    if tag == "raise" {
        let payload = to_value(value)?;
        return Ok(Value::function(move |_| Err(payload.clone())));
    }
    if tag == "object" {
        let Yaml::Mapping(map) = value else {
            return Err("`!object` expects a mapping".to_string());
        };
        let mut table = to_table(map)?;
        let target = table.get(&Key::from("call"));
        table.insert(Key::from("call"), Value::Nil);
        return Ok(Value::from(if target.is_nil() {
            table
        } else {
            table.with_call(target)
        }));
    }
    if tag == "call" {
        return Err("`!call` is only allowed as a direct step argument".to_string());
    }
    Err(format!("unknown tag {tag}"))
}

fn describe(yaml: &Yaml) -> &'static str {
    match yaml {
        Yaml::Null => "null",
        Yaml::Bool(_) => "a boolean",
        Yaml::Number(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Sequence(_) => "a sequence",
        Yaml::Mapping(_) => "a mapping",
        Yaml::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tests_in_order() {
        let module = parse_module(
            "inline.yaml",
            "first:\n  - ok: true\nsecond:\n  - equal: [1, 1]\n",
        )
        .unwrap();
        assert_eq!(module.names().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn empty_document_is_an_empty_module() {
        assert!(parse_module("empty.yaml", "").unwrap().is_empty());
    }

    #[test]
    fn rejects_top_level_sequence() {
        let err = parse_module("list.yaml", "- ok: true\n").err().unwrap();
        assert!(matches!(err, HarnessError::InvalidModule { .. }));
    }

    #[test]
    fn rejects_step_with_two_predicates() {
        let err = parse_module("two.yaml", "t:\n  - {ok: true, is_nil: ~}\n")
            .err()
            .unwrap();
        assert!(err.to_string().contains("step 1"));
    }

    #[test]
    fn object_tag_attaches_call_capability() {
        let value = to_value(serde_yaml::from_str("!object {call: !fn 1, x: 2}").unwrap()).unwrap();
        let table = value.as_table().unwrap();
        assert!(table.call_target().is_some());
        assert_eq!(table.get(&Key::from("call")), Value::Nil);
        assert_eq!(value.call(&[]), Ok(Value::from(1)));
    }

    #[test]
    fn integer_keys_fill_the_sequence() {
        let value = to_value(serde_yaml::from_str("{1: a, 2: b, x: c}").unwrap()).unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.associative().count(), 1);
    }
}
