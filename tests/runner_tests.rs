//! Suite runner and file sequencer behaviour, end to end.

mod common;

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use common::Fixture;
use tally::loader::StaticModuleLoader;
use tally::runtime::Failure;
use tally::{equal, ExitStatus, HarnessError, TestModule, Value};

/// Runs `module` and returns the status `on_complete` received, if any.
fn run_suite(fixture: &Fixture, module: Option<TestModule>) -> (Option<ExitStatus>, Vec<String>) {
    let slot = Rc::new(Cell::new(None));
    let completion = slot.clone();
    let pending = fixture
        .runner()
        .run(module, move |status| completion.set(Some(status)));
    (slot.get(), pending)
}

fn files(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

fn passing_module() -> TestModule {
    TestModule::new().with_test("passes", |ctx| {
        ctx.ok(true);
        ctx.done();
        Ok(())
    })
}

fn failing_module() -> TestModule {
    TestModule::new().with_test("fails", |ctx| {
        ctx.ok(false);
        ctx.done();
        Ok(())
    })
}

// =============================================================================
// SUITE RUNNER
// =============================================================================

#[test]
fn passing_test_reports_full_ratio() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("one equals one", |ctx| {
        ctx.ok(equal(&Value::from(1), &Value::from(1)));
        ctx.done();
        Ok(())
    });

    let (status, pending) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Passed));
    assert!(pending.is_empty());
    assert_eq!(
        fixture.lines(),
        ["one equals one: 1/1 within 0.000 seconds"]
    );
}

#[test]
fn failing_assertion_prints_one_error_line() {
    let fixture = Fixture::new();
    let (status, _) = run_suite(&fixture, Some(failing_module()));

    assert_eq!(status, Some(ExitStatus::Failed));
    let lines = fixture.lines();
    assert!(lines[0].starts_with("fails: 0/1 within"));
    let failures = fixture.failure_lines();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("ok: assertion failed (false)"));
    assert!(failures[0].contains("runner_tests.rs"));
}

#[test]
fn raised_error_is_recorded_and_finalizes() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("raises", |ctx| {
        ctx.ok(true);
        Err(Value::from("boom"))
    });

    let (status, pending) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Failed));
    assert!(pending.is_empty());
    assert!(fixture.lines()[0].starts_with("raises: 1/2 within"));
    assert_eq!(fixture.failure_lines(), ["  uncaught error: boom"]);
}

#[test]
fn panic_counts_as_a_raise() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("panics", |_| panic!("kaboom"));

    let (status, _) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Failed));
    assert_eq!(fixture.failure_lines(), ["  uncaught error: kaboom"]);
}

#[test]
fn absent_or_empty_module_completes_immediately() {
    let fixture = Fixture::new();
    assert_eq!(run_suite(&fixture, None).0, Some(ExitStatus::Passed));
    assert_eq!(
        run_suite(&fixture, Some(TestModule::new())).0,
        Some(ExitStatus::Passed)
    );
    assert!(fixture.output().is_empty());
}

#[test]
fn one_failing_test_fails_the_suite() {
    let fixture = Fixture::new();
    let module = TestModule::new()
        .with_test("good", |ctx| {
            ctx.equal(1, 1);
            ctx.done();
            Ok(())
        })
        .with_test("bad", |ctx| {
            ctx.equal(1, 2);
            ctx.done();
            Ok(())
        });

    let (status, _) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Failed));
    assert_eq!(fixture.lines().len(), 3);
}

#[test]
fn suite_waits_for_deferred_done() {
    let fixture = Fixture::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let log = order.clone();
    let module = TestModule::new().with_test("later", move |ctx| {
        let log = log.clone();
        log.borrow_mut().push("started");
        ctx.defer(move |ctx| {
            log.borrow_mut().push("deferred");
            ctx.ok(true);
            ctx.done();
            Ok(())
        });
        Ok(())
    });

    let (status, pending) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Passed));
    assert!(pending.is_empty());
    assert_eq!(*order.borrow(), ["started", "deferred"]);
}

#[test]
fn error_in_deferred_task_takes_abnormal_path() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("later", |ctx| {
        ctx.defer(|_| Err(Value::from("async boom")));
        Ok(())
    });

    let (status, _) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Failed));
    assert_eq!(fixture.failure_lines(), ["  uncaught error: async boom"]);
}

#[test]
fn test_that_never_finishes_is_reported_pending() {
    let fixture = Fixture::new();
    let module = TestModule::new()
        .with_test("forgetful", |ctx| {
            ctx.ok(true);
            Ok(())
        })
        .with_test("diligent", |ctx| {
            ctx.done();
            Ok(())
        });

    let (status, pending) = run_suite(&fixture, Some(module));

    assert_eq!(status, None);
    assert_eq!(pending, ["forgetful"]);
}

#[test]
fn second_done_is_ignored() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("twice", |ctx| {
        ctx.ok(true);
        ctx.done();
        ctx.done();
        Ok(())
    });

    let (status, _) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Passed));
    assert_eq!(fixture.lines(), ["twice: 1/1 within 0.000 seconds"]);
}

#[test]
fn assertion_after_done_is_printed() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("eager", |ctx| {
        ctx.done();
        ctx.ok(false);
        ctx.done();
        Ok(())
    });

    run_suite(&fixture, Some(module));

    let lines = fixture.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("eager: failed after done: "));
    assert!(lines[1].ends_with("ok: assertion failed (false)"));
}

#[test]
fn raise_after_done_keeps_verdict() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("late", |ctx| {
        ctx.done();
        Err(Value::from("too late"))
    });

    let (status, _) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Passed));
    assert!(fixture.output().contains("late: raised after done: too late"));
}

#[test]
fn unknown_assertion_is_a_failure() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("typo", |ctx| {
        assert!(!ctx.check("is_banana", &[Value::from(1)]));
        ctx.done();
        Ok(())
    });

    let (status, _) = run_suite(&fixture, Some(module));

    assert_eq!(status, Some(ExitStatus::Failed));
    assert!(fixture.failure_lines()[0].ends_with("is_banana: unknown assertion"));
}

#[test]
fn failed_table_equality_prints_a_diff() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("tables", |ctx| {
        ctx.equal(Value::list([1, 2, 3]), Value::list([1, 2, 4]));
        ctx.done();
        Ok(())
    });

    run_suite(&fixture, Some(module));

    let lines = fixture.lines();
    assert!(lines.iter().any(|line| line == "   -   3,"));
    assert!(lines.iter().any(|line| line == "   +   4,"));
}

#[test]
fn elapsed_time_comes_from_the_clock() {
    let fixture = Fixture::new();
    let clock = fixture.clock.clone();
    let module = TestModule::new().with_test("slow", move |ctx| {
        clock.advance(Duration::from_millis(1500));
        ctx.done();
        Ok(())
    });

    run_suite(&fixture, Some(module));

    assert_eq!(fixture.lines(), ["slow: 0/0 within 1.500 seconds"]);
}

#[test]
fn context_counts_and_records() {
    let fixture = Fixture::new();
    let module = TestModule::new().with_test("counts", |ctx| {
        ctx.ok(1);
        ctx.equal("a", "a");
        ctx.throws(Value::function(|_| Ok(Value::Nil)), &[]);
        assert_eq!(ctx.tried(), 2);
        assert!(matches!(
            ctx.failures().as_slice(),
            [Failure::Assertion { assertion, .. }] if assertion == "throws"
        ));
        ctx.done();
        Ok(())
    });

    let (status, _) = run_suite(&fixture, Some(module));
    assert_eq!(status, Some(ExitStatus::Failed));
}

// =============================================================================
// FILE SEQUENCER
// =============================================================================

#[test]
fn any_failing_file_fails_the_run() {
    let fixture = Fixture::new();
    let loader = StaticModuleLoader::new()
        .with_module("fail.yaml", failing_module())
        .with_module("pass.yaml", passing_module());
    let (sequencer, _) = fixture.sequencer(loader);

    let status = sequencer
        .run_to_status(files(&["fail.yaml", "pass.yaml"]))
        .unwrap();

    assert_eq!(status, ExitStatus::Failed);
}

#[test]
fn files_run_from_the_end_of_the_list() {
    let fixture = Fixture::new();
    let loader = StaticModuleLoader::new()
        .with_module("fail.yaml", failing_module())
        .with_module("pass.yaml", passing_module());
    let (sequencer, _) = fixture.sequencer(loader);

    sequencer
        .run_to_status(files(&["fail.yaml", "pass.yaml"]))
        .unwrap();

    let lines = fixture.lines();
    assert!(lines[0].starts_with("passes:"));
    assert!(lines[1].starts_with("fails:"));
}

#[test]
fn load_failure_is_reported_and_skipped() {
    let fixture = Fixture::new();
    let loader = StaticModuleLoader::new().with_module("pass.yaml", passing_module());
    let (sequencer, diagnostics) = fixture.sequencer(loader);

    let status = sequencer
        .run_to_status(files(&["pass.yaml", "missing.yaml"]))
        .unwrap();

    assert_eq!(status, ExitStatus::Passed);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.messages()[0].contains("missing.yaml"));
    assert_eq!(fixture.lines().len(), 1);
}

#[test]
fn strict_mode_fails_on_load_failure() {
    let fixture = Fixture::new();
    let loader = StaticModuleLoader::new().with_module("pass.yaml", passing_module());
    let (sequencer, diagnostics) = fixture.sequencer(loader);

    let status = sequencer
        .strict(true)
        .run_to_status(files(&["pass.yaml", "missing.yaml"]))
        .unwrap();

    assert_eq!(status, ExitStatus::Failed);
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn stalled_suite_stops_the_run() {
    let fixture = Fixture::new();
    let stalls = TestModule::new().with_test("hangs", |_| Ok(()));
    let loader = StaticModuleLoader::new()
        .with_module("pass.yaml", passing_module())
        .with_module("stall.yaml", stalls);
    let (sequencer, _) = fixture.sequencer(loader);

    let err = sequencer
        .run_to_status(files(&["pass.yaml", "stall.yaml"]))
        .unwrap_err();

    match err {
        HarnessError::Stalled { file, pending, .. } => {
            assert!(file.ends_with("stall.yaml"));
            assert_eq!(pending, ["hangs"]);
        }
        other => panic!("expected a stall, got {other:?}"),
    }
    assert!(fixture.output().is_empty());
}

#[test]
fn run_passes_status_to_continuation() {
    let fixture = Fixture::new();
    let loader = StaticModuleLoader::new().with_module("pass.yaml", passing_module());
    let (sequencer, _) = fixture.sequencer(loader);
    let seen = Cell::new(None);

    sequencer
        .run(files(&["pass.yaml"]), |status| seen.set(Some(status)))
        .unwrap();

    assert_eq!(seen.get(), Some(ExitStatus::Passed));
}

#[test]
fn empty_file_list_passes() {
    let fixture = Fixture::new();
    let (sequencer, _) = fixture.sequencer(StaticModuleLoader::new());
    assert_eq!(sequencer.run_to_status(Vec::new()).unwrap(), ExitStatus::Passed);
}
