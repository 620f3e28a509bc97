//! Running assembled triggers.

use pretty_assertions::assert_eq;
use quill::diagnostic::ErrorCode;
use quill::lang::Trigger;
use quill::registry::CatalogState;

use crate::common::{runtime, Recorder, Script, Silence};

/// ```text
/// on message:
///     say "start"
///     loop 1, 2 and 3:
///         say "outer"
///         loop 1, 2 and 3:
///             if loop-value is even:
///                 continue
///             say loop-value
///         say "outer end"
///     say "done"
/// ```
fn nested_loops(state: &CatalogState) -> Trigger {
    let mut script = Script::new(state);
    assert!(script.on("[on] message"));
    script.say("start");

    let outer = script.numbers(1..=3);
    assert!(script.open("loop %objects%", vec![outer]));
    script.say("outer");

    let inner = script.numbers(1..=3);
    assert!(script.open("loop %objects%", vec![inner]));
    let value = script.expression("[the] loop-value", vec![]).unwrap();
    let even = script.expression("%number% is even", vec![value]).unwrap();
    assert!(script.open("if %=boolean%", vec![even]));
    assert!(script.effect("continue", vec![]));
    script.close();
    let value = script.expression("[the] loop-value", vec![]).unwrap();
    assert!(script.effect("say %objects%", vec![value]));
    script.close();

    script.say("outer end");
    script.close();
    script.say("done");
    script.build().unwrap()
}

fn expected_lines() -> Vec<String> {
    let mut lines = vec!["start".to_string()];
    for _ in 0..3 {
        lines.extend(["outer", "1", "3", "outer end"].map(String::from));
    }
    lines.push("done".to_string());
    lines
}

#[test]
fn continue_skips_to_the_next_inner_iteration() {
    let runtime = runtime();
    let state = runtime.catalog().read();
    let trigger = nested_loops(&state);
    drop(state);

    let recorder = Recorder::default();
    assert!(runtime.run(&trigger, &recorder));
    assert_eq!(recorder.lines(), expected_lines());
}

#[test]
fn continue_outside_a_loop_rejects_the_trigger() {
    let runtime = runtime();
    let state = runtime.catalog().read();
    let mut script = Script::new(&state);
    script.say("before");
    assert!(!script.effect("continue", vec![]));

    let diagnostics = script.build().unwrap_err();
    let codes: Vec<ErrorCode> = diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, [ErrorCode::E3001]);
}

#[test]
fn loop_value_outside_a_loop_is_rejected() {
    let runtime = runtime();
    let state = runtime.catalog().read();
    let mut script = Script::new(&state);
    assert!(script.expression("[the] loop-value", vec![]).is_none());
    assert!(script.build().is_err());
}

#[test]
fn event_guard_skips_other_contexts() {
    let runtime = runtime();
    let trigger = nested_loops(&runtime.catalog().read());
    assert!(!runtime.run(&trigger, &Silence));

    let recorder = Recorder::default();
    assert!(runtime.run(&trigger, &recorder));
    assert_eq!(recorder.lines().len(), expected_lines().len());
}

#[test]
fn whether_yields_the_condition_value() {
    let runtime = runtime();
    let state = runtime.catalog().read();
    let mut script = Script::new(&state);
    let numbers = script.numbers(2..=3);
    assert!(script.open("loop %objects%", vec![numbers]));
    let value = script.expression("[the] loop-value", vec![]).unwrap();
    let even = script.expression("%number% is even", vec![value]).unwrap();
    let whether = script.expression("whether %~boolean%", vec![even]).unwrap();
    assert!(script.effect("say %objects%", vec![whether]));
    script.close();
    let trigger = script.build().unwrap();

    let recorder = Recorder::default();
    assert!(runtime.run(&trigger, &recorder));
    assert_eq!(recorder.lines(), ["true", "false"]);
}

#[test]
fn one_trigger_runs_on_many_threads() {
    let runtime = runtime();
    let trigger = nested_loops(&runtime.catalog().read());

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let runtime = runtime.clone();
            let trigger = &trigger;
            scope.spawn(move || {
                let recorder = Recorder::default();
                assert!(runtime.run(trigger, &recorder));
                assert_eq!(recorder.lines(), expected_lines());
            });
        }
    });
}
