// Integration tests for the execution tracer

use pyviz::tracer::{trace, trace_with, Outcome, Trace, TraceConfig};

fn lines(trace: &Trace) -> Vec<usize> {
    trace.steps.iter().map(|step| step.line).collect()
}

fn local(trace: &Trace, step: usize, name: &str) -> String {
    trace.steps[step]
        .locals
        .get(name)
        .unwrap_or_else(|| panic!("no local '{}' at step {}", name, step))
        .text()
}

#[test]
fn test_loop_accumulator() {
    let source = "total = 0\nfor i in range(3): total += i\nprint(total)";
    let trace = trace(source);

    assert_eq!(trace.outcome, Outcome::Completed);
    assert_eq!(trace.output, "3");
    // header once, then once per jump back to fetch the next item
    assert_eq!(lines(&trace), vec![1, 2, 2, 2, 2, 3]);
    let last = trace.steps.len() - 1;
    assert_eq!(trace.steps[last].line, 3);
    assert_eq!(local(&trace, last, "total"), "3");
    assert_eq!(local(&trace, last, "i"), "2");
}

#[test]
fn test_one_step_per_line_event() {
    let source = r#"
x = 1
if x > 0:
    y = 2
else:
    y = 3
n = 0
while n < 2:
    n += 1
print(x, y, n)
"#;
    let trace = trace(source);
    assert_eq!(trace.output, "1 2 2");
    // while checks three times, its body runs twice
    assert_eq!(lines(&trace), vec![2, 3, 4, 7, 8, 9, 8, 9, 8, 10]);
}

#[test]
fn test_same_line_statements_share_a_step() {
    let trace = trace("a = 1; b = 2\nprint(a, b)\n");
    assert_eq!(trace.output, "1 2");
    assert_eq!(lines(&trace), vec![1, 2]);
}

#[test]
fn test_single_line_while() {
    let trace = trace("x = 0\nwhile x < 2: x += 1\n");
    assert_eq!(trace.outcome, Outcome::Completed);
    assert_eq!(lines(&trace), vec![1, 2, 2]);
}

#[test]
fn test_for_records_exhausted_fetch() {
    let trace = trace("for c in 'ab':\n    pass\n");
    assert_eq!(lines(&trace), vec![1, 2, 1, 2, 1]);
}

#[test]
fn test_function_frames() {
    let source = "def f(a):\n    b = a * 2\n    return b\nr = f(3)\n";
    let trace = trace(source);

    assert_eq!(lines(&trace), vec![1, 4, 2, 3]);
    let functions: Vec<&str> = trace.steps.iter().map(|s| s.function.as_str()).collect();
    assert_eq!(functions, vec!["<module>", "<module>", "f", "f"]);

    assert!(trace.steps[0].locals.is_empty());
    assert_eq!(local(&trace, 1, "f"), "<function f>");
    assert_eq!(local(&trace, 2, "a"), "3");
    assert!(!trace.steps[2].locals.contains_key("b"));
    assert_eq!(local(&trace, 3, "b"), "6");
}

#[test]
fn test_bookkeeping_names_excluded() {
    let trace = trace("a = 1\nb = 2\n");
    for step in &trace.steps {
        assert!(!step.locals.contains_key("__name__"));
        assert!(!step.locals.contains_key("__builtins__"));
    }
    let names: Vec<&String> = trace.steps[1].locals.keys().collect();
    assert_eq!(names, vec!["a"]);
}

#[test]
fn test_locals_sorted_by_name() {
    let trace = trace("zeta = 1\nalpha = 2\nmid = 3\npass\n");
    let names: Vec<&str> = trace.steps[3].locals.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_runtime_error_keeps_partial_trace() {
    let trace = trace("print('before')\nx = 1 / 0\nprint('after')\n");

    assert_eq!(trace.outcome, Outcome::RuntimeError);
    assert_eq!(lines(&trace), vec![1, 2]);
    assert_eq!(trace.output, "before\n\nRuntimeError: division by zero");
}

#[test]
fn test_runtime_error_messages() {
    assert_eq!(trace("print(x)").output, "RuntimeError: name 'x' is not defined");
    assert_eq!(trace("d = {}\nd['k']").output, "RuntimeError: 'k'");
    assert_eq!(
        trace("raise ValueError('bad value')").output,
        "RuntimeError: bad value"
    );
    assert_eq!(
        trace("[1, 2][5]").output,
        "RuntimeError: list index out of range"
    );
}

#[test]
fn test_syntax_error() {
    let trace = trace("x = 1\ny = = 2\n");

    assert!(trace.steps.is_empty());
    assert_eq!(trace.outcome, Outcome::SyntaxError);
    assert!(trace.output.starts_with("SyntaxError: "), "{}", trace.output);
    assert!(trace.output.ends_with("(<user_code>, line 2)"), "{}", trace.output);
}

#[test]
fn test_syntax_error_in_later_function_prevents_execution() {
    let trace = trace("print('never')\ndef f():\n    return )\n");
    assert!(trace.steps.is_empty());
    assert!(!trace.output.contains("never"));
}

#[test]
fn test_infinite_loop_hits_step_limit() {
    let trace = trace("n = 0\nwhile True:\n    n += 1\n");

    assert_eq!(trace.outcome, Outcome::StepLimit);
    assert_eq!(trace.steps.len(), 1000);
    assert_eq!(trace.output, "Step limit 1000 reached.");
    assert_eq!(trace.steps[999].line, 2);
}

#[test]
fn test_step_limit_keeps_printed_output() {
    let trace = trace("print('start')\nwhile True:\n    pass\n");
    assert_eq!(trace.output, "start\n\nStep limit 1000 reached.");
}

#[test]
fn test_step_limit_cannot_be_caught() {
    let source = r#"
try:
    while True:
        pass
except:
    print('caught')
finally:
    print('cleanup')
print('after')
"#;
    let trace = trace(source);
    assert_eq!(trace.steps.len(), 1000);
    assert_eq!(trace.output, "Step limit 1000 reached.");
}

#[test]
fn test_custom_step_ceiling() {
    let config = TraceConfig {
        max_steps: 5,
        ..TraceConfig::default()
    };
    let trace = trace_with("for i in range(100):\n    pass\n", &config);
    assert_eq!(trace.steps.len(), 5);
    assert_eq!(trace.output, "Step limit 5 reached.");

    let short = trace_with("a = 1\nb = 2\n", &config);
    assert_eq!(short.outcome, Outcome::Completed);
    assert_eq!(short.steps.len(), 2);
}

#[test]
fn test_output_ordering() {
    let source = r#"
import sys
print('out')
print('err', file=sys.stderr)
sys.stdout.write('out2\n')
raise KeyError('missing')
"#;
    let trace = trace(source);
    assert_eq!(trace.output, "out\nout2\n\nerr\n\nRuntimeError: 'missing'");
}

#[test]
fn test_output_trimmed() {
    let trace = trace("print()\nprint('  x  ')\nprint()\n");
    assert_eq!(trace.output, "x");
}

#[test]
fn test_idempotent() {
    let source = "xs = []\nfor i in range(4):\n    xs.append(i * i)\nd = {'k': xs}\nprint(d)\n";
    assert_eq!(trace(source), trace(source));
}

#[test]
fn test_repr_truncated() {
    let trace = trace("s = 'x' * 500\nn = 0\n");
    let repr = local(&trace, 1, "s");
    assert_eq!(repr.chars().count(), 200);
    assert!(repr.starts_with("'xxx"));
    assert!(repr.ends_with("..."));
}

#[test]
fn test_failed_repr_truncated_as_a_whole() {
    let config = TraceConfig {
        repr_limit: 40,
        ..TraceConfig::default()
    };
    let trace = trace_with("x = 10 ** 5000\ny = 0\n", &config);

    assert_eq!(trace.outcome, Outcome::Completed);
    let repr = local(&trace, 1, "x");
    assert_eq!(repr, "<repr error: Exceeds the limit (4300 ...");
    assert_eq!(repr.chars().count(), 40);
}

#[test]
fn test_self_referencing_list() {
    let trace = trace("a = [1]\na.append(a)\nb = 0\n");
    assert_eq!(local(&trace, 2, "a"), "[1, [...]]");
}

#[test]
fn test_deep_nesting_renders() {
    let source = "x = []\nfor i in range(300):\n    x = [x]\ndone = 1\n";
    let trace = trace(source);

    assert_eq!(trace.outcome, Outcome::Completed);
    let last = trace.steps.len() - 1;
    assert_eq!(trace.steps[last].line, 4);
    let repr = local(&trace, last, "x");
    assert!(repr.starts_with("[[[["));
    assert!(repr.ends_with("..."));
    assert_eq!(repr.chars().count(), 200);
    assert_eq!(local(&trace, last, "i"), "299");
}

#[test]
fn test_nesting_past_repr_depth_gets_placeholder() {
    let config = TraceConfig {
        max_steps: 3000,
        ..TraceConfig::default()
    };
    let source = "x = []\nfor i in range(1100):\n    x = [x]\ndone = 1\n";
    let trace = trace_with(source, &config);

    assert_eq!(trace.outcome, Outcome::Completed);
    let last = trace.steps.len() - 1;
    assert_eq!(trace.steps[last].line, 4);
    assert_eq!(
        local(&trace, last, "x"),
        "<repr error: maximum recursion depth exceeded while getting the repr of an object>"
    );
}

#[test]
fn test_structured_locals() {
    let trace = trace("xs = [1, 'two']\nd = {'a': [1]}\nt = (3,)\npass\n");
    let step = &trace.steps[3];

    let items: Vec<String> = step.locals["xs"]
        .list_items
        .as_ref()
        .unwrap()
        .iter()
        .map(|item| item.to_string())
        .collect();
    assert_eq!(items, vec!["1", "'two'"]);

    let pairs: Vec<(String, String)> = step.locals["d"]
        .dict_items
        .as_ref()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(pairs, vec![("'a'".to_string(), "[1]".to_string())]);

    assert_eq!(step.locals["t"].list_items.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_snapshot_is_taken_before_mutation() {
    let trace = trace("xs = [1]\nxs.append(2)\nys = 0\n");
    assert_eq!(local(&trace, 1, "xs"), "[1]");
    assert_eq!(local(&trace, 2, "xs"), "[1, 2]");
}

#[test]
fn test_recursion_limit() {
    let trace = trace("def down(n):\n    return down(n + 1)\ndown(0)\n");

    assert_eq!(trace.outcome, Outcome::RuntimeError);
    assert_eq!(
        trace.output,
        "RuntimeError: maximum recursion depth exceeded"
    );
    assert!(trace.steps.len() < 1000);
}

#[test]
fn test_moderate_recursion_completes() {
    let source = "def f(n): return 0 if n == 0 else f(n - 1)\nprint(f(250))\n";
    let trace = trace(source);

    assert_eq!(trace.outcome, Outcome::Completed);
    assert_eq!(trace.output, "0");
    // def, the call site, then one step per frame
    assert_eq!(trace.steps.len(), 253);
}

#[test]
fn test_recursive_function() {
    let source = r#"
def fact(n):
    if n <= 1:
        return 1
    return n * fact(n - 1)
print(fact(10))
"#;
    let trace = trace(source);
    assert_eq!(trace.output, "3628800");
    assert!(trace.steps.iter().any(|s| s.function == "fact"));
}

#[test]
fn test_json_shape() {
    let trace = trace("x = [1]\nprint(x)\n");
    let json = serde_json::to_value(&trace).unwrap();

    assert_eq!(json["outcome"], "completed");
    assert_eq!(json["output"], "[1]");
    assert_eq!(json["steps"][1]["lineno"], 2);
    assert_eq!(json["steps"][1]["func"], "<module>");
    let x = &json["steps"][1]["locals"]["x"];
    assert_eq!(x["repr"]["status"], "ok");
    assert_eq!(x["repr"]["text"], "[1]");
    assert_eq!(x["list_items"][0]["text"], "1");
    assert!(x.get("dict_items").is_none());

    let back: Trace = serde_json::from_value(json).unwrap();
    assert_eq!(back, trace);
}
