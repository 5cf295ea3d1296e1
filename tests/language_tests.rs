// Integration tests for the interpreted language, observed through traced output

use pyviz::tracer::{trace, Outcome};

/// Trace `source`, require a clean finish, and return its output
fn run(source: &str) -> String {
    let trace = trace(source);
    assert_eq!(
        trace.outcome,
        Outcome::Completed,
        "program failed: {}",
        trace.output
    );
    trace.output
}

/// Trace `source` and return the error line of a failed run
fn run_err(source: &str) -> String {
    let trace = trace(source);
    assert_eq!(trace.outcome, Outcome::RuntimeError, "{}", trace.output);
    trace.output.lines().last().unwrap_or_default().to_string()
}

#[test]
fn test_arithmetic() {
    let source = r#"
print(7 // 2, -7 // 2, 7 % 3, -7 % 3)
print(2 ** 10, 10 / 4, 1 + 2 * 3)
print(0.1 + 0.2)
print(abs(-5), round(2.675, 2), round(3.5), round(4.5))
print(1 << 4, 0xff & 0x0f, 5 ^ 1, ~0)
"#;
    assert_eq!(
        run(source),
        "3 -4 1 2\n1024 2.5 7\n0.30000000000000004\n5 2.67 4 4\n16 15 4 -1"
    );
}

#[test]
fn test_ints_grow_past_64_bits() {
    let source = r#"
def factorial(n):
    result = 1
    for i in range(2, n + 1):
        result *= i
    return result

print(2 ** 64)
print(factorial(21))
print(-9223372036854775808 // -1)
big = 10 ** 30
print(big // 7, big % 7, -big)
print(big > 2 ** 63, big == 10 ** 30, (big + 1) - big)
print(abs(-big), int("123456789012345678901234567890"), round(big + 6, -1))
print(f"{2 ** 70:,}", 0xFFFFFFFFFFFFFFFFFF)
print(float(2 ** 70), 2 ** 70 / 2 ** 69)
"#;
    assert_eq!(
        run(source),
        "18446744073709551616\n\
         51090942171709440000\n\
         9223372036854775808\n\
         142857142857142857142857142857 1 -1000000000000000000000000000000\n\
         True True 1\n\
         1000000000000000000000000000000 123456789012345678901234567890 1000000000000000000000000000010\n\
         1,180,591,620,717,411,303,424 4722366482869645213695\n\
         1.1805916207174113e+21 2.0"
    );
}

#[test]
fn test_int_size_limits() {
    assert_eq!(run_err("x = 10 ** 10 ** 9"), "RuntimeError:");
    assert_eq!(run_err("x = 'x' * 100000000000"), "RuntimeError:");
    assert_eq!(
        run_err("print(float(10 ** 400))"),
        "RuntimeError: int too large to convert to float"
    );
    assert_eq!(
        run_err("x = [1][2 ** 70]"),
        "RuntimeError: cannot fit 'int' into an index-sized integer"
    );
}

#[test]
fn test_strings() {
    let source = r#"
s = "Hello, World"
print(s.upper(), s.lower())
print(s[0], s[-1], s[7:], s[::-1])
print(s.split(", "), "-".join(["a", "b", "c"]))
print(s.replace("l", "L"), s.find("World"), s.count("l"))
print("  pad  ".strip() + "|", s.startswith("He"), s.endswith("x"))
print(len(s), "lo" in s, "abc" * 2)
print(repr("it's"), repr('say "hi"'))
"#;
    assert_eq!(
        run(source),
        "HELLO, WORLD hello, world\n\
         H d World dlroW ,olleH\n\
         ['Hello', 'World'] a-b-c\n\
         HeLLo, WorLd 7 3\n\
         pad| True False\n\
         12 True abcabc\n\
         \"it's\" 'say \"hi\"'"
    );
}

#[test]
fn test_fstrings_and_formatting() {
    let source = r#"
name = "Ada"
x = 3.14159
n = 1234567
print(f"{name!r} has {len(name)} letters")
print(f"{x:.2f} {n:,} {n:>10} {name:<5}|")
print("{} + {} = {}".format(1, 2, 1 + 2))
print("%s is %d years" % ("Bob", 42))
"#;
    assert_eq!(
        run(source),
        "'Ada' has 3 letters\n3.14 1,234,567    1234567 Ada  |\n1 + 2 = 3\nBob is 42 years"
    );
}

#[test]
fn test_lists() {
    let source = r#"
xs = [3, 1, 2]
xs.append(5)
xs.insert(0, 9)
print(xs, len(xs))
print(xs.pop(), xs.pop(0), xs)
xs.sort()
print(xs, sorted(xs, reverse=True))
ys = xs
ys.extend([7, 8])
print(xs, xs[1:3], xs[-2:])
xs[0] = 100
del xs[1]
print(xs, xs.index(7), xs.count(8))
print([1, 2] + [3], [0] * 3)
"#;
    assert_eq!(
        run(source),
        "[9, 3, 1, 2, 5] 5\n\
         5 9 [3, 1, 2]\n\
         [1, 2, 3] [3, 2, 1]\n\
         [1, 2, 3, 7, 8] [2, 3] [7, 8]\n\
         [100, 3, 7, 8] 2 1\n\
         [1, 2, 3] [0, 0, 0]"
    );
}

#[test]
fn test_dicts() {
    let source = r#"
d = {"a": 1, "b": 2}
d["c"] = 3
print(d, len(d), "a" in d)
print(d.get("z"), d.get("z", 0), d["b"])
print(list(d.keys()), list(d.values()))
for k, v in d.items():
    print(k, v)
print(d.pop("a"), d)
d.update({"b": 20})
print(d.setdefault("e", 5), d)
"#;
    assert_eq!(
        run(source),
        "{'a': 1, 'b': 2, 'c': 3} 3 True\n\
         None 0 2\n\
         ['a', 'b', 'c'] [1, 2, 3]\n\
         a 1\nb 2\nc 3\n\
         1 {'b': 2, 'c': 3}\n\
         5 {'b': 20, 'c': 3, 'e': 5}"
    );
}

#[test]
fn test_comprehensions_and_builtins() {
    let source = r#"
squares = [i * i for i in range(6) if i % 2 == 0]
print(squares, sum(squares), min(squares), max(squares))
pairs = [(a, b) for a in range(2) for b in "xy"]
print(pairs)
print(list(enumerate("ab")), list(zip([1, 2], "cd")))
print(sorted(["bb", "a", "ccc"], key=len), list(reversed([1, 2, 3])))
print(int("42") + 1, float("1.5"), str(3) + "!", bool(0), bool([1]))
print(list(range(10, 0, -3)), tuple([1, 2]))
"#;
    assert_eq!(
        run(source),
        "[0, 4, 16] 20 0 16\n\
         [(0, 'x'), (0, 'y'), (1, 'x'), (1, 'y')]\n\
         [(0, 'a'), (1, 'b')] [(1, 'c'), (2, 'd')]\n\
         ['a', 'bb', 'ccc'] [3, 2, 1]\n\
         43 1.5 3! False True\n\
         [10, 7, 4, 1] (1, 2)"
    );
}

#[test]
fn test_comprehension_variable_does_not_leak() {
    let trace = trace("xs = [k for k in range(3)]\ndone = 1\n");
    assert!(!trace.steps[1].locals.contains_key("k"));
}

#[test]
fn test_control_flow() {
    let source = r#"
for i in range(10):
    if i == 1:
        continue
    if i == 4:
        break
    print(i)
else:
    print("not reached")
n = 0
while n < 2:
    n += 1
else:
    print("while done", n)
grade = 75
if grade >= 90:
    print("A")
elif grade >= 70:
    print("C")
else:
    print("F")
print("yes" if 1 < 2 < 3 else "no", 0 or "fallback", 1 and 2)
"#;
    assert_eq!(run(source), "0\n2\n3\nwhile done 2\nC\nyes fallback 2");
}

#[test]
fn test_elif_records_each_condition() {
    let trace = trace("x = 5\nif x > 10:\n    pass\nelif x > 3:\n    pass\n");
    let lines: Vec<usize> = trace.steps.iter().map(|s| s.line).collect();
    assert_eq!(lines, vec![1, 2, 4, 5]);
}

#[test]
fn test_unpacking_and_assignment() {
    let source = r#"
a, b = 1, 2
a, b = b, a
x = y = [0]
x.append(1)
(p, q), r = (1, 2), 3
print(a, b, y, p + q + r)
"#;
    assert_eq!(run(source), "2 1 [0, 1] 6");
    assert_eq!(
        run_err("a, b = [1, 2, 3]"),
        "RuntimeError: too many values to unpack (expected 2)"
    );
}

#[test]
fn test_exceptions() {
    let source = r#"
try:
    {}["missing"]
except LookupError as e:
    print("lookup", repr(e))
try:
    int("abc")
except (TypeError, ValueError) as e:
    print("value:", e)
else:
    print("no error")
finally:
    print("finally")
try:
    x = 1
except Exception:
    print("unreachable")
else:
    print("else ran")
def risky():
    raise RuntimeError("inner")
try:
    risky()
except RuntimeError as err:
    print(err)
"#;
    assert_eq!(
        run(source),
        "lookup KeyError('missing')\n\
         value: invalid literal for int() with base 10: 'abc'\n\
         finally\n\
         else ran\n\
         inner"
    );
}

#[test]
fn test_finally_runs_on_uncaught_exception() {
    let trace = trace("try:\n    1 / 0\nfinally:\n    print('cleanup')\n");
    assert_eq!(trace.output, "cleanup\n\nRuntimeError: division by zero");
}

#[test]
fn test_reraise_and_assert() {
    assert_eq!(
        run_err("try:\n    [][0]\nexcept IndexError:\n    raise\n"),
        "RuntimeError: list index out of range"
    );
    assert_eq!(run_err("assert 1 == 2, 'math is broken'"), "RuntimeError: math is broken");
    // the empty message leaves only the trimmed prefix
    assert_eq!(run_err("assert False"), "RuntimeError:");
}

#[test]
fn test_functions_and_scoping() {
    let source = r#"
counter = 0
def bump(step=1):
    global counter
    counter += step
    return counter
def describe(name, greeting="Hello"):
    return greeting + ", " + name
bump()
bump(step=5)
print(counter, describe("Ann"), describe("Bo", greeting="Hi"))
def fib(n):
    return n if n < 2 else fib(n - 1) + fib(n - 2)
print([fib(i) for i in range(10)])
"#;
    assert_eq!(
        run(source),
        "6 Hello, Ann Hi, Bo\n[0, 1, 1, 2, 3, 5, 8, 13, 21, 34]"
    );
}

#[test]
fn test_modules() {
    let source = r#"
import math
from math import sqrt, pi
print(math.floor(2.7), math.ceil(2.1), sqrt(16.0), round(pi, 3))
"#;
    assert_eq!(run(source), "2 3 4.0 3.142");
    assert_eq!(
        run_err("import os"),
        "RuntimeError: No module named 'os'"
    );
}

#[test]
fn test_type_errors() {
    assert_eq!(
        run_err("x = 1 + 'a'"),
        "RuntimeError: unsupported operand type(s) for +: 'int' and 'str'"
    );
    assert_eq!(
        run_err("len(5)"),
        "RuntimeError: object of type 'int' has no len()"
    );
}

#[test]
fn test_del_and_none_checks() {
    let source = "x = None\nprint(x is None, x is not None)\nd = {'k': 1}\ndel d['k']\nprint(d)\n";
    assert_eq!(run(source), "True False\n{}");
    assert_eq!(
        run_err("y = 1\ndel y\nprint(y)\n"),
        "RuntimeError: name 'y' is not defined"
    );
}
