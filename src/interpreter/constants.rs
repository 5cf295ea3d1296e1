// Constants for the tracer and interpreter

/// Synthetic filename the user program is compiled under.
/// Line events are only recorded for code carrying this filename.
pub const USER_FILENAME: &str = "<user_code>";

/// Maximum number of step records in one trace
pub const MAX_STEPS: usize = 1000;

/// Maximum length of a rendered value repr, including the `...` tail
pub const REPR_LIMIT: usize = 200;

/// Tail appended to reprs cut at [`REPR_LIMIT`]
pub const REPR_ELLIPSIS: &str = "...";

/// Namespace bookkeeping names left out of locals snapshots
pub const EXCLUDED_LOCALS: [&str; 2] = ["__name__", "__builtins__"];

/// Function name recorded for top-level code
pub const MODULE_FUNCTION_NAME: &str = "<module>";

/// Maximum number of nested user function calls.
/// CPython's limit is 1000 frames, a few of which the host program holds.
pub const MAX_CALL_DEPTH: usize = 995;

/// Maximum container nesting a repr descends into
pub const MAX_REPR_DEPTH: usize = 1000;

/// Stack size of the thread a trace runs on.
/// Deep user recursion nests many evaluator frames per user call.
pub const TRACE_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Largest int, in bits, arithmetic may produce before raising `MemoryError`
pub const MAX_INT_BITS: u64 = 1 << 22;

/// Most decimal digits `str()`/`repr()` of an int may produce
pub const INT_MAX_STR_DIGITS: usize = 4300;

/// Longest str, list or tuple a repetition may build
pub const MAX_SEQUENCE_ITEMS: usize = 10_000_000;

/// Maximum number of elements broken out into `list_items` / `dict_items`
pub const STRUCTURED_ITEMS_LIMIT: usize = 100;
