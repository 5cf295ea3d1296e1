//! CLI definitions and source input.

use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use pyviz::interpreter::constants::{MAX_STEPS, REPR_LIMIT};
use pyviz::tracer::TraceConfig;

/// Line that ends source pasted on stdin
pub const SENTINEL: &str = "END";

pub const PROMPT: &str = "Paste Python code. End with a line containing only END.";

#[derive(Parser, Debug)]
#[command(name = "pyviz")]
#[command(about = "Trace a Python program step by step and browse the timeline")]
#[command(version)]
pub struct Cli {
    /// Source file to trace (reads stdin until a line containing only END if omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Maximum number of recorded steps
    #[arg(long, default_value_t = MAX_STEPS)]
    pub max_steps: usize,

    /// Maximum length of each rendered value
    #[arg(long, default_value_t = REPR_LIMIT)]
    pub repr_limit: usize,

    /// Print the trace as JSON instead of opening the viewer
    #[arg(long, conflicts_with = "html")]
    pub json: bool,

    /// Write the browser viewer to PATH instead of opening the terminal viewer
    #[arg(long, value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn trace_config(&self) -> TraceConfig {
        TraceConfig {
            max_steps: self.max_steps,
            repr_limit: self.repr_limit,
        }
    }
}

/// Read lines until one that is only `END` (surrounding whitespace ignored)
/// or end of input; lines are joined with `\n`
pub fn read_until_sentinel<R: BufRead>(reader: R) -> io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim() == SENTINEL {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_until_sentinel() {
        let input = "x = 1\nprint(x)\n  END  \nignored\n";
        assert_eq!(read_until_sentinel(input.as_bytes()).unwrap(), "x = 1\nprint(x)");
    }

    #[test]
    fn test_read_until_eof() {
        assert_eq!(read_until_sentinel("a = 1\n".as_bytes()).unwrap(), "a = 1");
        assert_eq!(read_until_sentinel("".as_bytes()).unwrap(), "");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["pyviz", "prog.py", "--max-steps", "5", "--json"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("prog.py")));
        assert!(cli.json);
        assert_eq!(cli.trace_config().max_steps, 5);
        assert_eq!(cli.trace_config().repr_limit, REPR_LIMIT);

        assert!(Cli::try_parse_from(["pyviz", "--json", "--html", "out.html"]).is_err());
    }
}
