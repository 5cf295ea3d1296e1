//! Browser viewer: a self-contained HTML page
//!
//! The page embeds the source and the serialized trace as JSON and drives a
//! range slider over the step indices with a small inline script. The step
//! selected by the session cursor is also rendered server-side, so the page
//! is readable without scripting.

use super::{Frontend, Session};
use crate::snapshot::{LocalValue, StepRecord};
use serde_json::json;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize trace: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes the browser viewer for a session to a file
#[derive(Debug, Clone)]
pub struct HtmlExport {
    pub path: PathBuf,
}

impl HtmlExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Frontend for HtmlExport {
    type Error = ExportError;

    fn present(&mut self, session: &mut Session) -> Result<(), ExportError> {
        let page = render_page(session)?;
        fs::write(&self.path, page).map_err(|source| ExportError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), steps = session.len(), "wrote browser viewer");
        Ok(())
    }
}

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Source listing with the current line marked `>>`
pub fn format_code(lines: &[&str], current: Option<usize>) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let lineno = idx + 1;
            let marker = if Some(lineno) == current { ">>" } else { "  " };
            format!("{} {:>4} {}", marker, lineno, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_table(out: &mut String, headers: [&str; 2], rows: &[(String, String)]) {
    out.push_str("<table><thead><tr>");
    for header in headers {
        let _ = write!(out, "<th>{}</th>", escape(header));
    }
    out.push_str("</tr></thead><tbody>");
    for (left, right) in rows {
        let _ = write!(out, "<tr><td>{}</td><td>{}</td></tr>", escape(left), escape(right));
    }
    out.push_str("</tbody></table>");
}

fn render_local(out: &mut String, name: &str, value: &LocalValue) {
    if let Some(items) = &value.list_items {
        let _ = write!(out, "<p><b>{}</b></p>", escape(name));
        let rows: Vec<(String, String)> = items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item.to_string()))
            .collect();
        render_table(out, ["index", "value"], &rows);
    } else if let Some(pairs) = &value.dict_items {
        let _ = write!(out, "<p><b>{}</b></p>", escape(name));
        let rows: Vec<(String, String)> = pairs
            .iter()
            .map(|(key, item)| (key.to_string(), item.to_string()))
            .collect();
        render_table(out, ["key", "value"], &rows);
    } else {
        let _ = write!(out, "<pre>{} = {}</pre>", escape(name), escape(&value.text()));
    }
}

/// Locals panel body for one step
pub fn render_locals(step: Option<&StepRecord>) -> String {
    let mut out = String::new();
    match step {
        Some(step) if !step.locals.is_empty() => {
            for (name, value) in &step.locals {
                render_local(&mut out, name, value);
            }
        }
        Some(_) => out.push_str("<p class=\"info\">No locals to show.</p>"),
        None => out.push_str("<p class=\"info\">&lt;no steps&gt;</p>"),
    }
    out
}

/// Render the full page for `session`, opened at the session's cursor
pub fn render_page(session: &Session) -> Result<String, serde_json::Error> {
    let data = json!({
        "source": session.source(),
        "trace": session.trace(),
    });
    // `</` would end the script element early
    let data = serde_json::to_string(&data)?.replace("</", "<\\/");

    let lines = session.source_lines();
    let output = if session.output().is_empty() {
        "<no output>"
    } else {
        session.output()
    };

    let mut page = String::new();
    page.push_str(PAGE_HEAD);
    page.push_str("<main><section id=\"trace\"><h2>Trace</h2>");
    if session.is_empty() {
        page.push_str("<p class=\"info\">No steps recorded.</p>");
    } else {
        let position = session.position().unwrap_or(0);
        let _ = write!(
            page,
            "<label>Step <span id=\"step-label\">{}/{}</span><br>\
             <input id=\"step\" type=\"range\" min=\"1\" max=\"{}\" value=\"{}\"></label>",
            position + 1,
            session.len(),
            session.len(),
            position + 1,
        );
        let _ = write!(
            page,
            "<pre id=\"code\">{}</pre>",
            escape(&format_code(&lines, session.current_line()))
        );
    }
    page.push_str("</section><section id=\"side\"><h2>Locals</h2><div id=\"locals\">");
    page.push_str(&render_locals(session.current()));
    let _ = write!(
        page,
        "</div><h2>Output</h2><pre id=\"output\">{}</pre></section></main>",
        escape(output)
    );
    let _ = write!(
        page,
        "<script id=\"trace-data\" type=\"application/json\">{}</script>",
        data
    );
    page.push_str(PAGE_SCRIPT);
    page.push_str("</body></html>\n");
    Ok(page)
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8">
<title>Python Code Visualizer</title>
<style>
body { font-family: sans-serif; margin: 1.5em; }
main { display: flex; gap: 2em; }
#trace { flex: 2; }
#side { flex: 1; }
pre { background: #f6f6f6; padding: 6px; }
input[type=range] { width: 100%; }
table { font-size: 0.85em; border-collapse: collapse; margin-bottom: 6px; }
th { text-align: left; padding: 2px 6px; border-bottom: 1px solid #ddd; }
td { padding: 2px 6px; border-bottom: 1px solid #f0f0f0; }
.info { color: #555; }
</style></head><body>
<h1>Python Code Visualizer</h1>
"#;

const PAGE_SCRIPT: &str = r#"<script>
(function () {
  const data = JSON.parse(document.getElementById("trace-data").textContent);
  const steps = data.trace.steps;
  const slider = document.getElementById("step");
  if (!slider) return;
  const lines = data.source.split(/\r?\n/);
  if (lines.length && lines[lines.length - 1] === "") lines.pop();
  const esc = (s) => String(s).replace(/[&<>"']/g, (c) => ({
    "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#x27;"
  })[c]);
  const repr = (r) => r.text;
  const table = (headers, rows) => "<table><thead><tr>" +
    headers.map((h) => "<th>" + esc(h) + "</th>").join("") + "</tr></thead><tbody>" +
    rows.map((r) => "<tr><td>" + esc(r[0]) + "</td><td>" + esc(r[1]) + "</td></tr>").join("") +
    "</tbody></table>";
  function render(index) {
    const step = steps[index];
    document.getElementById("step-label").textContent = (index + 1) + "/" + steps.length;
    document.getElementById("code").textContent = lines.map((line, i) => {
      const marker = i + 1 === step.lineno ? ">>" : "  ";
      return marker + " " + String(i + 1).padStart(4) + " " + line;
    }).join("\n");
    const names = Object.keys(step.locals);
    let html = "";
    for (const name of names) {
      const entry = step.locals[name];
      if (entry.list_items) {
        html += "<p><b>" + esc(name) + "</b></p>" +
          table(["index", "value"], entry.list_items.map((v, i) => [i, repr(v)]));
      } else if (entry.dict_items) {
        html += "<p><b>" + esc(name) + "</b></p>" +
          table(["key", "value"], entry.dict_items.map((kv) => [repr(kv[0]), repr(kv[1])]));
      } else {
        html += "<pre>" + esc(name + " = " + repr(entry.repr)) + "</pre>";
      }
    }
    document.getElementById("locals").innerHTML =
      names.length ? html : '<p class="info">No locals to show.</p>';
  }
  slider.addEventListener("input", () => render(Number(slider.value) - 1));
})();
</script>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::trace;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }

    #[test]
    fn test_format_code_marks_current_line() {
        let listing = format_code(&["a = 1", "b = 2"], Some(2));
        assert_eq!(listing, "      1 a = 1\n>>    2 b = 2");
    }

    #[test]
    fn test_page_renders_structured_locals() {
        let source = "xs = [1, 'a']\nd = {'k': 2}\nn = 3\n";
        let mut session = Session::new(trace(source), source);
        session.seek(usize::MAX);
        let page = render_page(&session).unwrap();

        assert!(page.contains("<th>index</th>"));
        assert!(page.contains("<td>&#x27;a&#x27;</td>"));
        assert!(page.contains("<th>key</th>"));
        assert!(page.contains("&gt;&gt;    3 n = 3"));
        assert!(page.contains("&lt;no output&gt;"));
        assert!(page.contains("max=\"3\""));
    }

    #[test]
    fn test_page_for_empty_trace() {
        let source = "def (\n";
        let session = Session::new(trace(source), source);
        let page = render_page(&session).unwrap();
        assert!(page.contains("No steps recorded."));
        assert!(page.contains("SyntaxError: "));
        assert!(!page.contains("id=\"step\""));
    }

    #[test]
    fn test_embedded_json_cannot_close_script() {
        let source = "s = '</script>'\n";
        let session = Session::new(trace(source), source);
        let page = render_page(&session).unwrap();
        assert_eq!(page.matches("</script>").count(), 2);
    }
}
