use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::task::Task;

pub const EMPTY_MESSAGE: &str = "No tasks yet.";

/// Makes user-supplied text safe to embed in markup. Titles are the
/// attack surface here: `<script>` in a title must come out as
/// literal text.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Table body markup: one row per task in insertion order, or a single
/// placeholder row spanning all columns when the list is empty. Each
/// delete control carries the task id for the consumer to wire up.
pub fn render_rows(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return format!("<tr class=\"empty\"><td colspan=\"4\">{EMPTY_MESSAGE}</td></tr>\n");
    }

    let mut out = String::new();
    for task in tasks {
        let _ = writeln!(
            out,
            "<tr data-id=\"{id}\"><td>{title}</td><td>{status}</td><td>{created}</td>\
             <td><button class=\"delete\" data-id=\"{id}\">&#10005;</button></td></tr>",
            id = task.id,
            title = escape_html(&task.title),
            status = escape_html(&task.status),
            created = escape_html(&task.created_at),
        );
    }
    out
}

/// Full standalone page around the table, for `export`.
pub fn render_page(tasks: &[Task]) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Tasks</title>\n</head>\n<body>\n\
         <table>\n<thead>\n<tr><th>Title</th><th>Status</th><th>Created</th><th></th></tr>\n</thead>\n\
         <tbody>\n{}</tbody>\n</table>\n</body>\n</html>\n",
        render_rows(tasks)
    )
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        let color = cfg.get_bool("color").unwrap_or(true);
        Self { color }
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[Task]) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_task_table(out, tasks)
    }

    pub fn write_task_table<W: Write>(&self, mut out: W, tasks: &[Task]) -> anyhow::Result<()> {
        if tasks.is_empty() {
            writeln!(out, "{EMPTY_MESSAGE}")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Title".to_string(),
            "Status".to_string(),
            "Created".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let id = self.paint(&task.id.to_string(), "33");
            rows.push(vec![
                id,
                task.title.clone(),
                task.status.clone(),
                task.created_at.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
