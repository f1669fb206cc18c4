//! Terminal output: status notes on stderr, plain tables on stdout.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

fn paint(color: &str, text: &str) -> String {
    if supports_color() {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Notes (stderr, so stdout stays pipeable)
// ---------------------------------------------------------------------------

pub fn note_warn(msg: &str) {
    eprintln!("{} {msg}", paint(YELLOW, "warning:"));
}

pub fn note_error(msg: &str) {
    eprintln!("{} {msg}", paint(RED, "error:"));
}

pub fn note_success(msg: &str) {
    eprintln!("{} {msg}", paint(GREEN, "ok:"));
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub header: String,
    pub align: Align,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
            max_width: None,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
            max_width: None,
        }
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width.max(1));
        self
    }
}

/// Render rows under a header; over-long cells are cut with an ellipsis.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (width, (column, cell)) in widths.iter_mut().zip(columns.iter().zip(row)) {
            let w = visible_width(cell);
            *width = (*width).max(column.max_width.map_or(w, |max| w.min(max)));
        }
    }

    let line = |cells: Vec<String>| format!("  {}", cells.join("  ").trim_end());

    let mut out = String::new();
    let header = columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| pad_cell(&column.header, width, &column.align))
        .collect();
    out.push_str(&paint(BOLD, &line(header)));
    out.push('\n');
    out.push_str(&paint(
        DIM,
        &line(widths.iter().map(|&w| "-".repeat(w)).collect()),
    ));
    out.push('\n');

    for row in rows {
        let cells = columns
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (column, &width))| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad_cell(&fit(cell, width), width, &column.align)
            })
            .collect();
        out.push_str(&line(cells));
        out.push('\n');
    }
    out
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn fit(cell: &str, width: usize) -> String {
    if visible_width(cell) <= width {
        return cell.to_string();
    }
    let kept: String = strip_ansi(cell).chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = " ".repeat(width.saturating_sub(visible_width(s)));
    match align {
        Align::Left => format!("{s}{pad}"),
        Align::Right => format!("{pad}{s}"),
    }
}
