//! Table detection over extracted page text.
//!
//! PDF text extraction loses the table grid, so tables are recovered from
//! runs of lines that split into the same number of cells. Cells are
//! separated by `|`, tabs, or two or more spaces.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Table;

/// Tab or a run of at least two spaces.
static CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+|\s{2,}").expect("valid regex"));

/// Minimum number of lines (header included) for a run to count as a table.
const MIN_TABLE_LINES: usize = 2;

/// Split a line into cells, or `None` when it doesn't look like a table row.
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cells: Vec<String> = if trimmed.contains('|') {
        trimmed
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect()
    } else {
        CELL_GAP.split(trimmed).map(|c| c.trim().to_string()).collect()
    };

    // Markdown-style separator rows carry no data.
    if cells.iter().all(|c| c.chars().all(|ch| matches!(ch, '-' | ':' | ' '))) {
        return None;
    }

    (cells.len() >= 2).then_some(cells)
}

/// Detect tables in the text of one page.
pub fn detect_tables(page: u32, text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        if is_separator(line) {
            continue;
        }
        match split_row(line) {
            Some(cells) => {
                if run.first().is_some_and(|first| first.len() != cells.len()) {
                    flush(page, &mut run, &mut tables);
                }
                run.push(cells);
            }
            None => flush(page, &mut run, &mut tables),
        }
    }
    flush(page, &mut run, &mut tables);

    tables
}

/// Close the current run, keeping it as a table when it is long enough.
fn flush(page: u32, run: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if run.len() >= MIN_TABLE_LINES {
        let mut rows = std::mem::take(run);
        let headers = rows.remove(0);
        tables.push(Table { page, table_number: tables.len() as u32 + 1, headers, rows });
    }
    run.clear();
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed.chars().all(|c| matches!(c, '-' | ':' | '|' | ' ' | '+'))
}
