use std::sync::LazyLock;

use regex::Regex;

use crate::parser::fields::{RowFields, is_pinned, resolve_record};
use crate::parser::{ParseFailure, ParsedUpgrade};

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-{3,}\s*$").unwrap());

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+\s+(upgrades?\s+available|packages?\s+ha(s|ve)\s+version\s+numbers)|chocolatey\s+has\s+determined\s+\d+)",
    )
    .unwrap()
});

static BRACKETED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\[[^\]]*\]$").unwrap());

/// Source column values the primary manager appends to each row.
const SOURCE_TOKENS: &[&str] = &["winget", "msstore"];

const DELIMITER: char = '|';

/// Text layouts a pending-upgrade report can come in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TableLayout {
    /// Header, dashed separator, whitespace-aligned columns
    /// (`Name Id Version Available Source`).
    Aligned,
    /// One `id|current|available|pinned` row per package, no header row.
    Delimited,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TabularReport {
    pub records: Vec<ParsedUpgrade>,
    /// Data rows that could not be resolved, kept verbatim for diagnostics.
    pub skipped: Vec<String>,
}

/// Parses a text upgrade report in either [`TableLayout`].
///
/// A dashed separator line selects the aligned layout; otherwise rows of
/// `|`-delimited fields select the delimited one. Output with neither is
/// [`ParseFailure::NoSeparator`].
pub fn parse_tabular<'a>(
    lines: impl IntoIterator<Item = &'a str>,
) -> Result<TabularReport, ParseFailure> {
    let lines: Vec<&str> = lines.into_iter().map(visible_text).collect();

    let (layout, rows) = match lines.iter().position(|line| SEPARATOR_RE.is_match(line)) {
        Some(separator) => (TableLayout::Aligned, &lines[separator + 1..]),
        None if lines.iter().any(|line| is_delimited_row(line)) => {
            (TableLayout::Delimited, &lines[..])
        }
        None => return Err(ParseFailure::NoSeparator),
    };

    let mut report = TabularReport::default();
    for line in rows {
        let line = line.trim();
        if line.is_empty() || SUMMARY_RE.is_match(line) {
            continue;
        }

        let fields = match layout {
            TableLayout::Aligned => aligned_row(line),
            TableLayout::Delimited if is_delimited_row(line) => delimited_row(line),
            // Banner and warning lines around delimited rows.
            TableLayout::Delimited => continue,
        };

        match fields {
            Some(fields) if is_pinned(&fields) => {}
            Some(fields) => match resolve_record(&fields) {
                Some(record) => report.records.push(record),
                None => report.skipped.push(line.to_string()),
            },
            None => report.skipped.push(line.to_string()),
        }
    }

    Ok(report)
}

// Progress spinners redraw with carriage returns; only the text after the
// last one is what a terminal would show.
fn visible_text(line: &str) -> &str {
    let line = line.trim_end_matches('\r');
    line.rsplit('\r').next().unwrap_or(line)
}

/// A delimited row starts with a package id, which never contains spaces.
/// That rules out the prose header `Output is package name | ...`.
fn is_delimited_row(line: &str) -> bool {
    let line = line.trim();
    match line.split_once(DELIMITER) {
        Some((first, _)) => !first.is_empty() && !first.contains(char::is_whitespace),
        None => false,
    }
}

fn delimited_row(line: &str) -> Option<RowFields> {
    let fields: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
    if fields.len() < 3 {
        return None;
    }

    let mut row = RowFields::default()
        .with("Id", fields[0])
        .with("Name", fields[0])
        .with("Version", fields[1])
        .with("AvailableVersion", fields[2]);
    if let Some(pinned) = fields.get(3) {
        row = row.with("Pinned", pinned);
    }
    Some(row)
}

/// Columns are anchored from the right because names may contain spaces
/// while version columns do not.
fn aligned_row(line: &str) -> Option<RowFields> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();

    let mut source = None;
    if tokens.len() > 3
        && let Some(last) = tokens.last()
        && SOURCE_TOKENS
            .iter()
            .any(|token| token.eq_ignore_ascii_case(last))
    {
        source = tokens.pop();
    }

    let row = match tokens.len() {
        count if count >= 4 => {
            let name = tokens[..count - 3].join(" ");
            RowFields::default()
                .with("Name", &strip_bracketed_suffix(&name))
                .with("Id", tokens[count - 3])
                .with("Version", tokens[count - 2])
                .with("AvailableVersion", tokens[count - 1])
        }
        3 => RowFields::default()
            .with("Name", tokens[0])
            .with("Id", tokens[1])
            .with("Version", tokens[2]),
        _ => return None,
    };

    Some(match source {
        Some(source) => row.with("Source", source),
        None => row,
    })
}

fn strip_bracketed_suffix(name: &str) -> String {
    BRACKETED_NAME_RE
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| name.to_string())
}
