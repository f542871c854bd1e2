//! Shaping fetched text into display lines.

use unicode_width::UnicodeWidthChar;

use super::Mode;

const TAB_WIDTH: usize = 4;

/// Display lines for `raw` in `mode`. Explorer mode wraps at `width`
/// columns; diffs are kept line for line.
pub fn shape(raw: &str, mode: Mode, width: usize) -> Vec<String> {
    let lines = split_lines(raw);
    match mode {
        Mode::Explorer => wrap(&lines, width),
        Mode::Diff => lines,
    }
}

/// Split into lines with tabs expanded. Blank text has no lines at all.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    text.trim_end_matches('\n')
        .split('\n')
        .map(|line| expand_tabs(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    line.replace('\t', &" ".repeat(TAB_WIDTH))
}

/// Hard-wrap every line at `width` display columns. Empty lines survive as
/// empty rows.
pub fn wrap(lines: &[String], width: usize) -> Vec<String> {
    if width == 0 {
        return lines.to_vec();
    }

    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let mut current = String::new();
        let mut used = 0;
        for ch in line.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if used + ch_width > width && !current.is_empty() {
                out.push(std::mem::take(&mut current));
                used = 0;
            }
            current.push(ch);
            used += ch_width;
        }
        out.push(current);
    }
    out
}
