use termwiz::cell::CellAttributes;
use termwiz::surface::Surface;
use unicode_width::UnicodeWidthChar;

use super::{Explorer, Focus, Mode, content, help_lines};
use crate::modal::{ModalController, ModalState};
use crate::render::{Layout, Rect, Renderer, bold, fg, with_bg};
use crate::rows::Row;
use crate::viewport;

const ACCENT: u8 = 62;
const MUTED: u8 = 240;
const ERROR: u8 = 160;
const ADDED: u8 = 71;
const HUNK: u8 = 69;
const STATUS_BAR_BG: u8 = 236;
const STATUS_BAR_FG: u8 = 250;
const UNFOCUSED_SELECTION: u8 = 238;

const MODAL_WIDTH: usize = 56;

pub(super) fn draw(explorer: &Explorer, surface: &mut Surface) {
    let layout = explorer.layout();
    let mut renderer = Renderer::new(surface);

    draw_files(explorer, &layout, &mut renderer);
    draw_content(explorer, &layout, &mut renderer);
    draw_status_bar(explorer, &layout, &mut renderer);

    if explorer.modal.is_open() {
        draw_modal(&explorer.modal, &layout, &mut renderer);
    }
}

/// Draw the pane frame and title; returns the body area.
fn pane(renderer: &mut Renderer<'_>, area: Rect, title: &str, focused: bool) -> Rect {
    let color = if focused { ACCENT } else { MUTED };
    renderer.draw_border(area, &fg(color));

    let inner = area.inset(2, 2);
    let title_attrs = if focused {
        bold(fg(ACCENT))
    } else {
        bold(CellAttributes::default())
    };
    renderer.styled(inner.x, inner.y, inner.width, title, &title_attrs);

    Rect {
        y: inner.y + 2,
        height: inner.height.saturating_sub(2),
        ..inner
    }
}

fn draw_files(explorer: &Explorer, layout: &Layout, renderer: &mut Renderer<'_>) {
    let focused = explorer.focus == Focus::Files;
    let body = pane(renderer, layout.files, "Files", focused);

    if explorer.rows.is_empty() {
        let message = match explorer.mode {
            Mode::Explorer => "No files found.",
            Mode::Diff => "No changes detected.",
        };
        renderer.styled(body.x, body.y, body.width, message, &CellAttributes::default());
        return;
    }

    let visible = viewport::slice(&explorer.rows, explorer.file_offset, body.height);
    for (line, row) in visible.iter().enumerate() {
        let index = explorer.file_offset + line;
        let y = body.y + line;
        let selected = index == explorer.selected;

        let indent = row.depth * 2;
        let mut x = body.x + indent;
        let mut width = body.width.saturating_sub(indent);

        let (marker, marker_attrs) = row_marker(row);
        let used = renderer.styled(x, y, width, &marker, &marker_attrs);
        x += used;
        width = width.saturating_sub(used);

        let mut attrs = if row.ignored {
            fg(MUTED)
        } else {
            CellAttributes::default()
        };
        if selected {
            let bg = if focused { ACCENT } else { UNFOCUSED_SELECTION };
            attrs = with_bg(attrs, bg);
        }
        let name = if row.is_dir {
            format!("{}/", row.name())
        } else {
            row.name().to_string()
        };
        renderer.styled(x, y, width, &name, &attrs);
    }
}

fn row_marker(row: &Row) -> (String, CellAttributes) {
    if row.is_dir {
        let marker = if row.collapsed { "▸ " } else { "▾ " };
        return (marker.to_string(), fg(MUTED));
    }

    let status = row
        .entry
        .as_ref()
        .map(|entry| entry.status.as_str())
        .unwrap_or("");
    let attrs = status_color(status).map_or_else(CellAttributes::default, fg);
    (format!("{status:<2} "), attrs)
}

fn status_color(status: &str) -> Option<u8> {
    let status = status.trim();
    if status.is_empty() {
        return None;
    }
    let color = if status.starts_with("??") {
        178
    } else if status.starts_with("!!") {
        MUTED
    } else if status.contains('D') {
        ERROR
    } else if status.contains('A') {
        ADDED
    } else if status.contains('M') {
        214
    } else if status.contains('R') {
        HUNK
    } else {
        111
    };
    Some(color)
}

fn draw_content(explorer: &Explorer, layout: &Layout, renderer: &mut Renderer<'_>) {
    let focused = explorer.focus == Focus::Content;
    let title = match explorer.mode {
        Mode::Explorer => "File",
        Mode::Diff => "Diff",
    };
    let body = pane(renderer, layout.content, title, focused);

    if let Some(error) = &explorer.last_error {
        let lines = content::wrap(&[format!("Error: {}", error.message)], body.width);
        for (line, text) in lines.iter().take(body.height).enumerate() {
            renderer.styled(body.x, body.y + line, body.width, text, &fg(ERROR));
        }
        return;
    }

    if explorer.content_lines.is_empty() {
        let has_file = explorer
            .selected_row()
            .is_some_and(|row| row.entry.is_some());
        let message = match (explorer.mode, has_file) {
            (Mode::Explorer, true) => "No file content to display.",
            (Mode::Diff, true) => "No diff for selected file.",
            (Mode::Explorer, false) => "Select a file to view its contents.",
            (Mode::Diff, false) => "Select a file to view its diff.",
        };
        renderer.styled(body.x, body.y, body.width, message, &CellAttributes::default());
        return;
    }

    let visible = viewport::slice(&explorer.content_lines, explorer.content_offset, body.height);
    for (line, text) in visible.iter().enumerate() {
        let attrs = match explorer.mode {
            Mode::Diff => diff_line_attrs(text),
            Mode::Explorer => CellAttributes::default(),
        };
        renderer.styled(body.x, body.y + line, body.width, text, &attrs);
    }
}

fn diff_line_attrs(line: &str) -> CellAttributes {
    if line.starts_with("+++ ") || line.starts_with("--- ") || line.starts_with("@@") {
        fg(HUNK)
    } else if line.starts_with('+') {
        fg(ADDED)
    } else if line.starts_with('-') {
        fg(ERROR)
    } else {
        CellAttributes::default()
    }
}

fn draw_status_bar(explorer: &Explorer, layout: &Layout, renderer: &mut Renderer<'_>) {
    let attrs = with_bg(fg(STATUS_BAR_FG), STATUS_BAR_BG);
    renderer.fill(layout.status, &attrs);

    let summary = if explorer.summary.is_empty() {
        "git: -"
    } else {
        explorer.summary.as_str()
    };
    let mut text = format!(
        "Mode: {}  |  {}  |  h for help",
        explorer.mode.label(),
        summary
    );
    if explorer.show_ignored {
        text.push_str("  |  ignored shown");
    }

    let inner = layout.status.inset(1, 0);
    renderer.styled(inner.x, inner.y, inner.width, &text, &attrs);
}

fn draw_modal(modal: &ModalController, layout: &Layout, renderer: &mut Renderer<'_>) {
    let screen = Rect::new(
        0,
        0,
        layout.status.width,
        layout.files.height + layout.status.height,
    );
    let width = MODAL_WIDTH.min(screen.width);
    let text_width = width.saturating_sub(6);

    let (title, mut body) = match modal.state() {
        ModalState::Commit => (
            "Commit",
            vec![
                "Enter a commit message:".to_string(),
                String::new(),
                String::new(),
                "Enter to commit, Esc to cancel.".to_string(),
            ],
        ),
        ModalState::Push => (
            "Push",
            vec![
                "Commit created. Push now?".to_string(),
                String::new(),
                "Enter to push, Esc to cancel.".to_string(),
            ],
        ),
        ModalState::Help => ("Help", help_lines()),
        ModalState::None => return,
    };
    if modal.is_pending() {
        body.push("Working...".to_string());
    }
    let mut error_line = None;
    if let Some(error) = modal.error() {
        body.push(String::new());
        error_line = Some(body.len());
        body.push(error.to_string());
    }

    // Border and padding on each side, plus the title and a spacer.
    let height = body.len() + 6;
    let area = screen.centered(width, height);
    renderer.fill(area, &CellAttributes::default());
    renderer.draw_border(area, &fg(ACCENT));

    let inner = area.inset(3, 2);
    renderer.styled(inner.x, inner.y, inner.width, title, &bold(fg(ACCENT)));

    let top = inner.y + 2;
    for (line, text) in body.iter().enumerate() {
        let attrs = if Some(line) == error_line {
            fg(ERROR)
        } else {
            CellAttributes::default()
        };
        renderer.styled(inner.x, top + line, text_width, text, &attrs);
    }

    if modal.state() == ModalState::Commit {
        draw_input(modal, renderer, inner.x, top + 1, text_width);
    }
}

fn draw_input(
    modal: &ModalController,
    renderer: &mut Renderer<'_>,
    x: usize,
    y: usize,
    width: usize,
) {
    let view = modal.input_view(width);
    let attrs = if view.is_placeholder {
        fg(MUTED)
    } else {
        CellAttributes::default()
    };
    renderer.styled(x, y, width, &view.text, &attrs);

    let cursor = char_at_column(&view.text, view.cursor_column).unwrap_or(' ');
    let mut cursor_attrs = attrs;
    cursor_attrs.set_reverse(true);
    let mut buf = [0; 4];
    renderer.styled(
        x + view.cursor_column,
        y,
        1,
        cursor.encode_utf8(&mut buf),
        &cursor_attrs,
    );
}

fn char_at_column(text: &str, column: usize) -> Option<char> {
    let mut used = 0;
    for ch in text.chars() {
        if used == column {
            return Some(ch);
        }
        used += ch.width().unwrap_or(0);
        if used > column {
            return None;
        }
    }
    None
}
