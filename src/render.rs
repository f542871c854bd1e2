use termwiz::cell::{CellAttributes, Intensity};
use termwiz::color::ColorAttribute;
use termwiz::surface::{Change, Position, Surface};
use unicode_width::UnicodeWidthChar;

use crate::event::Size;

/// Rows each pane spends on border, padding, title and the blank line
/// below the title.
pub const CHROME: usize = 6;

const MIN_FILES_WIDTH: usize = 24;
const MIN_CONTENT_WIDTH: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `horizontal` columns and `vertical` rows on every side.
    pub fn inset(self, horizontal: usize, vertical: usize) -> Self {
        Self {
            x: self.x + horizontal,
            y: self.y + vertical,
            width: self.width.saturating_sub(horizontal * 2),
            height: self.height.saturating_sub(vertical * 2),
        }
    }

    pub fn bottom(self) -> usize {
        self.y + self.height
    }

    /// A `width` x `height` rectangle centered inside `self`.
    pub fn centered(self, width: usize, height: usize) -> Self {
        let width = width.min(self.width);
        let height = height.min(self.height);
        Self {
            x: self.x + (self.width - width) / 2,
            y: self.y + (self.height - height) / 2,
            width,
            height,
        }
    }
}

/// Screen split: file list on the left, content on the right, status bar
/// on the bottom row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub files: Rect,
    pub content: Rect,
    pub status: Rect,
}

impl Layout {
    pub fn new(size: Size) -> Self {
        let width = usize::from(size.width);
        let height = usize::from(size.height);
        let pane_height = pane_height(size);
        let (left, right) = pane_widths(width);

        Self {
            files: Rect::new(0, 0, left, pane_height),
            content: Rect::new(left + 1, 0, right, pane_height),
            status: Rect::new(0, height.saturating_sub(1), width, height.min(1)),
        }
    }

    /// Rows of the file list that fit inside the pane.
    pub fn files_visible(&self) -> usize {
        self.files.height.saturating_sub(CHROME)
    }

    pub fn content_visible(&self) -> usize {
        self.content.height.saturating_sub(CHROME)
    }

    /// Columns available for content text.
    pub fn content_text_width(&self) -> usize {
        self.content.width.saturating_sub(4).max(1)
    }
}

fn pane_height(size: Size) -> usize {
    usize::from(size.height).saturating_sub(1)
}

fn pane_widths(width: usize) -> (usize, usize) {
    let mut left = (width / 3).max(MIN_FILES_WIDTH);
    if left > width.saturating_sub(MIN_CONTENT_WIDTH) {
        left = width / 2;
    }
    let right = width
        .saturating_sub(left + 1)
        .max(MIN_CONTENT_WIDTH);
    (left, right)
}

/// Thin painter over a termwiz surface. Everything written is clipped to the
/// surface.
pub struct Renderer<'a> {
    surface: &'a mut Surface,
}

impl<'a> Renderer<'a> {
    pub fn new(surface: &'a mut Surface) -> Self {
        Self { surface }
    }

    pub fn text(&mut self, x: usize, y: usize, text: &str) {
        self.styled(x, y, usize::MAX, text, &CellAttributes::default());
    }

    /// Write `text` at `(x, y)`, cut at `max_width` display columns. Returns
    /// the number of columns written.
    pub fn styled(
        &mut self,
        x: usize,
        y: usize,
        max_width: usize,
        text: &str,
        attrs: &CellAttributes,
    ) -> usize {
        let (width, height) = self.surface.dimensions();
        if y >= height || x >= width {
            return 0;
        }

        let budget = max_width.min(width - x);
        let mut used = 0;
        let mut content = String::new();
        for ch in text.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if used + ch_width > budget {
                break;
            }
            used += ch_width;
            content.push(ch);
        }

        if content.is_empty() {
            return 0;
        }

        self.move_to(x, y);
        self.surface
            .add_change(Change::AllAttributes(attrs.clone()));
        self.surface.add_change(Change::Text(content));
        used
    }

    /// Paint `area` with blanks in `attrs`.
    pub fn fill(&mut self, area: Rect, attrs: &CellAttributes) {
        let blank = " ".repeat(area.width);
        for y in area.y..area.bottom() {
            self.styled(area.x, y, area.width, &blank, attrs);
        }
    }

    pub fn draw_border(&mut self, area: Rect, attrs: &CellAttributes) {
        if area.width < 2 || area.height < 2 {
            return;
        }

        let right = area.x + area.width - 1;
        let bottom = area.y + area.height - 1;
        let horizontal = "─".repeat(area.width - 2);

        self.write_char(area.x, area.y, '┌', attrs);
        self.styled(area.x + 1, area.y, area.width - 2, &horizontal, attrs);
        self.write_char(right, area.y, '┐', attrs);

        for y in (area.y + 1)..bottom {
            self.write_char(area.x, y, '│', attrs);
            self.write_char(right, y, '│', attrs);
        }

        self.write_char(area.x, bottom, '└', attrs);
        self.styled(area.x + 1, bottom, area.width - 2, &horizontal, attrs);
        self.write_char(right, bottom, '┘', attrs);
    }

    fn write_char(&mut self, x: usize, y: usize, ch: char, attrs: &CellAttributes) {
        let mut buf = [0; 4];
        self.styled(x, y, 1, ch.encode_utf8(&mut buf), attrs);
    }

    fn move_to(&mut self, x: usize, y: usize) {
        self.surface.add_change(Change::CursorPosition {
            x: Position::Absolute(x),
            y: Position::Absolute(y),
        });
    }
}

pub fn fg(index: u8) -> CellAttributes {
    let mut attrs = CellAttributes::default();
    attrs.set_foreground(ColorAttribute::PaletteIndex(index));
    attrs
}

pub fn bold(attrs: CellAttributes) -> CellAttributes {
    let mut attrs = attrs;
    attrs.set_intensity(Intensity::Bold);
    attrs
}

pub fn with_bg(attrs: CellAttributes, index: u8) -> CellAttributes {
    let mut attrs = attrs;
    attrs.set_background(ColorAttribute::PaletteIndex(index));
    attrs
}
