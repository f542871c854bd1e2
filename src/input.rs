//! Single-line text input used for the commit message.

use unicode_width::UnicodeWidthChar;

use crate::event::{Key, KeyCode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputMsg {
    InsertChar(char),
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,
    DeleteToStart,
    DeleteToEnd,
    MoveLeft,
    MoveRight,
    MoveWordLeft,
    MoveWordRight,
    MoveToStart,
    MoveToEnd,
}

/// Editable buffer with a character cursor.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    chars: Vec<char>,
    cursor: usize,
    char_limit: Option<usize>,
    placeholder: String,
}

/// What the renderer needs to draw an input: the visible text window and the
/// cursor column inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputView {
    pub text: String,
    pub cursor_column: usize,
    pub is_placeholder: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = Some(limit);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Forward a key press; returns whether the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match default_keybindings(key, |msg| msg) {
            Some(msg) => {
                self.update(msg);
                true
            }
            None => false,
        }
    }

    /// Returns whether the buffer or cursor changed.
    pub fn update(&mut self, msg: InputMsg) -> bool {
        match msg {
            InputMsg::InsertChar(ch) => self.insert_text(&ch.to_string()),
            InputMsg::DeleteBackward => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
                self.chars.remove(self.cursor);
                true
            }
            InputMsg::DeleteForward => {
                if self.cursor >= self.chars.len() {
                    return false;
                }
                self.chars.remove(self.cursor);
                true
            }
            InputMsg::DeleteWordBackward => {
                let start = self.word_start_before(self.cursor);
                self.delete_range(start, self.cursor)
            }
            InputMsg::DeleteToStart => self.delete_range(0, self.cursor),
            InputMsg::DeleteToEnd => self.delete_range(self.cursor, self.chars.len()),
            InputMsg::MoveLeft => self.move_to(self.cursor.saturating_sub(1)),
            InputMsg::MoveRight => self.move_to((self.cursor + 1).min(self.chars.len())),
            InputMsg::MoveWordLeft => self.move_to(self.word_start_before(self.cursor)),
            InputMsg::MoveWordRight => self.move_to(self.word_end_after(self.cursor)),
            InputMsg::MoveToStart => self.move_to(0),
            InputMsg::MoveToEnd => self.move_to(self.chars.len()),
        }
    }

    /// Window of the buffer that fits `width` columns with the cursor kept
    /// on screen.
    pub fn view(&self, width: usize) -> InputView {
        if self.chars.is_empty() {
            let text: String = self.placeholder.chars().take(width).collect();
            return InputView {
                text,
                cursor_column: 0,
                is_placeholder: !self.placeholder.is_empty(),
            };
        }
        if width == 0 {
            return InputView {
                text: String::new(),
                cursor_column: 0,
                is_placeholder: false,
            };
        }

        // Reserve one column for a cursor parked after the last char.
        let budget = width.saturating_sub(1).max(1);
        let mut start = 0;
        while self.columns(start, self.cursor) > budget {
            start += 1;
        }

        let mut text = String::new();
        let mut used = 0;
        for ch in &self.chars[start..] {
            let ch_width = ch.width().unwrap_or(0);
            if used + ch_width > width {
                break;
            }
            used += ch_width;
            text.push(*ch);
        }

        InputView {
            text,
            cursor_column: self.columns(start, self.cursor),
            is_placeholder: false,
        }
    }

    fn columns(&self, start: usize, end: usize) -> usize {
        self.chars[start..end]
            .iter()
            .map(|ch| ch.width().unwrap_or(0))
            .sum()
    }

    fn insert_text(&mut self, text: &str) -> bool {
        let mut changed = false;
        for ch in text.chars().filter(|ch| !ch.is_control()) {
            if self
                .char_limit
                .is_some_and(|limit| self.chars.len() >= limit)
            {
                break;
            }
            self.chars.insert(self.cursor, ch);
            self.cursor += 1;
            changed = true;
        }
        changed
    }

    fn delete_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end {
            return false;
        }
        self.chars.drain(start..end);
        self.cursor = start;
        true
    }

    fn move_to(&mut self, index: usize) -> bool {
        let changed = self.cursor != index;
        self.cursor = index;
        changed
    }

    fn word_start_before(&self, index: usize) -> usize {
        let mut index = index;
        while index > 0 && self.chars[index - 1].is_whitespace() {
            index -= 1;
        }
        while index > 0 && !self.chars[index - 1].is_whitespace() {
            index -= 1;
        }
        index
    }

    fn word_end_after(&self, index: usize) -> usize {
        let len = self.chars.len();
        let mut index = index;
        while index < len && self.chars[index].is_whitespace() {
            index += 1;
        }
        while index < len && !self.chars[index].is_whitespace() {
            index += 1;
        }
        index
    }
}

/// Translate editing keys into input messages. Enter, Esc and Tab are left
/// to the owner.
pub fn default_keybindings<UpdateMsg>(
    key: Key,
    map: impl Fn(InputMsg) -> UpdateMsg,
) -> Option<UpdateMsg> {
    let msg = match key.code {
        KeyCode::Char(ch) if !key.ctrl && !key.alt => Some(InputMsg::InsertChar(ch)),
        KeyCode::Char('h') if key.ctrl => Some(InputMsg::DeleteBackward),
        KeyCode::Char('w') if key.ctrl => Some(InputMsg::DeleteWordBackward),
        KeyCode::Char('u') if key.ctrl => Some(InputMsg::DeleteToStart),
        KeyCode::Char('k') if key.ctrl => Some(InputMsg::DeleteToEnd),
        KeyCode::Char('a') if key.ctrl => Some(InputMsg::MoveToStart),
        KeyCode::Char('e') if key.ctrl => Some(InputMsg::MoveToEnd),
        KeyCode::Char(_) => None,
        KeyCode::Backspace if key.ctrl || key.alt => Some(InputMsg::DeleteWordBackward),
        KeyCode::Backspace => Some(InputMsg::DeleteBackward),
        KeyCode::Delete => Some(InputMsg::DeleteForward),
        KeyCode::Left if key.ctrl || key.alt => Some(InputMsg::MoveWordLeft),
        KeyCode::Right if key.ctrl || key.alt => Some(InputMsg::MoveWordRight),
        KeyCode::Left => Some(InputMsg::MoveLeft),
        KeyCode::Right => Some(InputMsg::MoveRight),
        KeyCode::Home => Some(InputMsg::MoveToStart),
        KeyCode::End => Some(InputMsg::MoveToEnd),
        KeyCode::Enter
        | KeyCode::Esc
        | KeyCode::Tab
        | KeyCode::Up
        | KeyCode::Down
        | KeyCode::PageUp
        | KeyCode::PageDown => None,
    }?;

    Some(map(msg))
}
