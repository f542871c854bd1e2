//! Scroll-window arithmetic shared by the file list and the content pane.
//!
//! Offsets and heights are plain `usize`s; a viewport that has no room
//! (`visible == 0`) always resolves to offset 0.

/// Bound `offset` so a window of `visible` rows never runs past `total`.
pub fn clamp(offset: usize, total: usize, visible: usize) -> usize {
    if total <= visible {
        return 0;
    }
    offset.min(total - visible)
}

/// Move `offset` the minimum distance needed for `selected` to be on screen.
pub fn ensure_visible(selected: usize, offset: usize, visible: usize, total: usize) -> usize {
    if visible == 0 {
        return 0;
    }

    let mut offset = offset;
    if selected < offset {
        offset = selected;
    } else if selected >= offset + visible {
        offset = selected + 1 - visible;
    }
    clamp(offset, total, visible)
}

/// Apply a signed scroll delta to `offset`, clamped to the scrollable range.
pub fn scroll(offset: usize, delta: isize, total: usize, visible: usize) -> usize {
    if visible == 0 {
        return 0;
    }
    clamp(offset.saturating_add_signed(delta), total, visible)
}

/// The `visible` items starting at `offset`; the start is pulled back onto
/// the last item when it overshoots.
pub fn slice<T>(items: &[T], offset: usize, visible: usize) -> &[T] {
    if visible == 0 || items.is_empty() {
        return &[];
    }
    let start = offset.min(items.len() - 1);
    let end = start.saturating_add(visible).min(items.len());
    &items[start..end]
}

/// Move an index by a signed delta inside `0..len`.
pub fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.saturating_add_signed(delta).min(len - 1)
}
