/// Outcome of mapping a settled scroll distance onto the strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Frame count from the start of the spin to the centred frame.
    pub raw_index: i64,
    /// On-screen frame to highlight.
    pub frame_index: usize,
    /// Logical winner, independent of how the strip was repeated.
    pub item_index: usize,
    /// `raw_index * frame_width`, the scroll distance the strip snaps to.
    pub snapped_scroll: f64,
}

fn wrap(raw: i64, len: usize) -> usize {
    let len = len as i64;
    (((raw % len) + len) % len) as usize
}

/// Resolves a cumulative (un-wrapped) scroll distance.
///
/// # Panics
///
/// Panics when `item_count` or `frame_count` is zero; an empty item set must
/// be replaced by the demo fallback before a spin is allowed.
pub fn resolve(scroll: f64, frame_width: f64, frame_count: usize, item_count: usize) -> Resolution {
    assert!(item_count > 0, "resolve called with an empty item set");
    assert!(frame_count > 0, "resolve called with an empty frame list");
    let raw_index = (scroll / frame_width).round() as i64;
    Resolution {
        raw_index,
        frame_index: wrap(raw_index, frame_count),
        item_index: wrap(raw_index, item_count),
        snapped_scroll: raw_index as f64 * frame_width,
    }
}
