//! Keyboard and swipe mapping for the open viewer.

/// Minimum horizontal travel, in pixels, for a swipe to count.
pub const SWIPE_MIN_DX: f64 = 60.0;
/// Maximum vertical drift, in pixels, tolerated during a swipe.
pub const SWIPE_MAX_DY: f64 = 120.0;

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Char(char),
    Other,
}

impl Key {
    /// Parses a DOM-style key name (`"Escape"`, `"ArrowLeft"`, `"d"`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// What the user asked the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Close,
    Navigate(Direction),
    Download,
}

/// Maps a key press to an action. Everything is ignored while closed.
pub fn action_for_key(key: Key, open: bool) -> Option<ViewerAction> {
    if !open {
        return None;
    }
    match key {
        Key::Escape => Some(ViewerAction::Close),
        Key::ArrowRight => Some(ViewerAction::Navigate(Direction::Next)),
        Key::ArrowLeft => Some(ViewerAction::Navigate(Direction::Prev)),
        Key::Char('d' | 'D') => Some(ViewerAction::Download),
        _ => None,
    }
}

/// Maps a completed touch gesture (end minus start) to navigation.
///
/// Leftward swipes advance, rightward swipes go back.
pub fn action_for_swipe(dx: f64, dy: f64, open: bool) -> Option<ViewerAction> {
    if !open || dx.abs() <= SWIPE_MIN_DX || dy.abs() >= SWIPE_MAX_DY {
        return None;
    }
    let direction = if dx < 0.0 {
        Direction::Next
    } else {
        Direction::Prev
    };
    Some(ViewerAction::Navigate(direction))
}
