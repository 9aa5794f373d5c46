//! Pointer and keyboard events delivered by the host.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Whether the modifiers extend the selection instead of replacing it.
    pub fn extends_selection(&self) -> bool {
        self.shift || self.command()
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        modifiers: Modifiers,
    },
    Wheel {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Wheel { position, .. } => *position,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Up { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Wheel { modifiers, .. } => *modifiers,
        }
    }
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name as reported by the host ("z", "Delete", "Escape", ...).
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    /// Editing command bound to this key press, if any.
    pub fn shortcut(&self) -> Option<Shortcut> {
        let key = self.key.to_ascii_lowercase();
        if self.modifiers.command() {
            return match key.as_str() {
                "z" if self.modifiers.shift => Some(Shortcut::Redo),
                "z" => Some(Shortcut::Undo),
                "y" => Some(Shortcut::Redo),
                "c" => Some(Shortcut::Copy),
                "v" => Some(Shortcut::Paste),
                "g" if self.modifiers.shift => Some(Shortcut::Ungroup),
                "g" => Some(Shortcut::Group),
                "a" => Some(Shortcut::SelectAll),
                _ => None,
            };
        }
        match key.as_str() {
            "delete" | "backspace" => Some(Shortcut::Delete),
            "escape" => Some(Shortcut::Cancel),
            _ => None,
        }
    }
}

/// Editing commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    Undo,
    Redo,
    Copy,
    Paste,
    Group,
    Ungroup,
    SelectAll,
    Delete,
    Cancel,
}

impl Shortcut {
    pub fn description(&self) -> &'static str {
        match self {
            Shortcut::Undo => "Undo",
            Shortcut::Redo => "Redo",
            Shortcut::Copy => "Copy selected nodes",
            Shortcut::Paste => "Paste nodes",
            Shortcut::Group => "Group selected nodes",
            Shortcut::Ungroup => "Ungroup selected group",
            Shortcut::SelectAll => "Select all nodes",
            Shortcut::Delete => "Delete selected nodes",
            Shortcut::Cancel => "Cancel current action",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_shortcuts() {
        let ctrl = Modifiers::ctrl();
        assert_eq!(KeyEvent::new("z", ctrl).shortcut(), Some(Shortcut::Undo));
        assert_eq!(KeyEvent::new("Y", ctrl).shortcut(), Some(Shortcut::Redo));
        assert_eq!(KeyEvent::new("c", ctrl).shortcut(), Some(Shortcut::Copy));
        assert_eq!(KeyEvent::new("v", ctrl).shortcut(), Some(Shortcut::Paste));

        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(KeyEvent::new("z", meta).shortcut(), Some(Shortcut::Undo));
        let meta_shift = Modifiers { shift: true, ..meta };
        assert_eq!(KeyEvent::new("z", meta_shift).shortcut(), Some(Shortcut::Redo));
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(KeyEvent::new("z", Modifiers::NONE).shortcut(), None);
        assert_eq!(
            KeyEvent::new("Delete", Modifiers::NONE).shortcut(),
            Some(Shortcut::Delete)
        );
        assert_eq!(
            KeyEvent::new("Escape", Modifiers::NONE).shortcut(),
            Some(Shortcut::Cancel)
        );
    }

    #[test]
    fn test_pointer_accessors() {
        let event = PointerEvent::Wheel {
            position: Point::new(3.0, 4.0),
            delta: Vec2::new(0.0, 1.0),
            modifiers: Modifiers::shift(),
        };
        assert_eq!(event.position(), Point::new(3.0, 4.0));
        assert!(event.modifiers().extends_selection());
    }
}
