//! Relative-length resolution.
//!
//! Node sizes are stored as CSS-like length strings (`"200px"`, `"50%"`,
//! `"10vh"`, `"5vw"`, `"auto"`). Resolution never fails: anything that cannot
//! be parsed resolves to `0.0` so half-typed values still render.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Default global viewport width used for `vw` lengths.
pub const DEFAULT_WINDOW_WIDTH: f64 = 1280.0;

/// Resolves length expressions against reference dimensions.
///
/// `vw` lengths always use [`UnitResolver::window`]'s width, not the
/// viewport dimension passed to [`UnitResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitResolver {
    /// Global viewport (host window) size.
    pub window: Size,
}

impl Default for UnitResolver {
    fn default() -> Self {
        Self {
            window: Size::new(DEFAULT_WINDOW_WIDTH, 720.0),
        }
    }
}

impl UnitResolver {
    /// Create a resolver for the given host window size.
    pub fn new(window: Size) -> Self {
        Self { window }
    }

    /// Resolve a length expression to a concrete number.
    pub fn resolve(&self, expr: &str, parent: f64, viewport: f64) -> f64 {
        resolve_length(expr, parent, viewport, self.window.width)
    }
}

/// Resolve `expr` against a parent dimension and a viewport dimension.
///
/// `window_width` is only consulted for `vw` lengths.
pub fn resolve_length(expr: &str, parent: f64, viewport: f64, window_width: f64) -> f64 {
    let expr = expr.trim();
    if expr == "auto" {
        return parent;
    }
    let value = leading_float(expr);
    if expr.ends_with('%') {
        parent * value / 100.0
    } else if expr.ends_with("vh") {
        viewport * value / 100.0
    } else if expr.ends_with("vw") {
        window_width * value / 100.0
    } else {
        value
    }
}

/// Format a number as a pixel length.
pub fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Parse the longest numeric prefix of `s`, returning `0.0` when there is none.
pub fn leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut last_valid = 0;
    while end < bytes.len() {
        let c = bytes[end];
        if c.is_ascii_digit() {
            seen_digit = true;
            end += 1;
            last_valid = end;
        } else if c == b'.' && !seen_dot && !seen_exp {
            seen_dot = true;
            end += 1;
            if seen_digit {
                last_valid = end;
            }
        } else if (c == b'e' || c == b'E') && seen_digit && !seen_exp {
            seen_exp = true;
            end += 1;
            if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
                end += 1;
            }
        } else {
            break;
        }
    }
    if !seen_digit {
        return 0.0;
    }
    s[..last_valid]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
