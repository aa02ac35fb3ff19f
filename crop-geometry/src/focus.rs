// SPDX-License-Identifier: MIT
//! # Focus Point Parsing
//!
//! Each puzzle stores its zoom origin as a CSS `transform-origin`-style string
//! ("30% 70%", "center", "top left", ...). The admin dashboard writes these
//! strings; this module resolves them into normalized coordinates once per
//! generation run.
//!
//! Parsing is deliberately forgiving: a malformed component falls back to
//! center (0.5) instead of failing the run, matching how a browser treats an
//! invalid transform-origin. Both components always land in `[0, 1]`.

/// Normalized zoom-origin coordinates, each in `[0, 1]`.
///
/// `(0, 0)` is the top-left corner of the base image, `(1, 1)` the
/// bottom-right. The pivot stays fixed on screen while the image zooms out
/// around it across stages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

impl FocusPoint {
    /// Center of the image, the fallback for missing or malformed origins.
    pub const CENTER: FocusPoint = FocusPoint { x: 0.5, y: 0.5 };

    /// Build a focus point, clamping both components into `[0, 1]`.
    /// Non-finite components collapse to center.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_component(x),
            y: clamp_component(y),
        }
    }

    /// Parse a CSS `transform-origin`-style string.
    ///
    /// Accepted forms:
    /// - keywords: `center`, `left`, `right`, `top`, `bottom`
    /// - percentages: `"30% 70%"` (first is x, second is y)
    /// - combinations: `"top left"`, `"left 70%"`, `"center bottom"`
    ///
    /// A single value sets x and leaves y centered, as in CSS. Tokens past
    /// the second and anything unrecognized are ignored, so arbitrary garbage
    /// resolves to [`FocusPoint::CENTER`].
    pub fn parse(origin: &str) -> Self {
        let mut x = 0.5;
        let mut y = 0.5;

        for (slot, token) in origin.split_whitespace().take(2).enumerate() {
            match token.to_ascii_lowercase().as_str() {
                "left" => x = 0.0,
                "right" => x = 1.0,
                "top" => y = 0.0,
                "bottom" => y = 1.0,
                "center" => {}
                other => {
                    if let Some(fraction) = parse_percentage(other) {
                        // Percentages are positional: first token is x,
                        // second is y.
                        if slot == 0 {
                            x = fraction;
                        } else {
                            y = fraction;
                        }
                    }
                }
            }
        }

        Self::new(x, y)
    }
}

impl Default for FocusPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

fn clamp_component(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 }
}

/// Parse `"37.5%"` into `0.375`. Returns `None` for anything else.
fn parse_percentage(token: &str) -> Option<f64> {
    let number = token.strip_suffix('%')?;
    number.parse::<f64>().ok().map(|p| p / 100.0)
}
