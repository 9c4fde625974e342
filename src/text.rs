use crate::error::{Error, Result};
use crate::text_metrics;

/// Lines may run this much wider than the requested width before breaking.
pub const WRAP_OVERPROVISION: f32 = 1.28;

/// Width of `text` at `font_size` in `font_family`, or `None` when no face is
/// available. Same shape as [`text_metrics::measure_text_width`].
pub type MeasureFn = fn(text: &str, font_size: f32, font_family: &str) -> Option<f32>;

/// Measures and greedily word-wraps single-style text runs.
#[derive(Clone, Copy)]
pub struct TextLayoutMeasurer {
    fast_metrics: bool,
    system: MeasureFn,
}

impl TextLayoutMeasurer {
    pub fn new(fast_metrics: bool) -> Self {
        Self {
            fast_metrics,
            system: text_metrics::measure_text_width,
        }
    }

    /// Calibrated character table only; never touches the font database.
    pub fn fast() -> Self {
        Self::new(true)
    }

    /// Font-backed measurement through `system` instead of the system font
    /// database.
    pub fn with_system_metrics(system: MeasureFn) -> Self {
        Self {
            fast_metrics: false,
            system,
        }
    }

    pub fn measure_width(&self, text: &str, font_family: &str, font_size: f32) -> Result<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }
        if self.fast_metrics {
            return Ok(fallback_text_width(text, font_size));
        }
        (self.system)(text, font_size, font_family).ok_or_else(|| {
            Error::Measurement {
                font_family: font_family.to_string(),
            }
        })
    }

    /// Splits `text` on spaces and packs words into lines no wider than
    /// `max_width * WRAP_OVERPROVISION`. A word that alone exceeds the limit
    /// gets a line of its own and is never broken.
    pub fn wrap(
        &self,
        text: &str,
        font_family: &str,
        font_size: f32,
        max_width: f32,
    ) -> Result<Vec<String>> {
        let limit = max_width * WRAP_OVERPROVISION;
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split(' ').filter(|word| !word.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if self.measure_width(&candidate, font_family, font_size)? > limit {
                push_line(&mut lines, &current);
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        push_line(&mut lines, &current);

        Ok(lines)
    }
}

impl std::fmt::Debug for TextLayoutMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutMeasurer")
            .field("fast_metrics", &self.fast_metrics)
            .finish_non_exhaustive()
    }
}

impl Default for TextLayoutMeasurer {
    fn default() -> Self {
        Self::fast()
    }
}

fn push_line(lines: &mut Vec<String>, line: &str) {
    let trimmed = line.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
}

pub(crate) fn char_width_factor(ch: char) -> f32 {
    // Advance widths in em, carried over from a Mermaid renderer's calibration
    // for its default sans face; not measured from Tahoma.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'A' => 0.652,
        'B' => 0.648,
        'C' => 0.734,
        'D' => 0.723,
        'E' => 0.594,
        'F' => 0.575,
        'G' | 'H' => 0.742,
        'I' => 0.272,
        'J' => 0.557,
        'K' => 0.648,
        'L' => 0.559,
        'M' => 0.903,
        'N' => 0.763,
        'O' => 0.754,
        'P' => 0.623,
        'Q' => 0.755,
        'R' => 0.637,
        'S' => 0.633,
        'T' => 0.599,
        'U' => 0.746,
        'V' => 0.661,
        'W' => 0.958,
        'X' => 0.655,
        'Y' => 0.646,
        'Z' => 0.621,
        'a' => 0.550,
        'b' => 0.603,
        'c' => 0.547,
        'd' => 0.609,
        'e' => 0.570,
        'f' => 0.340,
        'g' | 'h' => 0.600,
        'i' => 0.235,
        'j' => 0.227,
        'k' => 0.522,
        'l' => 0.239,
        'm' => 0.867,
        'n' => 0.585,
        'o' => 0.574,
        'p' => 0.595,
        'q' => 0.585,
        'r' => 0.364,
        's' => 0.523,
        't' => 0.305,
        'u' => 0.585,
        'v' => 0.545,
        'w' => 0.811,
        'x' => 0.538,
        'y' => 0.556,
        'z' => 0.550,
        '0' => 0.613,
        '1' => 0.396,
        '2' => 0.609,
        '3' => 0.597,
        '4' => 0.614,
        '5' => 0.586,
        '6' => 0.608,
        '7' => 0.559,
        '8' => 0.611,
        '9' => 0.595,
        '@' | '#' | '%' | '&' => 0.946,
        '\n' => 0.0,
        // Cyrillic and other scripts: roughly the Latin lowercase average.
        _ => 0.568,
    }
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}
