//! Ripple options
//!
//! Options come from three layers, lowest precedence first:
//! built-in defaults, the element's `imd-options` attribute, and the options
//! passed to the call. The attribute is relaxed JSON (`{pixelSize: 4, color: 'red'}`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::DEFAULT_COLOR;
use crate::consts::*;
use crate::easing::{CustomTiming, TimingSpec};
use crate::error::Result;

/// When the fade-out starts after a pointer press
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExitBefore {
    /// Start on this DOM event of the host element (e.g. "mouseup")
    Event(String),
    /// `true`: start right away; `false`: start once the reveal completes
    Immediate(bool),
}

impl Default for ExitBefore {
    fn default() -> Self {
        ExitBefore::Event(DEFAULT_EXIT_EVENT.to_string())
    }
}

/// Timing function supplied as code rather than by name
#[derive(Clone)]
pub struct CustomTimingFn(pub CustomTiming);

impl fmt::Debug for CustomTimingFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomTimingFn(..)")
    }
}

/// Every field optional; unset fields fall through to the layer below
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RippleOptions {
    /// Edge length of one block in pixels
    pub pixel_size: Option<u32>,
    /// Edge jitter strength
    pub bit_crash: Option<f64>,
    /// Disable image smoothing on the canvas
    pub pixelated: Option<bool>,
    /// Any CSS color
    pub color: Option<String>,
    /// Name of a curve in the easing table
    pub timing_function: Option<String>,
    /// Code timing function; wins over `timing_function` within the same layer
    #[serde(skip)]
    pub custom_timing: Option<CustomTimingFn>,
    pub exit_before: Option<ExitBefore>,
    /// Fade out and remove the canvas once the reveal completes
    pub auto_destroy: Option<bool>,
    /// Opacity lost per frame while fading
    pub opacity_step: Option<f64>,
}

impl RippleOptions {
    /// Parse a relaxed-JSON options blob
    pub fn parse(blob: &str) -> Result<Self> {
        if blob.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&relax_json(blob))?)
    }

    /// Parse an element attribute; a malformed one contributes nothing
    pub fn from_attribute(blob: Option<&str>) -> Self {
        match blob.map(Self::parse) {
            Some(Ok(options)) => options,
            Some(Err(e)) => {
                log::warn!("Ignoring {} attribute: {}", OPTIONS_ATTRIBUTE, e);
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Layer `over` on top of `self`; fields set in `over` win
    pub fn merge(&self, over: &RippleOptions) -> RippleOptions {
        let (timing_function, custom_timing) =
            if over.timing_function.is_some() || over.custom_timing.is_some() {
                (over.timing_function.clone(), over.custom_timing.clone())
            } else {
                (self.timing_function.clone(), self.custom_timing.clone())
            };
        RippleOptions {
            pixel_size: over.pixel_size.or(self.pixel_size),
            bit_crash: over.bit_crash.or(self.bit_crash),
            pixelated: over.pixelated.or(self.pixelated),
            color: over.color.clone().or_else(|| self.color.clone()),
            timing_function,
            custom_timing,
            exit_before: over.exit_before.clone().or_else(|| self.exit_before.clone()),
            auto_destroy: over.auto_destroy.or(self.auto_destroy),
            opacity_step: over.opacity_step.or(self.opacity_step),
        }
    }

    /// Defaults for a standalone play on a canvas `height` pixels tall
    pub fn play_defaults(height: u32) -> Self {
        RippleOptions {
            pixel_size: Some((height / PIXEL_SIZE_DIVISOR).max(1)),
            bit_crash: Some(DEFAULT_BIT_CRASH),
            pixelated: Some(true),
            ..Default::default()
        }
    }

    pub fn with_custom_timing(mut self, timing: CustomTiming) -> Self {
        self.custom_timing = Some(CustomTimingFn(timing));
        self
    }

    pub fn color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn timing_spec(&self) -> TimingSpec {
        match (&self.custom_timing, &self.timing_function) {
            (Some(custom), _) => TimingSpec::Custom(custom.0.clone()),
            (None, Some(name)) => TimingSpec::Named(name.clone()),
            (None, None) => TimingSpec::Named(DEFAULT_TIMING_FUNCTION.to_string()),
        }
    }

    pub fn exit_before_or_default(&self) -> ExitBefore {
        self.exit_before.clone().unwrap_or_default()
    }

    pub fn opacity_step_or_default(&self) -> f64 {
        self.opacity_step.unwrap_or(DEFAULT_OPACITY_STEP)
    }
}

/// Rewrite relaxed JSON into strict JSON: quotes bare keys, converts
/// single-quoted strings, drops comments and trailing commas, and fixes
/// leading-dot numbers.
pub fn relax_json(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                i = copy_string(&chars, i, &mut out);
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            ',' => {
                if !matches!(next_token(&chars, i + 1), Some('}') | Some(']')) {
                    out.push(',');
                }
            }
            '.' if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
                && !out.ends_with(|p: char| p.is_ascii_digit()) =>
            {
                out.push_str("0.");
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let is_key = next_token(&chars, i) == Some(':');
                if is_key {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
                continue;
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// First character at or after `from` that is neither whitespace nor inside a comment
fn next_token(chars: &[char], from: usize) -> Option<char> {
    let mut i = from;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1)) {
            (c, _) if c.is_whitespace() => i += 1,
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            (c, _) => return Some(c),
        }
    }
    None
}

/// Copy a quoted string starting at `start` as a double-quoted JSON string.
/// Returns the index just past the closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            match chars.get(i + 1) {
                // \' is not a JSON escape
                Some('\'') => out.push('\''),
                Some(&next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => {}
            }
            i += 2;
            continue;
        }
        if c == quote {
            out.push('"');
            return i + 1;
        }
        if c == '"' {
            out.push_str("\\\"");
        } else {
            out.push(c);
        }
        i += 1;
    }
    out.push('"');
    i
}
