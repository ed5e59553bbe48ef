//! Timing functions for the reveal schedule
//!
//! Named curves live in a static, read-only table keyed by their easing-js
//! names. A timing function is called as `f(t, b, c, d)`:
//! - `t`: normalized distance of the block (raw frame / max raw frame)
//! - `b`: raw frame of the block
//! - `c`: maximum raw frame of the schedule
//! - `d`: duration, always 1
//!
//! and returns the eased frame. Named curves ignore `b` and return `c * curve(t / d)`.

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;

/// Overshoot amount shared by the "back" curves
const BACK_OVERSHOOT: f64 = 1.70158;

/// A named easing curve over normalized progress `[0, 1]`
pub struct Easing {
    pub name: &'static str,
    curve: fn(f64) -> f64,
}

impl Easing {
    /// Evaluate the raw curve at normalized progress
    #[inline]
    pub fn curve(&self, pos: f64) -> f64 {
        (self.curve)(pos)
    }

    /// Evaluate with the `(t, b, c, d)` frame contract
    #[inline]
    pub fn apply(&self, t: f64, _b: f64, c: f64, d: f64) -> f64 {
        c * self.curve(t / d)
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Easing").field(&self.name).finish()
    }
}

/// User supplied timing function: `(t, b, c, d) -> eased frame`
pub type CustomTiming = Rc<dyn Fn(f64, f64, f64, f64) -> f64>;

/// A resolved timing function
#[derive(Clone)]
pub enum TimingFunction {
    Named(&'static Easing),
    Custom(CustomTiming),
}

impl TimingFunction {
    pub fn apply(&self, t: f64, b: f64, c: f64, d: f64) -> f64 {
        match self {
            TimingFunction::Named(easing) => easing.apply(t, b, c, d),
            TimingFunction::Custom(f) => f(t, b, c, d),
        }
    }

    /// Registry name, `None` for custom functions
    pub fn name(&self) -> Option<&'static str> {
        match self {
            TimingFunction::Named(easing) => Some(easing.name),
            TimingFunction::Custom(_) => None,
        }
    }
}

impl PartialEq for TimingFunction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TimingFunction::Named(a), TimingFunction::Named(b)) => std::ptr::eq(*a, *b),
            (TimingFunction::Custom(a), TimingFunction::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for TimingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingFunction::Named(easing) => write!(f, "TimingFunction({})", easing.name),
            TimingFunction::Custom(_) => f.write_str("TimingFunction(<custom>)"),
        }
    }
}

/// What a caller asks for: a curve name or their own function
#[derive(Clone)]
pub enum TimingSpec {
    Named(String),
    Custom(CustomTiming),
}

impl From<&str> for TimingSpec {
    fn from(name: &str) -> Self {
        TimingSpec::Named(name.to_string())
    }
}

impl From<String> for TimingSpec {
    fn from(name: String) -> Self {
        TimingSpec::Named(name)
    }
}

/// Look up a named curve in the static table
pub fn find_easing(name: &str) -> Option<&'static Easing> {
    EASINGS.iter().find(|easing| easing.name == name)
}

/// Resolve a timing spec. Unknown names give `None`, meaning "no easing".
pub fn resolve_timing_function(spec: TimingSpec) -> Option<TimingFunction> {
    match spec {
        TimingSpec::Custom(f) => Some(TimingFunction::Custom(f)),
        TimingSpec::Named(name) => {
            let found = find_easing(&name).map(TimingFunction::Named);
            if found.is_none() {
                log::warn!("Unknown timing function '{}', using linear schedule", name);
            }
            found
        }
    }
}

/// All named curves, easing-js naming
pub static EASINGS: &[Easing] = &[
    Easing { name: "linear", curve: linear },
    Easing { name: "easeInQuad", curve: in_quad },
    Easing { name: "easeOutQuad", curve: out_quad },
    Easing { name: "easeInOutQuad", curve: in_out_quad },
    Easing { name: "easeInCubic", curve: in_cubic },
    Easing { name: "easeOutCubic", curve: out_cubic },
    Easing { name: "easeInOutCubic", curve: in_out_cubic },
    Easing { name: "easeInQuart", curve: in_quart },
    Easing { name: "easeOutQuart", curve: out_quart },
    Easing { name: "easeInOutQuart", curve: in_out_quart },
    Easing { name: "easeInQuint", curve: in_quint },
    Easing { name: "easeOutQuint", curve: out_quint },
    Easing { name: "easeInOutQuint", curve: in_out_quint },
    Easing { name: "easeInSine", curve: in_sine },
    Easing { name: "easeOutSine", curve: out_sine },
    Easing { name: "easeInOutSine", curve: in_out_sine },
    Easing { name: "easeInExpo", curve: in_expo },
    Easing { name: "easeOutExpo", curve: out_expo },
    Easing { name: "easeInOutExpo", curve: in_out_expo },
    Easing { name: "easeInCirc", curve: in_circ },
    Easing { name: "easeOutCirc", curve: out_circ },
    Easing { name: "easeInOutCirc", curve: in_out_circ },
    Easing { name: "easeInBack", curve: in_back },
    Easing { name: "easeOutBack", curve: out_back },
    Easing { name: "easeInOutBack", curve: in_out_back },
    Easing { name: "easeInElastic", curve: in_elastic },
    Easing { name: "easeOutElastic", curve: out_elastic },
    Easing { name: "easeInOutElastic", curve: in_out_elastic },
    Easing { name: "easeInBounce", curve: in_bounce },
    Easing { name: "easeOutBounce", curve: out_bounce },
    Easing { name: "easeInOutBounce", curve: in_out_bounce },
];

fn linear(pos: f64) -> f64 {
    pos
}

fn in_quad(pos: f64) -> f64 {
    pos * pos
}

fn out_quad(pos: f64) -> f64 {
    1.0 - (1.0 - pos) * (1.0 - pos)
}

fn in_out_quad(pos: f64) -> f64 {
    if pos < 0.5 {
        2.0 * pos * pos
    } else {
        1.0 - (-2.0 * pos + 2.0).powi(2) / 2.0
    }
}

fn in_cubic(pos: f64) -> f64 {
    pos.powi(3)
}

fn out_cubic(pos: f64) -> f64 {
    1.0 - (1.0 - pos).powi(3)
}

fn in_out_cubic(pos: f64) -> f64 {
    if pos < 0.5 {
        4.0 * pos.powi(3)
    } else {
        1.0 - (-2.0 * pos + 2.0).powi(3) / 2.0
    }
}

fn in_quart(pos: f64) -> f64 {
    pos.powi(4)
}

fn out_quart(pos: f64) -> f64 {
    1.0 - (1.0 - pos).powi(4)
}

fn in_out_quart(pos: f64) -> f64 {
    if pos < 0.5 {
        8.0 * pos.powi(4)
    } else {
        1.0 - (-2.0 * pos + 2.0).powi(4) / 2.0
    }
}

fn in_quint(pos: f64) -> f64 {
    pos.powi(5)
}

fn out_quint(pos: f64) -> f64 {
    1.0 - (1.0 - pos).powi(5)
}

fn in_out_quint(pos: f64) -> f64 {
    if pos < 0.5 {
        16.0 * pos.powi(5)
    } else {
        1.0 - (-2.0 * pos + 2.0).powi(5) / 2.0
    }
}

fn in_sine(pos: f64) -> f64 {
    1.0 - (pos * PI / 2.0).cos()
}

fn out_sine(pos: f64) -> f64 {
    (pos * PI / 2.0).sin()
}

fn in_out_sine(pos: f64) -> f64 {
    -((PI * pos).cos() - 1.0) / 2.0
}

fn in_expo(pos: f64) -> f64 {
    if pos == 0.0 {
        0.0
    } else {
        2f64.powf(10.0 * (pos - 1.0))
    }
}

fn out_expo(pos: f64) -> f64 {
    if pos == 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * pos)
    }
}

fn in_out_expo(pos: f64) -> f64 {
    if pos == 0.0 {
        return 0.0;
    }
    if pos == 1.0 {
        return 1.0;
    }
    let p = pos * 2.0;
    if p < 1.0 {
        0.5 * 2f64.powf(10.0 * (p - 1.0))
    } else {
        0.5 * (2.0 - 2f64.powf(-10.0 * (p - 1.0)))
    }
}

fn in_circ(pos: f64) -> f64 {
    1.0 - (1.0 - pos * pos).sqrt()
}

fn out_circ(pos: f64) -> f64 {
    (1.0 - (pos - 1.0).powi(2)).sqrt()
}

fn in_out_circ(pos: f64) -> f64 {
    let p = pos * 2.0;
    if p < 1.0 {
        -0.5 * ((1.0 - p * p).sqrt() - 1.0)
    } else {
        0.5 * ((1.0 - (p - 2.0).powi(2)).sqrt() + 1.0)
    }
}

fn in_back(pos: f64) -> f64 {
    let s = BACK_OVERSHOOT;
    pos * pos * ((s + 1.0) * pos - s)
}

fn out_back(pos: f64) -> f64 {
    let s = BACK_OVERSHOOT;
    let p = pos - 1.0;
    p * p * ((s + 1.0) * p + s) + 1.0
}

fn in_out_back(pos: f64) -> f64 {
    let s = BACK_OVERSHOOT * 1.525;
    let p = pos * 2.0;
    if p < 1.0 {
        0.5 * (p * p * ((s + 1.0) * p - s))
    } else {
        let p = p - 2.0;
        0.5 * (p * p * ((s + 1.0) * p + s) + 2.0)
    }
}

fn in_elastic(pos: f64) -> f64 {
    if pos == 0.0 || pos == 1.0 {
        return pos;
    }
    -(2f64.powf(10.0 * pos - 10.0)) * ((pos * 10.0 - 10.75) * (2.0 * PI / 3.0)).sin()
}

fn out_elastic(pos: f64) -> f64 {
    if pos == 0.0 || pos == 1.0 {
        return pos;
    }
    2f64.powf(-10.0 * pos) * ((pos * 10.0 - 0.75) * (2.0 * PI / 3.0)).sin() + 1.0
}

fn in_out_elastic(pos: f64) -> f64 {
    if pos == 0.0 || pos == 1.0 {
        return pos;
    }
    let k = 2.0 * PI / 4.5;
    if pos < 0.5 {
        -(2f64.powf(20.0 * pos - 10.0) * ((20.0 * pos - 11.125) * k).sin()) / 2.0
    } else {
        2f64.powf(-20.0 * pos + 10.0) * ((20.0 * pos - 11.125) * k).sin() / 2.0 + 1.0
    }
}

fn out_bounce(pos: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if pos < 1.0 / D {
        N * pos * pos
    } else if pos < 2.0 / D {
        let p = pos - 1.5 / D;
        N * p * p + 0.75
    } else if pos < 2.5 / D {
        let p = pos - 2.25 / D;
        N * p * p + 0.9375
    } else {
        let p = pos - 2.625 / D;
        N * p * p + 0.984375
    }
}

fn in_bounce(pos: f64) -> f64 {
    1.0 - out_bounce(1.0 - pos)
}

fn in_out_bounce(pos: f64) -> f64 {
    if pos < 0.5 {
        in_bounce(pos * 2.0) * 0.5
    } else {
        out_bounce(pos * 2.0 - 1.0) * 0.5 + 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_stable() {
        for easing in EASINGS {
            assert!(easing.curve(0.0).abs() < 1e-9, "{} at 0", easing.name);
            assert!((easing.curve(1.0) - 1.0).abs() < 1e-9, "{} at 1", easing.name);
        }
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in EASINGS.iter().enumerate() {
            for b in &EASINGS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_resolve_named() {
        let f = resolve_timing_function("easeInOutExpo".into()).unwrap();
        assert_eq!(f.name(), Some("easeInOutExpo"));
        // Same table entry every time
        assert_eq!(f, resolve_timing_function("easeInOutExpo".into()).unwrap());
    }

    #[test]
    fn test_resolve_custom_passthrough() {
        let custom: CustomTiming = Rc::new(|_t, b, _c, _d| b * 2.0);
        let f = resolve_timing_function(TimingSpec::Custom(custom.clone())).unwrap();
        assert_eq!(f, TimingFunction::Custom(custom));
        assert_eq!(f.apply(0.5, 3.0, 6.0, 1.0), 6.0);
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        assert!(resolve_timing_function("nothing".into()).is_none());
    }

    #[test]
    fn test_named_scales_by_max_frame() {
        let linear = find_easing("linear").unwrap();
        assert_eq!(linear.apply(0.5, 5.0, 10.0, 1.0), 5.0);
        let back = find_easing("easeInBack").unwrap();
        // Overshoots below zero early on
        assert!(back.apply(0.2, 2.0, 10.0, 1.0) < 0.0);
    }
}
