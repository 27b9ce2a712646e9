use std::fmt;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};

use crate::Result;

/// Receives one frame per processed accession.
pub trait Progress {
    /// `iteration` out of `total` done, `label` names what just happened.
    fn update(&self, iteration: usize, total: usize, label: &str);
}

/// Single line bar on stdout: `<label> |████------| 40.0% `.
/// Reaching the total finishes the line.
#[derive(Debug, Clone)]
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    /// `decimals` of the percentage, `bar_length` characters of bar.
    pub fn new(decimals: usize, bar_length: usize) -> Result<Self> {
        Self::with_draw_target(decimals, bar_length, ProgressDrawTarget::stdout())
    }

    pub fn with_draw_target(
        decimals: usize,
        bar_length: usize,
        target: ProgressDrawTarget,
    ) -> Result<Self> {
        let style = ProgressStyle::with_template("{prefix} |{fill}| {pct}% {msg}")?
            .with_key("fill", move |state: &ProgressState, w: &mut dyn fmt::Write| {
                let _ = w.write_str(&fill_bar(state.pos(), state.len().unwrap_or(0), bar_length));
            })
            .with_key("pct", move |state: &ProgressState, w: &mut dyn fmt::Write| {
                let _ = w.write_str(&percent(state.pos(), state.len().unwrap_or(0), decimals));
            });
        let bar = ProgressBar::with_draw_target(Some(0), target);
        bar.set_style(style);
        Ok(Self { bar })
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl Progress for TerminalProgress {
    fn update(&self, iteration: usize, total: usize, label: &str) {
        if total == 0 {
            return;
        }
        self.bar.set_length(total as u64);
        self.bar.set_prefix(label.to_string());
        self.bar.set_position(iteration as u64);
        if iteration >= total {
            self.bar.finish();
        }
    }
}

/// Percentage of `pos` in `len` with `decimals` places, `"0.0"`-style. Empty when `len` is 0.
pub fn percent(pos: u64, len: u64, decimals: usize) -> String {
    if len == 0 {
        return String::new();
    }
    format!("{:.*}", decimals, 100.0 * pos as f64 / len as f64)
}

/// `width` characters, the filled share rounded half to even.
pub fn fill_bar(pos: u64, len: u64, width: usize) -> String {
    let filled = if len == 0 {
        0
    } else {
        ((width as f64 * pos as f64 / len as f64).round_ties_even() as usize).min(width)
    };
    let mut bar = String::with_capacity(width * '█'.len_utf8());
    for _ in 0..filled {
        bar.push('█');
    }
    bar.push_str(&"-".repeat(width - filled));
    bar
}
