//! Terminal logging with colored module prefixes and progress bars.
//!
//! - `log!` writes one line per message, prefixed with `[module]`
//! - `ProgressBars` draws one bar per named task and updates them in place
//!
//! # Example
//!
//! ```ignore
//! log!("navbar"; "injected after #header ({} links)", count);
//!
//! let progress = ProgressBars::new(&[("pages", 12), ("files", 40)]);
//! progress.inc_by_name("pages");
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{IsTerminal, Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

// ============================================================================
// Layout Constants
// ============================================================================
//
// Progress bar format: "[pages] [████░░░░] 42/100"
//                       ^-----^ ^-------^ ^----^
//                       prefix   bar       count

/// "[" and "]" around the module name
const BRACKET_LEN: usize = 2;
/// Space after "[module]"
const SPACE_AFTER_PREFIX: usize = 1;
/// " []" around the bar itself
const BAR_WRAPPER_LEN: usize = 3;
/// Space before "42/100"
const SPACE_BEFORE_COUNT: usize = 1;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;
/// Width assumed when the terminal size is unknown (pipes, CI).
const FALLBACK_WIDTH: u16 = 120;

#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("footer"; "stamped year {}", year);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Progress Bars
// ============================================================================

/// Several progress bars on consecutive terminal lines.
///
/// Bars are addressed by creation index or by module name. Terminal updates
/// are serialized through a mutex so rayon workers can report concurrently.
/// When stdout is not a terminal the bars stay silent.
pub struct ProgressBars {
    bars: Vec<ProgressBar>,
    lock: Mutex<()>,
    enabled: bool,
}

struct ProgressBar {
    name: &'static str,
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: AtomicUsize,
    row: usize,
}

impl ProgressBars {
    /// Reserve one terminal line per `(module, total)` pair.
    pub fn new(modules: &[(&'static str, usize)]) -> Self {
        let enabled = stdout().is_terminal();
        if enabled {
            let mut stdout = stdout().lock();
            for _ in 0..modules.len() {
                writeln!(stdout).ok();
            }
            stdout.flush().ok();
        }

        let bars = modules
            .iter()
            .enumerate()
            .map(|(row, (name, total))| ProgressBar {
                name,
                prefix: colorize_prefix(name, &name.to_ascii_lowercase()),
                prefix_len: calc_prefix_len(name.len()),
                total: *total,
                current: AtomicUsize::new(0),
                row,
            })
            .collect();

        Self {
            bars,
            lock: Mutex::new(()),
            enabled,
        }
    }

    #[inline]
    pub fn inc(&self, index: usize) {
        if let Some(bar) = self.bars.get(index) {
            let current = bar.current.fetch_add(1, Ordering::Relaxed) + 1;
            self.display(bar, current);
        }
    }

    /// Increment the bar registered under `name`; unknown names are ignored.
    pub fn inc_by_name(&self, name: &str) {
        if let Some(index) = self.bars.iter().position(|bar| bar.name == name) {
            self.inc(index);
        }
    }

    fn display(&self, bar: &ProgressBar, current: usize) {
        if !self.enabled {
            return;
        }
        let _guard = self.lock.lock().ok();

        let width = get_terminal_width() as usize;
        let count = format!("{}/{}", current, bar.total);
        let overhead = bar.prefix_len + BAR_WRAPPER_LEN + SPACE_BEFORE_COUNT + count.len();
        let bar_width = width
            .saturating_sub(overhead)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
        let filled = (current * bar_width).checked_div(bar.total).unwrap_or(0);
        let rendered = "█".repeat(filled) + &"░".repeat(bar_width.saturating_sub(filled));

        let mut stdout = stdout().lock();
        let lines_up = (self.bars.len() - bar.row) as u16;
        execute!(stdout, cursor::MoveUp(lines_up)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{}] {}", bar.prefix, rendered, count).ok();
        execute!(stdout, cursor::MoveDown(lines_up)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    /// Clear every bar from the terminal.
    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let _guard = self.lock.lock().ok();
        let rows = self.bars.len() as u16;

        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveUp(rows)).ok();
        for _ in &self.bars {
            execute!(stdout, Clear(ClearType::CurrentLine)).ok();
            execute!(stdout, cursor::MoveDown(1)).ok();
        }
        execute!(stdout, cursor::MoveUp(rows)).ok();
        stdout.flush().ok();
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write `[module] message`, truncated to the terminal width.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let max_msg_len = (get_terminal_width() as usize).saturating_sub(calc_prefix_len(module.len()));
    let message = truncate_str(message, max_msg_len);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold(),
        "watch" | "build" => prefix.bright_green().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        "header" | "navbar" | "sidebar" | "footer" => prefix.bright_cyan().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max_len` bytes on a char boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "[navbar] " = 6 + 2 + 1
        assert_eq!(calc_prefix_len(6), 9);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_ascii() {
        assert_eq!(truncate_str("fragment", 20), "fragment");
        assert_eq!(truncate_str("fragment", 4), "frag");
        assert_eq!(truncate_str("fragment", 0), "");
    }

    #[test]
    fn test_truncate_str_respects_char_boundary() {
        // "☰" is 3 bytes
        assert_eq!(truncate_str("☰ Menu", 2), "");
        assert_eq!(truncate_str("☰ Menu", 4), "☰ ");
    }

    #[test]
    fn test_inc_by_name_unknown_is_ignored() {
        let progress = ProgressBars {
            bars: Vec::new(),
            lock: Mutex::new(()),
            enabled: false,
        };
        progress.inc_by_name("pages");
        progress.finish();
    }

    #[test]
    fn test_inc_by_name_counts() {
        let progress = ProgressBars {
            bars: vec![ProgressBar {
                name: "pages",
                prefix: colorize_prefix("pages", "pages"),
                prefix_len: calc_prefix_len(5),
                total: 2,
                current: AtomicUsize::new(0),
                row: 0,
            }],
            lock: Mutex::new(()),
            enabled: false,
        };
        progress.inc_by_name("pages");
        progress.inc_by_name("pages");
        assert_eq!(progress.bars[0].current.load(Ordering::Relaxed), 2);
    }
}
