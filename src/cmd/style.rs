use ansi_term::{Color, Style};
use once_cell::sync::Lazy;

pub static DEFAULT: Lazy<Style> = Lazy::new(Style::default);

pub static GREEN: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Green));
pub static RED: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Red));
pub static CYAN: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Cyan));
pub static YELLOW: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Yellow));

pub static UNDERLINE: Lazy<Style> = Lazy::new(|| Style::new().underline());
pub static BOLD: Lazy<Style> = Lazy::new(|| Style::new().bold());

/// Whether output styling should be applied: the repo's own
/// `--no-styles` flag wins, falling back to `atty`'s stdout check so
/// piped output doesn't carry escape codes.
pub fn styles_enabled(no_styles: bool) -> bool {
    !no_styles && atty::is(atty::Stream::Stdout)
}