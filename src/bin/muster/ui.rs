//! Text rendering for the `--format text` output.

use std::fmt::Display;
use std::io::IsTerminal;

use muster::stats::Distribution;
use nu_ansi_term::{Color, Style};

const BAR_WIDTH: usize = 24;

/// Writes report blocks to stdout, colored only on a terminal.
pub struct Ui {
    color: bool,
}

#[derive(Clone, Copy)]
enum Tone {
    Title,
    Label,
    Accent,
    Good,
    Bad,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Title => Color::Purple.bold(),
            Tone::Label => Color::LightBlue.normal(),
            Tone::Accent => Color::LightCyan.normal(),
            Tone::Good => Color::LightGreen.bold(),
            Tone::Bad => Color::Yellow.bold(),
        }
    }
}

impl Ui {
    pub fn new(plain: bool) -> Self {
        let color = !plain && std::io::stdout().is_terminal();
        #[cfg(windows)]
        if color {
            let _ = nu_ansi_term::enable_ansi_support();
        }
        Self { color }
    }

    pub fn spacer(&self) {
        println!();
    }

    /// Titled block of `label: value` lines with the labels right-aligned.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(label, value)| (label, value.to_string()))
            .collect();
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        self.block(
            title,
            rows.into_iter().map(|(label, value)| {
                let label = self.tint(Tone::Label, format!("{label:>width$}:"));
                format!("{label} {value}")
            }),
        );
    }

    pub fn list<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = String>,
    {
        let bullet = self.tint(Tone::Accent, "-");
        self.block(title, entries.into_iter().map(|entry| format!("{bullet} {entry}")));
    }

    /// One bar per bucket, scaled to the largest bucket.
    pub fn distribution(&self, title: &str, buckets: &[Distribution]) {
        let width = buckets.iter().map(|b| b.name.len()).max().unwrap_or(0);
        let peak = buckets.iter().map(|b| b.value).max().unwrap_or(0).max(1);
        self.block(
            title,
            buckets.iter().map(|bucket| {
                let cells = (bucket.value * BAR_WIDTH).div_ceil(peak);
                let bar = self.bar(bucket.color, cells);
                format!("{:<width$} {bar} {}", bucket.name, bucket.value)
            }),
        );
    }

    pub fn success(&self, message: &str) {
        println!("{} {message}", self.tint(Tone::Good, "ok:"));
    }

    pub fn warn(&self, message: &str) {
        println!("{} {message}", self.tint(Tone::Bad, "warning:"));
    }

    // Nothing is printed, title included, when there are no lines.
    fn block<I>(&self, title: &str, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut lines = lines.into_iter().peekable();
        if lines.peek().is_none() {
            return;
        }
        println!("{}", self.tint(Tone::Title, title));
        for line in lines {
            println!("  {line}");
        }
    }

    fn bar(&self, color: Option<&str>, cells: usize) -> String {
        if !self.color {
            return "#".repeat(cells);
        }
        let style = color
            .and_then(hex_color)
            .map_or_else(|| Tone::Accent.style(), |rgb| rgb.normal());
        style.paint("█".repeat(cells)).to_string()
    }

    fn tint(&self, tone: Tone, text: impl Display) -> String {
        if self.color {
            tone.style().paint(text.to_string()).to_string()
        } else {
            text.to_string()
        }
    }
}

/// `#rrggbb` to a 24-bit terminal color.
fn hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#').filter(|d| d.len() == 6)?;
    let channel = |at: usize| u8::from_str_radix(digits.get(at..at + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_colors() {
        assert_eq!(hex_color("#22c55e"), Some(Color::Rgb(0x22, 0xc5, 0x5e)));
        assert_eq!(hex_color("22c55e"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
        assert_eq!(hex_color("#fff"), None);
    }

    #[test]
    fn plain_output_has_no_escapes() {
        let ui = Ui { color: false };
        assert_eq!(ui.tint(Tone::Title, "Summary"), "Summary");
        assert_eq!(ui.bar(Some("#ff0000"), 3), "###");
    }
}
