//! Terminal styling for the text reporter
//!
//! `NO_COLOR` wins over `--color`, which wins over TTY detection.

use crate::config::ColorWhen;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Map the configured color mode onto a `termcolor` choice
pub fn resolve_color_choice(when: ColorWhen) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match when {
        ColorWhen::Always => ColorChoice::Always,
        ColorWhen::Never => ColorChoice::Never,
        ColorWhen::Auto => ColorChoice::Auto,
    }
}

/// Bold foreground text, used for failures and pass counts
fn emphasis(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(true);
    spec
}

/// Faint text, used for timings
fn faint() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_dimmed(true);
    spec
}

/// White-on-color label in front of each case
fn badge(background: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_bg(Some(background))
        .set_fg(Some(Color::White))
        .set_bold(true);
    spec
}

/// Styled writer for case results and the summary line
///
/// Write errors are ignored: a closed stdout must not turn a passing run into
/// a failing one.
pub struct StyledOutput<W: WriteColor = StandardStream> {
    out: W,
}

impl StyledOutput {
    /// Styled writer on stdout
    pub fn stdout(choice: ColorChoice) -> Self {
        Self::with_writer(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> StyledOutput<W> {
    /// Styled writer on any color-capable sink
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    fn styled(&mut self, text: &str, spec: &ColorSpec) {
        let _ = self.out.set_color(spec);
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.reset();
    }

    pub fn error(&mut self, text: &str) {
        self.styled(text, &emphasis(Color::Red));
    }

    pub fn success(&mut self, text: &str) {
        self.styled(text, &emphasis(Color::Green));
    }

    pub fn dim(&mut self, text: &str) {
        self.styled(text, &faint());
    }

    pub fn plain(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
    }

    pub fn newline(&mut self) {
        let _ = writeln!(self.out);
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
    }

    /// ` PASS ` or ` FAIL ` badge for one case
    pub fn status_badge(&mut self, passed: bool) {
        if passed {
            self.styled(" PASS ", &badge(Color::Green));
        } else {
            self.styled(" FAIL ", &badge(Color::Red));
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
