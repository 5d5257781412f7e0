use crossterm::queue;
use crossterm::style::{Color, ContentStyle, Print, PrintStyledContent, StyledContent, Stylize};
use crossterm::tty::IsTty;
use std::env::{self, VarError};
use std::fmt::Display;
use std::io::{stdout, Stdout, Write};

pub(crate) fn no_color_set() -> bool {
    !matches!(env::var("NO_COLOR"), Err(VarError::NotPresent))
}

pub mod color {
    use crossterm::style::Color;

    // Colorscheme credit to Paul Tol https://personal.sron.nl/~pault/#sec:qualitative

    pub const YELLOW: Color = Color::Rgb {
        r: 0xCC,
        g: 0xBB,
        b: 0x44,
    };
    pub const CYAN: Color = Color::Rgb {
        r: 0x66,
        g: 0xCC,
        b: 0xEE,
    };
    pub const RED: Color = Color::Rgb {
        r: 0xEE,
        g: 0x66,
        b: 0x77,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0x22,
        g: 0x88,
        b: 0x33,
    };
    pub const GREY: Color = Color::Rgb {
        r: 0xBB,
        g: 0xBB,
        b: 0xBB,
    };

    pub const OEM: Color = YELLOW;
    pub const BUNDLED: Color = CYAN;
    pub const DISABLED: Color = GREY;
    pub const ERROR: Color = RED;
    pub const OK: Color = GREEN;
}

/// Prints optionally styled content to stdout
///
/// Styling is only applied when stdout is a terminal and `NO_COLOR` isn't set.
pub struct Printer {
    is_tty: bool,
    style_enabled: bool,
}

impl Drop for Printer {
    fn drop(&mut self) {
        self.flush()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            is_tty: stdout().is_tty(),
            style_enabled: !no_color_set(),
        }
    }

    pub fn println(&self, content: impl Display) {
        self.do_styled_print(content, ContentStyle::default(), true)
    }

    pub fn println_colored(&self, content: impl Display, color: Color) {
        self.do_styled_print(content, ContentStyle::default().with(color), true)
    }

    fn should_style(&self) -> bool {
        self.is_tty && self.style_enabled
    }

    fn do_styled_print(&self, content: impl Display, style: ContentStyle, with_nl: bool) {
        let should_style = self.should_style();
        with_stdout(|s| {
            if should_style {
                _ = queue!(s, PrintStyledContent(StyledContent::new(style, content)));
            } else {
                _ = queue!(s, Print(content));
            }
            if with_nl {
                _ = queue!(s, Print("\n"));
            }
        });
    }

    pub fn flush(&self) {
        with_stdout(|s| {
            _ = s.flush();
        })
    }
}

#[inline]
fn with_stdout<F: FnOnce(&mut Stdout)>(func: F) {
    let mut stdout = stdout();
    func(&mut stdout);
}
