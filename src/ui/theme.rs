use crate::app::Tone;
use ratatui::style::{Color, Modifier, Style};

pub const FG: Color = Color::Rgb(229, 231, 235);
pub const MUTED: Color = Color::Rgb(156, 163, 175);
pub const DIM: Color = Color::Rgb(107, 114, 128);
pub const BORDER: Color = Color::Rgb(55, 65, 81);

pub const ACCENT: Color = Color::Rgb(129, 140, 248); // indigo
pub const ACCENT_BG: Color = Color::Rgb(30, 27, 75);

pub const SUCCESS: Color = Color::Rgb(134, 239, 172);
pub const WARNING: Color = Color::Rgb(251, 191, 36);
pub const ERROR: Color = Color::Rgb(248, 113, 113);

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Normal => FG,
        Tone::Accent => ACCENT,
        Tone::Good => SUCCESS,
        Tone::Warn => WARNING,
        Tone::Bad => ERROR,
        Tone::Muted => MUTED,
    }
}

pub fn block_style() -> Style {
    Style::default().fg(BORDER)
}

pub fn title_style() -> Style {
    Style::default().fg(FG).add_modifier(Modifier::BOLD)
}

pub fn label_style() -> Style {
    Style::default().fg(DIM)
}
