use anyhow::Result;
use base64::Engine;
use ratatui::layout::Rect;
use std::io::{self, Write};

/// OSC 52 escape sequence asking the terminal to put `text` on the system
/// clipboard.
pub fn osc52(text: &str) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{payload}\x07")
}

/// Copies `text` to the clipboard through the terminal. Terminals without
/// OSC 52 support ignore the sequence.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(osc52(text).as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// A `width` x `height` rectangle centred in `area`, clipped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Replaces every character with a bullet.
pub fn mask(value: &str) -> String {
    "•".repeat(value.chars().count())
}
