//! Short-lived status messages shown in the corner of every screen.

use crate::tui::Frame;
use ratatui::{prelude::*, widgets::*};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    shown_at: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: ToastKind, message: String) {
        self.items.push(Toast {
            kind,
            message,
            shown_at: Instant::now(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(toast = %message, "success");
        self.push(ToastKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(toast = %message, "error");
        self.push(ToastKind::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(toast = %message, "info");
        self.push(ToastKind::Info, message);
    }

    /// Drops toasts older than [`TOAST_TTL`].
    pub fn prune(&mut self) {
        self.prune_at(Instant::now());
    }

    fn prune_at(&mut self, now: Instant) {
        self.items
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_TTL);
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let width = 46.min(area.width);
        let mut y = area.y + 1;

        for toast in self.items.iter().rev().take(4) {
            let (glyph, color) = match toast.kind {
                ToastKind::Success => ("✓", Color::Rgb(140, 219, 140)),
                ToastKind::Error => ("✗", Color::Rgb(255, 100, 100)),
                ToastKind::Info => ("i", Color::Rgb(129, 199, 245)),
            };
            let lines = (toast.message.chars().count() as u16 + 4) / width.saturating_sub(4).max(1) + 1;
            let height = (lines + 2).min(6);
            if y + height > area.bottom() {
                break;
            }
            let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, height);
            frame.render_widget(Clear, rect);
            let paragraph = Paragraph::new(format!("{glyph} {}", toast.message))
                .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(color))
                        .style(Style::default().bg(Color::Rgb(30, 30, 46))),
                );
            frame.render_widget(paragraph, rect);
            y += height;
        }
    }
}
