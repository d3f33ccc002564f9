use iced::keyboard;
use iced::Color;

use casedesk_core::{NotificationKind, Record, StatusTag, StatusTone};

use crate::app::styles::StatusBadgeStyle;
use crate::app::types::Message;

pub(crate) fn level_color(level: tracing::Level) -> Color {
    match level {
        tracing::Level::ERROR => Color::from_rgb8(0xe0, 0x4f, 0x4f),
        tracing::Level::WARN => Color::from_rgb8(0xe0, 0xb0, 0x4f),
        tracing::Level::INFO => Color::from_rgb8(0x3b, 0x82, 0xf6),
        tracing::Level::DEBUG => Color::from_rgb8(0x22, 0x7d, 0x64),
        tracing::Level::TRACE => Color::from_rgb8(0x6b, 0x72, 0x80),
    }
}

pub(crate) fn notification_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => Color::from_rgb8(0x22, 0x9a, 0x5b),
        NotificationKind::Error => Color::from_rgb8(0xe0, 0x4f, 0x4f),
        NotificationKind::Info => Color::from_rgb8(0x3b, 0x82, 0xf6),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ToneColors {
    pub(crate) background: Color,
    pub(crate) text: Color,
}

/// Color table for status badges. Every view renders statuses through
/// [`StatusPalette::badge`] so the label and its colors cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StatusPalette {
    pub(crate) warning: ToneColors,
    pub(crate) info: ToneColors,
    pub(crate) success: ToneColors,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            warning: ToneColors {
                background: Color::from_rgb8(0xfd, 0xf0, 0xd5),
                text: Color::from_rgb8(0x8a, 0x5a, 0x00),
            },
            info: ToneColors {
                background: Color::from_rgb8(0xdb, 0xea, 0xfe),
                text: Color::from_rgb8(0x1e, 0x40, 0xaf),
            },
            success: ToneColors {
                background: Color::from_rgb8(0xd1, 0xf4, 0xe0),
                text: Color::from_rgb8(0x14, 0x6c, 0x43),
            },
        }
    }
}

impl StatusPalette {
    pub(crate) fn colors(&self, tone: StatusTone) -> ToneColors {
        match tone {
            StatusTone::Warning => self.warning,
            StatusTone::Info => self.info,
            StatusTone::Success => self.success,
        }
    }

    pub(crate) fn badge(&self, status: StatusTag) -> (&'static str, StatusBadgeStyle) {
        let colors = self.colors(status.tone());
        (
            status.label(),
            StatusBadgeStyle {
                background: colors.background,
                text: colors.text,
            },
        )
    }
}

pub(crate) fn escape_key_event(
    key: keyboard::Key,
    _modifiers: keyboard::Modifiers,
) -> Option<Message> {
    match key {
        keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::EscapePressed),
        _ => None,
    }
}

/// Completed records no longer take forum annotations.
pub(crate) fn can_annotate(record: &Record) -> bool {
    record.display_status() != StatusTag::Completed
}

pub(crate) fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => "—",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_gives_each_status_its_own_colors() {
        let palette = StatusPalette::default();
        let (pending_label, pending) = palette.badge(StatusTag::Pending);
        let (_, in_progress) = palette.badge(StatusTag::InProgress);
        let (done_label, done) = palette.badge(StatusTag::Completed);

        assert_eq!(pending_label, "Pending");
        assert_eq!(done_label, "Completed");
        assert_ne!(pending.background, in_progress.background);
        assert_ne!(in_progress.background, done.background);
        assert_eq!(done.text, palette.success.text);
    }

    #[test]
    fn escape_maps_to_close_message() {
        let message = escape_key_event(
            keyboard::Key::Named(keyboard::key::Named::Escape),
            keyboard::Modifiers::default(),
        );
        assert!(matches!(message, Some(Message::EscapePressed)));

        let other = escape_key_event(
            keyboard::Key::Named(keyboard::key::Named::Enter),
            keyboard::Modifiers::default(),
        );
        assert!(other.is_none());
    }

    #[test]
    fn only_open_records_can_be_annotated() {
        let mut record = Record::new(casedesk_core::RecordId::new("r-1"));
        assert!(can_annotate(&record));

        record.status_tag = Some(StatusTag::InProgress);
        assert!(can_annotate(&record));

        record.status_tag = Some(StatusTag::Completed);
        assert!(!can_annotate(&record));
    }

    #[test]
    fn blank_values_render_as_dash() {
        assert_eq!(or_dash(Some("Central")), "Central");
        assert_eq!(or_dash(Some("  ")), "—");
        assert_eq!(or_dash(None), "—");
    }
}
