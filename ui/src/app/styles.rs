use iced::{Background, Border, Color, Shadow, Theme, Vector};

#[derive(Debug, Clone, Copy)]
pub(crate) struct TabStyle {
    pub(crate) active: bool,
}

impl iced::widget::button::StyleSheet for TabStyle {
    type Style = Theme;

    fn active(&self, style: &Self::Style) -> iced::widget::button::Appearance {
        let palette = style.extended_palette();
        let (background, text_color) = if self.active {
            (palette.background.base.color, palette.background.base.text)
        } else {
            (palette.background.weak.color, palette.background.weak.text)
        };

        iced::widget::button::Appearance {
            background: Some(Background::Color(background)),
            text_color,
            border: Border {
                color: palette.background.strong.color,
                width: 1.0,
                radius: [8.0, 8.0, 0.0, 0.0].into(),
            },
            shadow_offset: if self.active {
                Vector::new(0.0, 0.0)
            } else {
                Vector::new(0.0, 1.0)
            },
            ..iced::widget::button::Appearance::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> iced::widget::button::Appearance {
        let mut appearance = self.active(style);
        if !self.active {
            if let Some(Background::Color(color)) = appearance.background {
                appearance.background = Some(Background::Color(lift(color, 0.05)));
            }
        }
        appearance
    }
}

/// Pill drawn behind a status label.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StatusBadgeStyle {
    pub(crate) background: Color,
    pub(crate) text: Color,
}

impl iced::widget::container::StyleSheet for StatusBadgeStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> iced::widget::container::Appearance {
        iced::widget::container::Appearance {
            text_color: Some(self.text),
            background: Some(Background::Color(self.background)),
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 999.0.into(),
            },
            ..iced::widget::container::Appearance::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ToastStyle {
    pub(crate) accent: Color,
}

impl iced::widget::container::StyleSheet for ToastStyle {
    type Style = Theme;

    fn appearance(&self, style: &Self::Style) -> iced::widget::container::Appearance {
        let palette = style.extended_palette();
        iced::widget::container::Appearance {
            text_color: Some(palette.background.base.text),
            background: Some(Background::Color(palette.background.base.color)),
            border: Border {
                color: self.accent,
                width: 2.0,
                radius: 6.0.into(),
            },
            shadow: Shadow {
                color: Color::from_rgba8(0x00, 0x00, 0x00, 0.25),
                offset: Vector::new(0.0, 2.0),
                blur_radius: 6.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DialogStyle;

impl iced::widget::container::StyleSheet for DialogStyle {
    type Style = Theme;

    fn appearance(&self, style: &Self::Style) -> iced::widget::container::Appearance {
        let palette = style.extended_palette();
        iced::widget::container::Appearance {
            text_color: Some(palette.background.base.text),
            background: Some(Background::Color(palette.background.base.color)),
            border: Border {
                color: palette.background.strong.color,
                width: 1.0,
                radius: 10.0.into(),
            },
            shadow: Shadow {
                color: Color::from_rgba8(0x00, 0x00, 0x00, 0.35),
                offset: Vector::new(0.0, 4.0),
                blur_radius: 16.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RowStyle {
    pub(crate) selected: bool,
}

impl iced::widget::container::StyleSheet for RowStyle {
    type Style = Theme;

    fn appearance(&self, style: &Self::Style) -> iced::widget::container::Appearance {
        let palette = style.extended_palette();
        let background = if self.selected {
            Some(Background::Color(palette.primary.weak.color))
        } else {
            None
        };
        iced::widget::container::Appearance {
            background,
            border: Border {
                color: palette.background.weak.color,
                width: 1.0,
                radius: 4.0.into(),
            },
            ..iced::widget::container::Appearance::default()
        }
    }
}

fn lift(color: Color, amount: f32) -> Color {
    Color {
        r: (color.r + amount).min(1.0),
        g: (color.g + amount).min(1.0),
        b: (color.b + amount).min(1.0),
        a: color.a,
    }
}
