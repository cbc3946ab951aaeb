/// Results table, palette legend and error banner
use iced::widget::{column, container, row, scrollable, text, Column};
use iced::{Border, Color, Element, Length, Theme};

use crate::state::data::ResultRow;
use crate::Message;

const BANNER_RED: Color = Color::from_rgb(0.63, 0.16, 0.16);

/// Results table: `#`, Class, Confidence
pub fn table<'a>(rows: &[ResultRow]) -> Element<'a, Message> {
    if rows.is_empty() {
        return text("No detections yet").size(16).into();
    }

    let header = row![
        text("#").width(Length::Fixed(40.0)),
        text("Class").width(Length::Fill),
        text("Confidence").width(Length::Fixed(100.0)),
    ]
    .spacing(10);

    let body = Column::with_children(rows.iter().map(|r| {
        row![
            text(r.index.to_string()).width(Length::Fixed(40.0)),
            text(r.class.clone()).width(Length::Fill),
            text(r.confidence.clone()).width(Length::Fixed(100.0)),
        ]
        .spacing(10)
        .into()
    }))
    .spacing(4);

    column![header, scrollable(body).height(Length::Fill)]
        .spacing(8)
        .into()
}

/// Swatches for the configured class colors
pub fn legend<'a>(entries: &[(String, [u8; 4])], default_color: [u8; 4]) -> Element<'a, Message> {
    let swatch = |label: String, [r, g, b, _]: [u8; 4]| -> Element<'a, Message> {
        row![text("■").color(Color::from_rgb8(r, g, b)), text(label).size(14)]
            .spacing(6)
            .into()
    };

    let items = entries
        .iter()
        .map(|(label, color)| swatch(label.clone(), *color))
        .chain(std::iter::once(swatch("other".to_string(), default_color)));

    Column::with_children(items).spacing(2).into()
}

/// Red strip with the current error message
pub fn banner<'a>(message: &str) -> Element<'a, Message> {
    container(text(message.to_string()).color(Color::WHITE))
        .padding(10)
        .width(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(BANNER_RED.into()),
            border: Border {
                radius: 6.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}
