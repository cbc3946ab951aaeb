/// Image panel of the main window
use iced::widget::image::Handle;
use iced::widget::{center, container, image, text};
use iced::{Color, ContentFit, Element, Length};

use crate::Message;

const HINT: Color = Color::from_rgb(0.6, 0.6, 0.6);

/// Rendered image with its boxes, or a placeholder asking for a file
pub fn panel<'a>(frame: Option<&Handle>, hovering: bool) -> Element<'a, Message> {
    let content: Element<'a, Message> = match frame {
        Some(handle) if !hovering => image(handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        _ => {
            let hint = if hovering {
                "Drop the image to load it"
            } else {
                "Choose an image or drop one here (jpg, png, webp, gif, bmp)"
            };
            center(text(hint).size(18).color(HINT)).into()
        }
    };

    container(content)
        .padding(10)
        .width(Length::FillPortion(3))
        .height(Length::Fill)
        .style(container::rounded_box)
        .into()
}
