//! # Main Display Module
//!
//! Lays out the note name, measured frequency, cents readout, needle and the
//! start control.

use iced::widget::{Space, button, column, container, text};
use iced::{Alignment, Element, Length};

use super::needle_meter::NeedleMeter;
use tuner_core::PLACEHOLDER;

/// Creates the complete main application view
pub fn create_main_view(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    let title = text("Tuner").size(28);

    let (note_label, frequency_text, needle_offset, cents) = match &data.last_update {
        Some(update) => (
            update.note_label.clone(),
            update.frequency_text.clone(),
            update.needle_offset,
            update.cents,
        ),
        None => (PLACEHOLDER.to_string(), PLACEHOLDER.to_string(), 0.0, None),
    };

    let cents_text = cents
        .map(|c| format!("{c:+.1} cents"))
        .unwrap_or_default();

    let control: Element<'static, crate::Message> = if let Some(failure) = &data.failure {
        text(failure.clone()).size(16).into()
    } else if data.listening {
        text(format!("Listening ({})", data.source_label)).size(14).into()
    } else {
        button(text("Start")).on_press(crate::Message::Start).into()
    };

    let content = column![
        title,
        Space::with_height(10),
        text(note_label).size(64),
        text(format!("{frequency_text} Hz")).size(20),
        text(cents_text).size(16),
        NeedleMeter::new(needle_offset, data.needle_range).view(),
        control,
    ]
    .spacing(10)
    .align_x(Alignment::Center)
    .padding(20);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}
