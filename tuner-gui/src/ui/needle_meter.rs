//! # Needle Meter Widget
//!
//! A round dial with a needle showing how far the measured pitch is from the
//! matched reference note. The full needle range in Hz maps onto ±60°,
//! positive (sharp) to the right.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Theme, mouse};
use std::f32::consts::FRAC_PI_3;

/// Needle angle in radians for `offset` Hz, ±π/3 at the range ends.
pub fn needle_angle(offset: f32, range: f32) -> f32 {
    (offset.clamp(-range, range) / range) * FRAC_PI_3
}

/// Needle meter widget for displaying tuning accuracy.
pub struct NeedleMeter {
    /// Current needle offset in Hz
    offset: f32,
    /// Offset at which the needle hits its stop
    range: f32,
}

impl NeedleMeter {
    pub fn new(offset: f32, range: f32) -> Self {
        Self { offset, range }
    }

    /// Creates the view element for the needle meter.
    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fixed(300.0))
                .height(iced::Length::Fixed(300.0)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for NeedleMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        let radius = bounds.width.min(bounds.height) * 0.4;

        // Dial outline
        let outline = Path::circle(center, radius);
        frame.stroke(
            &outline,
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb8(0xAA, 0xAA, 0xAA)),
        );

        // Needle
        let angle = needle_angle(self.offset, self.range);
        let tip = Point::new(
            center.x + radius * angle.sin(),
            center.y - radius * angle.cos(),
        );
        let color = if self.offset == 0.0 {
            Color::from_rgb8(0x00, 0xFF, 0x00) // Lime
        } else {
            Color::from_rgb8(0xFF, 0x00, 0x00) // Red
        };
        frame.stroke(
            &Path::line(center, tip),
            Stroke::default().with_width(4.0).with_color(color),
        );

        vec![frame.into_geometry()]
    }
}
