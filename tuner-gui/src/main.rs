//! # Tuner GUI
//!
//! The desktop host for the tuner core. It owns the audio source, starts the
//! tuner loop when the user presses Start, and drives one loop cycle per
//! display frame through an iced subscription.
//!
//! ## Usage
//! ```text
//! tuner-gui [CONFIG.json] [--demo HZ]
//! ```
//! `--demo` replaces the microphone with a synthetic sine at `HZ`.

mod ui;

use anyhow::{Context, anyhow};
use iced::{Element, Subscription, Theme};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tuner_core::signal::SyntheticSource;
use tuner_core::{AudioSession, AudioSource, DisplayUpdate, Renderer, TunerConfig, TunerLoop};
use ui::main_display::create_main_view;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "tuner.json";
/// Sample rate used by the synthetic demo source.
const DEMO_SAMPLE_RATE: u32 = 44_100;
/// Amplitude of the synthetic demo tone.
const DEMO_AMPLITUDE: f32 = 0.5;
/// Roughly one display refresh at 60 Hz.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting tuner");
    iced::application("Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run()?;
    Ok(())
}

/// Application messages.
#[derive(Debug, Clone)]
pub enum Message {
    /// User asked to start listening
    Start,
    /// Display refresh tick
    Tick,
}

/// Command-line options.
#[derive(Debug, Default)]
struct HostOptions {
    config_path: Option<PathBuf>,
    demo_frequency: Option<f32>,
}

impl HostOptions {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--demo" {
                let value = args.next().ok_or_else(|| anyhow!("--demo needs a frequency"))?;
                let frequency: f32 = value
                    .parse()
                    .with_context(|| format!("invalid demo frequency {value:?}"))?;
                options.demo_frequency = Some(frequency);
            } else {
                options.config_path = Some(PathBuf::from(arg));
            }
        }
        Ok(options)
    }
}

/// Everything the view needs. Also the loop's renderer.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub last_update: Option<DisplayUpdate>,
    pub needle_range: f32,
    pub listening: bool,
    pub source_label: String,
    /// User-visible failure; once set the loop is not ticked again.
    pub failure: Option<String>,
}

impl Renderer for AppDisplayData {
    fn render(&mut self, update: &DisplayUpdate) {
        self.last_update = Some(update.clone());
    }
}

struct TunerApp {
    tuner: TunerLoop,
    source: Box<dyn AudioSource>,
    display_data: AppDisplayData,
}

impl Default for TunerApp {
    fn default() -> Self {
        let (options, option_error) = match HostOptions::parse(std::env::args().skip(1)) {
            Ok(options) => (options, None),
            Err(e) => {
                tracing::error!(error = %e, "Invalid command line");
                (HostOptions::default(), Some(e.to_string()))
            }
        };

        let config_path = options
            .config_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let config = TunerConfig::load_or_default(&config_path);

        let (source, source_label): (Box<dyn AudioSource>, String) = match options.demo_frequency {
            Some(frequency) => (
                Box::new(
                    SyntheticSource::new(frequency, DEMO_AMPLITUDE, DEMO_SAMPLE_RATE, config.frame_size)
                        .continuous(),
                ),
                format!("demo {frequency} Hz"),
            ),
            None => (
                Box::new(AudioSession::new(config.frame_size)),
                "microphone".to_string(),
            ),
        };

        Self {
            tuner: TunerLoop::new(&config),
            source,
            display_data: AppDisplayData {
                last_update: None,
                needle_range: config.needle_range_hz,
                listening: false,
                source_label,
                failure: option_error,
            },
        }
    }
}

impl TunerApp {
    fn update(&mut self, message: Message) {
        match message {
            Message::Start => {
                if self.display_data.failure.is_some() {
                    return;
                }
                match self.tuner.start(self.source.as_mut()) {
                    Ok(()) => self.display_data.listening = true,
                    Err(e) => self.display_data.failure = Some(e.to_string()),
                }
            }
            Message::Tick => {
                if let Err(e) = self.tuner.tick(self.source.as_mut(), &mut self.display_data) {
                    self.display_data.listening = false;
                    self.display_data.failure = Some(e.to_string());
                }
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Ticks once per display frame while listening.
    fn subscription(&self) -> Subscription<Message> {
        if self.display_data.listening {
            iced::time::every(TICK_INTERVAL).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_config_and_demo() {
        let options = HostOptions::parse(args(&["custom.json", "--demo", "110"])).expect("valid");
        assert_eq!(options.config_path, Some(PathBuf::from("custom.json")));
        assert_eq!(options.demo_frequency, Some(110.0));
    }

    #[test]
    fn test_parse_rejects_bad_demo_frequency() {
        assert!(HostOptions::parse(args(&["--demo"])).is_err());
        assert!(HostOptions::parse(args(&["--demo", "loud"])).is_err());
    }

    #[test]
    fn test_display_data_records_updates() {
        let mut data = AppDisplayData {
            last_update: None,
            needle_range: 50.0,
            listening: true,
            source_label: "test".to_string(),
            failure: None,
        };
        let update = DisplayUpdate::placeholder(tuner_core::FrameStatus::Silent);
        data.render(&update);
        assert_eq!(data.last_update, Some(update));
    }
}
