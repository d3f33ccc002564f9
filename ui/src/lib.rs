pub mod app;
mod executor;
pub mod logging;

use iced::Application;

pub use app::{DashboardApp, Flags};
pub use logging::{
    apply_log_level, init_logging, LogEntry, LogLevel, LogStore, ReloadHandle,
};

pub type UiResult = iced::Result;

pub fn run(flags: Flags) -> UiResult {
    let mut settings = iced::Settings::with_flags(flags);
    settings.window.size = iced::Size::new(1180.0, 760.0);
    DashboardApp::run(settings)
}
