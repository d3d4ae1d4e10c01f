//! CLI commands module.

mod classify;
mod config;
mod conversation;
mod discovery;
mod stt;
mod tone;
mod translate;
mod tts;
mod util;
mod visual;

pub use classify::ClassifyCommand;
pub use config::ConfigCommand;
pub use conversation::ConversationCommand;
pub use discovery::DiscoveryCommand;
pub use stt::SttCommand;
pub use tone::ToneCommand;
pub use translate::TranslateCommand;
pub use tts::TtsCommand;
pub use visual::VisualCommand;

pub(crate) use util::*;
