//! Preset mower actions offered to the operator.

use clap::ValueEnum;
use mower_command::CommandRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MowerAction {
    Start,
    Home,
    S1,
    S2,
    EmergencyOn,
    EmergencyOff,
    BladeOn,
    BladeOff,
}

impl MowerAction {
    pub const ALL: [MowerAction; 8] = [
        Self::Start,
        Self::Home,
        Self::S1,
        Self::S2,
        Self::EmergencyOn,
        Self::EmergencyOff,
        Self::BladeOn,
        Self::BladeOff,
    ];

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Home => "Home",
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::EmergencyOn => "Emergency On",
            Self::EmergencyOff => "Emergency Off",
            Self::BladeOn => "Blade On",
            Self::BladeOff => "Blade Off",
        }
    }

    /// The control endpoint request this preset sends.
    pub fn request(&self) -> CommandRequest {
        match self {
            Self::Start => CommandRequest::new("mower_start"),
            Self::Home => CommandRequest::new("mower_home"),
            Self::S1 => CommandRequest::new("mower_s1"),
            Self::S2 => CommandRequest::new("mower_s2"),
            Self::EmergencyOn => CommandRequest::new("emergency").with_arg("emergency", 1),
            Self::EmergencyOff => CommandRequest::new("emergency").with_arg("emergency", 0),
            Self::BladeOn => CommandRequest::new("mow")
                .with_arg("mow_enabled", 1)
                .with_arg("mow_direction", 0),
            Self::BladeOff => CommandRequest::new("mow")
                .with_arg("mow_enabled", 0)
                .with_arg("mow_direction", 0),
        }
    }
}
