mod email_settings;

pub use email_settings::*;
