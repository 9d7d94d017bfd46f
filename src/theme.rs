use crate::kv::{KeyValueStore, THEME_KEY};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("unknown theme: {s} (valid: light, dark)")),
        }
    }
}

impl Theme {
    /// Browser chrome colour for this theme.
    pub fn meta_color(self) -> &'static str {
        match self {
            Theme::Light => "#ffffff",
            Theme::Dark => "#0e0e0f",
        }
    }
}

/// Only an exact stored `"dark"` selects the dark theme.
pub fn load_theme(kv: &dyn KeyValueStore) -> Theme {
    match kv.get(THEME_KEY) {
        Ok(Some(s)) if s == "dark" => Theme::Dark,
        Ok(_) => Theme::Light,
        Err(e) => {
            warn!(error = %e, "theme unavailable, using light");
            Theme::Light
        }
    }
}

pub fn set_theme(kv: &mut dyn KeyValueStore, theme: Theme) -> &'static str {
    if let Err(e) = kv.set(THEME_KEY, &theme.to_string()) {
        warn!(error = %e, %theme, "failed to persist theme");
    }
    theme.meta_color()
}
