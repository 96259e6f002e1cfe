use serde::{Deserialize, Serialize};

use crate::foundation::error::{CardError, CardResult};

/// Seconds a scripted wish spends "being typed" when the cue does not say.
pub const DEFAULT_TYPE_SECS: f64 = 1.2;

/// One scripted interaction, standing in for a click or key press.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Card time in seconds at which the interaction lands.
    pub at: f64,
    #[serde(flatten)]
    pub action: CueAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
pub enum CueAction {
    /// Press the music button.
    ToggleMusic,
    /// Type `text` into the wish box and press Send at `at`.
    ///
    /// Typing starts `type_secs` earlier so the text appears in the box before it is sent.
    Wish {
        text: String,
        #[serde(default)]
        type_secs: Option<f64>,
    },
    /// Click the tree.
    TapTree,
    /// Click the video or its Close button.
    CloseVideo,
}

impl CueAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleMusic => "toggle_music",
            Self::Wish { .. } => "wish",
            Self::TapTree => "tap_tree",
            Self::CloseVideo => "close_video",
        }
    }
}

impl Cue {
    pub fn validate(&self) -> CardResult<()> {
        if !self.at.is_finite() || self.at < 0.0 {
            return Err(CardError::validation(format!(
                "cue '{}' time must be finite and >= 0, got {}",
                self.action.name(),
                self.at
            )));
        }
        if let CueAction::Wish {
            type_secs: Some(ts),
            ..
        } = &self.action
            && (!ts.is_finite() || *ts < 0.0)
        {
            return Err(CardError::validation(
                "wish cue type_secs must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Seconds the wish text is visible in the box before it is sent.
    pub fn type_secs(&self) -> f64 {
        match &self.action {
            CueAction::Wish { type_secs, .. } => type_secs.unwrap_or(DEFAULT_TYPE_SECS),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/script.rs"]
mod tests;
