use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::card::script::Cue;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{CardError, CardResult};

/// Upper bound for any single particle field.
pub const MAX_FIELD_PARTICLES: u32 = 200_000;

/// A greeting card document.
///
/// This is the JSON-facing, human-edited description of one render: output format, assets, scene
/// tuning, and the scripted interactions. Asset paths are resolved against the session's assets
/// root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Length in frames.
    pub duration: u64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub title: TitleDef,
    #[serde(default)]
    pub song: SongDef,
    #[serde(default)]
    pub video: VideoDef,
    #[serde(default)]
    pub scene: SceneDef,
    #[serde(default)]
    pub script: Vec<Cue>,
}

/// Three-part headline shown at the top of the card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleDef {
    pub lead: String,
    /// Larger, brighter middle word.
    pub highlight: String,
    pub tail: String,
}

impl Default for TitleDef {
    fn default() -> Self {
        Self {
            lead: "MERRY".to_owned(),
            highlight: "100".to_owned(),
            tail: "DAYS".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongDef {
    pub path: Option<PathBuf>,
    /// `MM:SS`/text lyric file; the built-in sheet is used when absent.
    pub lyrics: Option<PathBuf>,
    pub volume: f64,
}

impl Default for SongDef {
    fn default() -> Self {
        Self {
            path: None,
            lyrics: None,
            volume: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoDef {
    pub path: Option<PathBuf>,
    pub volume: f64,
}

impl Default for VideoDef {
    fn default() -> Self {
        Self {
            path: None,
            volume: 1.0,
        }
    }
}

/// Scene tuning. Defaults reproduce the reference look.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDef {
    pub tree_particles: u32,
    pub topper_particles: u32,
    pub surprise_particles: u32,
    pub snow_particles: u32,
    pub wish_particles: u32,
    /// Device pixels per UI pixel; scales the overlay, not the particles.
    pub pixel_ratio: f64,
    /// Slow orbit of the camera around the tree.
    pub auto_rotate: bool,
}

impl Default for SceneDef {
    fn default() -> Self {
        Self {
            tree_particles: 15_000,
            topper_particles: 3_000,
            surprise_particles: 6_000,
            snow_particles: 2_000,
            wish_particles: 150,
            pixel_ratio: 1.0,
            auto_rotate: true,
        }
    }
}

impl Card {
    /// Parse a card from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CardResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| CardError::serde(format!("parse card JSON: {e}")))
    }

    /// Parse a card from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CardResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CardError::validation(format!("open card JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> CardResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(CardError::validation("canvas width/height must be > 0"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.duration == 0 {
            return Err(CardError::validation("duration must be > 0 frames"));
        }

        let s = &self.scene;
        for (name, n) in [
            ("tree_particles", s.tree_particles),
            ("topper_particles", s.topper_particles),
            ("surprise_particles", s.surprise_particles),
            ("snow_particles", s.snow_particles),
            ("wish_particles", s.wish_particles),
        ] {
            if n > MAX_FIELD_PARTICLES {
                return Err(CardError::validation(format!(
                    "scene.{name} must be <= {MAX_FIELD_PARTICLES}, got {n}"
                )));
            }
        }
        if !(s.pixel_ratio.is_finite() && s.pixel_ratio > 0.0 && s.pixel_ratio <= 4.0) {
            return Err(CardError::validation("scene.pixel_ratio must be in (0, 4]"));
        }

        for (name, v) in [("song", self.song.volume), ("video", self.video.volume)] {
            if !v.is_finite() || v < 0.0 {
                return Err(CardError::validation(format!(
                    "{name}.volume must be finite and >= 0"
                )));
            }
        }

        for cue in &self.script {
            cue.validate()?;
        }
        Ok(())
    }

    /// Length of the card in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.duration)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/model.rs"]
mod tests;
