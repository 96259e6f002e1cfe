/// Five-value state shared by the scene and the UI.
///
/// Actions are plain setters; guards against illegal transitions live in the choreography.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CardStore {
    pub is_wishing: bool,
    pub tree_boost_intensity: f64,
    pub show_surprise: bool,
    pub is_video_playing: bool,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_wish(&mut self, wish: &str) {
        tracing::info!(wish, "wishing");
        self.is_wishing = true;
    }

    pub fn end_wish(&mut self) {
        self.is_wishing = false;
    }

    pub fn set_tree_boost(&mut self, intensity: f64) {
        self.tree_boost_intensity = intensity;
    }

    pub fn trigger_surprise(&mut self) {
        self.show_surprise = true;
    }

    /// The video replaces the surprise heart.
    pub fn start_video(&mut self) {
        self.is_video_playing = true;
        self.show_surprise = false;
    }

    pub fn end_video(&mut self) {
        self.is_video_playing = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/card_store.rs"]
mod tests;
