pub mod anomaly;
pub mod bbox;
pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod line;
pub mod math;
pub mod monitor;
pub mod movement;
pub mod scene;
pub mod track;
pub mod tracker;

mod circular_queue;

pub use config::Config;
pub use detection::Detection;
pub use error::Error;
pub use frame::Frame;
pub use line::{CountingLine, Direction};
pub use scene::{FrameReport, Scene};
pub use track::{Track, TrackId};
pub use tracker::VehicleTracker;

use monitor::TrafficStatistics;
use std::collections::HashMap;

pub trait Monitoring {
    fn update(&mut self, frames: Vec<Frame>, src: &str) -> Vec<FrameReport>;
    fn statistics(&self, src: &str) -> Option<TrafficStatistics>;
    fn reset(&mut self, src: &str);
}

/// Keeps one independent [`Scene`] per video source.
pub struct TrafficMeter {
    config: Config,
    scenes: HashMap<String, Scene>,
}

impl TrafficMeter {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            scenes: HashMap::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn scene(&self, src: &str) -> Option<&Scene> {
        self.scenes.get(src)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }
}

impl Default for TrafficMeter {
    fn default() -> Self {
        Self {
            config: Config::default(),
            scenes: HashMap::new(),
        }
    }
}

impl crate::Monitoring for TrafficMeter {
    fn update(&mut self, frames: Vec<Frame>, src: &str) -> Vec<FrameReport> {
        let config = &self.config;
        let scene = self.scenes.entry(src.to_string()).or_insert_with(|| {
            log::info!("new scene for source `{}`", src);
            Scene::new(config)
        });

        frames.into_iter().map(|f| scene.process(f)).collect()
    }

    #[inline]
    fn statistics(&self, src: &str) -> Option<TrafficStatistics> {
        self.scenes.get(src).map(Scene::statistics)
    }

    fn reset(&mut self, src: &str) {
        if let Some(scene) = self.scenes.get_mut(src) {
            scene.reset();
        }
    }
}
