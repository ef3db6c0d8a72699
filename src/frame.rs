use crate::detection::Detection;
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    #[serde(default)]
    pub index: u64,
    pub timestamp: f32, // in seconds
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(index: u64, timestamp: f32, detections: Vec<Detection>) -> Self {
        Self {
            index,
            timestamp,
            detections,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
