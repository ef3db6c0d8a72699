use nalgebra as na;
use serde::Deserializer;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb, Ltwh};
use crate::track::TrackId;

/// One detector output for one frame, `bbox` is left-top-width-height
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TrackId>,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(default = "BBox::unknown", deserialize_with = "nullable_bbox")]
    pub bbox: BBox<Ltwh>,
}

// missing or null coordinates become NaN, so the detection stays in its
// frame but has no center
fn nullable_bbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BBox<Ltwh>, D::Error> {
    let coords = <Option<[Option<f32>; 4]> as serde::Deserialize>::deserialize(deserializer)?;

    Ok(match coords {
        Some(c) => {
            let [l, t, w, h] = c.map(|v| v.unwrap_or(f32::NAN));
            BBox::ltwh(l, t, w, h)
        }
        None => BBox::unknown(),
    })
}

impl Detection {
    pub fn new(class_name: impl Into<String>, confidence: f32, bbox: BBox<Ltwh>) -> Self {
        Self {
            id: None,
            class_name: class_name.into(),
            confidence,
            bbox,
        }
    }

    #[inline]
    pub fn from_ltrb(class_name: impl Into<String>, confidence: f32, bbox: &BBox<Ltrb>) -> Self {
        Self::new(class_name, confidence, bbox.as_ltwh())
    }

    /// Center of the bbox, `None` when the detector produced a non-finite box.
    #[inline]
    pub fn center(&self) -> Option<na::Point2<f32>> {
        if self.bbox.is_finite() {
            Some(self.bbox.center())
        } else {
            None
        }
    }

    #[inline]
    pub fn is_class(&self, classes: &[String]) -> bool {
        classes.iter().any(|c| c == &self.class_name)
    }
}
