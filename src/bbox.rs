use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(transparent, bound = "")]
pub struct BBox<F: BBoxFormat> {
    coords: [f32; 4],
    #[serde(skip)]
    format: PhantomData<F>,
}

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.coords
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline(always)]
    fn raw(coords: [f32; 4]) -> Self {
        Self {
            coords,
            format: PhantomData,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.coords
    }

    /// Detector output is sometimes NaN-padded, such boxes have no center.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|c| c.is_finite())
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::raw([left, top, width, height])
    }

    /// Box of a detection the detector could not localize, has no center.
    #[inline]
    pub fn unknown() -> Self {
        Self::raw([f32::NAN; 4])
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.coords[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.coords[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.coords[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.coords[3]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(
            self.left() + self.width() / 2.0,
            self.top() + self.height() / 2.0,
        )
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline]
    pub fn as_xywh(&self) -> BBox<Xywh> {
        self.into()
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::raw([left, top, right, bottom])
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.coords[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.coords[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.coords[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.coords[3]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(
            (self.left() + self.right()) / 2.0,
            (self.top() + self.bottom()) / 2.0,
        )
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }
}

impl BBox<Xywh> {
    #[inline]
    pub fn xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::raw([cx, cy, width, height])
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.coords[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.coords[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.coords[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.coords[3]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.cx(), self.cy())
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        let [l, t, w, h] = v.coords;
        Self::raw([l, t, l + w, t + h])
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        let [l, t, r, b] = v.coords;
        Self::raw([l, t, r - l, b - t])
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Xywh> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        let [l, t, w, h] = v.coords;
        Self::raw([l + w / 2.0, t + h / 2.0, w, h])
    }
}

impl<'a> From<&'a BBox<Xywh>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Xywh>) -> Self {
        let [cx, cy, w, h] = v.coords;
        Self::raw([cx - w / 2.0, cy - h / 2.0, w, h])
    }
}
