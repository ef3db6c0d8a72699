use nalgebra as na;

/// True when `a`, `b`, `c` are in strictly counter-clockwise order
/// (clockwise on screen, where y grows downward).
#[inline]
pub fn ccw(a: &na::Point2<f32>, b: &na::Point2<f32>, c: &na::Point2<f32>) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// Whether segments `p1-p2` and `p3-p4` intersect. Collinear segments never
/// do; an endpoint lying exactly on the other segment counts on one side only.
#[inline]
pub fn segments_intersect(
    p1: &na::Point2<f32>,
    p2: &na::Point2<f32>,
    p3: &na::Point2<f32>,
    p4: &na::Point2<f32>,
) -> bool {
    ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
}

/// Sum of distances between consecutive points.
pub fn path_length<'a, I>(points: I) -> f32
where
    I: IntoIterator<Item = &'a na::Point2<f32>>,
{
    let mut iter = points.into_iter();
    let mut prev = match iter.next() {
        Some(p) => p,
        None => return 0.0,
    };

    let mut total = 0.0;
    for p in iter {
        total += na::distance(prev, p);
        prev = p;
    }

    total
}
