//! Minimal planar geometry for street layers.
//!
//! Coordinates are `(x, y)`; for WGS84 layers that is `(longitude, latitude)`
//! in degrees. Planar operations (distance, length, projection) work in the
//! coordinate units; [`LineString::geodesic_length`] returns metres.

use serde::{Deserialize, Serialize};

/// Mean earth radius (m), IUGG.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Distance below which two coordinates are considered equal.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Coordinate equality up to `decimal` decimal places.
    pub fn almost_equals(&self, other: &Point, decimal: i32) -> bool {
        let tol = 0.5 * 10f64.powi(-decimal);
        (self.x - other.x).abs() < tol && (self.y - other.y).abs() < tol
    }

    pub fn coincides(&self, other: &Point) -> bool {
        self.distance(other) <= EPSILON
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Great-circle distance in metres, reading `x` as longitude and `y` as latitude.
    pub fn haversine_distance(&self, other: &Point) -> f64 {
        let (lat1, lat2) = (self.y.to_radians(), other.y.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.x - self.x).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Closest point to `p` on the segment `a`-`b`.
pub fn closest_point_on_segment(p: &Point, a: &Point, b: &Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return *a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

pub fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    p.distance(&closest_point_on_segment(p, a, b))
}

/// Intersection point of two segments, if they cross or touch in a single point.
/// Collinear overlaps return `None`.
pub fn segment_intersection(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<Point> {
    let r = (a2.x - a1.x, a2.y - a1.y);
    let s = (b2.x - b1.x, b2.y - b1.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let qp = (b1.x - a1.x, b1.y - a1.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    let tol = 1e-12;
    if (-tol..=1.0 + tol).contains(&t) && (-tol..=1.0 + tol).contains(&u) {
        Some(Point::new(a1.x + t * r.0, a1.y + t * r.1))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    pub coords: Vec<Point>,
}

impl LineString {
    pub fn new(coords: Vec<Point>) -> Self {
        Self { coords }
    }

    pub fn from_xy(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn start(&self) -> Option<Point> {
        self.coords.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.coords.last().copied()
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.coords.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance(&b)).sum()
    }

    /// Length in metres along the earth surface (coordinates in degrees).
    pub fn geodesic_length(&self) -> f64 {
        self.segments().map(|(a, b)| a.haversine_distance(&b)).sum()
    }

    pub fn is_closed(&self) -> bool {
        match (self.start(), self.end()) {
            (Some(a), Some(b)) => self.coords.len() > 2 && a.coincides(&b),
            _ => false,
        }
    }

    /// Length-weighted centroid; degenerate lines fall back to the mean coordinate.
    pub fn centroid(&self) -> Option<Point> {
        let total = self.length();
        if total <= 0.0 {
            let n = self.coords.len();
            if n == 0 {
                return None;
            }
            let (sx, sy) = self
                .coords
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            return Some(Point::new(sx / n as f64, sy / n as f64));
        }
        let (cx, cy) = self.segments().fold((0.0, 0.0), |(cx, cy), (a, b)| {
            let w = a.distance(&b);
            (cx + w * (a.x + b.x) / 2.0, cy + w * (a.y + b.y) / 2.0)
        });
        Some(Point::new(cx / total, cy / total))
    }

    /// Point at `fraction` (0..=1) of the length along the line.
    pub fn interpolate_normalized(&self, fraction: f64) -> Option<Point> {
        let first = self.start()?;
        let target = self.length() * fraction.clamp(0.0, 1.0);
        let mut walked = 0.0;
        for (a, b) in self.segments() {
            let seg = a.distance(&b);
            if walked + seg >= target && seg > 0.0 {
                let t = (target - walked) / seg;
                return Some(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
            }
            walked += seg;
        }
        self.end().or(Some(first))
    }

    pub fn distance_to_point(&self, point: &Point) -> f64 {
        match self.coords.len() {
            0 => f64::INFINITY,
            1 => self.coords[0].distance(point),
            _ => self
                .segments()
                .map(|(a, b)| point_segment_distance(point, &a, &b))
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// Shortest distance between two lines.
    pub fn distance_to_line(&self, other: &LineString) -> f64 {
        for (a1, a2) in self.segments() {
            for (b1, b2) in other.segments() {
                if segment_intersection(&a1, &a2, &b1, &b2).is_some() {
                    return 0.0;
                }
            }
        }
        let a = self
            .coords
            .iter()
            .map(|p| other.distance_to_point(p))
            .fold(f64::INFINITY, f64::min);
        let b = other
            .coords
            .iter()
            .map(|p| self.distance_to_point(p))
            .fold(f64::INFINITY, f64::min);
        a.min(b)
    }

    pub fn intersects_point(&self, point: &Point) -> bool {
        self.distance_to_point(point) <= EPSILON
    }

    /// True when `point` is one of the two (distinct) end points.
    pub fn touches_point(&self, point: &Point) -> bool {
        if self.is_closed() {
            return false;
        }
        match (self.start(), self.end()) {
            (Some(a), Some(b)) => a.coincides(point) || b.coincides(point),
            _ => false,
        }
    }

    /// True when the lines share at least one point but only at end points.
    pub fn touches(&self, other: &LineString) -> bool {
        let own_ends: Vec<Point> = self.start().into_iter().chain(self.end()).collect();
        let other_ends: Vec<Point> = other.start().into_iter().chain(other.end()).collect();
        let end_contact = own_ends.iter().any(|p| other.intersects_point(p))
            || other_ends.iter().any(|p| self.intersects_point(p));
        if !end_contact {
            return false;
        }
        for (a1, a2) in self.segments() {
            for (b1, b2) in other.segments() {
                if let Some(x) = segment_intersection(&a1, &a2, &b1, &b2) {
                    let at_own_end = own_ends.iter().any(|p| p.coincides(&x));
                    let at_other_end = other_ends.iter().any(|p| p.coincides(&x));
                    if !at_own_end && !at_other_end {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Points shared by both lines (segment crossings and touching end points).
    pub fn intersection_points(&self, other: &LineString) -> Vec<Point> {
        let mut points: Vec<Point> = Vec::new();
        for (a1, a2) in self.segments() {
            for (b1, b2) in other.segments() {
                if let Some(x) = segment_intersection(&a1, &a2, &b1, &b2) {
                    if !points.iter().any(|p| p.coincides(&x)) {
                        points.push(x);
                    }
                }
            }
        }
        points
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.coords.iter())
    }

    pub fn reversed(&self) -> LineString {
        let mut coords = self.coords.clone();
        coords.reverse();
        LineString::new(coords)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self { exterior }
    }

    /// Signed shoelace area of the exterior ring.
    fn signed_area(&self) -> f64 {
        let ring = &self.exterior;
        if ring.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn centroid(&self) -> Option<Point> {
        let area = self.signed_area();
        let ring = &self.exterior;
        if area.abs() < f64::EPSILON {
            return LineString::new(ring.clone()).centroid();
        }
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            let cross = a.x * b.y - b.x * a.y;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
    }

    /// Exterior ring as a closed line.
    pub fn boundary(&self) -> LineString {
        let mut coords = self.exterior.clone();
        if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
            if !first.coincides(&last) {
                coords.push(first);
            }
        }
        LineString::new(coords)
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.exterior.iter())
    }
}

impl Polygon {
    /// Even-odd test; points on the boundary count as inside.
    pub fn contains_point(&self, p: &Point) -> bool {
        let ring = &self.exterior;
        if ring.len() < 3 {
            return false;
        }
        if self.boundary().intersects_point(p) {
            return true;
        }
        let mut inside = false;
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Any geometry that can report its distance to a point.
pub trait PointDistance {
    fn distance_to(&self, point: &Point) -> f64;
}

impl PointDistance for Point {
    fn distance_to(&self, point: &Point) -> f64 {
        self.distance(point)
    }
}

impl PointDistance for LineString {
    fn distance_to(&self, point: &Point) -> f64 {
        self.distance_to_point(point)
    }
}

impl PointDistance for Polygon {
    fn distance_to(&self, point: &Point) -> f64 {
        if self.contains_point(point) {
            0.0
        } else {
            self.boundary().distance_to_point(point)
        }
    }
}

/// A single feature geometry of a vector layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
        }
    }

    pub fn centroid(&self) -> Option<Point> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::LineString(l) => l.centroid(),
            Geometry::Polygon(p) => p.centroid(),
        }
    }
}

impl PointDistance for Geometry {
    fn distance_to(&self, point: &Point) -> f64 {
        match self {
            Geometry::Point(p) => p.distance_to(point),
            Geometry::LineString(l) => l.distance_to(point),
            Geometry::Polygon(p) => p.distance_to(point),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => BoundingBox {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => b.including(p),
            })
        })
    }

    pub fn including(&self, p: &Point) -> Self {
        BoundingBox {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Grows the box by `fraction` of its width/height on every side.
    pub fn expanded(&self, fraction: f64) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        BoundingBox {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_centroid_of_polyline() {
        let line = LineString::from_xy(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]);
        assert_eq!(line.length(), 4.0);
        let c = line.centroid().unwrap();
        assert!((c.x - 1.5).abs() < 1e-12);
        assert!((c.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn interpolate_midpoint() {
        let line = LineString::from_xy(&[(0.0, 0.0), (4.0, 0.0)]);
        let mid = line.interpolate_normalized(0.5).unwrap();
        assert!(mid.coincides(&Point::new(2.0, 0.0)));
    }

    #[test]
    fn touches_only_at_end_points() {
        let a = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = LineString::from_xy(&[(1.0, 0.0), (1.0, 1.0)]);
        let crossing = LineString::from_xy(&[(0.5, -1.0), (0.5, 1.0)]);
        let t_junction = LineString::from_xy(&[(0.5, 0.0), (0.5, 1.0)]);
        assert!(a.touches(&b));
        assert!(!a.touches(&crossing));
        assert!(a.touches(&t_junction));
    }

    #[test]
    fn haversine_of_one_degree_latitude() {
        let a = Point::new(11.0, 48.0);
        let b = Point::new(11.0, 49.0);
        let d = a.haversine_distance(&b);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn polygon_centroid_and_area() {
        let square = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ]);
        assert_eq!(square.area(), 4.0);
        let c = square.centroid().unwrap();
        assert!(c.coincides(&Point::new(1.0, 1.0)));
        assert!(square.boundary().is_closed());
    }

    #[test]
    fn point_in_polygon_has_zero_distance() {
        let square = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ]);
        assert_eq!(square.distance_to(&Point::new(1.0, 1.0)), 0.0);
        assert_eq!(square.distance_to(&Point::new(3.0, 1.0)), 1.0);
    }

    #[test]
    fn bounding_box_expansion() {
        let bbox = BoundingBox::from_points(&[Point::new(0.0, 0.0), Point::new(10.0, 20.0)]).unwrap();
        let grown = bbox.expanded(0.05);
        assert_eq!(grown.min_x, -0.5);
        assert_eq!(grown.max_y, 21.0);
    }
}
