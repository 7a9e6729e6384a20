//! Line layer clean-up: snapping loose ends, pruning stubs, splitting at
//! crossings and merging chains.
//!
//! All distances are in the coordinate units of the layer. Work on a projected
//! layer when metres are meant.

use rivus_core::geometry::{point_segment_distance, EPSILON};
use rivus_core::{Geometry, LineString, Point, PointDistance, RivusError, RivusResult};

/// Decimal places used to decide whether a contact point is a vertex.
const VERTEX_DECIMALS: i32 = 6;

/// Projection parameters below this value snap to the segment start.
const PROJECTION_START_TOLERANCE: f64 = 0.00001;

fn push_unique(points: &mut Vec<Point>, p: Point) {
    if !points.iter().any(|q| q.coincides(&p)) {
        points.push(p);
    }
}

/// Start and end points of all lines, without duplicates, in order of appearance.
pub fn endpoints_from_lines(lines: &[LineString]) -> Vec<Point> {
    let mut points = Vec::new();
    for line in lines {
        for p in line.start().into_iter().chain(line.end()) {
            push_unique(&mut points, p);
        }
    }
    points
}

/// Every coordinate of every line, without duplicates, in order of appearance.
pub fn vertices_from_lines(lines: &[LineString]) -> Vec<Point> {
    let mut points = Vec::new();
    for p in lines.iter().flat_map(|l| l.coords.iter()) {
        push_unique(&mut points, *p);
    }
    points
}

/// Coordinates of all lines where close but not identical points are unified:
/// a coordinate is kept only if no kept vertex lies within `closeness`.
pub fn snapping_vertices_from_lines(lines: &[LineString], closeness: f64) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::new();
    for p in lines.iter().flat_map(|l| l.coords.iter()) {
        if kept.iter().all(|k| k.distance(p) > closeness) {
            kept.push(*p);
        }
    }
    kept
}

/// Indices of `lines` touching `of` (contact at end points only).
/// An identical line is not its own neighbour.
pub fn neighbors(lines: &[LineString], of: &LineString) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| *line != of && line.touches(of))
        .map(|(k, _)| k)
        .collect()
}

/// Moves the point `at` of `line` to `to`.
///
/// When `at` is a vertex of the line that vertex moves; otherwise the vertex
/// nearest to `at` does.
pub fn bend_towards(line: &LineString, at: &Point, to: &Point) -> RivusResult<LineString> {
    if !line.intersects_point(at) {
        return Err(RivusError::Geometry(format!(
            "line does not contain the point ({}, {})",
            at.x, at.y
        )));
    }
    let mut coords = line.coords.clone();
    if let Some(k) = coords
        .iter()
        .position(|v| at.almost_equals(v, VERTEX_DECIMALS))
    {
        coords[k] = *to;
        return Ok(LineString::new(coords));
    }
    let nearest = coords
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| at.distance(a).total_cmp(&at.distance(b)))
        .map(|(k, _)| k);
    if let Some(k) = nearest {
        coords[k] = *to;
    }
    Ok(LineString::new(coords))
}

/// A point shared by two touching lines, preferring end points.
fn contact_point(a: &LineString, b: &LineString) -> Option<Point> {
    a.start()
        .into_iter()
        .chain(a.end())
        .find(|p| b.intersects_point(p))
        .or_else(|| b.start().into_iter().chain(b.end()).find(|p| a.intersects_point(p)))
        .or_else(|| a.intersection_points(b).into_iter().next())
}

/// Removes lines shorter than `min_length`; the contact points of touching
/// lines are pulled to the centroid of the removed line.
pub fn prune_short_lines(lines: &[LineString], min_length: f64) -> RivusResult<Vec<LineString>> {
    let mut pruned: Vec<LineString> = lines.to_vec();
    let mut removed = vec![false; pruned.len()];

    for i in 0..pruned.len() {
        let line = pruned[i].clone();
        if line.length() >= min_length {
            continue;
        }
        removed[i] = true;
        let Some(centroid) = line.centroid() else {
            continue;
        };
        for n in neighbors(&pruned, &line) {
            if n == i {
                continue;
            }
            let Some(contact) = contact_point(&line, &pruned[n]) else {
                continue;
            };
            pruned[n] = bend_towards(&pruned[n], &contact, &centroid)?;
        }
    }

    Ok(pruned
        .into_iter()
        .zip(removed)
        .filter(|(_, gone)| !gone)
        .map(|(line, _)| line)
        .collect())
}

/// Nearest of `others` within `max_distance` of `point`, ignoring points
/// that coincide with it.
pub fn nearest_neighbor_within(others: &[Point], point: &Point, max_distance: f64) -> Option<Point> {
    others
        .iter()
        .map(|p| (p, p.distance(point)))
        .filter(|(_, d)| *d > 0.0 && *d <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| *p)
}

/// End points that are not an end point of any other line.
pub fn find_isolated_endpoints(lines: &[LineString]) -> Vec<Point> {
    let mut isolated = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        for endpoint in line.start().into_iter().chain(line.end()) {
            let joined = lines
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.touches_point(&endpoint));
            if !joined {
                isolated.push(endpoint);
            }
        }
    }
    isolated
}

/// Snaps isolated end points to the nearest line vertex at most
/// `max_distance` away. Lines collapsed to zero length are dropped.
pub fn snappy_endings(lines: &[LineString], max_distance: f64) -> RivusResult<Vec<LineString>> {
    let mut snapped: Vec<LineString> = lines.to_vec();
    let mut snapping_points = vertices_from_lines(&snapped);

    for endpoint in find_isolated_endpoints(&snapped) {
        let Some(target) = nearest_neighbor_within(&snapping_points, &endpoint, max_distance)
        else {
            continue;
        };

        if let Some(i) = snapped.iter().position(|l| l.touches_point(&endpoint)) {
            snapped[i] = bend_towards(&snapped[i], &endpoint, &target)?;
        }
        if let Some(p) = snapping_points.iter_mut().find(|p| p.coincides(&endpoint)) {
            *p = target;
        }
    }

    snapped.retain(|l| l.length() > 0.0);
    Ok(snapped)
}

/// Nearest geometry to `point` as `(geometry, distance, index)`.
pub fn closest_object<'a, G: PointDistance>(
    geometries: &'a [G],
    point: &Point,
) -> Option<(&'a G, f64, usize)> {
    geometries
        .iter()
        .enumerate()
        .map(|(k, g)| (g, g.distance_to(point), k))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Nearest point to `point` on the segment `start`-`end`.
///
/// Projections falling outside the segment (or within 1e-5 of its start)
/// return the nearer end point, the start on ties.
pub fn project_point_to_line(point: &Point, start: &Point, end: &Point) -> Point {
    let magnitude = start.distance(end);
    if magnitude == 0.0 {
        return *start;
    }
    let u = ((point.x - start.x) * (end.x - start.x) + (point.y - start.y) * (end.y - start.y))
        / (magnitude * magnitude);
    if !(PROJECTION_START_TOLERANCE..=1.0).contains(&u) {
        if point.distance(start) > point.distance(end) {
            *end
        } else {
            *start
        }
    } else {
        Point::new(
            start.x + u * (end.x - start.x),
            start.y + u * (end.y - start.y),
        )
    }
}

/// Overlapping pairs `(a[k], a[k+1])`.
pub fn pairs<T>(items: &[T]) -> impl Iterator<Item = (&T, &T)> {
    items.windows(2).map(|w| (&w[0], &w[1]))
}

/// Nearest point on a line or on the exterior ring of a polygon.
pub fn project_point_to_object(point: &Point, geometry: &Geometry) -> RivusResult<Point> {
    let coords = match geometry {
        Geometry::LineString(line) => line.coords.clone(),
        Geometry::Polygon(polygon) => polygon.boundary().coords,
        other => {
            return Err(RivusError::Geometry(format!(
                "project_point_to_object not implemented for geometry type '{}'",
                other.type_name()
            )))
        }
    };
    pairs(&coords)
        .map(|(a, b)| project_point_to_line(point, a, b))
        .min_by(|a, b| point.distance(a).total_cmp(&point.distance(b)))
        .ok_or_else(|| RivusError::Geometry("cannot project onto an empty geometry".into()))
}

fn endpoint_degree(lines: &[LineString], p: &Point) -> usize {
    lines
        .iter()
        .flat_map(|l| l.start().into_iter().chain(l.end()))
        .filter(|q| q.coincides(p))
        .count()
}

/// Joins `a` and `b` at their common end point `at`.
fn join_at(a: &LineString, b: &LineString, at: &Point) -> LineString {
    let a = match a.end() {
        Some(end) if end.coincides(at) => a.clone(),
        _ => a.reversed(),
    };
    let b = match b.start() {
        Some(start) if start.coincides(at) => b.clone(),
        _ => b.reversed(),
    };
    let mut coords = a.coords;
    coords.extend(b.coords.into_iter().skip(1));
    LineString::new(coords)
}

fn find_mergeable(lines: &[LineString]) -> Option<(usize, usize, Point)> {
    for i in 0..lines.len() {
        if lines[i].is_closed() {
            continue;
        }
        for p in lines[i].start().into_iter().chain(lines[i].end()) {
            if endpoint_degree(lines, &p) != 2 {
                continue;
            }
            let partner = lines
                .iter()
                .enumerate()
                .find(|(j, other)| *j != i && !other.is_closed() && other.touches_point(&p));
            if let Some((j, _)) = partner {
                return Some((i, j, p));
            }
        }
    }
    None
}

/// Merges lines into maximal chains through junctions of degree two.
pub fn linemerge(lines: &[LineString]) -> Vec<LineString> {
    let mut merged: Vec<LineString> = lines
        .iter()
        .filter(|l| l.coords.len() >= 2)
        .cloned()
        .collect();
    while let Some((i, j, at)) = find_mergeable(&merged) {
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let second = merged.remove(hi);
        let first = merged.remove(lo);
        let joined = if lo == i {
            join_at(&first, &second, &at)
        } else {
            join_at(&second, &first, &at)
        };
        merged.insert(lo, joined);
    }
    merged
}

/// Splits `line` at every point of `cuts` lying on it.
fn split_at_points(line: &LineString, cuts: &[Point]) -> Vec<LineString> {
    let Some(first) = line.start() else {
        return Vec::new();
    };
    let last = line.coords.len() - 1;
    let mut pieces = Vec::new();
    let mut current = vec![first];

    for (k, (a, b)) in line.segments().enumerate() {
        let mut on_segment: Vec<Point> = cuts
            .iter()
            .filter(|c| {
                point_segment_distance(c, &a, &b) <= EPSILON && !c.coincides(&a) && !c.coincides(&b)
            })
            .copied()
            .collect();
        on_segment.sort_by(|p, q| a.distance(p).total_cmp(&a.distance(q)));
        on_segment.dedup_by(|p, q| p.coincides(q));
        for cut in on_segment {
            current.push(cut);
            pieces.push(LineString::new(std::mem::replace(&mut current, vec![cut])));
        }
        current.push(b);
        if k + 1 < last && cuts.iter().any(|c| c.coincides(&b)) {
            pieces.push(LineString::new(std::mem::replace(&mut current, vec![b])));
        }
    }
    if current.len() >= 2 {
        pieces.push(LineString::new(current));
    }
    pieces
}

/// Returns lines whose end points lie at all crossings and touching points,
/// and only there.
pub fn one_linestring_per_intersection(lines: &[LineString]) -> Vec<LineString> {
    let mut pieces = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let cuts: Vec<Point> = lines
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .flat_map(|(_, other)| line.intersection_points(other))
            .collect();
        pieces.extend(split_at_points(line, &cuts));
    }
    pieces.retain(|l| l.length() > 0.0);
    linemerge(&pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivus_core::Polygon;

    fn line(coords: &[(f64, f64)]) -> LineString {
        LineString::from_xy(coords)
    }

    #[test]
    fn endpoints_are_unique() {
        let lines = vec![line(&[(0.0, 0.0), (1.0, 0.0)]), line(&[(1.0, 0.0), (2.0, 0.0)])];
        assert_eq!(endpoints_from_lines(&lines).len(), 3);
        let bent = vec![line(&[(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)])];
        assert_eq!(vertices_from_lines(&bent).len(), 3);
        assert_eq!(endpoints_from_lines(&bent).len(), 2);
    }

    #[test]
    fn close_vertices_are_unified() {
        let lines = vec![line(&[(0.0, 0.0), (1.0, 0.0)]), line(&[(1.05, 0.0), (2.0, 0.0)])];
        let verts = snapping_vertices_from_lines(&lines, 0.1);
        assert_eq!(verts.len(), 3);
        assert!(verts[1].coincides(&Point::new(1.0, 0.0)));
    }

    #[test]
    fn bend_requires_point_on_line() {
        let l = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let moved = bend_towards(&l, &Point::new(1.0, 0.0), &Point::new(1.0, 1.0)).unwrap();
        assert_eq!(moved.end(), Some(Point::new(1.0, 1.0)));
        let mid = bend_towards(&l, &Point::new(0.4, 0.0), &Point::new(0.0, 1.0)).unwrap();
        assert_eq!(mid.start(), Some(Point::new(0.0, 1.0)));
        assert!(bend_towards(&l, &Point::new(0.5, 0.5), &Point::new(0.0, 1.0)).is_err());
    }

    #[test]
    fn short_line_is_pruned_and_neighbours_bent() {
        let lines = vec![
            line(&[(0.0, 0.0), (10.0, 0.0)]),
            line(&[(10.0, 0.0), (10.2, 0.0)]),
            line(&[(10.2, 0.0), (20.0, 0.0)]),
        ];
        let pruned = prune_short_lines(&lines, 1.0).unwrap();
        assert_eq!(pruned.len(), 2);
        assert!(pruned[0].end().unwrap().coincides(&Point::new(10.1, 0.0)));
        assert!(pruned[1].start().unwrap().coincides(&Point::new(10.1, 0.0)));
    }

    #[test]
    fn loose_end_snaps_to_nearby_vertex() {
        let lines = vec![
            line(&[(0.0, 0.0), (10.0, 0.0)]),
            line(&[(10.3, 0.2), (10.3, 10.0)]),
        ];
        let snapped = snappy_endings(&lines, 1.0).unwrap();
        assert_eq!(snapped.len(), 2);
        let joined = snapped
            .iter()
            .any(|l| l.coords.iter().any(|p| p.coincides(&Point::new(10.3, 0.2))) && l != &lines[1]);
        assert!(joined);
    }

    #[test]
    fn isolated_endpoints_of_a_path() {
        let lines = vec![line(&[(0.0, 0.0), (1.0, 0.0)]), line(&[(1.0, 0.0), (2.0, 0.0)])];
        let isolated = find_isolated_endpoints(&lines);
        assert_eq!(isolated, vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0)]);
    }

    #[test]
    fn projection_falls_back_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(project_point_to_line(&Point::new(5.0, 3.0), &a, &b), Point::new(5.0, 0.0));
        assert_eq!(project_point_to_line(&Point::new(12.0, 1.0), &a, &b), b);
        assert_eq!(project_point_to_line(&Point::new(-1.0, 1.0), &a, &b), a);
        assert_eq!(project_point_to_line(&Point::new(3.0, 3.0), &a, &a), a);
    }

    #[test]
    fn project_onto_polygon_and_reject_points() {
        let square = Geometry::Polygon(Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ]));
        let p = project_point_to_object(&Point::new(3.0, 1.0), &square).unwrap();
        assert!(p.coincides(&Point::new(2.0, 1.0)));
        let err = project_point_to_object(&Point::new(0.0, 0.0), &Geometry::Point(Point::new(1.0, 1.0)));
        assert!(err.is_err());
    }

    #[test]
    fn closest_object_reports_index() {
        let lines = vec![line(&[(0.0, 5.0), (1.0, 5.0)]), line(&[(0.0, 1.0), (1.0, 1.0)])];
        let (_, dist, idx) = closest_object(&lines, &Point::new(0.5, 0.0)).unwrap();
        assert_eq!(idx, 1);
        assert!((dist - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pairs_overlap() {
        let items = [4, 7, 11, 2];
        let got: Vec<(i32, i32)> = pairs(&items).map(|(a, b)| (*a, *b)).collect();
        assert_eq!(got, vec![(4, 7), (7, 11), (11, 2)]);
    }

    #[test]
    fn merge_joins_chains_but_not_junctions() {
        let chain = vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(2.0, 0.0), (1.0, 0.0)]),
            line(&[(2.0, 0.0), (3.0, 0.0)]),
        ];
        let merged = linemerge(&chain);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].coords.len(), 4);

        let star = vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0)]),
            line(&[(1.0, 0.0), (1.0, 1.0)]),
        ];
        assert_eq!(linemerge(&star).len(), 3);
    }

    #[test]
    fn crossing_lines_are_split() {
        let cross = vec![line(&[(-1.0, 0.0), (1.0, 0.0)]), line(&[(0.0, -1.0), (0.0, 1.0)])];
        let pieces = one_linestring_per_intersection(&cross);
        assert_eq!(pieces.len(), 4);
        assert!(pieces.iter().all(|p| (p.length() - 1.0).abs() < 1e-12));
    }
}
