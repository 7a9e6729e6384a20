use rivus_core::{BoundingBox, LineString, Point, RivusError, RivusResult, StreetNetwork};
use rivus_geo::TransverseMercator;

/// Transverse Mercator frame centred on a street network.
///
/// Projected coordinates are metres from the lower-left corner of the
/// network extent grown by `extent` on every side.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MapFrame {
    projection: TransverseMercator,
    pub bounds: BoundingBox,
}

impl MapFrame {
    pub fn new(network: &StreetNetwork, extent: f64) -> RivusResult<Self> {
        let geographic = network
            .bounds()
            .ok_or_else(|| RivusError::Validation("cannot plot an empty network".into()))?;
        let centre = geographic.center();
        let projection = TransverseMercator::centred(centre.y, centre.x);
        let projected: Vec<Point> = network
            .vertices()
            .map(|v| v.geometry)
            .chain(network.edges().flat_map(|e| e.geometry.coords.iter().copied()))
            .map(|p| projection.forward(p))
            .collect();
        let bounds = BoundingBox::from_points(&projected)
            .ok_or_else(|| RivusError::Validation("cannot plot an empty network".into()))?
            .expanded(extent);
        Ok(Self { projection, bounds })
    }

    pub fn project(&self, lonlat: Point) -> Point {
        let p = self.projection.forward(lonlat);
        Point::new(p.x - self.bounds.min_x, p.y - self.bounds.min_y)
    }

    pub fn project_line(&self, line: &LineString) -> Vec<Point> {
        line.coords.iter().map(|p| self.project(*p)).collect()
    }

    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    pub fn height(&self) -> f64 {
        self.bounds.height()
    }
}

/// Line width for a capacity or demand value.
pub fn linewidth(value: f64, scale: f64) -> f64 {
    value.max(0.0).sqrt() * 0.05 * scale
}
