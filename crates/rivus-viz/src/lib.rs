//! # rivus-viz: figures of rivus results
//!
//! - [`map_svg`]: 2-D SVG map of one commodity (capacities or peak demand)
//! - [`fig3d`]: layered 3-D figure as plotly-compatible JSON
//! - [`char_plot`]: text grid of source vertices for logs
//! - [`colors`]: colours of commodities and building types
//!
//! Both map figures are drawn in a transverse Mercator projection centred on
//! the network.

pub mod charplot;
pub mod colors;
pub mod fig3d;
mod frame;
pub mod map;

pub use charplot::char_plot;
pub use colors::{color, Rgb, COLORS};
pub use fig3d::{default_commodities, fig3d, Fig3dOptions, DEFAULT_LAYER_ORDER};
pub use map::{map_svg, MapMode, MapOptions};
