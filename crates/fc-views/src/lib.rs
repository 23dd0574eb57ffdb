//! Renderer adapters and the controller that drives them
//!
//! Every adapter turns store snapshots into its own visual primitives and
//! reports clicks back through the handler it was mounted with. Nothing in
//! here mutates the store except that handler and the controller.

mod adapter;
mod binding;
mod controller;
mod dom_globe;
mod reconcile;
mod sphere;
mod style;
mod surface;
mod tile_map;
mod viewport;

pub use adapter::{AdapterKind, AdapterSettings, Container, RendererAdapter, SelectHandler};
pub use binding::AdapterBinding;
pub use controller::ViewController;
pub use dom_globe::{equirectangular, DomGlobeAdapter};
pub use reconcile::{PrimitiveSet, ReconcileReport};
pub use sphere::{lat_lon_to_cartesian, SphereAdapter, GLOBE_RADIUS, POINT_OFFSET};
pub use tile_map::{TileLayer, TileMapAdapter};
pub use viewport::Viewport;
