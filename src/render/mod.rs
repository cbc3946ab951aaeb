/// Drawing detections over the selected image
///
/// - `palette.rs` - class to color mapping
/// - `surface.rs` - the `Surface` drawing target and its CPU raster implementation
/// - `renderer.rs` - lays out boxes and labels on a `Surface`

pub mod palette;
pub mod renderer;
pub mod surface;
