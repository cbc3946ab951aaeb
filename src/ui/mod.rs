/// View helpers for the main window
///
/// - `preview.rs` - rendered image panel and the drop target placeholder
/// - `results.rs` - detections table, palette legend and the error banner

pub mod preview;
pub mod results;
