/// State management module
///
/// This module handles all application state, including:
/// - Detections and table rows (data.rs)
/// - Ownership of the displayed preview (preview.rs)
/// - The Idle/Loading/Ready/Failed session and its stale-response guard (session.rs)

pub mod data;
pub mod preview;
pub mod session;
