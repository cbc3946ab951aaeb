/// Detection session
///
/// Current image, its detections, the Idle/Loading/Ready/Failed phase and
/// the banner message, plus the ids that keep late completions out.
use tracing::{debug, error, info, warn};

use super::data::{DetectionSet, ResultRow};
use super::preview::{AssetId, ImageAsset, ImageUpload, PreviewRegistry};
use crate::error::DetectResult;
use crate::ingest::ImageSource;

/// Identity of a file selection still being loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionId(u64);

/// Identity of a detection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

/// Issued when a request starts; the completion must present it back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectTicket {
    pub request: RequestId,
    pub asset: AssetId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading(RequestId),
    Ready,
    Failed,
}

/// Whether a completion changed the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Rejected,
    Stale,
}

/// The single mutable session behind the UI.
///
/// Holds the current image, its detections, the loading flag and the
/// banner message. Completions carry the id they were issued with and are
/// dropped when a newer selection, request or reset superseded them.
#[derive(Debug)]
pub struct Session {
    previews: PreviewRegistry,
    asset: Option<ImageAsset>,
    detections: DetectionSet,
    phase: Phase,
    last_error: Option<String>,
    latest_selection: u64,
    latest_request: u64,
}

impl Session {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            previews,
            asset: None,
            detections: DetectionSet::default(),
            phase: Phase::Idle,
            last_error: None,
            latest_selection: 0,
            latest_request: 0,
        }
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_ref()
    }

    pub fn detections(&self) -> &DetectionSet {
        &self.detections
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading(_))
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Table view of the current detections
    pub fn rows(&self) -> Vec<ResultRow> {
        self.detections.rows()
    }

    /// Show a message in the banner without touching anything else
    pub fn report(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Start loading a new selection; earlier pending loads become stale
    pub fn begin_selection(&mut self) -> SelectionId {
        self.latest_selection += 1;
        self.last_error = None;
        SelectionId(self.latest_selection)
    }

    /// Adopt a loaded selection, or show why it was refused
    pub fn finish_selection(&mut self, id: SelectionId, result: DetectResult<ImageSource>) -> Transition {
        if id.0 != self.latest_selection {
            debug!("dropping stale selection #{}", id.0);
            return Transition::Stale;
        }

        match result {
            Ok(source) => {
                // Old asset drops here, releasing its preview
                self.asset = Some(self.previews.acquire(source));
                self.detections = DetectionSet::default();
                self.phase = Phase::Idle;
                self.last_error = None;
                // Whatever is in flight belongs to the previous image
                self.latest_request += 1;
                Transition::Applied
            }
            Err(err) => {
                warn!("⚠️  Selection refused: {}", err);
                self.last_error = Some(err.user_message());
                Transition::Rejected
            }
        }
    }

    /// Synchronous selection: begin and finish in one step
    #[cfg(test)]
    pub fn select(&mut self, result: DetectResult<ImageSource>) -> Transition {
        let id = self.begin_selection();
        self.finish_selection(id, result)
    }

    /// Enter `Loading` and hand out the ticket and payload for the request.
    ///
    /// Returns `None` (with a banner message) when no image is selected.
    pub fn begin_detect(&mut self) -> Option<(DetectTicket, ImageUpload)> {
        let Some(asset) = self.asset.as_ref() else {
            self.last_error = Some("Please choose an image first.".into());
            return None;
        };

        self.latest_request += 1;
        let request = RequestId(self.latest_request);
        let ticket = DetectTicket { request, asset: asset.id };
        let upload = asset.upload();

        self.phase = Phase::Loading(request);
        self.detections = DetectionSet::default();
        self.last_error = None;

        info!("🔍 Detecting objects in {} (request #{})", upload.file_name, request.0);
        Some((ticket, upload))
    }

    /// Apply a finished request if it still belongs to the current session
    pub fn finish_detect(&mut self, ticket: &DetectTicket, result: DetectResult<DetectionSet>) -> Transition {
        let current_asset = self.asset.as_ref().map(|a| a.id);
        let awaiting = self.phase == Phase::Loading(ticket.request);

        if ticket.request.0 != self.latest_request || current_asset != Some(ticket.asset) || !awaiting {
            debug!("dropping stale response for request #{}", ticket.request.0);
            return Transition::Stale;
        }

        match result {
            Ok(detections) => {
                info!("✅ {} detections (request #{})", detections.len(), ticket.request.0);
                self.detections = detections;
                self.phase = Phase::Ready;
                Transition::Applied
            }
            Err(err) => {
                error!("❌ Detection failed: {}", err);
                self.detections = DetectionSet::default();
                self.phase = Phase::Failed;
                self.last_error = Some(err.user_message());
                Transition::Applied
            }
        }
    }

    /// Back to `Idle` with nothing selected; pending work becomes stale
    pub fn reset(&mut self) {
        self.asset = None;
        self.detections = DetectionSet::default();
        self.phase = Phase::Idle;
        self.last_error = None;
        self.latest_selection += 1;
        self.latest_request += 1;
        debug!("session reset ({} previews live)", self.previews.live());
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PreviewRegistry::new())
    }
}
