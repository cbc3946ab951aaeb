use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, text, Column};
use iced::{event, window, Alignment, Element, Event, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod inference;
mod ingest;
mod render;
mod state;
mod ui;

use config::AppConfig;
use error::DetectResult;
use inference::InferenceClient;
use ingest::{ImageSource, SUPPORTED_EXTENSIONS};
use render::palette::ClassPalette;
use render::renderer::DetectionRenderer;
use render::surface::{load_label_font, RasterSurface, Surface};
use state::data::DetectionSet;
use state::preview::PreviewRegistry;
use state::session::{DetectTicket, Phase, SelectionId, Session, Transition};

/// Main application state
struct WeedDetector {
    session: Session,
    /// `None` when the HTTP client could not be built
    client: Option<InferenceClient>,
    renderer: DetectionRenderer,
    surface: RasterSurface,
    /// Last rendered surface, as shown in the preview panel
    frame: Option<Handle>,
    /// Files are being dragged over the window
    hovering: bool,
    palette: ClassPalette,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Choose image"
    PickFile,
    FileHovered,
    FileHoverLeft,
    FileDropped(PathBuf),
    /// Background load of a selection finished
    AssetLoaded(SelectionId, DetectResult<ImageSource>),
    Detect,
    DetectionFinished(DetectTicket, DetectResult<DetectionSet>),
    Reset,
}

impl WeedDetector {
    fn new(config: AppConfig, startup_error: Option<String>) -> (Self, Task<Message>) {
        let mut session = Session::new(PreviewRegistry::new());
        if let Some(message) = startup_error {
            session.report(message);
        }

        let client = match InferenceClient::new(&config.inference) {
            Ok(client) => {
                info!("🌐 Detection endpoint: {}", client.host());
                Some(client)
            }
            Err(e) => {
                error!("❌ Could not create the detection client: {}", e);
                session.report(format!("Detection is unavailable: {}", e));
                None
            }
        };

        let renderer = DetectionRenderer::new(Arc::new(config.palette.clone()));
        let surface = RasterSurface::new(load_label_font(config.label_font.as_deref()));

        info!("🌱 Weed detector ready");
        (
            WeedDetector {
                session,
                client,
                renderer,
                surface,
                frame: None,
                hovering: false,
                palette: config.palette,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFile => {
                let picked = FileDialog::new()
                    .set_title("Choose an image")
                    .add_filter("Images", &SUPPORTED_EXTENSIONS)
                    .pick_file();
                // A cancelled dialog counts as an empty selection
                self.load(picked.into_iter().collect())
            }
            Message::FileHovered => {
                self.hovering = true;
                Task::none()
            }
            Message::FileHoverLeft => {
                self.hovering = false;
                Task::none()
            }
            Message::FileDropped(path) => {
                self.hovering = false;
                self.load(vec![path])
            }
            Message::AssetLoaded(id, result) => {
                if self.session.finish_selection(id, result) == Transition::Applied {
                    self.redraw();
                }
                Task::none()
            }
            Message::Detect => self.detect(),
            Message::DetectionFinished(ticket, result) => {
                if self.session.finish_detect(&ticket, result) == Transition::Applied {
                    self.redraw();
                }
                Task::none()
            }
            Message::Reset => {
                self.session.reset();
                self.redraw();
                info!("🔄 Session reset");
                Task::none()
            }
        }
    }

    /// Load `paths` in the background; the last issued load wins
    fn load(&mut self, paths: Vec<PathBuf>) -> Task<Message> {
        let id = self.session.begin_selection();
        Task::perform(ingest::load_selection(paths), move |result| Message::AssetLoaded(id, result))
    }

    fn detect(&mut self) -> Task<Message> {
        let Some(client) = self.client.clone() else {
            warn!("⚠️  Detect pressed without a detection client");
            self.session.report("Detection is unavailable. Check the endpoint configuration.");
            return Task::none();
        };
        let Some((ticket, upload)) = self.session.begin_detect() else {
            return Task::none();
        };
        // Detections were cleared; show the bare image while waiting
        self.redraw();

        Task::perform(async move { client.detect(upload).await }, move |result| {
            Message::DetectionFinished(ticket, result)
        })
    }

    /// Re-render the current asset and its detections into `frame`
    fn redraw(&mut self) {
        let Some(asset) = self.session.asset() else {
            self.frame = None;
            return;
        };
        self.renderer
            .render(&mut self.surface, &asset.source.pixels, self.session.detections());
        let (width, height) = self.surface.size();
        self.frame = Some(Handle::from_rgba(width, height, self.surface.pixels().as_raw().clone()));
    }

    fn status(&self) -> String {
        let Some(asset) = self.session.asset() else {
            return "No image loaded.".to_string();
        };
        let image = format!("{} ({}×{})", asset.source.file_name, asset.source.width(), asset.source.height());
        match self.session.phase() {
            Phase::Idle => format!("{}. Press Detect to find weeds.", image),
            Phase::Loading(_) => format!("{}. Detecting…", image),
            Phase::Ready if self.session.detections().is_empty() => format!("{}. Nothing detected.", image),
            Phase::Ready => match self.session.detections().len() {
                1 => format!("{}. 1 detection.", image),
                n => format!("{}. {} detections.", image, n),
            },
            Phase::Failed => format!("{}. Detection failed.", image),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let loading = self.session.is_loading();
        let detect_label = if loading { "Detecting…" } else { "Detect" };

        let actions = row![
            button("Choose image").on_press(Message::PickFile).padding(10),
            button(detect_label)
                .on_press_maybe((!loading).then_some(Message::Detect))
                .padding(10),
            button("Reset").on_press(Message::Reset).padding(10),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let side = column![
            text("Results").size(20),
            ui::results::table(&self.session.rows()),
            ui::results::legend(&self.palette.legend(), self.palette.default_color),
        ]
        .spacing(12)
        .width(Length::FillPortion(2))
        .height(Length::Fill);

        let body = row![ui::preview::panel(self.frame.as_ref(), self.hovering), side]
            .spacing(20)
            .height(Length::Fill);

        let content: Column<Message> = Column::new()
            .push(text("Weed Detector").size(32))
            .push(actions)
            .push_maybe(self.session.last_error().map(ui::results::banner))
            .push(body)
            .push(text(self.status()).size(14))
            .spacing(16)
            .padding(20);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Window file drag-and-drop
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovered),
            Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FileHoverLeft),
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weed_detector=info")),
        )
        .init();

    // A broken config is not fatal: run with defaults and say so in the banner
    let (config, startup_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            error!("❌ {}", e);
            (AppConfig::default(), Some(format!("Using default settings: {}", e)))
        }
    };

    iced::application("Weed Detector", WeedDetector::update, WeedDetector::view)
        .theme(WeedDetector::theme)
        .subscription(WeedDetector::subscription)
        .centered()
        .run_with(move || WeedDetector::new(config, startup_error))
}
