mod config;
mod controller;
mod conversation;
mod error;
mod service;
mod session;

use iced::{
    widget::{button, column, container, row, scrollable, text, text_input, Column},
    Element, Length, Task, Theme, Font, Subscription,
    time,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    alignment,
    window,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::conversation::Origin;
use crate::service::{AnsweringService, HttpAnsweringService, SelectedFile};
use crate::controller::InFlight;
use crate::session::{Action, Effect, NoticeLevel, Resolution, Session, SubmissionOutcome};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("doc_chat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load();
    tracing::info!(endpoint = %config.service.endpoint, "starting doc-chat");

    iced::application("Chat with Your Document", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size: iced::Size::new(config.window.width as f32, config.window.height as f32),
            min_size: Some(iced::Size::new(
                config.window.min_width as f32,
                config.window.min_height as f32,
            )),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(move || App::new(config))?;

    Ok(())
}

#[derive(Debug, Clone)]
enum Message {
    PickFile,
    FilePicked(Option<SelectedFile>),
    PromptChanged(String),
    Send,
    Upload,
    SubmissionFinished {
        generation: u64,
        outcome: SubmissionOutcome,
    },
    ClearChat,
    DismissNotice,
    Tick,
    Exit,
}

struct App {
    session: Session,
    service: Option<Arc<dyn AnsweringService>>,
    in_flight: InFlight,
    loading_frame: usize,
    transcript_id: scrollable::Id,
}

impl App {
    fn new(config: config::Config) -> (Self, Task<Message>) {
        let service: Option<Arc<dyn AnsweringService>> = match HttpAnsweringService::with_config(
            config.service.endpoint.clone(),
            config.service.timeout(),
        ) {
            Ok(client) => {
                tracing::debug!(endpoint = client.endpoint(), "answering service client ready");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::error!("Could not create HTTP client: {}", e);
                None
            }
        };

        let app = App {
            session: Session::new(),
            service,
            in_flight: InFlight::default(),
            loading_frame: 0,
            transcript_id: scrollable::Id::unique(),
        };

        (app, Task::none())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFile => Task::future(async {
                let handle = rfd::AsyncFileDialog::new()
                    .set_title("Select a document")
                    .pick_file()
                    .await;
                Message::FilePicked(handle.map(|h| SelectedFile::from_path(h.path())))
            }),
            Message::FilePicked(Some(file)) => self.dispatch(Action::SetFile(Some(file))),
            // Dialog dismissed
            Message::FilePicked(None) => Task::none(),
            Message::PromptChanged(value) => self.dispatch(Action::SetPrompt(value)),
            Message::Send => self.dispatch(Action::Send),
            Message::Upload => self.dispatch(Action::Upload),
            Message::SubmissionFinished { generation, outcome } => {
                self.in_flight.finish(generation);
                self.dispatch(Action::Completed { generation, outcome })
            }
            Message::ClearChat => self.dispatch(Action::Reset),
            Message::DismissNotice => self.dispatch(Action::DismissNotice),
            Message::Tick => {
                if self.session.is_busy() {
                    self.loading_frame = (self.loading_frame + 1) % SPINNER_FRAMES.len();
                }
                Task::none()
            }
            Message::Exit => iced::exit(),
        }
    }

    fn dispatch(&mut self, action: Action) -> Task<Message> {
        let before = self.session.conversation().len();
        let task = match self.session.apply(action) {
            Effect::None => Task::none(),
            Effect::Submit(request) => self.start_submission(request),
            Effect::Cancel(generation) => {
                if !self.in_flight.cancel(generation) {
                    tracing::debug!(generation, "no in-flight request to cancel");
                }
                Task::none()
            }
        };

        if self.session.conversation().len() > before {
            Task::batch([task, scrollable::snap_to(self.transcript_id.clone(), scrollable::RelativeOffset::END)])
        } else {
            task
        }
    }

    fn start_submission(&mut self, request: session::SubmissionRequest) -> Task<Message> {
        let generation = request.generation;

        let Some(service) = self.service.clone() else {
            return Task::done(Message::SubmissionFinished {
                generation,
                outcome: SubmissionOutcome::Failed("HTTP client unavailable".to_string()),
            });
        };

        let token = self.in_flight.start(generation);
        self.loading_frame = 0;

        Task::future(async move {
            let outcome = controller::run_submission(service, request, token).await;
            Message::SubmissionFinished { generation, outcome }
        })
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.session.is_busy() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::Exit)
            } else {
                None
            }
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<'_, Message> {
        let busy = self.session.is_busy();

        let file_label = match self.session.selected_file() {
            Some(file) => file.file_name.clone(),
            None => "No document selected".to_string(),
        };
        let picker = row![
            button(text("Choose document...").size(14))
                .on_press(Message::PickFile)
                .style(button::secondary)
                .padding(8),
            text(file_label).size(14),
        ]
        .spacing(10)
        .align_y(alignment::Vertical::Center);

        let messages: Column<Message> = self.session
            .conversation()
            .iter()
            .fold(Column::new().spacing(8).padding(10), |col, msg| {
                let bubble = container(text(msg.text()).size(15))
                    .padding(8)
                    .max_width(480.0)
                    .style(container::rounded_box);
                let align = match msg.origin() {
                    Origin::User => alignment::Horizontal::Right,
                    Origin::Assistant => alignment::Horizontal::Left,
                };
                col.push(container(bubble).width(Length::Fill).align_x(align))
            });

        let messages = match empty_transcript_hint(&self.session) {
            Some(hint) => messages.push(text(hint).size(14)),
            None => messages,
        };

        let transcript = scrollable(messages)
            .id(self.transcript_id.clone())
            .height(Length::Fill);

        let prompt = text_input("Ask a question...", self.session.prompt())
            .on_input(Message::PromptChanged)
            .on_submit(Message::Send)
            .padding(10)
            .size(16);

        let send_label = if busy {
            format!("{} Thinking...", SPINNER_FRAMES[self.loading_frame])
        } else {
            "Send".to_string()
        };
        let send = button(text(send_label).size(14))
            .on_press_maybe((!busy).then_some(Message::Send))
            .padding(10);
        let upload = button(text("Upload only").size(14))
            .on_press_maybe((!busy).then_some(Message::Upload))
            .style(button::secondary)
            .padding(10);

        let clear = button(
            text("Clear Chat")
                .size(14)
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
        )
        .on_press_maybe((!busy).then_some(Message::ClearChat))
        .style(button::danger)
        .width(Length::Fill)
        .padding(10);

        let mut content = column![picker].spacing(10).padding(15);

        if let Some(notice) = self.session.notice() {
            let style: fn(&Theme, button::Status) -> button::Style = match notice.level {
                NoticeLevel::Warning => button::secondary,
                NoticeLevel::Failure => button::danger,
            };
            content = content.push(
                button(text(format!("{}  [dismiss]", notice.text)).size(14))
                    .on_press(Message::DismissNotice)
                    .style(style)
                    .width(Length::Fill)
                    .padding(8),
            );
        }

        content = content
            .push(transcript)
            .push(row![prompt, send, upload].spacing(8))
            .push(clear);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

/// Placeholder shown in place of an empty transcript.
fn empty_transcript_hint(session: &Session) -> Option<&'static str> {
    if !session.conversation().is_empty() || session.is_busy() {
        return None;
    }
    match session.last_resolution() {
        Some(Resolution::Aborted) => Some("Select a document, then ask again."),
        _ => Some("Choose a document and ask a question about it."),
    }
}
