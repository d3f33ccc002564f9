use std::collections::HashSet;
use std::time::{Duration, Instant};

use iced::keyboard;
use iced::{Application, Command, Element, Subscription, Theme};

use casedesk_core::{targets, Completion, DashboardConfig, RecordListController, StatusTag};

use crate::logging::{apply_log_level, LogEntry, LogLevel, LogStore, ReloadHandle};

mod actions;
mod helpers;
mod modal;
mod styles;
mod types;
mod views;

use helpers::{escape_key_event, StatusPalette};
pub use types::{AnnotateForm, DeleteIntent, FilterChoice, Flags, Message, Tab, Toast};

const LOG_TICK: Duration = Duration::from_millis(250);
const TOAST_TICK: Duration = Duration::from_millis(500);

pub struct DashboardApp {
    log_store: LogStore,
    reload_handle: ReloadHandle,
    log_entries: Vec<LogEntry>,
    last_log_sequence: Option<u64>,
    log_level: LogLevel,
    known_targets: HashSet<String>,
    enabled_targets: HashSet<String>,
    copy_status: Option<String>,
    active_tab: Tab,
    config: DashboardConfig,
    controller: RecordListController,
    annotate_form: AnnotateForm,
    pending_delete: Option<DeleteIntent>,
    toasts: Vec<Toast>,
    next_toast_id: u64,
    palette: StatusPalette,
}

impl Application for DashboardApp {
    type Executor = crate::executor::DashboardExecutor;
    type Message = Message;
    type Theme = Theme;
    type Flags = Flags;

    fn new(flags: Flags) -> (Self, Command<Message>) {
        let known_targets: HashSet<String> =
            targets::ALL.iter().map(|target| target.to_string()).collect();
        let enabled_targets = known_targets.clone();
        let controller = RecordListController::from_config(flags.gateway, &flags.config);

        tracing::info!(
            target: targets::UI,
            base_url = %flags.config.base_url,
            schema = %flags.config.schema,
            "Dashboard mounted"
        );

        let mut app = Self {
            log_store: flags.log_store,
            reload_handle: flags.reload_handle,
            log_entries: Vec::new(),
            last_log_sequence: None,
            log_level: LogLevel::default(),
            known_targets,
            enabled_targets,
            copy_status: None,
            active_tab: Tab::Records,
            config: flags.config,
            controller,
            annotate_form: AnnotateForm::default(),
            pending_delete: None,
            toasts: Vec::new(),
            next_toast_id: 0,
            palette: StatusPalette::default(),
        };

        let task = app.controller.refetch();
        let command = app.schedule(Some(task));
        (app, command)
    }

    fn title(&self) -> String {
        "CaseDesk".to_string()
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::LogTick => {
                self.refresh_logs();
                Command::none()
            }
            Message::LogLevelChanged(level) => {
                self.log_level = level;
                apply_log_level(&self.reload_handle, level);
                tracing::info!(target: targets::UI, "Log level set to {}", level);
                Command::none()
            }
            Message::ToggleTarget(target, enabled) => {
                if enabled {
                    self.enabled_targets.insert(target);
                } else {
                    self.enabled_targets.remove(&target);
                }
                Command::none()
            }
            Message::CopyDiagnostics => {
                self.copy_status = Some(self.copy_diagnostics());
                Command::none()
            }
            Message::ClearLogs => {
                self.log_store.clear();
                self.log_entries.clear();
                Command::none()
            }
            Message::SelectTab(tab) => {
                self.active_tab = tab;
                Command::none()
            }
            Message::Refresh => {
                let task = self.controller.refetch();
                self.schedule(Some(task))
            }
            Message::FilterChanged(choice) => {
                self.controller.set_status_filter(choice.to_filter());
                Command::none()
            }
            Message::PageSizeChanged(size) => {
                self.controller.set_page_size(size.get());
                Command::none()
            }
            Message::PreviousPage => {
                self.previous_page();
                Command::none()
            }
            Message::NextPage => {
                let next = self.controller.page().saturating_add(1);
                if next < self.controller.page_count() {
                    self.controller.set_page(next);
                }
                Command::none()
            }
            Message::SelectAll(checked) => {
                self.controller.toggle_select_all(checked);
                Command::none()
            }
            Message::SelectOne(id) => {
                self.controller.toggle_select_one(&id);
                Command::none()
            }
            Message::ToggleStatus(id) => {
                let task = self.controller.request_status_toggle(&id);
                self.schedule(task)
            }
            Message::MarkCompleted(id) => {
                let task = self.controller.request_status_set(id, StatusTag::Completed);
                self.schedule(Some(task))
            }
            Message::RequestDelete(id) => {
                self.pending_delete = Some(DeleteIntent::One(id));
                Command::none()
            }
            Message::RequestDeleteSelected => {
                let count = self.controller.selected_count();
                if count > 0 {
                    self.pending_delete = Some(DeleteIntent::Selected(count));
                }
                Command::none()
            }
            Message::ConfirmDelete => self.confirm_delete(),
            Message::CancelDelete => {
                self.pending_delete = None;
                Command::none()
            }
            Message::OpenAnnotate(id) => {
                self.annotate_form = AnnotateForm::default();
                self.controller.open_annotate(id);
                Command::none()
            }
            Message::CloseAnnotate => {
                self.controller.close_annotate();
                self.annotate_form = AnnotateForm::default();
                Command::none()
            }
            Message::AnnotateDescriptionChanged(value) => {
                self.annotate_form.description = value;
                self.annotate_form.error = None;
                Command::none()
            }
            Message::AnnotateGrantChanged(value) => {
                self.annotate_form.grant = value;
                self.annotate_form.error = None;
                Command::none()
            }
            Message::SubmitAnnotate => self.submit_annotate(),
            Message::OpenDetail(id) => {
                let task = self.controller.open_detail(id);
                self.schedule(Some(task))
            }
            Message::CloseDetail => {
                self.controller.close_detail();
                Command::none()
            }
            Message::List(event) => {
                let annotated = matches!(event.completion, Some(Completion::Annotated { .. }));
                let follow_up = self.controller.apply(event);
                if annotated {
                    self.annotate_form.submitting = false;
                }
                self.schedule(follow_up)
            }
            Message::ToastTick => {
                self.expire_toasts(Instant::now());
                Command::none()
            }
            Message::DismissToast(id) => {
                self.toasts.retain(|toast| toast.id != id);
                Command::none()
            }
            Message::EscapePressed => {
                self.close_top_dialog();
                Command::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let log_tick = iced::time::every(LOG_TICK).map(|_| Message::LogTick);
        let escape_key = keyboard::on_key_press(escape_key_event);
        let mut subscriptions = vec![log_tick, escape_key];
        if !self.toasts.is_empty() {
            subscriptions.push(iced::time::every(TOAST_TICK).map(|_| Message::ToastTick));
        }
        Subscription::batch(subscriptions)
    }

    fn view(&self) -> Element<'_, Message> {
        self.root_view()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use casedesk_core::{MockGateway, RecordId, RecordSchema};
    use serde_json::json;
    use tracing_subscriber::{reload, EnvFilter};

    use super::*;

    fn run_future<T>(future: impl std::future::Future<Output = T>) -> T {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("tokio runtime");
        runtime.block_on(future)
    }

    fn app_with(mock: &MockGateway) -> DashboardApp {
        let (_layer, reload_handle) = reload::Layer::new(EnvFilter::default());
        let config = DashboardConfig {
            schema: RecordSchema::Survey,
            ..DashboardConfig::default()
        };
        let (app, _command) = DashboardApp::new(Flags {
            log_store: LogStore::new(64),
            reload_handle,
            config,
            gateway: Arc::new(mock.clone()),
        });
        app
    }

    fn loaded_app(mock: &MockGateway) -> DashboardApp {
        let mut app = app_with(mock);
        let task = app.controller.refetch();
        let event = run_future(task);
        let _ = app.update(Message::List(event));
        app
    }

    #[test]
    fn escape_closes_the_topmost_dialog_first() {
        let mock = MockGateway::new();
        let mut app = app_with(&mock);
        let id = RecordId::new("r-1");

        let _ = app.update(Message::OpenAnnotate(id.clone()));
        let _ = app.update(Message::RequestDelete(id.clone()));

        let _ = app.update(Message::EscapePressed);
        assert!(app.pending_delete.is_none());
        assert_eq!(app.controller.annotate_target(), Some(&id));

        let _ = app.update(Message::EscapePressed);
        assert!(app.controller.annotate_target().is_none());
    }

    #[test]
    fn empty_annotation_keeps_dialog_open_with_error() {
        let mock = MockGateway::new();
        let mut app = app_with(&mock);
        let id = RecordId::new("r-2");

        let _ = app.update(Message::OpenAnnotate(id.clone()));
        let _ = app.update(Message::AnnotateDescriptionChanged("Seen at dusk".to_string()));
        let _ = app.update(Message::SubmitAnnotate);

        assert_eq!(app.controller.annotate_target(), Some(&id));
        assert!(app.annotate_form.error.is_some());
        assert!(!app.annotate_form.submitting);
        assert!(mock.calls().iter().all(|call| !matches!(
            call,
            casedesk_core::GatewayCall::Annotate { .. }
        )));
    }

    #[test]
    fn failed_refetch_becomes_an_error_toast() {
        let mock = MockGateway::new();
        mock.push_list(Err(casedesk_core::Error::ServerError {
            url: "http://127.0.0.1:5000/api/get_surveys".to_string(),
            status: 500,
            body: None,
        }));
        let app = loaded_app(&mock);

        assert_eq!(app.toasts.len(), 1);
        assert_eq!(app.toasts[0].kind, casedesk_core::NotificationKind::Error);
    }

    #[test]
    fn next_page_stops_at_last_page() {
        let mock = MockGateway::new();
        let rows = (0..7)
            .map(|index| json!({"id": format!("r{index}"), "reason": "Pending"}))
            .collect();
        mock.push_list(Ok(rows));
        let mut app = loaded_app(&mock);

        let _ = app.update(Message::PageSizeChanged(casedesk_core::PageSize::ALL[0]));
        let _ = app.update(Message::NextPage);
        let _ = app.update(Message::NextPage);
        assert_eq!(app.controller.page(), 1);

        let _ = app.update(Message::PreviousPage);
        assert_eq!(app.controller.page(), 0);
    }

    #[test]
    fn bulk_delete_needs_a_selection() {
        let mock = MockGateway::new();
        mock.push_list(Ok(vec![json!({"id": "a"}), json!({"id": "b"})]));
        let mut app = loaded_app(&mock);

        let _ = app.update(Message::RequestDeleteSelected);
        assert!(app.pending_delete.is_none());

        let _ = app.update(Message::SelectAll(true));
        let _ = app.update(Message::RequestDeleteSelected);
        assert_eq!(app.pending_delete, Some(DeleteIntent::Selected(2)));
    }
}
