use std::time::Instant;

use iced::Command;

use casedesk_core::{targets, ListTask, NotificationKind};

use crate::app::types::{DeleteIntent, Message, Toast};
use crate::app::DashboardApp;
use crate::logging::LogEntry;

const MAX_TOASTS: usize = 5;
const DIAGNOSTIC_LOG_LINES: usize = 50;

impl DashboardApp {
    /// Hands a controller task to the executor and surfaces any notifications
    /// the controller queued while producing it.
    pub(super) fn schedule(&mut self, task: Option<ListTask>) -> Command<Message> {
        self.collect_notifications();
        match task {
            Some(task) => Command::perform(task, Message::List),
            None => Command::none(),
        }
    }

    fn collect_notifications(&mut self) {
        let now = Instant::now();
        let lifetime = self.config.toast_duration();
        for notification in self.controller.drain_notifications() {
            if notification.kind == NotificationKind::Error {
                tracing::debug!(
                    target: targets::UI,
                    summary = %notification.summary,
                    "Showing error toast"
                );
            }
            let id = self.next_toast_id;
            self.next_toast_id = self.next_toast_id.wrapping_add(1);
            self.toasts
                .push(Toast::from_notification(id, notification, now, lifetime));
        }
        if self.toasts.len() > MAX_TOASTS {
            let overflow = self.toasts.len() - MAX_TOASTS;
            self.toasts.drain(..overflow);
        }
    }

    pub(super) fn expire_toasts(&mut self, now: Instant) {
        self.toasts.retain(|toast| !toast.is_expired(now));
    }

    pub(super) fn previous_page(&mut self) {
        let page = self.controller.page();
        if page == 0 {
            return;
        }
        let last = self.controller.page_count().saturating_sub(1);
        self.controller.set_page((page - 1).min(last));
    }

    pub(super) fn confirm_delete(&mut self) -> Command<Message> {
        let task = match self.pending_delete.take() {
            Some(DeleteIntent::One(id)) => {
                if self.controller.detail_target() == Some(&id) {
                    self.controller.close_detail();
                }
                Some(self.controller.request_delete(id))
            }
            Some(DeleteIntent::Selected(_)) => self.controller.request_bulk_delete(),
            None => None,
        };
        self.schedule(task)
    }

    pub(super) fn submit_annotate(&mut self) -> Command<Message> {
        let Some(id) = self.controller.annotate_target().cloned() else {
            return Command::none();
        };
        if self.annotate_form.submitting {
            return Command::none();
        }

        match self.annotate_form.payload() {
            Ok(payload) => {
                self.annotate_form.error = None;
                self.annotate_form.submitting = true;
                let task = self.controller.request_annotate(id, payload);
                self.schedule(Some(task))
            }
            Err(error) => {
                tracing::debug!(target: targets::UI, "{}", error.technical_detail());
                self.annotate_form.error = Some(error.user_summary());
                Command::none()
            }
        }
    }

    /// Escape closes the confirm prompt first, then whichever dialog is open.
    pub(super) fn close_top_dialog(&mut self) {
        if self.pending_delete.take().is_some() {
            return;
        }
        if self.controller.annotate_target().is_some() {
            self.controller.close_annotate();
            self.annotate_form = Default::default();
            return;
        }
        if self.controller.detail_target().is_some() {
            self.controller.close_detail();
        }
    }

    pub(super) fn refresh_logs(&mut self) {
        let entries = self.log_store.entries_after(self.last_log_sequence);
        if entries.is_empty() {
            return;
        }
        for entry in &entries {
            if self.known_targets.insert(entry.target.clone()) {
                self.enabled_targets.insert(entry.target.clone());
            }
        }
        self.last_log_sequence = entries.last().map(|entry| entry.sequence);
        self.log_entries.extend(entries);

        let capacity = self.log_store.capacity();
        if self.log_entries.len() > capacity {
            let overflow = self.log_entries.len() - capacity;
            self.log_entries.drain(..overflow);
        }
    }

    pub(super) fn sorted_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.known_targets.iter().cloned().collect();
        targets.sort();
        targets
    }

    pub(super) fn visible_entries(&self) -> Vec<&LogEntry> {
        self.log_entries
            .iter()
            .filter(|entry| self.enabled_targets.contains(&entry.target))
            .collect()
    }

    pub(super) fn copy_diagnostics(&self) -> String {
        let text = self.diagnostics_text();
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => {
                tracing::info!(target: targets::UI, "Diagnostics copied to clipboard");
                "Copied".to_string()
            }
            Err(error) => {
                tracing::warn!(target: targets::UI, "Clipboard copy failed: {}", error);
                format!("Failed: {error}")
            }
        }
    }

    pub(super) fn diagnostics_text(&self) -> String {
        let controller = &self.controller;
        let mut output = String::new();
        output.push_str("CaseDesk diagnostics\n");
        output.push_str(&format!("Base URL: {}\n", self.config.base_url));
        output.push_str(&format!("Schema: {}\n", self.config.schema));
        output.push_str(&format!("Log level: {}\n", self.log_level));
        output.push_str(&format!("Records loaded: {}\n", controller.records().len()));
        output.push_str(&format!(
            "Filter: {}\n",
            controller
                .filter()
                .map(|tag| tag.as_wire())
                .unwrap_or("all")
        ));
        output.push_str(&format!(
            "Page: {} ({} per page, {} pages)\n",
            controller.page() + 1,
            controller.page_size(),
            controller.page_count()
        ));
        output.push_str(&format!("Selected: {}\n", controller.selected_count()));
        output.push_str(&format!("Requests in flight: {}\n", controller.in_flight()));
        output.push_str(&format!(
            "Targets enabled: {}\n",
            self.sorted_targets()
                .into_iter()
                .filter(|target| self.enabled_targets.contains(target))
                .collect::<Vec<String>>()
                .join(", ")
        ));
        output.push_str("Recent logs:\n");

        let entries = self.visible_entries();
        let start = entries.len().saturating_sub(DIAGNOSTIC_LOG_LINES);
        for entry in entries.into_iter().skip(start) {
            output.push_str(&entry.format_line());
            output.push('\n');
        }

        output
    }
}
