//! Filter, pagination, selection and dialog state for a remote record list.
//!
//! [`RecordListController`] is the single owner of that state. Operations that
//! talk to the gateway return a [`ListTask`]: a `'static` future the caller
//! drives on its executor and whose [`ListEvent`] is handed back through
//! [`RecordListController::apply`]. Every task is abortable; refetches and
//! detail loads supersede their predecessors, and [`RecordListController::shutdown`]
//! (or dropping the controller) cancels everything still in flight.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::{join_all, Abortable};
use tracing::{debug, info, warn};

use crate::config::{DashboardConfig, SelectionPolicy};
use crate::gateway::RecordGateway;
use crate::model::{AnnotatePayload, PageSize, Record, RecordDetail, RecordId, StatusFilter, StatusTag};
use crate::schema::{normalize_records, FieldMapping};
use crate::tasks::{TaskKind, TaskSet, TaskTicket};
use crate::{targets, Error};

pub type ListTask = Pin<Box<dyn Future<Output = ListEvent> + Send + 'static>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureInfo {
    pub summary: String,
    pub detail: String,
}

impl From<&Error> for FailureInfo {
    fn from(error: &Error) -> Self {
        Self {
            summary: error.user_summary(),
            detail: error.technical_detail(),
        }
    }
}

pub type Outcome<T> = Result<T, FailureInfo>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Refetched(Outcome<Vec<Record>>),
    DetailLoaded {
        id: RecordId,
        result: Outcome<RecordDetail>,
    },
    StatusUpdated {
        id: RecordId,
        status: StatusTag,
        result: Outcome<()>,
    },
    Deleted {
        id: RecordId,
        result: Outcome<()>,
    },
    BulkDeleted {
        results: Vec<(RecordId, Outcome<()>)>,
    },
    Annotated {
        id: RecordId,
        result: Outcome<String>,
    },
}

/// Result of a [`ListTask`]. `completion` is `None` when the task was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEvent {
    pub ticket: TaskTicket,
    pub completion: Option<Completion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub summary: String,
    pub detail: Option<String>,
}

impl Notification {
    pub fn success(summary: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn info(summary: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn failure(context: &str, failure: &FailureInfo) -> Self {
        Self {
            kind: NotificationKind::Error,
            summary: format!("{context}: {}", failure.summary),
            detail: Some(failure.detail.clone()),
        }
    }
}

/// Half-open index range of the visible page within the filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl PageWindow {
    pub fn label(&self) -> String {
        if self.start >= self.end {
            return format!("0 of {}", self.total);
        }
        format!("{}–{} of {}", self.start + 1, self.end, self.total)
    }
}

/// Records whose status equals the filter tag, in input order. An unset
/// filter keeps every record.
pub fn apply_filter(records: &[Record], filter: StatusFilter) -> Vec<&Record> {
    match filter {
        Some(tag) => records
            .iter()
            .filter(|record| record.status_tag == Some(tag))
            .collect(),
        None => records.iter().collect(),
    }
}

/// At most `page_size` items starting at `page * page_size`; empty past the end.
pub fn apply_pagination<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let Some(start) = page.checked_mul(page_size) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub struct RecordListController {
    gateway: Arc<dyn RecordGateway>,
    mapping: &'static FieldMapping,
    selection_policy: SelectionPolicy,
    records: Vec<Record>,
    filter: StatusFilter,
    page: usize,
    page_size: PageSize,
    selection: HashSet<RecordId>,
    annotate_target: Option<RecordId>,
    detail_target: Option<RecordId>,
    detail: Option<RecordDetail>,
    loading: bool,
    refetch_token: bool,
    tasks: TaskSet,
    notifications: VecDeque<Notification>,
}

impl RecordListController {
    pub fn new(gateway: Arc<dyn RecordGateway>, mapping: &'static FieldMapping) -> Self {
        Self {
            gateway,
            mapping,
            selection_policy: SelectionPolicy::default(),
            records: Vec::new(),
            filter: None,
            page: 0,
            page_size: PageSize::default(),
            selection: HashSet::new(),
            annotate_target: None,
            detail_target: None,
            detail: None,
            loading: false,
            refetch_token: false,
            tasks: TaskSet::new(),
            notifications: VecDeque::new(),
        }
    }

    pub fn from_config(gateway: Arc<dyn RecordGateway>, config: &DashboardConfig) -> Self {
        let mut controller = Self::new(gateway, config.schema.mapping());
        controller.page_size = config.page_size();
        controller.selection_policy = config.selection_policy;
        controller
    }

    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn selection(&self) -> &HashSet<RecordId> {
        &self.selection
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selection.contains(id)
    }

    pub fn annotate_target(&self) -> Option<&RecordId> {
        self.annotate_target.as_ref()
    }

    pub fn detail_target(&self) -> Option<&RecordId> {
        self.detail_target.as_ref()
    }

    pub fn detail(&self) -> Option<&RecordDetail> {
        self.detail.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn refetch_token(&self) -> bool {
        self.refetch_token
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn filtered(&self) -> Vec<&Record> {
        apply_filter(&self.records, self.filter)
    }

    pub fn visible(&self) -> Vec<&Record> {
        let filtered = self.filtered();
        apply_pagination(&filtered, self.page, self.page_size.get()).to_vec()
    }

    pub fn page_window(&self) -> PageWindow {
        let total = self.filtered().len();
        let size = self.page_size.get();
        let start = self.page.saturating_mul(size).min(total);
        let end = start.saturating_add(size).min(total);
        PageWindow { start, end, total }
    }

    pub fn page_count(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size.get())
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Compares sizes only, so an empty collection with an empty selection
    /// counts as fully selected.
    pub fn is_all_selected(&self) -> bool {
        self.selection.len() == self.records.len()
    }

    pub fn is_some_selected(&self) -> bool {
        !self.selection.is_empty() && self.selection.len() < self.records.len()
    }

    pub fn is_bulk_mode(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        debug!(
            target: targets::RECORDS,
            filter = ?filter.map(StatusTag::as_wire),
            "Status filter changed"
        );
        self.filter = filter;
    }

    pub fn set_page(&mut self, page: usize) {
        debug!(target: targets::RECORDS, page, "Page changed");
        self.page = page;
    }

    /// Sizes outside the allowed set are ignored. The page index is kept even
    /// when it falls past the new last page.
    pub fn set_page_size(&mut self, size: usize) {
        match PageSize::new(size) {
            Some(page_size) => {
                debug!(target: targets::RECORDS, size, page = self.page, "Page size changed");
                self.page_size = page_size;
            }
            None => warn!(target: targets::RECORDS, size, "Ignoring unsupported page size"),
        }
    }

    pub fn toggle_select_all(&mut self, checked: bool) {
        if checked {
            self.selection = self.records.iter().map(|record| record.id.clone()).collect();
        } else {
            self.selection.clear();
        }
    }

    pub fn toggle_select_one(&mut self, id: &RecordId) {
        if self.selection.remove(id) {
            return;
        }
        if self.find(id).is_some() {
            self.selection.insert(id.clone());
        } else {
            debug!(target: targets::RECORDS, id = %id, "Ignoring selection of unknown record");
        }
    }

    pub fn open_annotate(&mut self, id: RecordId) {
        self.annotate_target = Some(id);
    }

    pub fn close_annotate(&mut self) {
        self.annotate_target = None;
    }

    pub fn refetch(&mut self) -> ListTask {
        self.loading = true;
        let gateway = Arc::clone(&self.gateway);
        let mapping = self.mapping;
        debug!(target: targets::RECORDS, schema = mapping.name, "Refetch requested");
        self.spawn(TaskKind::Refetch, async move {
            let result = match gateway.list_surveys().await {
                Ok(raw) => Ok(normalize_records(mapping, &raw)),
                Err(error) => Err(FailureInfo::from(&error)),
            };
            Completion::Refetched(result)
        })
    }

    pub fn open_detail(&mut self, id: RecordId) -> ListTask {
        self.detail_target = Some(id.clone());
        self.detail = None;
        let gateway = Arc::clone(&self.gateway);
        self.spawn(TaskKind::Detail, async move {
            let result = gateway
                .get_record_detail(id.clone())
                .await
                .map_err(|error| FailureInfo::from(&error));
            Completion::DetailLoaded { id, result }
        })
    }

    pub fn close_detail(&mut self) {
        self.tasks.abort_kind(TaskKind::Detail);
        self.detail_target = None;
        self.detail = None;
    }

    /// Returns `None` when the record is not part of the current collection.
    pub fn request_status_toggle(&mut self, id: &RecordId) -> Option<ListTask> {
        let Some(record) = self.find(id) else {
            warn!(target: targets::RECORDS, id = %id, "Status toggle for unknown record");
            self.notifications
                .push_back(Notification::info(format!("Record {id} is no longer listed.")));
            return None;
        };
        let status = StatusTag::toggled(record.status_tag);
        Some(self.request_status_set(id.clone(), status))
    }

    pub fn request_status_set(&mut self, id: RecordId, status: StatusTag) -> ListTask {
        info!(target: targets::RECORDS, id = %id, status = %status, "Updating status");
        let gateway = Arc::clone(&self.gateway);
        self.spawn(TaskKind::Mutation, async move {
            let result = gateway
                .update_status(id.clone(), status)
                .await
                .map_err(|error| FailureInfo::from(&error));
            Completion::StatusUpdated { id, status, result }
        })
    }

    pub fn request_delete(&mut self, id: RecordId) -> ListTask {
        info!(target: targets::RECORDS, id = %id, "Deleting record");
        let gateway = Arc::clone(&self.gateway);
        self.spawn(TaskKind::Mutation, async move {
            let result = gateway
                .delete_record(id.clone())
                .await
                .map_err(|error| FailureInfo::from(&error));
            Completion::Deleted { id, result }
        })
    }

    /// Deletes every selected record. Returns `None` when nothing is selected.
    pub fn request_bulk_delete(&mut self) -> Option<ListTask> {
        if self.selection.is_empty() {
            return None;
        }
        let mut ids: Vec<RecordId> = self.selection.iter().cloned().collect();
        ids.sort();
        info!(target: targets::RECORDS, count = ids.len(), "Deleting selected records");

        let gateway = Arc::clone(&self.gateway);
        Some(self.spawn(TaskKind::Mutation, async move {
            let deletes = ids.into_iter().map(|id| {
                let gateway = Arc::clone(&gateway);
                async move {
                    let result = gateway
                        .delete_record(id.clone())
                        .await
                        .map_err(|error| FailureInfo::from(&error));
                    (id, result)
                }
            });
            Completion::BulkDeleted {
                results: join_all(deletes).await,
            }
        }))
    }

    /// Payload fields are expected to be validated by the form beforehand.
    pub fn request_annotate(&mut self, id: RecordId, payload: AnnotatePayload) -> ListTask {
        info!(target: targets::RECORDS, id = %id, "Adding annotation");
        let gateway = Arc::clone(&self.gateway);
        self.spawn(TaskKind::Mutation, async move {
            let result = gateway
                .annotate(id.clone(), payload)
                .await
                .map_err(|error| FailureInfo::from(&error));
            Completion::Annotated { id, result }
        })
    }

    /// Folds a finished task back into the state. A returned task is the
    /// refetch triggered by a successful mutation.
    pub fn apply(&mut self, event: ListEvent) -> Option<ListTask> {
        let current = self.tasks.complete(event.ticket);
        if event.ticket.kind == TaskKind::Refetch {
            self.loading = self.tasks.is_running(TaskKind::Refetch);
        }

        let Some(completion) = event.completion.filter(|_| current) else {
            debug!(
                target: targets::RECORDS,
                kind = ?event.ticket.kind,
                generation = event.ticket.generation,
                "Discarding superseded task result"
            );
            return None;
        };

        match completion {
            Completion::Refetched(result) => {
                self.apply_refetch(result);
                None
            }
            Completion::DetailLoaded { id, result } => {
                if self.detail_target.as_ref() != Some(&id) {
                    return None;
                }
                match result {
                    Ok(detail) => self.detail = Some(detail),
                    Err(failure) => self
                        .notifications
                        .push_back(Notification::failure("Could not load details", &failure)),
                }
                None
            }
            Completion::StatusUpdated { id, status, result } => match result {
                Ok(()) => {
                    info!(target: targets::RECORDS, id = %id, status = %status, "Status updated");
                    self.notifications
                        .push_back(Notification::success(format!("Status set to {}.", status.label())));
                    Some(self.bump_refetch_token())
                }
                Err(failure) => {
                    self.notifications
                        .push_back(Notification::failure("Status update failed", &failure));
                    None
                }
            },
            Completion::Deleted { id, result } => match result {
                Ok(()) => {
                    info!(target: targets::RECORDS, id = %id, "Record deleted");
                    self.notifications
                        .push_back(Notification::success("Record deleted."));
                    Some(self.bump_refetch_token())
                }
                Err(failure) => {
                    self.notifications
                        .push_back(Notification::failure("Delete failed", &failure));
                    None
                }
            },
            Completion::BulkDeleted { results } => {
                let mut deleted = 0usize;
                for (id, result) in &results {
                    match result {
                        Ok(()) => deleted += 1,
                        Err(failure) => self.notifications.push_back(Notification::failure(
                            &format!("Delete of {id} failed"),
                            failure,
                        )),
                    }
                }
                self.selection.clear();
                info!(
                    target: targets::RECORDS,
                    deleted,
                    failed = results.len() - deleted,
                    "Bulk delete settled"
                );
                if deleted == 0 {
                    return None;
                }
                let noun = if deleted == 1 { "record" } else { "records" };
                self.notifications
                    .push_back(Notification::success(format!("{deleted} {noun} deleted.")));
                Some(self.bump_refetch_token())
            }
            Completion::Annotated { id, result } => match result {
                Ok(message) => {
                    info!(target: targets::RECORDS, id = %id, "Annotation added");
                    let message = if message.trim().is_empty() {
                        "Annotation added.".to_string()
                    } else {
                        message
                    };
                    self.notifications.push_back(Notification::success(message));
                    if self.annotate_target.as_ref() == Some(&id) {
                        self.annotate_target = None;
                    }
                    Some(self.bump_refetch_token())
                }
                Err(failure) => {
                    self.notifications
                        .push_back(Notification::failure("Annotation failed", &failure));
                    None
                }
            },
        }
    }

    /// Cancels every in-flight task. Their events are discarded by [`Self::apply`].
    pub fn shutdown(&mut self) {
        if !self.tasks.is_empty() {
            debug!(
                target: targets::RECORDS,
                in_flight = self.tasks.len(),
                "Aborting in-flight tasks"
            );
        }
        self.tasks.abort_all();
        self.loading = false;
    }

    fn apply_refetch(&mut self, result: Outcome<Vec<Record>>) {
        match result {
            Ok(records) => {
                debug!(target: targets::RECORDS, count = records.len(), "Collection replaced");
                self.records = records;
                if self.selection_policy == SelectionPolicy::PruneOnRefetch {
                    let present: HashSet<&RecordId> =
                        self.records.iter().map(|record| &record.id).collect();
                    self.selection.retain(|id| present.contains(id));
                }
            }
            Err(failure) => {
                warn!(
                    target: targets::RECORDS,
                    detail = %failure.detail,
                    "Refetch failed, keeping previous collection"
                );
                self.notifications
                    .push_back(Notification::failure("Could not load records", &failure));
            }
        }
    }

    fn bump_refetch_token(&mut self) -> ListTask {
        self.refetch_token = !self.refetch_token;
        self.refetch()
    }

    fn spawn<F>(&mut self, kind: TaskKind, work: F) -> ListTask
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let (ticket, registration) = self.tasks.begin(kind);
        Box::pin(async move {
            let completion = Abortable::new(work, registration).await.ok();
            ListEvent { ticket, completion }
        })
    }
}

impl Drop for RecordListController {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::gateway::{GatewayCall, MockGateway};
    use crate::schema::{REPORT_MAPPING, SURVEY_MAPPING};

    fn run_future<T>(future: impl std::future::Future<Output = T>) -> T {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("tokio runtime");
        runtime.block_on(future)
    }

    /// Runs a task and every follow-up task it triggers.
    fn drive(controller: &mut RecordListController, task: ListTask) {
        let mut next = Some(task);
        while let Some(task) = next.take() {
            let event = run_future(task);
            next = controller.apply(event);
        }
    }

    fn survey(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "category": "Theft",
            "idate": "2024-05-01",
            "district": "Central",
            "usage": "Station 4",
            "reason": status
        })
    }

    fn loaded(rows: Vec<Value>) -> (MockGateway, RecordListController) {
        let mock = MockGateway::new();
        let mut controller = RecordListController::new(Arc::new(mock.clone()), &SURVEY_MAPPING);
        mock.push_list(Ok(rows));
        let task = controller.refetch();
        drive(&mut controller, task);
        (mock, controller)
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|record| record.id.to_string()).collect()
    }

    #[test]
    fn pending_filter_keeps_relative_order() {
        let (_, mut controller) = loaded(vec![
            survey("a", "Pending"),
            survey("b", "Completed"),
            survey("c", "Pending"),
        ]);

        controller.set_status_filter(Some(StatusTag::Pending));
        assert_eq!(ids(&controller.visible()), vec!["a", "c"]);

        controller.set_status_filter(None);
        assert_eq!(ids(&controller.visible()), vec!["a", "b", "c"]);
    }

    #[test]
    fn filter_excludes_records_without_status() {
        let records = vec![
            Record::new(RecordId::new("x")),
            Record::new(RecordId::new("y")).with_status(StatusTag::Pending),
        ];
        let filtered = apply_filter(&records, Some(StatusTag::Pending));
        assert_eq!(ids(&filtered), vec!["y"]);
    }

    #[test]
    fn pagination_windows() {
        let items: Vec<u32> = (0..12).collect();
        assert_eq!(apply_pagination(&items, 0, 5), &[0, 1, 2, 3, 4]);
        assert_eq!(apply_pagination(&items, 2, 5), &[10, 11]);
        assert!(apply_pagination(&items, 3, 5).is_empty());
        assert!(apply_pagination(&items, usize::MAX, 5).is_empty());
        assert!(apply_pagination::<u32>(&[], 0, 5).is_empty());
    }

    #[test]
    fn out_of_range_page_is_not_clamped() {
        let (_, mut controller) = loaded(vec![survey("a", "Pending")]);
        controller.set_page(4);
        assert_eq!(controller.page(), 4);
        assert!(controller.visible().is_empty());
        assert_eq!(controller.page_window().label(), "0 of 1");
    }

    #[test]
    fn page_size_change_keeps_page_index() {
        let rows = (0..30).map(|index| survey(&format!("r{index}"), "Pending")).collect();
        let (_, mut controller) = loaded(rows);

        controller.set_page(2);
        assert_eq!(controller.visible().len(), 10);
        assert_eq!(controller.page_count(), 3);

        controller.set_page_size(25);
        assert_eq!(controller.page(), 2);
        assert!(controller.visible().is_empty());
        assert_eq!(controller.page_window().label(), "0 of 30");

        controller.set_page(1);
        assert_eq!(controller.visible().len(), 5);
        assert_eq!(controller.page_window().label(), "26–30 of 30");

        controller.set_page_size(7);
        assert_eq!(controller.page_size().get(), 25);
    }

    #[test]
    fn filter_change_keeps_page_and_selection() {
        let (_, mut controller) = loaded(vec![survey("a", "Pending"), survey("b", "Completed")]);
        controller.set_page(1);
        controller.toggle_select_one(&RecordId::new("b"));

        controller.set_status_filter(Some(StatusTag::Pending));
        assert_eq!(controller.page(), 1);
        assert!(controller.is_selected(&RecordId::new("b")));
    }

    #[test]
    fn select_all_ignores_active_filter() {
        let (_, mut controller) = loaded(vec![
            survey("a", "Pending"),
            survey("b", "Completed"),
            survey("c", "In-Progress"),
        ]);
        controller.set_status_filter(Some(StatusTag::Completed));

        controller.toggle_select_all(true);
        let expected: HashSet<RecordId> = ["a", "b", "c"].into_iter().map(RecordId::new).collect();
        assert_eq!(controller.selection(), &expected);
        assert!(controller.is_all_selected());
        assert!(!controller.is_some_selected());
        assert!(controller.is_bulk_mode());

        controller.toggle_select_all(false);
        assert!(controller.selection().is_empty());
        assert!(!controller.is_bulk_mode());
    }

    #[test]
    fn empty_collection_counts_as_all_selected() {
        let (_, controller) = loaded(Vec::new());
        assert!(controller.is_all_selected());
        assert!(!controller.is_some_selected());
        assert!(!controller.is_bulk_mode());
    }

    #[test]
    fn select_one_is_its_own_inverse() {
        let (_, mut controller) = loaded(vec![
            survey("a", "Pending"),
            survey("b", "Pending"),
            survey("c", "Pending"),
        ]);
        controller.toggle_select_one(&RecordId::new("a"));
        let before = controller.selection().clone();

        controller.toggle_select_one(&RecordId::new("b"));
        assert!(controller.is_some_selected());
        assert!(!controller.is_all_selected());
        assert_eq!(controller.selected_count(), 2);

        controller.toggle_select_one(&RecordId::new("c"));
        assert!(controller.is_all_selected());
        assert!(!controller.is_some_selected());
        controller.toggle_select_one(&RecordId::new("c"));

        controller.toggle_select_one(&RecordId::new("b"));
        assert_eq!(controller.selection(), &before);

        controller.toggle_select_one(&RecordId::new("missing"));
        assert_eq!(controller.selection(), &before);
    }

    #[test]
    fn toggling_completed_sends_pending_then_refetches() {
        let (mock, mut controller) = loaded(vec![survey("a", "Completed")]);
        mock.push_update(Ok(()));
        mock.push_list(Ok(vec![survey("a", "Pending")]));

        let task = controller
            .request_status_toggle(&RecordId::new("a"))
            .expect("known record");
        let token_before = controller.refetch_token();
        drive(&mut controller, task);

        assert_eq!(
            mock.calls(),
            vec![
                GatewayCall::ListSurveys,
                GatewayCall::UpdateStatus {
                    id: RecordId::new("a"),
                    status: StatusTag::Pending,
                },
                GatewayCall::ListSurveys,
            ]
        );
        assert_ne!(controller.refetch_token(), token_before);
        assert_eq!(controller.records()[0].status_tag, Some(StatusTag::Pending));
        let notes = controller.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Success);
    }

    #[test]
    fn toggling_pending_advances_to_in_progress() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending")]);
        mock.push_update(Ok(()));
        mock.push_list(Ok(vec![survey("a", "In-Progress")]));

        let task = controller
            .request_status_toggle(&RecordId::new("a"))
            .expect("known record");
        drive(&mut controller, task);

        assert!(mock.calls().contains(&GatewayCall::UpdateStatus {
            id: RecordId::new("a"),
            status: StatusTag::InProgress,
        }));
    }

    #[test]
    fn toggle_of_unknown_record_issues_nothing() {
        let (mock, mut controller) = loaded(vec![]);
        assert!(controller.request_status_toggle(&RecordId::new("ghost")).is_none());
        assert_eq!(mock.calls(), vec![GatewayCall::ListSurveys]);
        assert_eq!(controller.drain_notifications()[0].kind, NotificationKind::Info);
    }

    #[test]
    fn failed_update_notifies_without_refetch() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending")]);
        mock.push_update(Err(Error::ServerError {
            url: "mock://gateway/update_report_status/a".to_string(),
            status: 500,
            body: None,
        }));

        let task = controller
            .request_status_toggle(&RecordId::new("a"))
            .expect("known record");
        drive(&mut controller, task);

        assert_eq!(mock.calls().len(), 2);
        let notes = controller.drain_notifications();
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert!(notes[0].summary.starts_with("Status update failed"));
    }

    #[test]
    fn deleted_record_leaves_stale_selection_by_default() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending"), survey("b", "Pending")]);
        controller.toggle_select_one(&RecordId::new("a"));
        mock.push_delete(Ok(()));
        mock.push_list(Ok(vec![survey("b", "Pending")]));

        let task = controller.request_delete(RecordId::new("a"));
        drive(&mut controller, task);

        assert_eq!(ids(&controller.visible()), vec!["b"]);
        assert!(controller.is_selected(&RecordId::new("a")));
        assert!(controller.is_all_selected());
    }

    #[test]
    fn prune_policy_drops_vanished_ids() {
        let mock = MockGateway::new();
        let mut controller = RecordListController::new(Arc::new(mock.clone()), &SURVEY_MAPPING)
            .with_selection_policy(SelectionPolicy::PruneOnRefetch);
        mock.push_list(Ok(vec![survey("a", "Pending"), survey("b", "Pending")]));
        let task = controller.refetch();
        drive(&mut controller, task);

        controller.toggle_select_all(true);
        mock.push_delete(Ok(()));
        mock.push_list(Ok(vec![survey("b", "Pending")]));
        let task = controller.request_delete(RecordId::new("a"));
        drive(&mut controller, task);

        let expected: HashSet<RecordId> = [RecordId::new("b")].into_iter().collect();
        assert_eq!(controller.selection(), &expected);
    }

    #[test]
    fn failed_refetch_keeps_previous_collection() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending")]);
        mock.push_list(Err(Error::NetworkFailure {
            url: "mock://gateway/get_surveys".to_string(),
            details: "connection refused".to_string(),
        }));

        let task = controller.refetch();
        assert!(controller.is_loading());
        drive(&mut controller, task);

        assert!(!controller.is_loading());
        assert_eq!(ids(&controller.visible()), vec!["a"]);
        let notes = controller.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert!(notes[0].detail.as_deref().unwrap_or_default().contains("connection refused"));
    }

    #[test]
    fn newer_refetch_supersedes_older() {
        let mock = MockGateway::new();
        let mut controller = RecordListController::new(Arc::new(mock.clone()), &REPORT_MAPPING);
        mock.push_list(Ok(vec![json!({"ruuid": "fresh", "status": "Completed"})]));

        let stale = controller.refetch();
        let fresh = controller.refetch();

        let stale_event = run_future(stale);
        assert!(stale_event.completion.is_none());
        assert!(controller.apply(stale_event).is_none());
        assert!(controller.is_loading());

        let fresh_event = run_future(fresh);
        assert!(controller.apply(fresh_event).is_none());
        assert!(!controller.is_loading());
        assert_eq!(controller.records()[0].id, RecordId::new("fresh"));
        assert_eq!(mock.calls(), vec![GatewayCall::ListSurveys]);
    }

    #[test]
    fn reopening_detail_drops_earlier_request() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending"), survey("b", "Pending")]);
        let detail_b = RecordDetail {
            record: Record::new(RecordId::new("b")),
            suspect_name: None,
            suspect_details: Some("second".to_string()),
            suspect_details_type: None,
            suspect_info: None,
            media: Vec::new(),
        };
        mock.push_detail(Ok(detail_b.clone()));

        let first = controller.open_detail(RecordId::new("a"));
        let second = controller.open_detail(RecordId::new("b"));
        drive(&mut controller, first);
        assert!(controller.detail().is_none());
        drive(&mut controller, second);

        assert_eq!(controller.detail_target(), Some(&RecordId::new("b")));
        assert_eq!(controller.detail(), Some(&detail_b));
        assert_eq!(
            mock.calls().last(),
            Some(&GatewayCall::GetRecordDetail(RecordId::new("b")))
        );
    }

    #[test]
    fn closing_detail_cancels_pending_load() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending")]);
        let task = controller.open_detail(RecordId::new("a"));
        controller.close_detail();
        drive(&mut controller, task);

        assert!(controller.detail_target().is_none());
        assert!(controller.detail().is_none());
        assert_eq!(mock.calls(), vec![GatewayCall::ListSurveys]);
    }

    #[test]
    fn annotation_surfaces_server_message_and_closes_dialog() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending")]);
        controller.open_annotate(RecordId::new("a"));
        mock.push_annotation(Ok("Added to forum".to_string()));
        mock.push_list(Ok(vec![survey("a", "Pending")]));

        let payload = AnnotatePayload::new("seen at night", "approved");
        let task = controller.request_annotate(RecordId::new("a"), payload.clone());
        drive(&mut controller, task);

        assert!(controller.annotate_target().is_none());
        assert!(mock.calls().contains(&GatewayCall::Annotate {
            id: RecordId::new("a"),
            payload,
        }));
        let notes = controller.drain_notifications();
        assert_eq!(notes[0].summary, "Added to forum");
    }

    #[test]
    fn failed_annotation_keeps_dialog_open() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending")]);
        controller.open_annotate(RecordId::new("a"));
        mock.push_annotation(Err(Error::NetworkFailure {
            url: "mock://gateway/add_to_forum/a".to_string(),
            details: "timeout".to_string(),
        }));

        let task = controller.request_annotate(RecordId::new("a"), AnnotatePayload::new("d", "g"));
        drive(&mut controller, task);

        assert_eq!(controller.annotate_target(), Some(&RecordId::new("a")));
        assert_eq!(controller.drain_notifications()[0].kind, NotificationKind::Error);
    }

    #[test]
    fn bulk_delete_reports_partial_failure() {
        let (mock, mut controller) = loaded(vec![
            survey("a", "Pending"),
            survey("b", "Pending"),
            survey("c", "Pending"),
        ]);
        controller.toggle_select_one(&RecordId::new("a"));
        controller.toggle_select_one(&RecordId::new("b"));
        mock.push_delete(Ok(()));
        mock.push_delete(Err(Error::ServerError {
            url: "mock://gateway/delete_report/b".to_string(),
            status: 404,
            body: None,
        }));
        mock.push_list(Ok(vec![survey("b", "Pending"), survey("c", "Pending")]));

        let task = controller.request_bulk_delete().expect("selection present");
        drive(&mut controller, task);

        assert!(controller.selection().is_empty());
        assert_eq!(controller.records().len(), 2);
        let kinds: Vec<NotificationKind> = controller
            .drain_notifications()
            .into_iter()
            .map(|note| note.kind)
            .collect();
        assert_eq!(kinds, vec![NotificationKind::Error, NotificationKind::Success]);
    }

    #[test]
    fn bulk_delete_needs_a_selection() {
        let (_, mut controller) = loaded(vec![survey("a", "Pending")]);
        assert!(controller.request_bulk_delete().is_none());
    }

    #[test]
    fn shutdown_discards_in_flight_results() {
        let (mock, mut controller) = loaded(vec![survey("a", "Pending")]);
        mock.push_delete(Ok(()));

        let task = controller.request_delete(RecordId::new("a"));
        assert_eq!(controller.in_flight(), 1);
        controller.shutdown();
        assert_eq!(controller.in_flight(), 0);

        let event = run_future(task);
        assert!(event.completion.is_none());
        assert!(controller.apply(event).is_none());
        assert_eq!(mock.calls(), vec![GatewayCall::ListSurveys]);
    }

    #[test]
    fn config_drives_mapping_and_page_size() {
        let mock = MockGateway::new();
        let config = DashboardConfig {
            schema: crate::schema::RecordSchema::Report,
            page_size: 5,
            ..DashboardConfig::default()
        };
        let mut controller = RecordListController::from_config(Arc::new(mock.clone()), &config);
        mock.push_list(Ok(vec![json!({"ruuid": "r", "police_station": "North", "status": "Completed"})]));
        let task = controller.refetch();
        drive(&mut controller, task);

        assert_eq!(controller.page_size().get(), 5);
        assert_eq!(controller.records()[0].location_detail.as_deref(), Some("North"));
        assert_eq!(controller.records()[0].status_tag, Some(StatusTag::Completed));
    }
}
