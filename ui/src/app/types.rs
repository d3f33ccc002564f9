use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use casedesk_core::{
    AnnotatePayload, DashboardConfig, Error, ListEvent, Notification, NotificationKind, PageSize,
    RecordGateway, RecordId, StatusFilter, StatusTag,
};

use crate::logging::{LogLevel, LogStore, ReloadHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Records,
    Debug,
}

/// Pick-list entry for the status filter; `All` clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChoice {
    All,
    Status(StatusTag),
}

impl FilterChoice {
    pub const ALL: [FilterChoice; 4] = [
        FilterChoice::All,
        FilterChoice::Status(StatusTag::Pending),
        FilterChoice::Status(StatusTag::InProgress),
        FilterChoice::Status(StatusTag::Completed),
    ];

    pub fn from_filter(filter: StatusFilter) -> Self {
        filter.map_or(FilterChoice::All, FilterChoice::Status)
    }

    pub fn to_filter(self) -> StatusFilter {
        match self {
            FilterChoice::All => None,
            FilterChoice::Status(tag) => Some(tag),
        }
    }
}

impl fmt::Display for FilterChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterChoice::All => f.write_str("All statuses"),
            FilterChoice::Status(tag) => f.write_str(tag.label()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    LogTick,
    LogLevelChanged(LogLevel),
    ToggleTarget(String, bool),
    CopyDiagnostics,
    ClearLogs,
    SelectTab(Tab),
    Refresh,
    FilterChanged(FilterChoice),
    PageSizeChanged(PageSize),
    PreviousPage,
    NextPage,
    SelectAll(bool),
    SelectOne(RecordId),
    ToggleStatus(RecordId),
    MarkCompleted(RecordId),
    RequestDelete(RecordId),
    RequestDeleteSelected,
    ConfirmDelete,
    CancelDelete,
    OpenAnnotate(RecordId),
    CloseAnnotate,
    AnnotateDescriptionChanged(String),
    AnnotateGrantChanged(String),
    SubmitAnnotate,
    OpenDetail(RecordId),
    CloseDetail,
    List(ListEvent),
    ToastTick,
    DismissToast(u64),
    EscapePressed,
}

/// Deletion awaiting confirmation in the confirm dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteIntent {
    One(RecordId),
    Selected(usize),
}

impl DeleteIntent {
    pub fn prompt(&self) -> String {
        match self {
            DeleteIntent::One(id) => format!("Delete record {id}? This cannot be undone."),
            DeleteIntent::Selected(1) => "Delete the selected record? This cannot be undone.".to_string(),
            DeleteIntent::Selected(count) => {
                format!("Delete {count} selected records? This cannot be undone.")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotateForm {
    pub description: String,
    pub grant: String,
    pub error: Option<String>,
    pub submitting: bool,
}

impl AnnotateForm {
    /// Validated payload with surrounding whitespace removed.
    pub fn payload(&self) -> Result<AnnotatePayload, Error> {
        let payload = AnnotatePayload::new(self.description.trim(), self.grant.trim());
        payload.validate()?;
        Ok(payload)
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: NotificationKind,
    pub summary: String,
    pub detail: Option<String>,
    pub expires_at: Instant,
}

impl Toast {
    pub fn from_notification(
        id: u64,
        notification: Notification,
        now: Instant,
        lifetime: Duration,
    ) -> Self {
        // Failures stay up twice as long so the detail can be read.
        let lifetime = match notification.kind {
            NotificationKind::Error => lifetime.saturating_mul(2),
            _ => lifetime,
        };
        Self {
            id,
            kind: notification.kind,
            summary: notification.summary,
            detail: notification.detail,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct Flags {
    pub log_store: LogStore,
    pub reload_handle: ReloadHandle,
    pub config: DashboardConfig,
    pub gateway: Arc<dyn RecordGateway>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_choice_maps_to_controller_filter() {
        assert_eq!(FilterChoice::All.to_filter(), None);
        assert_eq!(
            FilterChoice::from_filter(Some(StatusTag::Completed)),
            FilterChoice::Status(StatusTag::Completed)
        );
        assert_eq!(FilterChoice::from_filter(None), FilterChoice::All);
        assert_eq!(FilterChoice::Status(StatusTag::InProgress).to_string(), "In progress");
    }

    #[test]
    fn annotate_form_reports_first_missing_field() {
        let form = AnnotateForm {
            description: "   ".to_string(),
            grant: "approved".to_string(),
            ..AnnotateForm::default()
        };
        match form.payload() {
            Err(Error::Validation { field }) => assert_eq!(field, "description"),
            other => panic!("unexpected result: {other:?}"),
        }

        let form = AnnotateForm {
            description: " Seen at dusk ".to_string(),
            grant: " approved".to_string(),
            ..AnnotateForm::default()
        };
        let payload = form.payload().expect("valid payload");
        assert_eq!(payload, AnnotatePayload::new("Seen at dusk", "approved"));
    }

    #[test]
    fn error_toasts_outlive_success_toasts() {
        let now = Instant::now();
        let lifetime = Duration::from_secs(4);
        let success = Toast::from_notification(1, Notification::success("Saved."), now, lifetime);
        let failure = Toast::from_notification(
            2,
            Notification {
                kind: NotificationKind::Error,
                summary: "Delete failed".to_string(),
                detail: Some("HTTP 500".to_string()),
            },
            now,
            lifetime,
        );

        let later = now + Duration::from_secs(5);
        assert!(success.is_expired(later));
        assert!(!failure.is_expired(later));
        assert_eq!(failure.detail.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn oversized_lifetime_does_not_overflow() {
        let now = Instant::now();
        let toast = Toast::from_notification(1, Notification::success("Saved."), now, Duration::MAX);
        assert!(toast.expires_at >= now);
    }

    #[test]
    fn delete_prompt_counts_selection() {
        assert!(DeleteIntent::One(RecordId::new("r-1")).prompt().contains("r-1"));
        assert!(DeleteIntent::Selected(3).prompt().starts_with("Delete 3 selected records"));
        assert!(DeleteIntent::Selected(1).prompt().contains("the selected record?"));
    }
}
