pub mod config;
pub mod error;
pub mod gateway;
pub mod list;
pub mod model;
pub mod schema;
pub mod targets;
pub mod tasks;

pub use config::{config_path, DashboardConfig, SelectionPolicy};
pub use error::{Error, GatewayError, StorageAction};
pub use gateway::{GatewayCall, GatewayFuture, HttpGateway, MockGateway, RecordGateway};
pub use list::{
    apply_filter, apply_pagination, Completion, FailureInfo, ListEvent, ListTask, Notification,
    NotificationKind, Outcome, PageWindow, RecordListController,
};
pub use model::{
    parse_status_filter, AnnotatePayload, PageSize, Record, RecordDetail, RecordId, StatusFilter,
    StatusTag, StatusTone, ALLOWED_PAGE_SIZES, DEFAULT_PAGE_SIZE,
};
pub use schema::{
    map_fields, normalize_records, CanonicalField, CanonicalRecord, FieldMapping, RecordSchema,
    REPORT_MAPPING, SURVEY_MAPPING,
};
pub use tasks::{TaskKind, TaskSet, TaskTicket};
