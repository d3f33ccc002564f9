use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

pub const ALLOWED_PAGE_SIZES: [usize; 3] = [5, 10, 25];
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusTag {
    Pending,
    #[serde(rename = "In-Progress")]
    InProgress,
    Completed,
}

/// Visual weight of a status, independent of any concrete color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Warning,
    Info,
    Success,
}

impl StatusTag {
    pub const ALL: [StatusTag; 3] = [StatusTag::Pending, StatusTag::InProgress, StatusTag::Completed];

    pub fn as_wire(self) -> &'static str {
        match self {
            StatusTag::Pending => "Pending",
            StatusTag::InProgress => "In-Progress",
            StatusTag::Completed => "Completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusTag::Pending => "Pending",
            StatusTag::InProgress => "In progress",
            StatusTag::Completed => "Completed",
        }
    }

    pub fn tone(self) -> StatusTone {
        match self {
            StatusTag::Pending => StatusTone::Warning,
            StatusTag::InProgress => StatusTone::Info,
            StatusTag::Completed => StatusTone::Success,
        }
    }

    /// Accepts the three wire strings plus common spelling variants; anything
    /// else is treated as an absent status.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "pending" => Some(StatusTag::Pending),
            "inprogress" => Some(StatusTag::InProgress),
            "completed" => Some(StatusTag::Completed),
            _ => None,
        }
    }

    /// Edit-action rule: `Pending` advances to `In-Progress`, everything else
    /// (including absent and `Completed`) goes back to `Pending`.
    pub fn toggled(current: Option<StatusTag>) -> StatusTag {
        match current {
            Some(StatusTag::Pending) => StatusTag::InProgress,
            _ => StatusTag::Pending,
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// `None` matches every record.
pub type StatusFilter = Option<StatusTag>;

pub fn parse_status_filter(value: &str) -> StatusFilter {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return None;
    }
    StatusTag::parse(trimmed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub category: Option<String>,
    pub reported_date: Option<String>,
    pub location_name: Option<String>,
    pub location_detail: Option<String>,
    pub status_tag: Option<StatusTag>,
}

impl Record {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            category: None,
            reported_date: None,
            location_name: None,
            location_detail: None,
            status_tag: None,
        }
    }

    pub fn with_status(mut self, status: StatusTag) -> Self {
        self.status_tag = Some(status);
        self
    }

    pub fn display_status(&self) -> StatusTag {
        self.status_tag.unwrap_or(StatusTag::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDetail {
    pub record: Record,
    pub suspect_name: Option<String>,
    pub suspect_details: Option<String>,
    pub suspect_details_type: Option<String>,
    pub suspect_info: Option<String>,
    /// Image first, then video, when present.
    pub media: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatePayload {
    pub description: String,
    pub grant: String,
}

impl AnnotatePayload {
    pub fn new(description: impl Into<String>, grant: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            grant: grant.into(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.description.trim().is_empty() {
            return Err(Error::Validation {
                field: "description",
            });
        }
        if self.grant.trim().is_empty() {
            return Err(Error::Validation { field: "grant" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(usize);

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize(5), PageSize(10), PageSize(25)];

    pub fn new(value: usize) -> Option<Self> {
        ALLOWED_PAGE_SIZES
            .contains(&value)
            .then_some(PageSize(value))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(DEFAULT_PAGE_SIZE)
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        PageSize::new(value).ok_or_else(|| {
            format!("page size {value} is not one of {ALLOWED_PAGE_SIZES:?}")
        })
    }
}

impl From<PageSize> for usize {
    fn from(value: PageSize) -> Self {
        value.0
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
