//! Normalizes remote objects into the canonical record shape.
//!
//! A [`FieldMapping`] names, for every canonical field, the key that carries
//! it in the remote payload. Mapping never fails: a key that is missing from
//! the source simply leaves the canonical slot empty.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{Record, RecordDetail, RecordId, StatusTag};
use crate::targets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    Id,
    Category,
    ReportedDate,
    LocationName,
    LocationDetail,
    StatusTag,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Id,
        CanonicalField::Category,
        CanonicalField::ReportedDate,
        CanonicalField::LocationName,
        CanonicalField::LocationDetail,
        CanonicalField::StatusTag,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub name: &'static str,
    pub pairs: &'static [(CanonicalField, &'static str)],
}

impl FieldMapping {
    pub fn source_key(&self, field: CanonicalField) -> Option<&'static str> {
        self.pairs
            .iter()
            .find(|(canonical, _)| *canonical == field)
            .map(|(_, source)| *source)
    }
}

pub const REPORT_MAPPING: FieldMapping = FieldMapping {
    name: "report",
    pairs: &[
        (CanonicalField::Id, "ruuid"),
        (CanonicalField::Category, "category"),
        (CanonicalField::ReportedDate, "idate"),
        (CanonicalField::LocationName, "district"),
        (CanonicalField::LocationDetail, "police_station"),
        (CanonicalField::StatusTag, "status"),
    ],
};

pub const SURVEY_MAPPING: FieldMapping = FieldMapping {
    name: "survey",
    pairs: &[
        (CanonicalField::Id, "id"),
        (CanonicalField::Category, "category"),
        (CanonicalField::ReportedDate, "idate"),
        (CanonicalField::LocationName, "district"),
        (CanonicalField::LocationDetail, "usage"),
        (CanonicalField::StatusTag, "reason"),
    ],
};

/// Which mapping table normalizes the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordSchema {
    #[default]
    Survey,
    Report,
}

impl RecordSchema {
    pub fn mapping(self) -> &'static FieldMapping {
        match self {
            RecordSchema::Survey => &SURVEY_MAPPING,
            RecordSchema::Report => &REPORT_MAPPING,
        }
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mapping().name)
    }
}

/// Every canonical field of a mapping, each holding the source value if present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalRecord {
    fields: BTreeMap<CanonicalField, Option<Value>>,
}

impl CanonicalRecord {
    pub fn get(&self, field: CanonicalField) -> Option<&Value> {
        self.fields.get(&field).and_then(Option::as_ref)
    }

    pub fn contains_key(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn text(&self, field: CanonicalField) -> Option<String> {
        self.get(field).and_then(value_as_text)
    }
}

pub fn map_fields(mapping: &FieldMapping, source: &Map<String, Value>) -> CanonicalRecord {
    let fields = mapping
        .pairs
        .iter()
        .map(|(canonical, key)| (*canonical, source.get(*key).cloned()))
        .collect();
    CanonicalRecord { fields }
}

impl Record {
    /// Returns `None` when the id slot holds nothing usable.
    pub fn from_canonical(canonical: &CanonicalRecord) -> Option<Self> {
        let id = canonical
            .text(CanonicalField::Id)
            .filter(|value| !value.is_empty())?;
        Some(Self {
            id: RecordId(id),
            category: canonical.text(CanonicalField::Category),
            reported_date: canonical.text(CanonicalField::ReportedDate),
            location_name: canonical.text(CanonicalField::LocationName),
            location_detail: canonical.text(CanonicalField::LocationDetail),
            status_tag: canonical
                .text(CanonicalField::StatusTag)
                .and_then(|value| StatusTag::parse(&value)),
        })
    }
}

/// Maps a list payload, dropping entries that are not objects or lack an id.
pub fn normalize_records(mapping: &FieldMapping, raw: &[Value]) -> Vec<Record> {
    let mut records = Vec::with_capacity(raw.len());
    for (index, item) in raw.iter().enumerate() {
        let Some(object) = item.as_object() else {
            warn!(target: targets::RECORDS, index, "Skipping non-object record");
            continue;
        };
        match Record::from_canonical(&map_fields(mapping, object)) {
            Some(record) => records.push(record),
            None => warn!(
                target: targets::RECORDS,
                index,
                schema = mapping.name,
                "Skipping record without id"
            ),
        }
    }
    records
}

const MEDIA_KEYS: [&str; 2] = ["suspect_img", "suspect_video"];

impl RecordDetail {
    pub fn from_raw(id: &RecordId, source: &Map<String, Value>) -> Self {
        let canonical = map_fields(&REPORT_MAPPING, source);
        let record = Record::from_canonical(&canonical).unwrap_or_else(|| {
            let mut record = Record::new(id.clone());
            record.category = canonical.text(CanonicalField::Category);
            record.reported_date = canonical.text(CanonicalField::ReportedDate);
            record.location_name = canonical.text(CanonicalField::LocationName);
            record.location_detail = canonical.text(CanonicalField::LocationDetail);
            record.status_tag = canonical
                .text(CanonicalField::StatusTag)
                .and_then(|value| StatusTag::parse(&value));
            record
        });

        let media = MEDIA_KEYS
            .iter()
            .filter_map(|key| source.get(*key))
            .flat_map(media_references)
            .filter(|reference| !reference.is_empty())
            .collect();
        let text = |key: &str| source.get(key).and_then(value_as_text);

        Self {
            record,
            suspect_name: text("suspect_name"),
            suspect_details: text("suspect_details"),
            suspect_details_type: text("suspect_detailstype"),
            suspect_info: text("suspect_info"),
            media,
        }
    }
}

fn media_references(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_as_text).collect(),
        other => value_as_text(other).into_iter().collect(),
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
