//! Canonical field names and the prefix-tolerant lookup over raw records.
//!
//! Records come from an external CRM and may carry namespaced keys
//! (`delivery__StageNamePk__c`) or bare ones (`StageNamePk__c`). This is the
//! only place that knows about the difference.

use crate::error::{BoardError, Result};
use crate::model::{Priority, Stage, Ticket};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

pub type RawRecord = Map<String, Value>;

pub const ID: &str = "Id";
pub const NAME: &str = "Name";
pub const TITLE: &str = "BriefDescriptionTxt__c";
pub const DESCRIPTION: &str = "DetailsTxt__c";
pub const STAGE: &str = "StageNamePk__c";
pub const PRIORITY: &str = "PriorityPk__c";
pub const SORT_ORDER: &str = "SortOrderNumber__c";
pub const IS_ACTIVE: &str = "IsActiveBool__c";
pub const TAGS: &str = "Tags__c";
pub const INTENTION: &str = "ClientIntentionPk__c";
pub const DEV_DAYS_SIZE: &str = "DeveloperDaysSizeNumber__c";
pub const CALCULATED_ETA: &str = "CalculatedETADate__c";
pub const PROJECTED_UAT_READY: &str = "ProjectedUATReadyDate__c";
pub const TOTAL_LOGGED_HOURS: &str = "TotalLoggedHoursNumber__c";
pub const ESTIMATED_HOURS: &str = "EstimatedHoursNumber__c";
pub const CREATED_DATE: &str = "CreatedDate";

/// Timestamps as the CRM API writes them, offset without a colon.
const CRM_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    prefix: String,
}

impl FieldMap {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key variants in lookup order: exact, prefix removed, prefix added.
    fn candidates(&self, key: &str) -> Vec<String> {
        let mut keys = vec![key.to_string()];
        if self.prefix.is_empty() {
            return keys;
        }
        match key.strip_prefix(&self.prefix) {
            Some(bare) => keys.push(bare.to_string()),
            None => keys.push(format!("{}{}", self.prefix, key)),
        }
        keys
    }

    pub fn get<'a>(&self, record: &'a RawRecord, key: &str) -> Option<&'a Value> {
        self.candidates(key)
            .iter()
            .find_map(|candidate| record.get(candidate))
            .filter(|value| !value.is_null())
    }

    /// Write to whichever key variant the record already uses, else `key`.
    pub fn set(&self, record: &mut RawRecord, key: &str, value: Value) {
        let existing = self
            .candidates(key)
            .into_iter()
            .find(|candidate| record.contains_key(candidate));
        record.insert(existing.unwrap_or_else(|| key.to_string()), value);
    }

    pub fn get_str<'a>(&self, record: &'a RawRecord, key: &str) -> Option<&'a str> {
        self.get(record, key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, record: &RawRecord, key: &str) -> Option<f64> {
        match self.get(record, key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, record: &RawRecord, key: &str) -> Option<bool> {
        match self.get(record, key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_date(&self, record: &RawRecord, key: &str) -> Option<NaiveDate> {
        let raw = self.get_str(record, key)?;
        NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
    }

    /// RFC 3339, the CRM's `2025-01-10T09:00:00.000+0000`, or a bare date
    /// taken from the first ten characters.
    pub fn get_datetime(&self, record: &RawRecord, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.get_str(record, key)?.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, CRM_DATETIME_FORMAT))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            })
    }

    /// Decode a raw record into a ticket. Dependency links are not part of
    /// the record and are left empty.
    pub fn decode_ticket(&self, record: &RawRecord) -> Result<Ticket> {
        let id = self
            .get_str(record, ID)
            .ok_or_else(|| BoardError::Parse("Record has no Id".to_string()))?;
        let stage: Stage = match self.get_str(record, STAGE) {
            Some(raw) => raw.parse()?,
            None => Stage::default(),
        };
        let priority = self
            .get_str(record, PRIORITY)
            .and_then(|raw| raw.parse::<Priority>().ok())
            .unwrap_or_default();

        let mut ticket = Ticket::new(
            id.to_string(),
            self.get_str(record, NAME).unwrap_or(id).to_string(),
            self.get_str(record, TITLE).unwrap_or_default().to_string(),
        )
        .with_stage(stage)
        .with_priority(priority)
        .with_sort_order(self.get_f64(record, SORT_ORDER).unwrap_or(0.0));

        ticket.description = self.get_str(record, DESCRIPTION).unwrap_or_default().to_string();
        ticket.intention = self.get_str(record, INTENTION).map(str::to_string);
        ticket.tags = self.get_str(record, TAGS).map(str::to_string);
        ticket.developer_days_size = self.get_f64(record, DEV_DAYS_SIZE);
        ticket.actual_hours = self.get_f64(record, TOTAL_LOGGED_HOURS);
        ticket.estimated_hours = self.get_f64(record, ESTIMATED_HOURS);
        ticket.stored_eta = self.get_date(record, CALCULATED_ETA);
        ticket.projected_uat_date = self.get_date(record, PROJECTED_UAT_READY);
        ticket.created_date = self.get_datetime(record, CREATED_DATE);
        ticket.is_active = self.get_bool(record, IS_ACTIVE).unwrap_or(true);
        Ok(ticket)
    }

    pub fn encode_ticket(&self, ticket: &Ticket) -> RawRecord {
        let mut record = RawRecord::new();
        let mut put = |key: &str, value: Value| {
            if !value.is_null() {
                self.set(&mut record, key, value);
            }
        };
        put(ID, Value::from(ticket.id.clone()));
        put(NAME, Value::from(ticket.name.clone()));
        put(TITLE, Value::from(ticket.title.clone()));
        if !ticket.description.is_empty() {
            put(DESCRIPTION, Value::from(ticket.description.clone()));
        }
        put(STAGE, Value::from(ticket.stage.label()));
        put(PRIORITY, Value::from(ticket.priority.to_string()));
        put(SORT_ORDER, Value::from(ticket.sort_order));
        put(IS_ACTIVE, Value::from(ticket.is_active));
        put(TAGS, Value::from(ticket.tags.clone()));
        put(INTENTION, Value::from(ticket.intention.clone()));
        put(DEV_DAYS_SIZE, Value::from(ticket.developer_days_size));
        put(ESTIMATED_HOURS, Value::from(ticket.estimated_hours));
        put(TOTAL_LOGGED_HOURS, Value::from(ticket.actual_hours));
        put(
            CALCULATED_ETA,
            Value::from(ticket.stored_eta.map(|d| d.to_string())),
        );
        put(
            PROJECTED_UAT_READY,
            Value::from(ticket.projected_uat_date.map(|d| d.to_string())),
        );
        put(
            CREATED_DATE,
            Value::from(ticket.created_date.map(|d| d.to_rfc3339())),
        );
        record
    }
}
