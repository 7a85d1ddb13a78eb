//! Per-ticket view models.
//!
//! The enricher turns raw tickets plus the live ETA projection into the
//! values a board card shows. It never mutates its inputs; `today` is fixed
//! at construction so output is reproducible.

use crate::model::{EtaResponse, Priority, StageOwner, Ticket, intention_color};
use chrono::{Local, NaiveDate};
use serde::Serialize;

const DATE_FORMAT: &str = "%b %-d, %Y";
const UAT_FORMAT: &str = "%b %-d";
const NO_DATE: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateLabel {
    Live,
    Stored,
    Created,
    None,
}

impl DateLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateLabel::Live => "Est. Completion (Live)",
            DateLabel::Stored => "Est. Completion",
            DateLabel::Created => "Created",
            DateLabel::None => "No Date",
        }
    }
}

/// The other end of a dependency, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedTicket {
    pub id: String,
    pub name: String,
    pub dependency_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTicket {
    pub ticket: Ticket,
    pub display_date: String,
    pub date_label: DateLabel,
    /// Whole days from today to the ETA, when an ETA is known.
    pub days_until: Option<i64>,
    pub is_blocked_by: Vec<LinkedTicket>,
    pub is_blocking: Vec<LinkedTicket>,
    pub is_currently_blocked: bool,
    pub tags: Vec<String>,
    pub is_high_priority: bool,
    pub priority_class: String,
    pub hours_display: String,
    pub size_display: String,
    pub uat_display: Option<String>,
    pub is_pushed_back: bool,
    pub owner: StageOwner,
    pub card_color: String,
    pub intention_color: Option<String>,
}

impl EnrichedTicket {
    pub fn id(&self) -> &str {
        &self.ticket.id
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TicketEnricher {
    today: NaiveDate,
}

impl TicketEnricher {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Enricher anchored on the local calendar date.
    pub fn for_today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn enrich_all(&self, tickets: &[Ticket], etas: &EtaResponse) -> Vec<EnrichedTicket> {
        tickets
            .iter()
            .map(|ticket| self.enrich(ticket, etas))
            .collect()
    }

    pub fn enrich(&self, ticket: &Ticket, etas: &EtaResponse) -> EnrichedTicket {
        let (date_label, eta) = match (etas.eta_for(&ticket.id), ticket.stored_eta) {
            (Some(live), _) => (DateLabel::Live, Some(live)),
            (None, Some(stored)) => (DateLabel::Stored, Some(stored)),
            (None, None) if ticket.created_date.is_some() => (DateLabel::Created, None),
            (None, None) => (DateLabel::None, None),
        };

        let (display_date, days_until) = match eta {
            Some(date) => {
                let days = (date - self.today).num_days();
                (
                    format!("{}{}", date.format(DATE_FORMAT), day_offset_suffix(days)),
                    Some(days),
                )
            }
            None => (
                ticket
                    .created_date
                    .map(|created| created.date_naive().format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|| NO_DATE.to_string()),
                None,
            ),
        };

        let is_blocked_by = links(&ticket.blocked_by);
        let is_blocking = links(&ticket.blocking);

        EnrichedTicket {
            display_date,
            date_label,
            days_until,
            is_currently_blocked: !is_blocked_by.is_empty(),
            is_blocked_by,
            is_blocking,
            tags: parse_tags(ticket.tags.as_deref()),
            is_high_priority: ticket.priority == Priority::High,
            priority_class: format!(
                "priority-badge priority-{}",
                ticket.priority.to_string().to_lowercase()
            ),
            hours_display: format!(
                "{} / {}h",
                ticket.actual_hours.unwrap_or(0.0),
                ticket.estimated_hours.unwrap_or(0.0)
            ),
            size_display: ticket
                .developer_days_size
                .map(|days| days.to_string())
                .unwrap_or_else(|| "--".to_string()),
            uat_display: ticket
                .projected_uat_date
                .map(|date| date.format(UAT_FORMAT).to_string()),
            is_pushed_back: etas.pushed_back.iter().any(|id| *id == ticket.id),
            owner: ticket.stage.owner(),
            card_color: ticket.stage.color().to_string(),
            intention_color: ticket
                .intention
                .as_deref()
                .and_then(intention_color)
                .map(str::to_string),
            ticket: ticket.clone(),
        }
    }
}

/// `" (+Nd)"`, `" (-Nd)"` or `" (Today)"` for a whole-day offset.
pub fn day_offset_suffix(days: i64) -> String {
    match days {
        d if d > 0 => format!(" (+{}d)", d),
        d if d < 0 => format!(" ({}d)", d),
        _ => " (Today)".to_string(),
    }
}

/// Split a raw tag string on commas, trimming and dropping empties and repeats.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.unwrap_or("").split(',').map(str::trim) {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn links(raw: &[crate::model::DependencyLink]) -> Vec<LinkedTicket> {
    raw.iter()
        .map(|link| LinkedTicket {
            id: link.ticket_id.clone(),
            name: link
                .ticket_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| link.ticket_id.clone()),
            dependency_id: link.dependency_id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyLink, EtaProjection, Stage};
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ticket() -> Ticket {
        Ticket::new("t1".into(), "T-0001".into(), "Login page".into())
            .with_created_date(Utc.with_ymd_and_hms(2025, 1, 2, 15, 30, 0).unwrap())
    }

    fn live(id: &str, date: NaiveDate) -> EtaResponse {
        EtaResponse {
            tickets: vec![EtaProjection {
                ticket_id: id.into(),
                calculated_eta: Some(date),
            }],
            pushed_back: vec![],
        }
    }

    #[test]
    fn test_live_eta_three_days_out() {
        let enricher = TicketEnricher::new(day(2025, 3, 7));
        let view = enricher.enrich(&ticket(), &live("t1", day(2025, 3, 10)));
        assert_eq!(view.date_label, DateLabel::Live);
        assert_eq!(view.display_date, "Mar 10, 2025 (+3d)");
        assert!(view.display_date.ends_with(" (+3d)"));
        assert_eq!(view.days_until, Some(3));
    }

    #[test]
    fn test_live_eta_wins_over_stored() {
        let enricher = TicketEnricher::new(day(2025, 3, 7));
        let t = ticket().with_stored_eta(day(2025, 4, 1));
        let view = enricher.enrich(&t, &live("t1", day(2025, 3, 7)));
        assert_eq!(view.date_label, DateLabel::Live);
        assert!(view.display_date.ends_with(" (Today)"));
    }

    #[test]
    fn test_stored_eta_in_the_past() {
        let enricher = TicketEnricher::new(day(2025, 3, 7));
        let t = ticket().with_stored_eta(day(2025, 3, 2));
        let view = enricher.enrich(&t, &EtaResponse::default());
        assert_eq!(view.date_label, DateLabel::Stored);
        assert_eq!(view.display_date, "Mar 2, 2025 (-5d)");
    }

    #[test]
    fn test_created_date_has_no_suffix() {
        let enricher = TicketEnricher::new(day(2025, 3, 7));
        let view = enricher.enrich(&ticket(), &live("other", day(2025, 3, 9)));
        assert_eq!(view.date_label, DateLabel::Created);
        assert_eq!(view.display_date, "Jan 2, 2025");
        assert_eq!(view.days_until, None);
        assert_eq!(view.date_label.as_str(), "Created");
    }

    #[test]
    fn test_no_date_at_all() {
        let mut t = ticket();
        t.created_date = None;
        let view = TicketEnricher::new(day(2025, 3, 7)).enrich(&t, &EtaResponse::default());
        assert_eq!(view.date_label, DateLabel::None);
        assert_eq!(view.date_label.as_str(), "No Date");
        assert_eq!(view.display_date, "—");
    }

    #[test]
    fn test_blocking_lists() {
        let mut t = ticket();
        t.blocked_by = vec![DependencyLink {
            dependency_id: "d1".into(),
            ticket_id: "t9".into(),
            ticket_name: None,
        }];
        t.blocking = vec![DependencyLink {
            dependency_id: "d2".into(),
            ticket_id: "t3".into(),
            ticket_name: Some("T-0003".into()),
        }];
        let view = TicketEnricher::new(day(2025, 1, 1)).enrich(&t, &EtaResponse::default());
        assert!(view.is_currently_blocked);
        assert_eq!(view.is_blocked_by[0].name, "t9");
        assert_eq!(view.is_blocked_by[0].dependency_id, "d1");
        assert_eq!(view.is_blocking[0].name, "T-0003");
    }

    #[test]
    fn test_tags_are_cleaned() {
        assert_eq!(
            parse_tags(Some(" ui, backend,,ui , ,perf")),
            vec!["ui", "backend", "perf"]
        );
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn test_display_fields() {
        let mut t = ticket().with_priority(Priority::High).with_intention("will do");
        t.actual_hours = Some(2.5);
        t.estimated_hours = Some(8.0);
        t.projected_uat_date = Some(day(2025, 6, 4));
        let view = TicketEnricher::new(day(2025, 1, 1)).enrich(&t, &EtaResponse::default());
        assert!(view.is_high_priority);
        assert_eq!(view.priority_class, "priority-badge priority-high");
        assert_eq!(view.hours_display, "2.5 / 8h");
        assert_eq!(view.size_display, "--");
        assert_eq!(view.uat_display.as_deref(), Some("Jun 4"));
        assert_eq!(view.intention_color.as_deref(), Some("#2196F3"));
        assert_eq!(view.owner, Stage::Backlog.owner());
    }

    #[test]
    fn test_critical_is_not_high() {
        let t = ticket().with_priority(Priority::Critical).with_size(3.0);
        let view = TicketEnricher::new(day(2025, 1, 1)).enrich(&t, &EtaResponse::default());
        assert!(!view.is_high_priority);
        assert_eq!(view.size_display, "3");
        assert_eq!(view.hours_display, "0 / 0h");
    }

    #[test]
    fn test_pushed_back_flag() {
        let etas = EtaResponse {
            tickets: vec![],
            pushed_back: vec!["t1".into()],
        };
        let view = TicketEnricher::new(day(2025, 1, 1)).enrich(&ticket(), &etas);
        assert!(view.is_pushed_back);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(day_offset_suffix(3), " (+3d)");
        assert_eq!(day_offset_suffix(-8), " (-8d)");
        assert_eq!(day_offset_suffix(0), " (Today)");
    }
}
