//! Capacity-based completion estimates for the file backend.

use crate::model::{EtaProjection, EtaResponse, Ticket};
use crate::validation::{MAX_DEV_COUNT, MAX_TICKET_DAYS};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct EtaScheduler {
    dev_count: u32,
    start: NaiveDate,
}

impl EtaScheduler {
    /// `dev_count` is clamped to `1..=MAX_DEV_COUNT`.
    pub fn new(dev_count: u32, today: NaiveDate) -> Self {
        Self {
            dev_count: dev_count.clamp(1, MAX_DEV_COUNT),
            start: next_working_day(today),
        }
    }

    pub fn schedule(&self, tickets: &[Ticket], prioritized: Option<&[String]>) -> EtaResponse {
        let prioritized = prioritized.unwrap_or_default();
        let etas = self.run(tickets, prioritized);

        let pushed_back = if prioritized.is_empty() {
            Vec::new()
        } else {
            let baseline = self.run(tickets, &[]);
            let mut ids: Vec<String> = etas
                .iter()
                .filter(|(id, eta)| baseline.get(*id).is_some_and(|base| *eta > base))
                .map(|(id, _)| id.clone())
                .collect();
            ids.sort();
            ids
        };

        let tickets = tickets
            .iter()
            .map(|ticket| EtaProjection {
                ticket_id: ticket.id.clone(),
                calculated_eta: etas.get(&ticket.id).copied(),
            })
            .collect();

        EtaResponse {
            tickets,
            pushed_back,
        }
    }

    fn run(&self, tickets: &[Ticket], prioritized: &[String]) -> BTreeMap<String, NaiveDate> {
        let rank: HashMap<&str, usize> = prioritized
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut queue: Vec<&Ticket> = tickets
            .iter()
            .filter(|t| t.is_active && !t.stage.is_delivered())
            .collect();
        queue.sort_by(|a, b| {
            let ra = rank.get(a.id.as_str()).copied().unwrap_or(usize::MAX);
            let rb = rank.get(b.id.as_str()).copied().unwrap_or(usize::MAX);
            ra.cmp(&rb).then(a.sort_order.total_cmp(&b.sort_order))
        });

        // Each lane holds the first working day its developer is free.
        let mut lanes = vec![self.start; self.dev_count as usize];
        let mut etas = BTreeMap::new();
        for ticket in queue {
            let Some((lane, free)) = lanes
                .iter()
                .copied()
                .enumerate()
                .min_by_key(|(i, day)| (*day, *i))
            else {
                break;
            };
            let finish = add_working_days(free, working_days(ticket) - 1);
            lanes[lane] = add_working_days(finish, 1);
            etas.insert(ticket.id.clone(), finish);
        }
        etas
    }
}

fn working_days(ticket: &Ticket) -> u64 {
    let size = ticket
        .developer_days_size
        .filter(|size| size.is_finite() && *size > 0.0)
        .unwrap_or(1.0)
        .min(MAX_TICKET_DAYS);
    size.ceil() as u64
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn next_working_day(mut date: NaiveDate) -> NaiveDate {
    while is_weekend(date) {
        date = date + Days::new(1);
    }
    date
}

/// Move `days` working days past `date`, which must itself be a working day.
pub fn add_working_days(mut date: NaiveDate, days: u64) -> NaiveDate {
    for _ in 0..days {
        date = next_working_day(date + Days::new(1));
    }
    date
}
