use crate::models::{rate, Entry, SlotStat, StatsResponse, Totals};
use crate::timezone::parse_local;
use chrono::Timelike;

pub const MIN_SLOT_SENT: u64 = 10;
pub const NO_BEST_SLOT: &str = "Need at least 10 requests per time slot";

pub fn build_stats(entries: &[Entry]) -> StatsResponse {
    let mut totals = Totals::default();
    for entry in entries {
        totals.sent = totals.sent.saturating_add(entry.requests_sent);
        totals.accepted = totals.accepted.saturating_add(entry.accepted);
        totals.rejected = totals.rejected.saturating_add(entry.rejected);
        totals.pending = totals.pending.saturating_add(entry.pending);
    }

    let slots = group_slots(entries);
    let best_slot = best_slot(&slots)
        .map(|slot| {
            format!(
                "{} {:02}:00 ({:.1}% acceptance)",
                slot.weekday, slot.hour, slot.rate
            )
        })
        .unwrap_or_else(|| NO_BEST_SLOT.to_string());

    StatsResponse {
        acceptance_rate: rate(totals.accepted, totals.sent),
        totals,
        best_slot,
        slots,
    }
}

/// Groups entries by weekday and hour, in the order slots are first seen.
fn group_slots(entries: &[Entry]) -> Vec<SlotStat> {
    let mut slots: Vec<SlotStat> = Vec::new();
    for entry in entries {
        let Some(local) = parse_local(&entry.local_date_time) else {
            continue;
        };
        let weekday = local.format("%A").to_string();
        let hour = local.hour();

        let index = match slots
            .iter()
            .position(|slot| slot.weekday == weekday && slot.hour == hour)
        {
            Some(index) => index,
            None => {
                slots.push(SlotStat {
                    weekday,
                    hour,
                    sent: 0,
                    accepted: 0,
                    rate: 0.0,
                });
                slots.len() - 1
            }
        };
        let slot = &mut slots[index];
        slot.sent = slot.sent.saturating_add(entry.requests_sent);
        slot.accepted = slot.accepted.saturating_add(entry.accepted);
    }

    for slot in &mut slots {
        slot.rate = rate(slot.accepted, slot.sent);
    }
    slots
}

fn best_slot(slots: &[SlotStat]) -> Option<&SlotStat> {
    let mut best: Option<&SlotStat> = None;
    let mut best_rate = 0.0;
    for slot in slots.iter().filter(|slot| slot.sent >= MIN_SLOT_SENT) {
        let slot_rate = slot.accepted as f64 / slot.sent as f64;
        if slot_rate > best_rate {
            best_rate = slot_rate;
            best = Some(slot);
        }
    }
    best
}
