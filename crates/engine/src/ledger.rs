//! Pure billing computations over already-loaded collections.
//!
//! Everything here is a function of `(&[Child], &[Lesson], &[Payment])` plus
//! an optional month window; no store access, no clocks. The unit of account
//! is the **lesson**: a payment buys `lessons_count` of them, a delivered
//! lesson (`completed && !cancelled`) consumes one.
use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Child, ChildId, Lesson, Money, Payment};

/// Inclusive first/last day of one calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl MonthWindow {
    /// The calendar month containing `day`.
    #[must_use]
    pub fn containing(day: NaiveDate) -> Self {
        let first = day.with_day(1).unwrap_or(day);
        let next_month = if day.month() == 12 {
            NaiveDate::from_ymd_opt(day.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(day.year(), day.month() + 1, 1)
        };
        let last = next_month
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .unwrap_or(day);
        Self { first, last }
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first <= day && day <= self.last
    }
}

/// Per-child reconciliation of paid versus delivered sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildBalance {
    pub child_id: ChildId,
    pub name: String,
    pub unit_price: Money,
    /// Sessions actually held (`completed && !cancelled`).
    pub delivered: u32,
    /// Sessions bought across all payments.
    pub paid_lessons: i64,
    /// `paid_lessons - delivered`; positive = credit, negative = debt.
    pub balance: i64,
}

impl ChildBalance {
    /// The balance expressed in money at the child's *current* unit price.
    #[must_use]
    pub fn monetary(&self) -> Money {
        self.unit_price.times(self.balance)
    }
}

/// Balance in lesson units for one child.
#[must_use]
pub fn lesson_balance(child_id: ChildId, lessons: &[Lesson], payments: &[Payment]) -> i64 {
    let delivered = lessons
        .iter()
        .filter(|l| l.child_id == child_id && l.is_delivered())
        .count() as i64;
    let paid: i64 = payments
        .iter()
        .filter(|p| p.child_id == child_id)
        .map(|p| i64::from(p.lessons_count))
        .sum();
    paid - delivered
}

/// Balances for every listed child, in listing order.
///
/// Pass the default (non-archived) children listing to get the ledger's
/// default aggregation scope.
#[must_use]
pub fn child_balances(
    children: &[Child],
    lessons: &[Lesson],
    payments: &[Payment],
) -> Vec<ChildBalance> {
    children
        .iter()
        .map(|child| {
            let delivered = lessons
                .iter()
                .filter(|l| l.child_id == child.id && l.is_delivered())
                .count() as u32;
            let paid_lessons: i64 = payments
                .iter()
                .filter(|p| p.child_id == child.id)
                .map(|p| i64::from(p.lessons_count))
                .sum();
            ChildBalance {
                child_id: child.id,
                name: child.name.clone(),
                unit_price: child.unit_price,
                delivered,
                paid_lessons,
                balance: paid_lessons - i64::from(delivered),
            }
        })
        .collect()
}

/// One calendar month summary plus the all-time over/underpay totals.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyReport {
    pub window: MonthWindow,
    /// Delivered sessions dated inside the window.
    pub delivered: u32,
    /// Cancelled sessions dated inside the window.
    pub cancelled: u32,
    /// Sum of payment amounts recorded inside the window.
    pub payments_total: Money,
    /// All-time credit across children, no cross-child offsetting.
    pub overpaid_total: Money,
    /// All-time debt across children (as a positive number).
    pub underpaid_total: Money,
}

/// Builds the monthly report. The over/underpay sums are all-time, not
/// in-month: a child's surplus never offsets another child's deficit.
#[must_use]
pub fn monthly_report(
    window: MonthWindow,
    children: &[Child],
    lessons: &[Lesson],
    payments: &[Payment],
) -> MonthlyReport {
    let delivered = lessons
        .iter()
        .filter(|l| window.contains(l.date) && l.is_delivered())
        .count() as u32;
    let cancelled = lessons
        .iter()
        .filter(|l| window.contains(l.date) && l.cancelled)
        .count() as u32;
    let payments_total = payments
        .iter()
        .filter(|p| window.contains(p.payment_date))
        .fold(Money::ZERO, |acc, p| acc + p.amount);

    let mut overpaid_total = Money::ZERO;
    let mut underpaid_total = Money::ZERO;
    for balance in child_balances(children, lessons, payments) {
        let monetary = balance.monetary();
        if monetary.is_positive() {
            overpaid_total += monetary;
        } else if monetary.is_negative() {
            underpaid_total += monetary.abs();
        }
    }

    MonthlyReport {
        window,
        delivered,
        cancelled,
        payments_total,
        overpaid_total,
        underpaid_total,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayIncome {
    pub date: NaiveDate,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChildIncome {
    pub child_id: ChildId,
    pub name: String,
    pub total: Money,
}

/// In-window delivered sessions grouped by date, each valued at its child's
/// current unit price. Sorted by date ascending.
#[must_use]
pub fn income_by_day(
    window: MonthWindow,
    children: &[Child],
    lessons: &[Lesson],
) -> Vec<DayIncome> {
    let prices: HashMap<ChildId, Money> =
        children.iter().map(|c| (c.id, c.unit_price)).collect();

    let mut by_day: HashMap<NaiveDate, Money> = HashMap::new();
    for lesson in lessons
        .iter()
        .filter(|l| window.contains(l.date) && l.is_delivered())
    {
        let Some(price) = prices.get(&lesson.child_id) else {
            continue;
        };
        *by_day.entry(lesson.date).or_insert(Money::ZERO) += *price;
    }

    let mut out: Vec<DayIncome> = by_day
        .into_iter()
        .map(|(date, total)| DayIncome { date, total })
        .collect();
    out.sort_by_key(|d| d.date);
    out
}

/// In-window delivered sessions grouped by child, in listing order; children
/// without delivered in-window sessions are omitted.
#[must_use]
pub fn income_by_child(
    window: MonthWindow,
    children: &[Child],
    lessons: &[Lesson],
) -> Vec<ChildIncome> {
    let mut by_child: HashMap<ChildId, Money> = HashMap::new();
    for lesson in lessons
        .iter()
        .filter(|l| window.contains(l.date) && l.is_delivered())
    {
        if let Some(child) = children.iter().find(|c| c.id == lesson.child_id) {
            *by_child.entry(child.id).or_insert(Money::ZERO) += child.unit_price;
        }
    }

    children
        .iter()
        .filter_map(|child| {
            by_child.get(&child.id).map(|total| ChildIncome {
                child_id: child.id,
                name: child.name.clone(),
                total: *total,
            })
        })
        .collect()
}
