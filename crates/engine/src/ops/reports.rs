use chrono::NaiveDate;

use crate::{
    ChildId, Lesson, Payment, ResultEngine,
    ledger::{self, ChildBalance, ChildIncome, DayIncome, MonthWindow, MonthlyReport},
};

use super::Engine;

/// Everything `/balance` shows for one child: the reconciliation plus the
/// records behind it.
#[derive(Clone, Debug)]
pub struct ChildStatement {
    pub balance: ChildBalance,
    /// All payments for the child, oldest first.
    pub payments: Vec<Payment>,
    /// Delivered lessons, oldest first.
    pub delivered_lessons: Vec<Lesson>,
}

impl Engine {
    /// Balances for the default (non-archived) listing, in listing order.
    pub async fn child_balances(&self) -> ResultEngine<Vec<ChildBalance>> {
        let children = self.children().await?;
        let lessons = self.lessons().await?;
        let payments = self.payments().await?;
        Ok(ledger::child_balances(&children, &lessons, &payments))
    }

    pub async fn child_statement(&self, child_id: ChildId) -> ResultEngine<ChildStatement> {
        let child = self.child(child_id).await?;
        let lessons = self.lessons_for_child(child_id).await?;
        let mut payments = self.payments_for_child(child_id).await?;
        payments.sort_by_key(|p| p.payment_date);

        let mut delivered_lessons: Vec<Lesson> =
            lessons.iter().filter(|l| l.is_delivered()).cloned().collect();
        delivered_lessons.sort_by(|a, b| a.date.cmp(&b.date).then(a.start_time.cmp(&b.start_time)));

        let balance = ledger::child_balances(
            std::slice::from_ref(&child),
            &lessons,
            &payments,
        )
        .pop()
        .unwrap_or(ChildBalance {
            child_id,
            name: child.name.clone(),
            unit_price: child.unit_price,
            delivered: 0,
            paid_lessons: 0,
            balance: 0,
        });

        Ok(ChildStatement {
            balance,
            payments,
            delivered_lessons,
        })
    }

    /// The report for the calendar month containing `today`.
    pub async fn monthly_report(&self, today: NaiveDate) -> ResultEngine<MonthlyReport> {
        let children = self.children().await?;
        let lessons = self.lessons().await?;
        let payments = self.payments().await?;
        Ok(ledger::monthly_report(
            MonthWindow::containing(today),
            &children,
            &lessons,
            &payments,
        ))
    }

    pub async fn income_by_day(&self, today: NaiveDate) -> ResultEngine<Vec<DayIncome>> {
        let children = self.children().await?;
        let lessons = self.lessons().await?;
        Ok(ledger::income_by_day(
            MonthWindow::containing(today),
            &children,
            &lessons,
        ))
    }

    pub async fn income_by_child(&self, today: NaiveDate) -> ResultEngine<Vec<ChildIncome>> {
        let children = self.children().await?;
        let lessons = self.lessons().await?;
        Ok(ledger::income_by_child(
            MonthWindow::containing(today),
            &children,
            &lessons,
        ))
    }
}
