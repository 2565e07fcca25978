use chrono::NaiveDate;

use crate::{
    ChildId, EngineError, Money, OperatorId, Payment, PaymentId, ResultEngine,
};

use super::{Engine, normalize_optional_text};

/// Derives how many sessions `amount` buys at `unit_price`.
///
/// Rejects a zero/unset price and any amount that is not an exact multiple:
/// the caller explains the granularity instead of silently rounding.
pub(crate) fn lessons_count_from_amount(
    amount: Money,
    unit_price: Money,
) -> Result<u32, EngineError> {
    if !unit_price.is_positive() {
        return Err(EngineError::PriceNotSet);
    }
    if amount.kopiikas() % unit_price.kopiikas() != 0 {
        return Err(EngineError::NotMultipleOfPrice {
            amount,
            unit_price,
            approx: amount.kopiikas() as f64 / unit_price.kopiikas() as f64,
        });
    }
    let count = amount.kopiikas() / unit_price.kopiikas();
    u32::try_from(count).map_err(|_| {
        EngineError::Validation("amount buys an implausible number of sessions".to_string())
    })
}

impl Engine {
    /// Records a payment. Both the amount and the session count must be
    /// strictly positive; the child must be currently visible.
    pub async fn add_payment(
        &self,
        operator: OperatorId,
        child_id: ChildId,
        amount: Money,
        lessons_count: u32,
        payment_date: NaiveDate,
        note: Option<&str>,
    ) -> ResultEngine<Payment> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        if lessons_count == 0 {
            return Err(EngineError::Validation(
                "lessons count must be positive".to_string(),
            ));
        }
        self.visible_child(child_id).await?;

        let payment = Payment::new(
            operator,
            child_id,
            amount,
            lessons_count,
            payment_date,
            normalize_optional_text(note),
        );
        self.store().insert_payment(payment.clone()).await?;
        Ok(payment)
    }

    /// Amount-first entry: the session count is derived from the child's
    /// unit price, never rounded.
    pub async fn derive_lessons_count(
        &self,
        child_id: ChildId,
        amount: Money,
    ) -> ResultEngine<u32> {
        let child = self.visible_child(child_id).await?;
        lessons_count_from_amount(amount, child.unit_price)
    }

    pub async fn payment(&self, id: PaymentId) -> ResultEngine<Payment> {
        match self.store().payment(id).await {
            Some(payment) if self.allowed_operators().contains(&payment.operator) => Ok(payment),
            _ => Err(EngineError::NotFound(format!("payment {id}"))),
        }
    }

    /// Every payment in the shared workspace, newest first.
    pub async fn payments(&self) -> ResultEngine<Vec<Payment>> {
        Ok(self.store().payments(self.allowed_operators(), None).await)
    }

    pub async fn payments_for_child(&self, child_id: ChildId) -> ResultEngine<Vec<Payment>> {
        Ok(self
            .store()
            .payments(self.allowed_operators(), Some(child_id))
            .await)
    }

    pub async fn delete_payment(&self, id: PaymentId) -> ResultEngine<()> {
        self.payment(id).await?;
        self.store().delete_payment(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_is_accepted() {
        let count =
            lessons_count_from_amount(Money::from_major(1500), Money::from_major(300)).unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn non_multiple_is_rejected_with_ratio() {
        let err = lessons_count_from_amount(Money::from_major(1600), Money::from_major(300))
            .unwrap_err();
        match err {
            EngineError::NotMultipleOfPrice { approx, .. } => {
                assert!((approx - 5.33).abs() < 0.01);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_price_blocks_derivation() {
        let err = lessons_count_from_amount(Money::from_major(300), Money::ZERO).unwrap_err();
        assert_eq!(err, EngineError::PriceNotSet);
    }
}
