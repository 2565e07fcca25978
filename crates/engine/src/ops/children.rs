use crate::{
    Child, ChildId, EngineError, Money, OperatorId, OperatorProfile, ResultEngine,
    store::ArchivedFilter,
};

use super::{Engine, normalize_required_name};

/// How many records reference a child; gates hard deletion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChildUsage {
    pub lessons: u64,
    pub payments: u64,
}

impl ChildUsage {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.lessons == 0 && self.payments == 0
    }
}

impl Engine {
    /// Registers or refreshes an operator profile.
    pub async fn upsert_operator(&self, profile: OperatorProfile) -> ResultEngine<()> {
        self.store().upsert_operator(profile).await?;
        Ok(())
    }

    pub async fn add_child(
        &self,
        operator: OperatorId,
        name: &str,
        age: u8,
        unit_price: Money,
    ) -> ResultEngine<Child> {
        let name = normalize_required_name(name, "child")?;
        if unit_price.is_negative() {
            return Err(EngineError::Validation(
                "unit price must not be negative".to_string(),
            ));
        }
        let child = Child::new(operator, name, age, unit_price);
        self.store().insert_child(child.clone()).await?;
        Ok(child)
    }

    /// Looks a child up, treating ids outside the allowed-operator scope the
    /// same as missing ones.
    pub async fn child(&self, id: ChildId) -> ResultEngine<Child> {
        match self.store().child(id).await {
            Some(child) if self.allowed_operators().contains(&child.operator) => Ok(child),
            _ => Err(EngineError::NotFound(format!("child {id}"))),
        }
    }

    /// Like [`Engine::child`], but additionally requires the child to be in
    /// the default (non-archived) listing. Flows select children from that
    /// listing, so an archived id reaching them is stale.
    pub async fn visible_child(&self, id: ChildId) -> ResultEngine<Child> {
        let child = self.child(id).await?;
        if child.archived {
            return Err(EngineError::NotFound(format!("child {id}")));
        }
        Ok(child)
    }

    /// The default listing: non-archived children of the whole team.
    pub async fn children(&self) -> ResultEngine<Vec<Child>> {
        Ok(self
            .store()
            .children(self.allowed_operators(), ArchivedFilter::Active)
            .await)
    }

    pub async fn archived_children(&self) -> ResultEngine<Vec<Child>> {
        Ok(self
            .store()
            .children(self.allowed_operators(), ArchivedFilter::Archived)
            .await)
    }

    pub async fn rename_child(&self, id: ChildId, name: &str) -> ResultEngine<Child> {
        let name = normalize_required_name(name, "child")?;
        self.child(id).await?;
        self.store()
            .update_child(id, |child| child.name = name)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("child {id}")))
    }

    pub async fn set_child_age(&self, id: ChildId, age: u8) -> ResultEngine<Child> {
        self.child(id).await?;
        self.store()
            .update_child(id, |child| child.age = age)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("child {id}")))
    }

    pub async fn set_child_unit_price(
        &self,
        id: ChildId,
        unit_price: Money,
    ) -> ResultEngine<Child> {
        if unit_price.is_negative() {
            return Err(EngineError::Validation(
                "unit price must not be negative".to_string(),
            ));
        }
        self.child(id).await?;
        self.store()
            .update_child(id, |child| child.unit_price = unit_price)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("child {id}")))
    }

    /// Hides the child from default listings and ledger aggregation.
    /// Reversible; linked lessons/payments are untouched.
    pub async fn archive_child(&self, id: ChildId) -> ResultEngine<Child> {
        self.child(id).await?;
        self.store()
            .update_child(id, |child| child.archived = true)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("child {id}")))
    }

    pub async fn unarchive_child(&self, id: ChildId) -> ResultEngine<Child> {
        self.child(id).await?;
        self.store()
            .update_child(id, |child| child.archived = false)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("child {id}")))
    }

    pub async fn child_usage(&self, id: ChildId) -> ResultEngine<ChildUsage> {
        self.child(id).await?;
        Ok(ChildUsage {
            lessons: self.store().count_lessons_for(id).await,
            payments: self.store().count_payments_for(id).await,
        })
    }

    /// Hard-deletes a child. Refused while any lesson or payment references
    /// it, whether the child is active or archived; archive instead.
    pub async fn delete_child(&self, id: ChildId) -> ResultEngine<()> {
        let usage = self.child_usage(id).await?;
        if !usage.is_empty() {
            return Err(EngineError::ChildInUse {
                lessons: usage.lessons,
                payments: usage.payments,
            });
        }
        if !self.store().delete_child(id).await? {
            return Err(EngineError::NotFound(format!("child {id}")));
        }
        Ok(())
    }
}
