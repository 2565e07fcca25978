//! Capability check applied before any handler logic runs.

use engine::OperatorId;

/// Flat allowlist plus admin list. Admins are implicitly allowed; beyond
/// that the two lists grant the same capabilities today.
#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
    admins: Vec<OperatorId>,
    allowed: Vec<OperatorId>,
}

impl AccessPolicy {
    #[must_use]
    pub fn new(admins: Vec<OperatorId>, allowed: Vec<OperatorId>) -> Self {
        Self { admins, allowed }
    }

    #[must_use]
    pub fn is_admin(&self, operator: OperatorId) -> bool {
        self.admins.contains(&operator)
    }

    #[must_use]
    pub fn is_allowed(&self, operator: OperatorId) -> bool {
        self.allowed.contains(&operator) || self.is_admin(operator)
    }

    /// The union of both lists; every read in the engine is scoped to it.
    #[must_use]
    pub fn operators(&self) -> Vec<OperatorId> {
        let mut all = self.admins.clone();
        for id in &self.allowed {
            if !all.contains(id) {
                all.push(*id);
            }
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_are_allowed_implicitly() {
        let policy = AccessPolicy::new(vec![OperatorId::new(1)], vec![OperatorId::new(2)]);
        assert!(policy.is_allowed(OperatorId::new(1)));
        assert!(policy.is_allowed(OperatorId::new(2)));
        assert!(!policy.is_allowed(OperatorId::new(3)));
        assert!(policy.is_admin(OperatorId::new(1)));
        assert!(!policy.is_admin(OperatorId::new(2)));
    }

    #[test]
    fn operators_union_deduplicates() {
        let policy = AccessPolicy::new(
            vec![OperatorId::new(1)],
            vec![OperatorId::new(1), OperatorId::new(2)],
        );
        assert_eq!(policy.operators(), vec![OperatorId::new(1), OperatorId::new(2)]);
    }
}
