use std::collections::BTreeSet;

use crate::models::domain::Enrollment;

/// Difference between a course's current enrollments and the learners an
/// administrator now wants assigned. Learners present in both sets are left
/// alone so their enrollment rows, and the progress tied to them, survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPlan {
    /// Targeted learners with no enrollment at all.
    pub to_add: Vec<String>,
    /// Mandatory enrollments whose learner is no longer targeted.
    pub to_remove: Vec<String>,
    /// Targeted learners who enrolled themselves; flipped to mandatory.
    pub to_promote: Vec<String>,
    pub unchanged: Vec<String>,
}

fn owned(set: BTreeSet<&str>) -> Vec<String> {
    set.into_iter().map(str::to_string).collect()
}

impl AssignmentPlan {
    pub fn compute(existing: &[Enrollment], target: &[String]) -> Self {
        let target: BTreeSet<&str> = target.iter().map(String::as_str).collect();
        let mandatory: BTreeSet<&str> = existing
            .iter()
            .filter(|e| e.is_admin_assigned())
            .map(|e| e.learner_id.as_str())
            .collect();
        let optional: BTreeSet<&str> = existing
            .iter()
            .filter(|e| !e.is_admin_assigned())
            .map(|e| e.learner_id.as_str())
            .collect();

        AssignmentPlan {
            to_add: owned(
                target
                    .iter()
                    .filter(|id| !mandatory.contains(*id) && !optional.contains(*id))
                    .copied()
                    .collect(),
            ),
            to_remove: owned(mandatory.difference(&target).copied().collect()),
            to_promote: owned(optional.intersection(&target).copied().collect()),
            unchanged: owned(mandatory.intersection(&target).copied().collect()),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_promote.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn same_target_is_a_noop() {
        let now = Utc::now();
        let existing = vec![
            Enrollment::assigned("a", "c-1", now),
            Enrollment::assigned("b", "c-1", now),
        ];

        let plan = AssignmentPlan::compute(&existing, &ids(&["b", "a"]));
        assert!(plan.is_noop());
        assert_eq!(plan.unchanged, ids(&["a", "b"]));
    }

    #[test]
    fn diff_adds_removes_and_promotes() {
        let now = Utc::now();
        let existing = vec![
            Enrollment::assigned("a", "c-1", now),
            Enrollment::assigned("b", "c-1", now),
            Enrollment::self_enrolled("c", "c-1", now),
            Enrollment::self_enrolled("d", "c-1", now),
        ];

        let plan = AssignmentPlan::compute(&existing, &ids(&["b", "c", "e", "e"]));

        assert_eq!(plan.to_add, ids(&["e"]));
        assert_eq!(plan.to_remove, ids(&["a"]));
        assert_eq!(plan.to_promote, ids(&["c"]));
        assert_eq!(plan.unchanged, ids(&["b"]));
    }

    #[test]
    fn self_enrolled_learners_are_never_removed() {
        let now = Utc::now();
        let existing = vec![Enrollment::self_enrolled("d", "c-1", now)];

        let plan = AssignmentPlan::compute(&existing, &[]);
        assert!(plan.to_remove.is_empty());
        assert!(plan.is_noop());
    }
}
