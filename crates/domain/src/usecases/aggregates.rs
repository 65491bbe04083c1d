//! Hashtag aggregate maintenance for post create/edit/delete

use std::collections::BTreeMap;

use crate::model::{HashtagAggregate, HashtagDelta, HashtagDeltaPlan};

/// Deltas for a newly created post
pub fn plan_create(post_id: &str, tags: &[String]) -> HashtagDeltaPlan {
    HashtagDeltaPlan {
        decrements: vec![],
        increments: unique(tags)
            .map(|tag| HashtagDelta::increment(tag, post_id))
            .collect(),
    }
}

/// Deltas for an edited post; tags present before and after are untouched
pub fn plan_edit(post_id: &str, old_tags: &[String], new_tags: &[String]) -> HashtagDeltaPlan {
    HashtagDeltaPlan {
        decrements: unique(old_tags)
            .filter(|tag| !new_tags.contains(tag))
            .map(|tag| HashtagDelta::decrement(tag, post_id))
            .collect(),
        increments: unique(new_tags)
            .filter(|tag| !old_tags.contains(tag))
            .map(|tag| HashtagDelta::increment(tag, post_id))
            .collect(),
    }
}

/// Deltas for a deleted post
pub fn plan_delete(post_id: &str, tags: &[String]) -> HashtagDeltaPlan {
    HashtagDeltaPlan {
        decrements: unique(tags)
            .map(|tag| HashtagDelta::decrement(tag, post_id))
            .collect(),
        increments: vec![],
    }
}

fn unique(tags: &[String]) -> impl Iterator<Item = &String> {
    tags.iter()
        .enumerate()
        .filter(move |&(i, tag)| !tags[..i].contains(tag))
        .map(|(_, tag)| tag)
}

/// Apply a delta to a tag-keyed aggregate map, creating the aggregate if needed
pub fn apply_delta(aggregates: &mut BTreeMap<String, HashtagAggregate>, delta: &HashtagDelta) {
    aggregates
        .entry(delta.tag.clone())
        .or_insert_with(|| HashtagAggregate::empty(delta.tag.clone()))
        .apply(delta);
}

/// Apply every delta of a plan, decrements first
pub fn apply_plan(aggregates: &mut BTreeMap<String, HashtagAggregate>, plan: &HashtagDeltaPlan) {
    for delta in plan.iter() {
        apply_delta(aggregates, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_create_increments_each_tag_once() {
        let plan = plan_create("p1", &tags(&["rust", "go", "rust"]));
        assert!(plan.decrements.is_empty());
        assert_eq!(
            plan.increments,
            vec![
                HashtagDelta::increment("rust", "p1"),
                HashtagDelta::increment("go", "p1"),
            ]
        );
    }

    #[test]
    fn test_plan_edit_swaps_old_for_new() {
        let mut aggregates = BTreeMap::new();
        apply_plan(&mut aggregates, &plan_create("p1", &tags(&["old", "keep"])));

        let plan = plan_edit("p1", &tags(&["old", "keep"]), &tags(&["keep", "new"]));
        assert_eq!(plan.decrements, vec![HashtagDelta::decrement("old", "p1")]);
        assert_eq!(plan.increments, vec![HashtagDelta::increment("new", "p1")]);

        apply_plan(&mut aggregates, &plan);

        let old = &aggregates["old"];
        assert_eq!(old.count, 0);
        assert!(!old.post_ids.contains("p1"));

        let new = &aggregates["new"];
        assert_eq!(new.count, 1);
        assert!(new.post_ids.contains("p1"));

        let keep = &aggregates["keep"];
        assert_eq!(keep.count, 1);
    }

    #[test]
    fn test_plan_edit_without_tag_changes_is_empty() {
        let plan = plan_edit("p1", &tags(&["a", "b"]), &tags(&["b", "a"]));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_delete_decrements_every_tag() {
        let plan = plan_delete("p1", &tags(&["a", "b"]));
        assert_eq!(plan.len(), 2);
        assert!(plan.increments.is_empty());
        assert!(plan.decrements.iter().all(|d| !d.added && d.count_delta == -1));
    }

    #[test]
    fn test_edit_of_untracked_tag_floors_at_zero() {
        let mut aggregates = BTreeMap::new();
        apply_plan(&mut aggregates, &plan_edit("p9", &tags(&["gone"]), &[]));

        let gone = &aggregates["gone"];
        assert_eq!(gone.count, 0);
        assert!(gone.is_consistent());
    }

    #[test]
    fn test_operation_sequences_keep_invariants() {
        let mut aggregates = BTreeMap::new();

        apply_plan(&mut aggregates, &plan_create("p1", &tags(&["a", "b"])));
        apply_plan(&mut aggregates, &plan_create("p2", &tags(&["b", "c"])));
        apply_plan(&mut aggregates, &plan_edit("p1", &tags(&["a", "b"]), &tags(&["c"])));
        // Replayed edit, as seen with out-of-order delivery
        apply_plan(&mut aggregates, &plan_edit("p1", &tags(&["a", "b"]), &tags(&["c"])));
        apply_plan(&mut aggregates, &plan_delete("p2", &tags(&["b", "c"])));
        apply_plan(&mut aggregates, &plan_delete("p2", &tags(&["b", "c"])));

        for agg in aggregates.values() {
            assert!(agg.is_consistent(), "inconsistent aggregate {:?}", agg);
        }
        assert_eq!(aggregates["a"].count, 0);
        assert_eq!(aggregates["b"].count, 0);
        assert_eq!(aggregates["c"].count, 1);
        assert!(aggregates["c"].post_ids.contains("p1"));
    }
}
