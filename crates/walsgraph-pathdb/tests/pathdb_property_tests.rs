//! Property tests: keyed upsert and group counts

use proptest::prelude::*;
use std::collections::BTreeMap;
use walsgraph_pathdb::*;

fn ops() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-e]{1,2}", "[xyz]{0,1}"), 0..40)
}

fn apply(db: &mut PathDB, ops: &[(String, String)]) {
    for (key, group) in ops {
        let mut attrs = vec![("id", key.as_str())];
        if !group.is_empty() {
            attrs.push(("group", group.as_str()));
        }
        db.upsert_entity("Node", key, attrs).unwrap();
    }
}

proptest! {
    /// One entity per distinct key, holding the last write's attributes.
    #[test]
    fn upsert_keeps_last_write_per_key(ops in ops()) {
        let mut db = PathDB::new();
        apply(&mut db, &ops);

        let expected: BTreeMap<&str, &str> = ops
            .iter()
            .map(|(k, g)| (k.as_str(), g.as_str()))
            .collect();
        prop_assert_eq!(db.count_of_type("Node"), expected.len());
        for (key, group) in &expected {
            let id = db.find_by_key("Node", key).unwrap();
            prop_assert_eq!(db.attr(id, "group").unwrap_or_default(), group.to_string());
        }
    }

    /// Replaying the same writes changes nothing.
    #[test]
    fn replaying_upserts_is_idempotent(ops in ops()) {
        let mut db = PathDB::new();
        apply(&mut db, &ops);
        let before = db.execute(&PathQuery::new("Node").select(Projection::Attrs(vec![])));
        apply(&mut db, &ops);
        let after = db.execute(&PathQuery::new("Node").select(Projection::Attrs(vec![])));
        prop_assert_eq!(before, after);
    }

    /// Group buckets, the unset one included, cover every entity once.
    #[test]
    fn group_counts_sum_to_count(ops in ops()) {
        let mut db = PathDB::new();
        apply(&mut db, &ops);
        let rows = db.execute(&PathQuery::new("Node").select(Projection::GroupCount {
            key: "group".to_string(),
        }));
        let sum: usize = rows.rows.iter().map(|r| r[1].parse::<usize>().unwrap()).sum();
        prop_assert_eq!(sum, db.count_of_type("Node"));
    }
}
