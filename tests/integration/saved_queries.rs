#![allow(missing_docs)]

use std::fs;

use muster::query::{
    Condition, FieldRegistry, Group, GroupBuilder, Logic, Operator, QueryExecutor, SavedQuery,
};
use muster::data_generator::RosterGenerator;
use muster::{execute, Personnel};
use serde_json::json;
use tempfile::TempDir;
use time::macros::date;

fn deployable_marines() -> Group {
    GroupBuilder::all()
        .condition("branch", Operator::Equals, "Marines")
        .unary("deploymentEligible", Operator::IsTrue)
        .group(
            GroupBuilder::any()
                .condition("clearanceLevel", Operator::Equals, "Secret")
                .condition("clearanceLevel", Operator::Equals, "Top Secret"),
        )
        .build()
}

#[test]
fn saved_query_survives_a_file_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("marines.json");
    let saved = SavedQuery {
        name: "Deployable cleared Marines".into(),
        description: Some("for the readiness brief".into()),
        group: deployable_marines(),
    };
    fs::write(&path, serde_json::to_string_pretty(&saved).unwrap()).unwrap();

    let loaded: SavedQuery = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, saved);

    let people = RosterGenerator::with_anchor(11, date!(2024 - 06 - 15)).generate_personnel(300);
    let direct = execute(&people, Some(&saved.group));
    let reloaded = execute(&people, Some(&loaded.group));
    assert_eq!(direct, reloaded);
    assert!(direct.iter().all(|p: &&Personnel| p.branch == "Marines"
        && p.deployment_eligible
        && (p.clearance_level == "Secret" || p.clearance_level == "Top Secret")));
}

#[test]
fn builder_numbers_ids_depth_first() {
    let group = deployable_marines();
    let json = serde_json::to_value(&group).unwrap();
    assert_eq!(json["id"], "g1");
    assert_eq!(json["logic"], "AND");
    assert_eq!(json["conditions"][0]["id"], "c1");
    assert_eq!(json["conditions"][1]["id"], "c2");
    assert!(json["conditions"][1].get("value").is_none());
    assert_eq!(json["groups"][0]["id"], "g2");
    assert_eq!(json["groups"][0]["logic"], "OR");
    assert_eq!(json["groups"][0]["conditions"][1]["id"], "c4");
    assert_eq!(group.condition_count(), 4);
    assert_eq!(group.depth(), 2);
}

#[test]
fn stale_operator_still_loads_and_fails_open() {
    let group: Group = serde_json::from_value(json!({
        "id": "g1",
        "logic": "AND",
        "conditions": [
            {"id": "c1", "field": "lastName", "operator": "sounds_like", "value": "Smyth"}
        ]
    }))
    .unwrap();
    assert_eq!(
        group.conditions[0].operator,
        Operator::Other("sounds_like".into())
    );
    let records = vec![json!({"lastName": "Jones"})];
    assert_eq!(execute(&records, Some(&group)).len(), 1);

    let issues = QueryExecutor::new().validate(&group);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code(), "OperatorNotAllowed");
}

#[test]
fn editing_a_saved_tree() {
    let registry = FieldRegistry::personnel();
    let mut group = deployable_marines();

    // switch the inner OR to AND and back
    assert!(group.set_logic("g2", Logic::And));
    assert_eq!(group.find_group("g2").unwrap().logic, Logic::And);
    assert!(group.set_logic("g2", Logic::Or));
    assert!(!group.set_logic("missing", Logic::And));

    // new rows start on the field's first operator with no value
    let id = group
        .add_default_condition("g2", "clearanceExpiration", registry)
        .unwrap();
    let added = group.find_condition(&id).unwrap();
    assert_eq!(added.operator, Operator::Equals);
    assert!(added.value.is_none());
    assert_eq!(group.condition_count(), 5);

    // pointing a condition at another field resets it
    assert!(group.update_condition(&id, |c| c.retarget("deploymentEligible", registry)));
    assert_eq!(group.find_condition(&id).unwrap().operator, Operator::IsTrue);

    // explicit ids that collide get replaced
    let dup = group
        .add_condition("g1", Condition::new("c1", "rank", Operator::Equals, "SGT"))
        .unwrap();
    assert_ne!(dup, "c1");

    let sub = group.add_group("g2", Logic::Or).unwrap();
    assert_eq!(group.depth(), 3);
    assert!(group.remove_group(&sub).is_some());
    assert_eq!(group.depth(), 2);

    assert!(group.remove_condition("c1").is_some());
    assert!(group.remove_condition("c1").is_none());
    assert!(group.add_condition("nope", Condition::unary("x", "rank", Operator::IsEmpty)).is_none());
}

#[test]
fn removing_every_row_restores_the_identity_filter() {
    let mut group = deployable_marines();
    for id in ["c1", "c2"] {
        group.remove_condition(id);
    }
    group.remove_group("g2");
    assert!(group.is_empty());
    let people = RosterGenerator::with_anchor(2, date!(2024 - 06 - 15)).generate_personnel(20);
    assert_eq!(execute(&people, Some(&group)).len(), 20);
}
