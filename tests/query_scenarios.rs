#![allow(missing_docs)]

use muster::query::{execute_owned, Condition, ConditionValue, Group, GroupBuilder, Logic, Operator};
use muster::stats::summarize;
use muster::{execute, QueryExecutor};
use serde_json::{json, Value};
use time::macros::date;

fn single(condition: Condition) -> Group {
    let mut group = Group::new("root", Logic::And);
    group.conditions.push(condition);
    group
}

fn names<'a>(records: &[&'a Value], key: &str) -> Vec<&'a str> {
    records
        .iter()
        .map(|r| r[key].as_str().unwrap_or_default())
        .collect()
}

#[test]
fn contains_is_case_insensitive_and_keeps_order() {
    let records = vec![
        json!({"lastName": "Smith"}),
        json!({"lastName": "SMITHSON"}),
        json!({"lastName": "Jones"}),
    ];
    let group = single(Condition::new("c1", "lastName", Operator::Contains, "smith"));
    let matched = execute(&records, Some(&group));
    assert_eq!(names(&matched, "lastName"), vec!["Smith", "SMITHSON"]);
}

#[test]
fn between_is_inclusive_on_both_bounds() {
    let records: Vec<Value> = [150, 200, 250, 300]
        .into_iter()
        .map(|score| json!({"ptTestScore": score}))
        .collect();
    let group = single(Condition::between("c1", "ptTestScore", 200, 270));
    let scores: Vec<i64> = execute(&records, Some(&group))
        .iter()
        .filter_map(|r| r["ptTestScore"].as_i64())
        .collect();
    assert_eq!(scores, vec![200, 250]);

    let edge = single(Condition::between("c1", "ptTestScore", 200, 300));
    assert_eq!(execute(&records, Some(&edge)).len(), 3);
}

#[test]
fn is_false_selects_only_false_flags() {
    let records = vec![
        json!({"id": "a", "deploymentEligible": true}),
        json!({"id": "b", "deploymentEligible": false}),
        json!({"id": "c", "deploymentEligible": true}),
    ];
    let group = single(Condition::unary("c1", "deploymentEligible", Operator::IsFalse));
    assert_eq!(names(&execute(&records, Some(&group)), "id"), vec!["b"]);
}

#[test]
fn nested_or_inside_and() {
    let group: Group = serde_json::from_value(json!({
        "id": "root",
        "logic": "AND",
        "conditions": [
            {"id": "c1", "field": "branch", "operator": "equals", "value": "Marines"}
        ],
        "groups": [{
            "id": "g2",
            "logic": "OR",
            "conditions": [
                {"id": "c2", "field": "clearanceLevel", "operator": "equals", "value": "Secret"},
                {"id": "c3", "field": "clearanceLevel", "operator": "equals", "value": "Top Secret"}
            ]
        }]
    }))
    .unwrap();
    let records = vec![
        json!({"id": "1", "branch": "Marines", "clearanceLevel": "Secret"}),
        json!({"id": "2", "branch": "Army", "clearanceLevel": "Secret"}),
        json!({"id": "3", "branch": "Marines", "clearanceLevel": "None"}),
        json!({"id": "4", "branch": "Marines", "clearanceLevel": "Top Secret"}),
        json!({"id": "5", "branch": "Navy", "clearanceLevel": "Top Secret"}),
    ];
    assert_eq!(names(&execute(&records, Some(&group)), "id"), vec!["1", "4"]);
}

#[test]
fn unknown_field_always_matches() {
    let records = vec![json!({}), json!({"doesNotExist": 3}), json!({"lastName": "Jones"})];
    for operator in ["equals", "contains", "between", "is_true", "in_last_days", "bogus"] {
        let group = single(Condition::new("c1", "doesNotExist", operator, "anything"));
        assert_eq!(
            execute(&records, Some(&group)).len(),
            records.len(),
            "operator {operator}"
        );
    }
}

#[test]
fn operator_illegal_for_type_matches() {
    let records = vec![json!({"ptTestScore": 10}), json!({"ptTestScore": 290})];
    let group = single(Condition::new("c1", "ptTestScore", Operator::Contains, "29"));
    assert_eq!(execute(&records, Some(&group)).len(), 2);

    let strict = QueryExecutor::new().strict(true);
    assert!(strict.execute(&records, Some(&group)).is_err());
}

#[test]
fn missing_or_empty_group_returns_everything() {
    let records = vec![json!({"id": "a"}), json!({"id": "b"})];
    assert_eq!(execute(&records, None).len(), 2);
    let empty = Group::new("root", Logic::Or);
    assert_eq!(execute_owned(&records, Some(&empty)), records);
}

#[test]
fn relative_dates_follow_the_executor_clock() {
    let records = vec![
        json!({"id": "soon", "clearanceExpiration": "2024-07-01"}),
        json!({"id": "later", "clearanceExpiration": "2024-12-01"}),
        json!({"id": "none"}),
    ];
    let group = GroupBuilder::all()
        .condition("clearanceExpiration", Operator::InNextDays, 30)
        .build();
    let executor = QueryExecutor::new().today(date!(2024 - 06 - 15));
    let matched = executor.execute(&records, Some(&group)).unwrap();
    assert_eq!(names(&matched, "id"), vec!["soon"]);
}

#[test]
fn select_membership_and_its_negation() {
    let records = vec![
        json!({"id": "a", "branch": "Army"}),
        json!({"id": "n", "branch": "Navy"}),
        json!({"id": "m", "branch": "Marines"}),
    ];
    let group = GroupBuilder::all().one_of("branch", ["Army", "Navy"]).build();
    assert_eq!(names(&execute(&records, Some(&group)), "id"), vec!["a", "n"]);
    let group = GroupBuilder::all().none_of("branch", ["Army", "Navy"]).build();
    assert_eq!(names(&execute(&records, Some(&group)), "id"), vec!["m"]);

    // a scalar where a list is expected matches nothing by default
    let scalar = single(Condition::new(
        "c1",
        "branch",
        Operator::NotIn,
        ConditionValue::from("Army"),
    ));
    assert!(execute(&records, Some(&scalar)).is_empty());
}

#[test]
fn filtered_roster_feeds_summary() {
    let records = vec![
        json!({"branch": "Army", "rank": "SGT", "deploymentEligible": true, "medicalReadiness": "Green", "yearsOfService": 4}),
        json!({"branch": "Army", "rank": "SPC", "deploymentEligible": false, "medicalReadiness": "Red", "yearsOfService": 2}),
        json!({"branch": "Navy", "rank": "PO2", "deploymentEligible": true, "medicalReadiness": "Green", "yearsOfService": 9}),
    ];
    let group = GroupBuilder::all()
        .condition("branch", Operator::Equals, "Army")
        .build();
    let army = execute(&records, Some(&group));
    let summary = summarize(&army);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.deployment_eligible_percent, 50);
    assert_eq!(summary.avg_years_of_service, "3.0");
    assert_eq!(summary.by_branch.len(), 1);
}
