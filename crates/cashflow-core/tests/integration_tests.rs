//! Integration tests for cashflow-core
//!
//! These tests exercise the full import → rules → aggregates workflow.

use cashflow_core::{
    aggregate_all,
    import::{parse_csv, parse_json, parse_rules},
    AggregateFunction, AggregateType, AggregateValues, AggregationDefaults, Error, Frequency,
    Observation,
};
use serde_json::json;

/// Three balance observations spanning two months
fn monthly_balances() -> &'static str {
    r#"[
        {"dateStart": "2020-01-05", "timeZone": "UTC", "timeZoneType": "UTC", "balanceEnding": 100},
        {"dateStart": "2020-01-20", "timeZone": "UTC", "timeZoneType": "UTC", "balanceEnding": 200},
        {"dateStart": "2020-02-10", "timeZone": "UTC", "timeZoneType": "UTC", "balanceEnding": 50}
    ]"#
}

/// Transaction amounts on consecutive days of March 2020, as CSV
fn march_amounts_csv(amounts: &[f64]) -> String {
    let mut csv = String::from("dateStart,timeZone,timeZoneType,amount\n");
    for (i, amount) in amounts.iter().enumerate() {
        csv.push_str(&format!(
            "2020-03-{:02},America/Denver,LOCAL,{}\n",
            i + 2,
            amount
        ));
    }
    csv
}

fn rule_json(extra: serde_json::Value) -> String {
    let mut rule = json!({
        "group": "test",
        "frequency": "MONTHLY",
        "type": "sumsAndAverages",
        "propertyKey": "amount"
    });
    if let (Some(rule), Some(extra)) = (rule.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            rule.insert(k.clone(), v.clone());
        }
    }
    json!([rule]).to_string()
}

fn run(observations: &[Observation], rules: &str) -> Vec<cashflow_core::Aggregate> {
    let rules = parse_rules(rules.as_bytes()).expect("Failed to parse rules");
    let mut outputs = aggregate_all(observations, &rules, &AggregationDefaults::default())
        .expect("Aggregation failed");
    assert_eq!(outputs.len(), 1);
    outputs.remove(0).aggregates
}

// =============================================================================
// Windowing
// =============================================================================

#[test]
fn test_monthly_sums_and_averages() {
    let observations = parse_json(monthly_balances().as_bytes()).expect("Failed to parse JSON");
    let aggregates = run(
        &observations,
        &rule_json(json!({"group": "balances", "propertyKey": "balanceEnding"})),
    );

    let value = serde_json::to_value(&aggregates).unwrap();
    assert_eq!(
        value,
        json!([
            {
                "group": "balances",
                "type": "sumsAndAverages",
                "eventCount": 2,
                "dateStart": "2020-01-01",
                "dateEnd": "2020-01-31",
                "sum": 300.0,
                "average": 150.0
            },
            {
                "group": "balances",
                "type": "sumsAndAverages",
                "eventCount": 1,
                "dateStart": "2020-02-01",
                "dateEnd": "2020-02-10",
                "sum": 50.0,
                "average": 50.0
            }
        ])
    );
}

#[test]
fn test_weekly_window_anchors_to_preceding_weekday() {
    // 2020-01-08 is a Wednesday
    let observations = parse_json(
        r#"[{"dateStart": "2020-01-08", "timeZone": "UTC", "timeZoneType": "UTC", "amount": 12}]"#
            .as_bytes(),
    )
    .unwrap();

    let monday = run(
        &observations,
        &rule_json(json!({"frequency": "WEEKLY", "weekdayStart": "monday"})),
    );
    assert_eq!(monday.len(), 1);
    assert_eq!(monday[0].date_start.to_string(), "2020-01-06");
    assert_eq!(monday[0].date_end.to_string(), "2020-01-08");

    let sunday = run(
        &observations,
        &rule_json(json!({"frequency": "WEEKLY", "weekdayStart": "sunday"})),
    );
    assert_eq!(sunday[0].date_start.to_string(), "2020-01-05");
}

#[test]
fn test_fiscal_year_windows_from_csv() {
    let csv = "\
dateStart,timeZone,timeZoneType,amount
2020-03-15,America/Denver,LOCAL,100
2020-08-01,America/Denver,LOCAL,50
2021-06-30,America/Denver,LOCAL,25
";
    let observations = parse_csv(csv.as_bytes()).expect("Failed to parse CSV");
    let aggregates = run(
        &observations,
        &rule_json(json!({"frequency": "ANNUALLY", "fiscalYearStart": "07-01"})),
    );

    let windows: Vec<_> = aggregates
        .iter()
        .map(|a| {
            (
                a.date_start.to_string(),
                a.date_end.to_string(),
                a.event_count,
                a.sum(),
            )
        })
        .collect();
    assert_eq!(
        windows,
        vec![
            ("2019-07-01".to_string(), "2020-06-30".to_string(), 1, Some(100.0)),
            ("2020-07-01".to_string(), "2021-06-30".to_string(), 2, Some(75.0)),
        ]
    );
}

#[test]
fn test_empty_periods_are_never_emitted() {
    let observations = parse_json(
        r#"[
            {"dateStart": "2020-01-15", "timeZone": "UTC", "timeZoneType": "UTC", "amount": 1},
            {"dateStart": "2020-05-15", "timeZone": "UTC", "timeZoneType": "UTC", "amount": 2}
        ]"#
        .as_bytes(),
    )
    .unwrap();

    let aggregates = run(&observations, &rule_json(json!({})));
    assert_eq!(aggregates.len(), 2);
    assert!(aggregates.iter().all(|a| a.event_count > 0));
    assert_eq!(aggregates[1].date_start.to_string(), "2020-05-01");
    assert_eq!(aggregates[1].date_end.to_string(), "2020-05-15");
}

#[test]
fn test_date_set_windows() {
    let observations = parse_csv(march_amounts_csv(&[10.0, 20.0, 30.0, 40.0]).as_bytes()).unwrap();
    let aggregates = run(
        &observations,
        &rule_json(json!({
            "frequency": "DATE_SETS",
            "type": "minimumsAndMaximums",
            "dateSets": [
                {"dateStart": "2020-03-03", "dateEnd": "2020-03-04"},
                {"dateStart": "2020-03-05", "dateEnd": "2020-03-31"}
            ]
        })),
    );

    assert_eq!(aggregates.len(), 2);
    assert_eq!(aggregates[0].event_count, 2);
    assert_eq!(
        aggregates[0].values,
        AggregateValues::MinimumsAndMaximums {
            minimum: Some(20.0),
            maximum: Some(30.0),
        }
    );
    assert_eq!(aggregates[1].date_end.to_string(), "2020-03-05");
}

// =============================================================================
// Reducers
// =============================================================================

#[test]
fn test_medians_and_modes() {
    let observations =
        parse_csv(march_amounts_csv(&[1.0, 1.0, 1.0, 2.0, 2.0, 3.0]).as_bytes()).unwrap();
    let aggregates = run(
        &observations,
        &rule_json(json!({"type": "mediansAndModes", "xPercentRange": 0})),
    );

    assert_eq!(aggregates.len(), 1);
    assert_eq!(
        aggregates[0].values,
        AggregateValues::MediansAndModes {
            medians: vec![2.0, 2.0],
            modes: vec![1.0],
        }
    );
}

#[test]
fn test_two_distinct_values_have_no_mode() {
    let observations = parse_csv(march_amounts_csv(&[5.0, 5.0, 7.0]).as_bytes()).unwrap();
    let aggregates = run(&observations, &rule_json(json!({"type": "mediansAndModes"})));

    assert_eq!(
        aggregates[0].values,
        AggregateValues::MediansAndModes {
            medians: vec![7.0],
            modes: vec![],
        }
    );
}

#[test]
fn test_mode_tolerance_comes_from_the_rule() {
    let observations =
        parse_csv(march_amounts_csv(&[100.0, 103.0, 200.0, 100.0]).as_bytes()).unwrap();

    let tolerant = run(
        &observations,
        &rule_json(json!({"type": "mediansAndModes", "xPercentRange": 5})),
    );
    assert_eq!(
        tolerant[0].values,
        AggregateValues::MediansAndModes {
            medians: vec![103.0, 200.0],
            modes: vec![100.0, 103.0],
        }
    );

    let exact = run(&observations, &rule_json(json!({"type": "mediansAndModes"})));
    assert_eq!(
        exact[0].values,
        AggregateValues::MediansAndModes {
            medians: vec![103.0, 200.0],
            modes: vec![100.0],
        }
    );
}

#[test]
fn test_greatest_values_with_reverse() {
    let observations = parse_csv(march_amounts_csv(&[10.0, 50.0, 30.0, 50.0]).as_bytes()).unwrap();

    let greatest = run(
        &observations,
        &rule_json(json!({"type": "greatestValues", "selectionLimit": 2})),
    );
    assert_eq!(
        greatest[0].values,
        AggregateValues::GreatestValues {
            greatest_values: vec![50.0, 30.0]
        }
    );
    assert_eq!(greatest[0].event_count, 4);

    let reversed = run(
        &observations,
        &rule_json(json!({"type": "greatestValues", "selectionLimit": 2, "reverse": true})),
    );
    assert_eq!(
        reversed[0].values,
        AggregateValues::GreatestValues {
            greatest_values: vec![10.0, 30.0]
        }
    );

    let least = run(
        &observations,
        &rule_json(json!({"type": "leastValues", "selectionLimit": 2})),
    );
    assert_eq!(
        least[0].values,
        AggregateValues::LeastValues {
            least_values: vec![10.0, 30.0]
        }
    );
}

#[test]
fn test_negative_flow_uses_absolute_values() {
    let observations =
        parse_csv(march_amounts_csv(&[-20.0, 15.0, -5.0, 0.0]).as_bytes()).unwrap();
    let aggregates = run(&observations, &rule_json(json!({"flowDirection": "NEGATIVE"})));

    assert_eq!(aggregates[0].event_count, 2);
    assert_eq!(aggregates[0].sum(), Some(25.0));
    assert_eq!(aggregates[0].average(), Some(12.5));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_selector_has_no_function_for_once() {
    assert!(AggregateFunction::select(Frequency::Once, AggregateType::SumsAndAverages).is_none());

    let observations = parse_json(monthly_balances().as_bytes()).unwrap();
    let rules = parse_rules(rule_json(json!({"frequency": "ONCE"})).as_bytes()).unwrap();
    let err = aggregate_all(&observations, &rules, &AggregationDefaults::default()).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_mixed_timezones_are_rejected() {
    let csv = "\
dateStart,timeZone,timeZoneType,amount
2020-03-01,America/Denver,LOCAL,1
2020-03-02,America/New_York,LOCAL,2
";
    let observations = parse_csv(csv.as_bytes()).unwrap();
    let rules = parse_rules(rule_json(json!({})).as_bytes()).unwrap();
    let err = aggregate_all(&observations, &rules, &AggregationDefaults::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn test_empty_observations_are_rejected() {
    let rules = parse_rules(rule_json(json!({})).as_bytes()).unwrap();
    let err = aggregate_all(&[], &rules, &AggregationDefaults::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn test_overflowing_sum_reports_where_it_failed() {
    let csv = "\
dateStart,timeZone,timeZoneType,amount
2020-03-01,UTC,UTC,1e308
2020-03-04,UTC,UTC,1e308
";
    let observations = parse_csv(csv.as_bytes()).unwrap();
    let rules = parse_rules(rule_json(json!({"group": "overflow"})).as_bytes()).unwrap();
    let err = aggregate_all(&observations, &rules, &AggregationDefaults::default()).unwrap_err();

    match err {
        Error::Traversal {
            group, date, index, ..
        } => {
            assert_eq!(group, "overflow");
            assert_eq!(date, "2020-03-04");
            assert_eq!(index, 2);
        }
        other => panic!("expected traversal error, got {other}"),
    }
}
