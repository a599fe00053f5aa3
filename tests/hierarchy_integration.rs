//! Integration tests for the full hierarchy analysis.
//!
//! Runs a small survey workbook (one top-level sheet with four factors and
//! one three-factor sub-sheet per top factor) through the aggregator and
//! checks exclusions, global ranking, group tables and significance.

use std::collections::BTreeSet;

use ahp_sherpa::config::AnalysisConfig;
use ahp_sherpa::domain::ahp::{ExclusionReason, SheetTable};
use ahp_sherpa::domain::analysis::{
    AnalysisReport, HierarchicalAggregator, HierarchyInput, PostHocOutcome, SignificanceTester,
    SkipReason,
};
use ahp_sherpa::domain::foundation::{AnalysisError, ErrorCode, MeanMethod};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn table(name: &str, header: &[&str], records: &[&[&str]]) -> SheetTable {
    SheetTable::new(
        name,
        header.to_vec(),
        records.iter().map(|r| r.to_vec()).collect(),
    )
}

fn sub_table(name: &str, prefix: &str) -> SheetTable {
    let a = format!("{prefix}1_{prefix}2");
    let b = format!("{prefix}1_{prefix}3");
    let c = format!("{prefix}2_{prefix}3");
    table(
        name,
        &["ID", "Type", &a, &b, &c],
        &[
            &["1", "E", "5", "-5", "5"],
            &["2", "E", "7", "-7", "7"],
            &["3", "G", "3", "-3", "3"],
            &["4", "G", "9", "-9", "9"],
            &["5", "O", "4", "-4", "4"],
        ],
    )
}

fn workbook() -> Vec<SheetTable> {
    vec![
        table(
            "Main",
            &["ID", "Type", "A_B", "A_C", "A_D", "B_C", "B_D", "C_D"],
            &[
                &["1", "E", "5", "-5", "5", "5", "-5", "5"],
                &["2", "E", "7", "7", "-7", "-7", "2", "-2"],
                &["3", "G", "-5", "5", "5", "-5", "5", "5"],
                &["4", "G", "3", "-3", "3", "-3", "3", "-3"],
                &["5", "O", "9", "-9", "9", "-9", "9", "-9"],
            ],
        ),
        sub_table("A", "a"),
        sub_table("B", "b"),
        sub_table("C", "c"),
        sub_table("D", "d"),
    ]
}

fn analyze(config: &AnalysisConfig, tables: &[SheetTable]) -> Result<AnalysisReport, AnalysisError> {
    init_tracing();
    let input = HierarchyInput::from_tables(tables)?;
    HierarchicalAggregator::new(config).analyze(&input)
}

// =============================================================================
// Survey workbook
// =============================================================================

#[test]
fn workbook_excludes_unrepairable_sub_respondents() {
    let report = analyze(&AnalysisConfig::default(), &workbook()).unwrap();

    assert_eq!(report.sheets.len(), 5);
    assert!(report.top_sheet().unwrap().result.excluded.is_empty());
    assert_eq!(report.top_sheet().unwrap().result.respondents.len(), 5);

    assert_eq!(report.exclusions.len(), 8);
    let excluded_ids: BTreeSet<&str> = report
        .exclusions
        .iter()
        .map(|e| e.respondent_id.as_str())
        .collect();
    assert_eq!(excluded_ids, BTreeSet::from(["2", "4"]));
    for record in &report.exclusions {
        assert_ne!(record.sheet, "Main");
        assert!(record.final_cr > 0.1);
        assert!(matches!(record.reason, ExclusionReason::ConvergenceFailure { .. }));
    }
}

#[test]
fn workbook_repairs_every_included_respondent() {
    let report = analyze(&AnalysisConfig::default(), &workbook()).unwrap();

    for sheet in &report.sheets {
        for respondent in &sheet.result.respondents {
            assert!(respondent.final_report.cr <= 0.1);
            assert!(respondent.final_report.cr <= respondent.original_report.cr);
            assert!(respondent.final_matrix.is_reciprocal(1e-12));
            assert!((respondent.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }
}

#[test]
fn workbook_global_rows_rank_every_leaf() {
    let report = analyze(&AnalysisConfig::default(), &workbook()).unwrap();

    assert_eq!(report.global.len(), 12);
    let total: f64 = report.global.iter().map(|r| r.global_weight).sum();
    assert!((total - 1.0).abs() < 1e-9);

    let best = report.global.iter().find(|r| r.global_rank == 1).unwrap();
    assert_eq!(best.top_factor, "B");
    assert_eq!(best.sub_factor, "b1");
    assert!((best.global_weight - 0.15607).abs() < 1e-4);

    for a in &report.global {
        for b in &report.global {
            if a.global_weight > b.global_weight {
                assert!(a.global_rank < b.global_rank);
            }
            if a.global_weight == b.global_weight {
                assert_eq!(a.global_rank, b.global_rank);
            }
        }
    }

    let top_cr = report.top_sheet().unwrap().composite.as_ref().unwrap().mean_final_cr;
    assert!(report.global.iter().all(|r| r.top_cr == top_cr));
}

#[test]
fn workbook_group_tables_and_comparison() {
    let report = analyze(&AnalysisConfig::default(), &workbook()).unwrap();

    let labels: Vec<&str> = report.groups.iter().map(|g| g.group.as_str()).collect();
    assert_eq!(labels, vec!["E", "G", "O"]);
    assert_eq!(report.group("E").unwrap().top_composite.members, 2);
    for group in &report.groups {
        assert_eq!(group.rows.len(), 12);
        let total: f64 = group.rows.iter().map(|r| r.global_weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    assert_eq!(report.comparison.len(), 12);
    for row in &report.comparison {
        assert_eq!(row.groups.len(), 3);
        assert!(row.groups.values().all(Option::is_some));
    }
}

#[test]
fn workbook_respondent_weights_need_both_levels() {
    let report = analyze(&AnalysisConfig::default(), &workbook()).unwrap();

    let ids: BTreeSet<&str> = report
        .respondent_weights
        .iter()
        .map(|w| w.respondent_id.as_str())
        .collect();
    assert_eq!(ids, BTreeSet::from(["1", "3", "5"]));
    assert_eq!(report.respondent_weights.len(), 36);

    for id in ids {
        let total: f64 = report
            .respondent_weights
            .iter()
            .filter(|w| w.respondent_id == id)
            .map(|w| w.global_weight)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}

#[test]
fn workbook_singleton_groups_skip_anova() {
    let report = analyze(&AnalysisConfig::default(), &workbook()).unwrap();

    assert!(report.significance.results.is_empty());
    assert_eq!(report.significance.skipped.len(), 12);
    assert!(report
        .significance
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::NoReplication { groups: 3, .. })));
}

#[test]
fn workbook_looser_threshold_keeps_everyone() {
    let config = AnalysisConfig::default().with_cr_threshold(0.2);
    let report = analyze(&config, &workbook()).unwrap();

    assert!(report.exclusions.is_empty());
    assert_eq!(report.respondent_weights.len(), 60);
    assert_eq!(report.group("G").unwrap().top_composite.members, 2);
    assert_eq!(report.significance.results.len(), 12);
}

#[test]
fn workbook_arithmetic_composites_stay_reciprocal() {
    let config = AnalysisConfig::default().with_mean_method(MeanMethod::Arithmetic);
    let report = analyze(&config, &workbook()).unwrap();

    for sheet in &report.sheets {
        let composite = sheet.composite.as_ref().unwrap();
        assert!(composite.matrix.is_reciprocal(1e-12));
        assert!((composite.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn workbook_report_serializes() {
    let report = analyze(&AnalysisConfig::default(), &workbook()).unwrap();
    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["global"].as_array().unwrap().len(), 12);
    assert_eq!(value["exclusions"][0]["reason"]["kind"], "convergence_failure");
}

// =============================================================================
// Malformed input
// =============================================================================

#[test]
fn malformed_sub_sheet_aborts_with_context() {
    let mut tables = workbook();
    tables[2].records[3][3] = "n/a".to_string();

    let err = analyze(&AnalysisConfig::default(), &tables).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedInput);
    assert_eq!(
        err,
        AnalysisError::NonNumericCode {
            sheet: "B".to_string(),
            row: 4,
            column: "b1_b3".to_string(),
            value: "n/a".to_string(),
        }
    );
}

#[test]
fn missing_sub_sheet_is_hierarchy_mismatch() {
    let mut tables = workbook();
    tables.pop();

    let err = analyze(&AnalysisConfig::default(), &tables).unwrap_err();
    assert_eq!(err, AnalysisError::HierarchyMismatch { expected: 4, actual: 3 });
}

#[test]
fn column_count_error_names_sheet() {
    let tables = vec![table(
        "Main",
        &["ID", "Type", "A_B", "A_C", "B_C", "extra"],
        &[&["1", "E", "1", "1", "1", "1"]],
    )];

    let err = analyze(&AnalysisConfig::default(), &tables).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::ColumnCount { ref sheet, expected: 6, actual: 4, .. } if sheet == "Main"
    ));
}

// =============================================================================
// Group differences
// =============================================================================

fn polarized_workbook() -> Vec<SheetTable> {
    vec![
        table(
            "Main",
            &["ID", "Type", "Price_Service"],
            &[
                &["1", "E", "-3"],
                &["2", "E", "-3"],
                &["3", "P", "3"],
                &["4", "P", "3"],
            ],
        ),
        table(
            "Price",
            &["ID", "Type", "upfront_running"],
            &[&["1", "E", "1"], &["2", "E", "1"], &["3", "P", "1"], &["4", "P", "1"]],
        ),
        table(
            "Service",
            &["ID", "Type", "speed_care"],
            &[&["1", "E", "1"], &["2", "E", "1"], &["3", "P", "1"], &["4", "P", "1"]],
        ),
    ]
}

#[test]
fn separated_groups_are_localized_by_post_hoc() {
    let report = analyze(&AnalysisConfig::default(), &polarized_workbook()).unwrap();

    let result = report.significance.result_for("Price", "upfront").unwrap();
    assert!(result.significant);
    let pairs = result.post_hoc.pairs();
    assert_eq!(pairs.len(), 1);
    assert_eq!((pairs[0].first.as_str(), pairs[0].second.as_str()), ("E", "P"));
    assert!(pairs[0].mean_difference > 0.0);

    let row = report
        .comparison
        .iter()
        .find(|r| r.top_factor == "Price" && r.sub_factor == "upfront")
        .unwrap();
    assert!((row.groups["E"].unwrap() - 0.375).abs() < 1e-9);
    assert!((row.groups["P"].unwrap() - 0.125).abs() < 1e-9);
    assert!((row.overall - 0.25).abs() < 1e-9);
}

#[test]
fn missing_post_hoc_still_reports_omnibus() {
    init_tracing();
    let config = AnalysisConfig::default();
    let input = HierarchyInput::from_tables(&polarized_workbook()).unwrap();
    let report = HierarchicalAggregator::new(&config)
        .with_tester(SignificanceTester::new(0.05, None))
        .analyze(&input)
        .unwrap();

    assert_eq!(report.significance.results.len(), 4);
    for result in &report.significance.results {
        assert!(result.significant);
        assert_eq!(result.post_hoc, PostHocOutcome::Unavailable);
        assert!(result.post_hoc.pairs().is_empty());
    }
}
