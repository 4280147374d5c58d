//! Report invariants over hand-built predictions

use ndarray::{array, Array1};
use shopsight::data::ClassLabels;
use shopsight::report::{balanced_accuracy, ClassificationReport, ConfusionMatrix};

fn classes() -> ClassLabels {
    ClassLabels::new(vec!["No Sale".to_string(), "Sale".to_string()])
}

#[test]
fn test_balanced_accuracy_in_unit_interval_for_many_prediction_vectors() {
    let y_true = array![0, 0, 0, 0, 0, 0, 1, 1, 1, 1];

    // Every constant prediction, perfect, inverted and a few mixtures.
    let candidates: Vec<Array1<i64>> = vec![
        Array1::zeros(10),
        Array1::ones(10),
        y_true.clone(),
        y_true.mapv(|v| 1 - v),
        array![0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
        array![1, 0, 0, 0, 0, 0, 1, 1, 1, 0],
    ];

    for y_pred in candidates {
        let score = balanced_accuracy(&y_true, &y_pred).unwrap();
        assert!(
            (0.0..=1.0).contains(&score),
            "score {score} outside [0, 1] for {y_pred:?}"
        );
    }
}

#[test]
fn test_balanced_accuracy_is_mean_of_recalls() {
    let y_true = array![0, 0, 0, 0, 1, 1];
    // No Sale recall 3/4, Sale recall 1/2
    let y_pred = array![0, 0, 0, 1, 1, 0];

    let score = balanced_accuracy(&y_true, &y_pred).unwrap();
    assert!((score - (0.75 + 0.5) / 2.0).abs() < 1e-12);
}

#[test]
fn test_report_contains_expected_row_labels_exactly_once() {
    let y_true = array![0, 0, 1, 1, 0, 1];
    let y_pred = array![0, 1, 1, 1, 0, 0];

    let report = ClassificationReport::compute(&y_true, &y_pred, &classes()).unwrap();

    for label in ["No Sale", "Sale", "accuracy", "macro avg", "weighted avg"] {
        let n = report.rows.iter().filter(|r| r.label == label).count();
        assert_eq!(n, 1, "label {label} appears {n} times");
    }
    assert_eq!(report.rows.len(), 5);
}

#[test]
fn test_report_sorted_by_f1_descending() {
    let y_true = array![0, 0, 0, 0, 0, 0, 0, 1, 1, 1];
    let y_pred = array![0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

    let report = ClassificationReport::compute(&y_true, &y_pred, &classes()).unwrap();
    for pair in report.rows.windows(2) {
        assert!(
            pair[0].f1 >= pair[1].f1,
            "{} ({}) before {} ({})",
            pair[0].label,
            pair[0].f1,
            pair[1].label,
            pair[1].f1
        );
    }
}

#[test]
fn test_weighted_avg_tracks_class_support() {
    let y_true = array![0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
    let y_pred = array![0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

    let report = ClassificationReport::compute(&y_true, &y_pred, &classes()).unwrap();
    let weighted = report
        .rows
        .iter()
        .find(|r| r.label == "weighted avg")
        .unwrap();

    // All-majority predictions: weighted recall equals plain accuracy (0.8),
    // macro recall would be 0.5.
    assert!((weighted.recall - 0.8).abs() < 1e-12);
    let macro_row = report.rows.iter().find(|r| r.label == "macro avg").unwrap();
    assert!((macro_row.recall - 0.5).abs() < 1e-12);
}

#[test]
fn test_confusion_matrix_cells() {
    let y_true = array![0, 0, 0, 1, 1, 1, 1, 0];
    let y_pred = array![0, 1, 0, 1, 0, 1, 1, 0];

    let cm = ConfusionMatrix::compute(&y_true, &y_pred, &classes()).unwrap();

    assert_eq!(cm.labels, vec!["No Sale", "Sale"]);
    assert_eq!(cm.counts[0], vec![3, 1]);
    assert_eq!(cm.counts[1], vec![1, 3]);
    assert_eq!(cm.total(), 8);
}

#[test]
fn test_confusion_matrix_rejects_length_mismatch() {
    let y_true = array![0, 1];
    let y_pred = array![0, 1, 0];
    assert!(ConfusionMatrix::compute(&y_true, &y_pred, &classes()).is_err());
}
