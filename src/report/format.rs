//! Formatted terminal output.
//!
//! Formatting lives here so the fitting code stays free of presentation and
//! output changes stay localized (the tests below pin the exact text).

use crate::domain::{EvaluateConfig, Evaluation, RankedImportance};

/// Run summary: dataset sizes, model settings, CV and test scores.
pub fn format_evaluation_summary(eval: &Evaluation, config: &EvaluateConfig) -> String {
    let mut out = String::new();

    out.push_str("=== retail - Random Forest Evaluation ===\n");
    out.push_str(&format!(
        "Rows: train={} | test={} | features={}\n",
        eval.n_train,
        eval.n_test,
        eval.importances.len()
    ));
    out.push_str(&format!(
        "Model: trees={} seed={} impute={:?}\n",
        config.forest.n_trees, config.forest.seed, config.impute_axis
    ));
    out.push_str(&format!("Fold scores: {}\n", fmt_vec(&eval.cv.fold_scores)));
    out.push_str(&format!(
        "{}-fold CV MAE: {:.2} with std: {:.2}\n",
        config.folds, eval.cv.mean, eval.cv.std
    ));
    out.push_str(&format!("Test MAE: {:.2}.\n", eval.test_mae));

    out
}

/// Table of the top `n` ranked importances.
pub fn format_importance_table(ranked: &[RankedImportance], n: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>4} {:<28} {:>12} {:>12} {:>12}",
            "rank", "feature", "importance", "normalized", "cumulative"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<4} {:-<28} {:-<12} {:-<12} {:-<12}\n",
        "", "", "", "", ""
    ));

    for (i, r) in ranked.iter().take(n).enumerate() {
        out.push_str(&format!(
            "{:>4} {:<28} {:>12.6} {:>12.6} {:>12.6}\n",
            i + 1,
            truncate(&r.feature, 28),
            r.importance,
            r.importance_normalized,
            r.cumulative_importance,
        ));
    }

    if ranked.len() > n {
        out.push_str(&format!("... {} more features\n", ranked.len() - n));
    }

    out
}

/// `"{k} features required for {p}% of cumulative importance."`
pub fn format_threshold_message(required: Option<usize>, threshold: f64) -> String {
    match required {
        Some(k) => format!(
            "{k} features required for {:.0}% of cumulative importance.",
            100.0 * threshold
        ),
        None => format!(
            "No feature count exceeds {:.0}% of cumulative importance.",
            100.0 * threshold
        ),
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CvSummary, FeatureImportance};

    #[test]
    fn summary_contains_score_lines() {
        let eval = Evaluation {
            predictions: vec![1.0, 2.0],
            importances: vec![FeatureImportance {
                feature: "x".to_string(),
                importance: 1.0,
            }],
            cv: CvSummary {
                fold_scores: vec![1.0, 2.0],
                mean: 1.5,
                std: 0.5,
            },
            test_mae: 0.1234,
            n_train: 10,
            n_test: 2,
        };
        let txt = format_evaluation_summary(&eval, &EvaluateConfig::default());

        assert!(txt.contains("Rows: train=10 | test=2 | features=1\n"));
        assert!(txt.contains("5-fold CV MAE: 1.50 with std: 0.50\n"));
        assert!(txt.contains("Test MAE: 0.12.\n"));
    }

    #[test]
    fn importance_table_golden() {
        let ranked = vec![
            RankedImportance {
                feature: "sqft".to_string(),
                importance: 3.0,
                importance_normalized: 0.75,
                cumulative_importance: 0.75,
            },
            RankedImportance {
                feature: "age".to_string(),
                importance: 1.0,
                importance_normalized: 0.25,
                cumulative_importance: 1.0,
            },
        ];

        let txt = format_importance_table(&ranked, 1);
        let expected = concat!(
            "rank feature                        importance   normalized   cumulative\n",
            "---- ---------------------------- ------------ ------------ ------------\n",
            "   1 sqft                             3.000000     0.750000     0.750000\n",
            "... 1 more features\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn threshold_message_wording() {
        assert_eq!(
            format_threshold_message(Some(12), 0.9),
            "12 features required for 90% of cumulative importance."
        );
        assert_eq!(
            format_threshold_message(None, 1.0),
            "No feature count exceeds 100% of cumulative importance."
        );
    }
}
