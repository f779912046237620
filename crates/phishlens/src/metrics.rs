//! Held-out evaluation: per-class precision / recall / F1 and their averages.

use crate::model::Label;
use serde::Serialize;
use std::fmt;

const CLASSES: [Label; 2] = [Label::Legitimate, Label::Phishing];

/// Scores for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Binary confusion counts, `matrix[actual][predicted]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub matrix: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_pairs(actual: &[Label], predicted: &[Label]) -> Self {
        let mut cm = Self::default();
        for (a, p) in actual.iter().zip(predicted) {
            cm.matrix[a.index()][p.index()] += 1;
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    fn scores(&self, label: Label) -> ClassScores {
        let k = label.index();
        let tp = self.matrix[k][k];
        let predicted: usize = self.matrix.iter().map(|row| row[k]).sum();
        let support: usize = self.matrix[k].iter().sum();

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassScores {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Classification report over a held-out set. Undefined ratios are 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub legitimate: ClassScores,
    pub phishing: ClassScores,
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Build a report from aligned true and predicted labels.
    pub fn new(actual: &[Label], predicted: &[Label]) -> Self {
        let confusion = ConfusionMatrix::from_pairs(actual, predicted);
        let [legitimate, phishing] = CLASSES.map(|l| confusion.scores(l));
        let total = confusion.total();
        let correct = confusion.matrix[0][0] + confusion.matrix[1][1];

        let per_class = [legitimate, phishing];
        let macro_avg = average(&per_class, |_| 0.5, total);
        let weighted_avg = average(&per_class, |s| ratio(s.support, total), total);

        Self {
            legitimate,
            phishing,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
            confusion,
        }
    }

    pub fn scores(&self, label: Label) -> &ClassScores {
        match label {
            Label::Legitimate => &self.legitimate,
            Label::Phishing => &self.phishing,
        }
    }
}

fn average(per_class: &[ClassScores; 2], weight: impl Fn(&ClassScores) -> f64, total: usize) -> ClassScores {
    let mean = |f: fn(&ClassScores) -> f64| -> f64 {
        per_class.iter().map(|s| weight(s) * f(s)).sum()
    };
    ClassScores {
        precision: mean(|s| s.precision),
        recall: mean(|s| s.recall),
        f1: mean(|s| s.f1),
        support: total,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for label in CLASSES {
            write_row(f, &label.to_string(), self.scores(label))?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, s: &ClassScores) -> fmt::Result {
    writeln!(
        f,
        "{name:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        s.precision, s.recall, s.f1, s.support
    )
}
