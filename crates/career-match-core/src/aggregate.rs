//! Ranking: similarity scores -> ordered categories with centroid and supporting rows.
//!
//! Labeled corpora rank roles by the mean similarity of their members. Unlabeled corpora rank
//! rows directly, each row acting as its own category.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::corpus::ReferenceCorpus;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SUPPORT_SIZE: usize = 3;

/// A corpus row backing a category's ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupportRow {
    pub row_index: usize,
    pub similarity: f64,
}

/// One ranked category. `vector` is the raw centroid (labeled) or the row itself (unlabeled).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    #[serde(rename = "role")]
    pub category: String,
    pub score: f64,
    pub vector: Vec<f64>,
    pub support: Vec<SupportRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub top_k: usize,
    pub support_size: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            support_size: DEFAULT_SUPPORT_SIZE,
        }
    }
}

/// Rank categories. `scores[i]` is the similarity of corpus row `i`.
pub fn aggregate(scores: &[f64], corpus: &ReferenceCorpus, options: &AggregateOptions) -> Vec<RankedEntry> {
    assert_eq!(scores.len(), corpus.len(), "one score per corpus row");
    match corpus.labels() {
        Some(labels) => rank_labeled(scores, labels, corpus, options),
        None => rank_rows(scores, corpus, options.top_k),
    }
}

/// Score descending, then row index ascending.
fn by_similarity(scores: &[f64], a: usize, b: usize) -> Ordering {
    scores[b].total_cmp(&scores[a]).then(a.cmp(&b))
}

fn rank_rows(scores: &[f64], corpus: &ReferenceCorpus, top_k: usize) -> Vec<RankedEntry> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| by_similarity(scores, a, b));
    order
        .into_iter()
        .take(top_k)
        .map(|i| RankedEntry {
            category: corpus.row_label(i),
            score: scores[i],
            vector: corpus.row(i).to_vec(),
            support: vec![SupportRow {
                row_index: i,
                similarity: scores[i],
            }],
        })
        .collect()
}

struct Group<'a> {
    label: &'a str,
    members: Vec<usize>,
    score: f64,
}

fn rank_labeled(
    scores: &[f64],
    labels: &[String],
    corpus: &ReferenceCorpus,
    options: &AggregateOptions,
) -> Vec<RankedEntry> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (row, label) in labels.iter().enumerate() {
        let slot = *seen.entry(label.as_str()).or_insert_with(|| {
            groups.push(Group {
                label: label.as_str(),
                members: Vec::new(),
                score: 0.0,
            });
            groups.len() - 1
        });
        groups[slot].members.push(row);
    }

    for g in &mut groups {
        let sum: f64 = g.members.iter().map(|&i| scores[i]).sum();
        g.score = sum / g.members.len() as f64;
    }

    // Stable: equal scores keep first-seen label order.
    groups.sort_by(|a, b| b.score.total_cmp(&a.score));
    groups.truncate(options.top_k);

    groups
        .into_iter()
        .map(|mut g| {
            let vector = corpus.matrix().mean_of_rows(&g.members);
            g.members.sort_by(|&a, &b| by_similarity(scores, a, b));
            let support = g
                .members
                .iter()
                .take(options.support_size)
                .map(|&i| SupportRow {
                    row_index: i,
                    similarity: scores[i],
                })
                .collect();
            RankedEntry {
                category: g.label.to_string(),
                score: g.score,
                vector,
                support,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(rows: &[Vec<f64>], labels: &[&str]) -> ReferenceCorpus {
        ReferenceCorpus::from_rows(
            rows[0].len(),
            rows,
            Some(labels.iter().map(|s| s.to_string()).collect()),
        )
    }

    fn options(top_k: usize) -> AggregateOptions {
        AggregateOptions {
            top_k,
            ..AggregateOptions::default()
        }
    }

    #[test]
    fn unlabeled_rows_rank_individually() {
        let corpus = ReferenceCorpus::from_rows(1, &[vec![1.0], vec![1.0], vec![1.0]], None);
        let top = aggregate(&[0.9, 0.4, 0.95], &corpus, &options(2));
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].category, "expert_2");
        assert_eq!(top[0].score, 0.95);
        assert_eq!(top[0].support, vec![SupportRow { row_index: 2, similarity: 0.95 }]);
        assert_eq!(top[1].support[0].row_index, 0);
        assert_eq!(top[1].vector, vec![1.0]);
    }

    #[test]
    fn unlabeled_ties_keep_row_order() {
        let corpus = ReferenceCorpus::from_rows(1, &[vec![1.0], vec![1.0], vec![1.0]], None);
        let top = aggregate(&[0.5, 0.7, 0.5], &corpus, &options(5));
        let order: Vec<usize> = top.iter().map(|e| e.support[0].row_index).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn labeled_score_is_member_mean_and_centroid_is_raw_mean() {
        let corpus = labeled(
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
            &["dev", "dev", "ops"],
        );
        let top = aggregate(&[0.2, 0.6, 0.3], &corpus, &options(5));
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].category, "dev");
        assert!((top[0].score - 0.4).abs() < 1e-9);
        assert_eq!(top[0].vector, vec![0.5, 0.5]);
        assert_eq!(top[1].category, "ops");
        assert_eq!(top[1].vector, vec![1.0, 0.0]);
    }

    #[test]
    fn labeled_ties_keep_first_seen_order() {
        let corpus = labeled(
            &[vec![1.0], vec![1.0], vec![1.0], vec![1.0]],
            &["b", "a", "c", "a"],
        );
        let top = aggregate(&[0.5, 0.4, 0.9, 0.6], &corpus, &options(5));
        let names: Vec<&str> = top.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn support_is_top_three_members() {
        let corpus = labeled(
            &[vec![1.0], vec![1.0], vec![1.0], vec![1.0], vec![1.0]],
            &["x", "x", "x", "x", "x"],
        );
        let top = aggregate(&[0.1, 0.8, 0.3, 0.8, 0.5], &corpus, &options(1));
        let support: Vec<usize> = top[0].support.iter().map(|s| s.row_index).collect();
        assert_eq!(support, vec![1, 3, 4]);
    }

    #[test]
    fn support_size_is_tunable() {
        let corpus = labeled(&[vec![1.0], vec![1.0]], &["x", "x"]);
        let opts = AggregateOptions {
            top_k: 5,
            support_size: 1,
        };
        let top = aggregate(&[0.1, 0.2], &corpus, &opts);
        assert_eq!(top[0].support.len(), 1);
        assert_eq!(top[0].support[0].row_index, 1);
    }

    #[test]
    fn top_k_beyond_categories_returns_all() {
        let corpus = labeled(&[vec![1.0], vec![1.0]], &["x", "y"]);
        assert_eq!(aggregate(&[0.1, 0.2], &corpus, &options(50)).len(), 2);
    }

    #[test]
    fn empty_corpus_ranks_nothing() {
        assert!(aggregate(&[], &ReferenceCorpus::empty(3), &options(5)).is_empty());
    }

    #[test]
    fn serializes_category_as_role() {
        let entry = RankedEntry {
            category: "Data Engineer".into(),
            score: 0.5,
            vector: vec![0.1],
            support: vec![SupportRow { row_index: 4, similarity: 0.5 }],
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["role"], "Data Engineer");
        assert_eq!(v["support"][0]["row_index"], 4);
    }
}
