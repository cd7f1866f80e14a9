//! Reference corpus: expert records turned into unit trait vectors, with optional role labels.
//!
//! Two record layouts are accepted and detected automatically:
//!
//! - **Direct**: every record carries one numeric field per trait id.
//! - **Raw answers**: records carry questionnaire answers (`FC01`, `LI03`, `SJT01_best`,
//!   `SJT01_second`, ...) and go through the same vectorizer as live requests.
//!
//! The corpus is built once and only read afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::answers::AnswerSet;
use crate::error::{CorpusError, CorpusResult};
use crate::mapping::QuestionMapping;
use crate::vector::RowMatrix;
use crate::vectorize::{vectorize, AnswerTally};

pub const DEFAULT_LABEL_FIELD: &str = "role";

/// One source record: field name (trimmed) -> cell.
pub type SourceRecord = Map<String, Value>;

/// Layout the corpus was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusShape {
    Direct,
    RawAnswers,
    Empty,
}

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    /// Field holding the category (role) of each record.
    pub label_field: String,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            label_field: DEFAULT_LABEL_FIELD.to_string(),
        }
    }
}

/// Records read from a corpus file, before vectorization.
#[derive(Debug, Clone, Default)]
pub struct CorpusSource {
    records: Vec<SourceRecord>,
}

impl CorpusSource {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self {
            records: records.into_iter().map(trim_field_names).collect(),
        }
    }

    /// Load a JSON array of objects, or JSON Lines when the extension is `.jsonl` / `.ndjson`.
    pub fn from_path(path: impl AsRef<Path>) -> CorpusResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lines = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("jsonl") | Some("ndjson")
        );
        let source = if lines {
            Self::from_json_lines(&content)?
        } else {
            Self::from_json_str(&content)?
        };
        tracing::info!(path = %path.display(), records = source.len(), "corpus source loaded");
        Ok(source)
    }

    pub fn from_json_str(s: &str) -> CorpusResult<Self> {
        let values: Vec<Value> = serde_json::from_str(s)?;
        Self::from_values(values)
    }

    pub fn from_json_lines(s: &str) -> CorpusResult<Self> {
        let values = s
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str::<Value>)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_values(values)
    }

    fn from_values(values: Vec<Value>) -> CorpusResult<Self> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(row, v)| match v {
                Value::Object(map) => Ok(map),
                _ => Err(CorpusError::NotAnObject { row }),
            })
            .collect::<CorpusResult<Vec<_>>>()?;
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// `N x D` matrix of unit (or zero) rows plus optional parallel labels.
#[derive(Debug, Clone)]
pub struct ReferenceCorpus {
    rows: RowMatrix,
    labels: Option<Vec<String>>,
    shape: CorpusShape,
}

impl ReferenceCorpus {
    /// Corpus from already-extracted trait rows; rows are L2-normalized here.
    ///
    /// Rows given here are trait values, so a non-empty corpus reports
    /// [`CorpusShape::Direct`] whatever file layout they originally came from.
    /// Only [`build_corpus`] produces [`CorpusShape::RawAnswers`].
    pub fn from_rows(dim: usize, rows: &[Vec<f64>], labels: Option<Vec<String>>) -> Self {
        if let Some(labels) = &labels {
            assert_eq!(labels.len(), rows.len(), "label count must match row count");
        }
        let mut matrix = RowMatrix::with_capacity(dim, rows.len());
        for row in rows {
            matrix.push_row(row);
        }
        matrix.normalize_rows();
        let shape = if rows.is_empty() {
            CorpusShape::Empty
        } else {
            CorpusShape::Direct
        };
        Self {
            rows: matrix,
            labels,
            shape,
        }
    }

    pub fn empty(dim: usize) -> Self {
        Self::from_rows(dim, &[], None)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.rows.dim()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        self.rows.row(i)
    }

    pub fn matrix(&self) -> &RowMatrix {
        &self.rows
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    pub fn is_labeled(&self) -> bool {
        self.labels.is_some()
    }

    pub fn shape(&self) -> CorpusShape {
        self.shape
    }

    /// Category of row `i`: its label, or `expert_{i}` in an unlabeled corpus.
    pub fn row_label(&self, i: usize) -> String {
        match &self.labels {
            Some(labels) => labels[i].clone(),
            None => format!("expert_{}", i),
        }
    }

    /// Distinct labels, or the row count when unlabeled.
    pub fn category_count(&self) -> usize {
        match &self.labels {
            Some(labels) => labels.iter().collect::<HashSet<_>>().len(),
            None => self.len(),
        }
    }
}

/// Build the reference corpus from source records.
pub fn build_corpus(
    source: &CorpusSource,
    mapping: &QuestionMapping,
    options: &CorpusOptions,
) -> CorpusResult<ReferenceCorpus> {
    let records = source.records();
    let dim = mapping.schema().dim();
    if records.is_empty() {
        tracing::warn!("corpus source has no records; scoring will return empty rankings");
        return Ok(ReferenceCorpus::empty(dim));
    }

    let labels = extract_labels(records, &options.label_field);
    let shape = detect_shape(records, mapping)?;

    let mut rows = RowMatrix::with_capacity(dim, records.len());
    match shape {
        CorpusShape::Direct => {
            for (row, record) in records.iter().enumerate() {
                rows.push_row(&direct_row(row, record, mapping)?);
            }
        }
        CorpusShape::RawAnswers => {
            let mut total = AnswerTally::default();
            for (row, record) in records.iter().enumerate() {
                let answers = record_answers(record, mapping);
                let out = vectorize(&answers, mapping);
                if out.vector.is_zero() {
                    tracing::warn!(row, "expert record produced a zero trait vector");
                }
                total.applied += out.tally.applied;
                total.ignored_unknown += out.tally.ignored_unknown;
                total.ignored_malformed += out.tally.ignored_malformed;
                rows.push_row(out.vector.as_slice());
            }
            if total.ignored() > 0 {
                tracing::warn!(
                    ignored_unknown = total.ignored_unknown,
                    ignored_malformed = total.ignored_malformed,
                    "some expert answers were ignored while vectorizing the corpus"
                );
            }
        }
        CorpusShape::Empty => {}
    }
    rows.normalize_rows();

    tracing::info!(
        rows = rows.len(),
        traits = dim,
        labeled = labels.is_some(),
        shape = ?shape,
        "reference corpus built"
    );
    Ok(ReferenceCorpus {
        rows,
        labels,
        shape,
    })
}

fn detect_shape(records: &[SourceRecord], mapping: &QuestionMapping) -> CorpusResult<CorpusShape> {
    let traits = mapping.schema().traits();
    if records
        .iter()
        .all(|r| traits.iter().all(|t| r.contains_key(t)))
    {
        return Ok(CorpusShape::Direct);
    }

    let has_answers = records.iter().any(|r| {
        mapping.forced_choice().keys().any(|q| r.contains_key(q))
            || mapping.likert().keys().any(|q| r.contains_key(q))
            || mapping.situational().keys().any(|q| {
                r.contains_key(q)
                    || r.contains_key(&format!("{}_best", q))
                    || r.contains_key(&format!("{}_second", q))
            })
    });
    if has_answers {
        return Ok(CorpusShape::RawAnswers);
    }

    let missing_traits = traits
        .iter()
        .filter(|t| records.iter().any(|r| !r.contains_key(t.as_str())))
        .cloned()
        .collect();
    Err(CorpusError::UnrecognizedShape { missing_traits })
}

fn direct_row(row: usize, record: &SourceRecord, mapping: &QuestionMapping) -> CorpusResult<Vec<f64>> {
    mapping
        .schema()
        .traits()
        .iter()
        .map(|t| {
            let cell = record.get(t).unwrap_or(&Value::Null);
            numeric_cell(cell).ok_or_else(|| CorpusError::NonNumericTrait {
                row,
                trait_id: t.clone(),
                value: cell.to_string(),
            })
        })
        .collect()
}

fn numeric_cell(cell: &Value) -> Option<f64> {
    let v = match cell {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Answer code from a spreadsheet-style cell. Integral numbers render without a fraction.
fn code_cell(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(n.to_string())
                }
            }
        }
        _ => None,
    }
}

fn record_answers(record: &SourceRecord, mapping: &QuestionMapping) -> AnswerSet {
    let mut answers = AnswerSet::new();
    for q in mapping.forced_choice().keys().chain(mapping.likert().keys()) {
        if let Some(code) = code_cell(record.get(q)) {
            answers.insert_choice(q.clone(), code);
        }
    }
    for q in mapping.situational().keys() {
        let (best, second) = match record.get(q) {
            Some(Value::Object(pick)) => (code_cell(pick.get("best")), code_cell(pick.get("second"))),
            _ => (
                code_cell(record.get(&format!("{}_best", q))),
                code_cell(record.get(&format!("{}_second", q))),
            ),
        };
        if best.is_some() || second.is_some() {
            answers.insert_ranked(q.clone(), best, second);
        }
    }
    answers
}

/// Labels are all-or-nothing per corpus: once any record carries the field, rows without
/// it fall back to `expert_{row}` so they still rank as their own category.
fn extract_labels(records: &[SourceRecord], field: &str) -> Option<Vec<String>> {
    let labels: Vec<Option<String>> = records
        .iter()
        .map(|r| match r.get(field) {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Null) | None => None,
            Some(other @ Value::Number(_)) => code_cell(Some(other)),
            Some(other) => Some(other.to_string()),
        })
        .collect();

    let missing = labels.iter().filter(|l| l.is_none()).count();
    if missing == labels.len() {
        return None;
    }
    if missing > 0 {
        tracing::warn!(
            field,
            missing,
            "some expert records have no label; they are ranked under their row id"
        );
    }
    Some(
        labels
            .into_iter()
            .enumerate()
            .map(|(row, label)| label.unwrap_or_else(|| format!("expert_{}", row)))
            .collect(),
    )
}

fn trim_field_names(record: SourceRecord) -> SourceRecord {
    record
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v))
        .collect()
}
