//! Raw record -> model input row.
//!
//! The model only sees positions, never column names, so every row handed to
//! it must follow [`FeatureSchema`] order exactly. [`ColumnIndex`] is built
//! once from the schema and turns alignment into plain lookups:
//!
//! - continuous field: `field -> position`, value copied as is
//! - categorical field: `(field, category) -> position`, set to 1
//! - anything else: 0
//!
//! Categories the schema never saw are dropped without error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{ArtifactError, ScreeningError};

/// Separator the training pipeline put between field and category.
pub const ONE_HOT_SEPARATOR: &str = "_";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Category(String),
}

/// One submission, keyed by training column name. Built once, then read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number(self, name: impl Into<String>, value: f64) -> Self {
        self.with(name.into(), FieldValue::Number(value))
    }

    pub fn with_category(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name.into(), FieldValue::Category(value.into()))
    }

    // later value for the same key wins
    fn with(mut self, name: String, value: FieldValue) -> Self {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ordered column names the model was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Rejects empty schemas and duplicate column names.
    pub fn new(columns: Vec<String>) -> Result<Self, ArtifactError> {
        if columns.is_empty() {
            return Err(ArtifactError::InvalidSchema("no columns".into()));
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(ArtifactError::InvalidSchema(format!("duplicate column '{c}'")));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Explicit column mapping shipped next to the schema (`feature_mapping.json`).
///
/// ```json
/// {"continuous": ["Age"], "categorical": {"Gender": {"Male": "Gender_Male"}}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMapping {
    #[serde(default)]
    pub continuous: Vec<String>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, String>>,
}

/// Model input row, same length and order as the schema it was aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedVector {
    values: Vec<f64>,
}

impl AlignedVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, schema: &FeatureSchema, column: &str) -> Option<f64> {
        schema.position(column).and_then(|i| self.values.get(i).copied())
    }

    /// `(column, value)` for every non-zero position, in schema order.
    pub fn non_zero<'a>(
        &'a self,
        schema: &'a FeatureSchema,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        schema
            .columns()
            .iter()
            .zip(self.values.iter())
            .filter(|(_, v)| **v != 0.0)
            .map(|(c, v)| (c.as_str(), *v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub vector: AlignedVector,
    /// Record fields that matched no schema column (unseen categories, unknown fields).
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ColumnIndex {
    width: usize,
    continuous: HashMap<String, usize>,
    categorical: HashMap<String, HashMap<String, usize>>,
}

impl ColumnIndex {
    /// Builds the index from an explicit mapping. Every column the mapping
    /// names must exist in the schema and be claimed only once.
    pub fn from_mapping(
        schema: &FeatureSchema,
        mapping: &FeatureMapping,
    ) -> Result<Self, ArtifactError> {
        let mut claimed: HashSet<usize> = HashSet::new();
        let mut claim = |column: &str| -> Result<usize, ArtifactError> {
            let pos = schema.position(column).ok_or_else(|| {
                ArtifactError::InvalidMapping(format!("column '{column}' is not in the schema"))
            })?;
            if !claimed.insert(pos) {
                return Err(ArtifactError::InvalidMapping(format!(
                    "column '{column}' is mapped more than once"
                )));
            }
            Ok(pos)
        };

        let mut continuous = HashMap::with_capacity(mapping.continuous.len());
        for name in &mapping.continuous {
            continuous.insert(name.clone(), claim(name)?);
        }

        let mut categorical: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (field, cats) in &mapping.categorical {
            let entry = categorical.entry(field.clone()).or_default();
            for (category, column) in cats {
                entry.insert(category.clone(), claim(column)?);
            }
        }

        Ok(Self {
            width: schema.len(),
            continuous,
            categorical,
        })
    }

    /// Recovers the mapping from the column names alone, assuming
    /// `<field><sep><category>` naming. A column goes to the longest
    /// categorical field it is prefixed by; exact matches on a continuous
    /// field win over that. Columns matching neither stay unmapped.
    pub fn derive(
        schema: &FeatureSchema,
        continuous_fields: &[&str],
        categorical_fields: &[&str],
        sep: &str,
    ) -> Self {
        let mut continuous = HashMap::new();
        let mut categorical: HashMap<String, HashMap<String, usize>> = HashMap::new();

        for (pos, column) in schema.columns().iter().enumerate() {
            if continuous_fields.contains(&column.as_str()) {
                continuous.insert(column.clone(), pos);
                continue;
            }

            let owner = categorical_fields
                .iter()
                .filter_map(|f| {
                    column
                        .strip_prefix(*f)
                        .and_then(|rest| rest.strip_prefix(sep))
                        .map(|category| (*f, category))
                })
                .max_by_key(|(f, _)| f.len());

            match owner {
                Some((f, category)) => {
                    categorical
                        .entry(f.to_string())
                        .or_default()
                        .insert(category.to_string(), pos);
                }
                None => {
                    tracing::debug!(column = %column, "schema column not derived from any form field");
                }
            }
        }

        Self {
            width: schema.len(),
            continuous,
            categorical,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn continuous_position(&self, field: &str) -> Option<usize> {
        self.continuous.get(field).copied()
    }

    pub fn category_position(&self, field: &str, category: &str) -> Option<usize> {
        self.categorical.get(field).and_then(|m| m.get(category)).copied()
    }

    /// Positions of every known category of `field`.
    pub fn category_positions(&self, field: &str) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .categorical
            .get(field)
            .map(|m| m.values().copied().collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    pub fn align(&self, record: &RawRecord) -> Result<Alignment, ScreeningError> {
        let mut values = vec![0.0; self.width];
        let mut ignored = Vec::new();

        for (name, value) in record.iter() {
            let pos = match value {
                FieldValue::Number(v) => {
                    if !v.is_finite() {
                        return Err(ScreeningError::NonFiniteValue {
                            field: name.to_string(),
                        });
                    }
                    self.continuous_position(name).map(|i| (i, *v))
                }
                FieldValue::Category(c) => self.category_position(name, c).map(|i| (i, 1.0)),
            };
            match pos {
                Some((i, v)) => values[i] = v,
                None => ignored.push(name.to_string()),
            }
        }

        Ok(Alignment {
            vector: AlignedVector { values },
            ignored,
        })
    }
}
