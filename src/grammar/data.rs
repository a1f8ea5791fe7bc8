//! Data abstraction for Grammar of Graphics.
//!
//! A [`Dataset`] is an immutable, cheaply clonable sequence of [`Record`]s.
//! Derived datasets (canonical orders, group means, ellipse vertices) share
//! or copy records; nothing is ever mutated in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::{PlotError, PlotResult};

/// A value in a record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataValue {
    /// A numeric value.
    Number(f64),
    /// A text value.
    Text(String),
    /// A missing value.
    Null,
}

impl DataValue {
    /// Get as f64, or None if not a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Categorical label of this value; missing values read as `"NA"`.
    #[must_use]
    pub fn to_label(&self) -> String {
        match self {
            DataValue::Number(n) => n.to_string(),
            DataValue::Text(s) => s.clone(),
            DataValue::Null => "NA".to_string(),
        }
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Number(v)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

/// One observation: named fields in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    fields: Vec<(String, DataValue)>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<DataValue>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
        self
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate over `(name, value)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// An ordered, immutable collection of records.
///
/// Records are shared behind an [`Arc`]: cloning a dataset or deriving one
/// with [`Dataset::with_canonical_order`] never copies them.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Arc<[Record]>,
    field_names: Arc<[String]>,
    orders: BTreeMap<String, Vec<String>>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::from_records(Vec::new())
    }
}

static MISSING: DataValue = DataValue::Null;

impl Dataset {
    /// Create a dataset from records, preserving their order.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut field_names: Vec<String> = Vec::new();
        for record in &records {
            for (name, _) in record.fields() {
                if !field_names.iter().any(|f| f == name) {
                    field_names.push(name.to_string());
                }
            }
        }
        Self { records: records.into(), field_names: field_names.into(), orders: BTreeMap::new() }
    }

    /// Start a columnar builder.
    #[must_use]
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    /// Create from x and y arrays (fields `x` and `y`).
    #[must_use]
    pub fn from_xy(x: &[f64], y: &[f64]) -> Self {
        let records = x
            .iter()
            .zip(y)
            .map(|(&xv, &yv)| Record::new().with("x", xv).with("y", yv))
            .collect();
        Self::from_records(records)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Field names in first-seen order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Check if a field exists.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field_names.iter().any(|f| f == name)
    }

    fn require(&self, field: &str) -> PlotResult<()> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(PlotError::UnknownField(field.to_string()))
        }
    }

    /// Values of a field, one per record (`Null` where a record lacks it).
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::UnknownField`] if no record has the field.
    pub fn values(&self, field: &str) -> PlotResult<Vec<&DataValue>> {
        self.require(field)?;
        Ok(self.records.iter().map(|r| r.get(field).unwrap_or(&MISSING)).collect())
    }

    /// Numeric values of a field; missing values read as NaN.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is unknown or holds text.
    pub fn numeric(&self, field: &str) -> PlotResult<Vec<f64>> {
        self.values(field)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| match v {
                DataValue::Number(n) => Ok(*n),
                DataValue::Null => Ok(f64::NAN),
                DataValue::Text(_) => {
                    Err(PlotError::NonNumericValue { field: field.to_string(), row })
                }
            })
            .collect()
    }

    /// Categorical labels of a field, one per record.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::UnknownField`] if no record has the field.
    pub fn categorical(&self, field: &str) -> PlotResult<Vec<String>> {
        Ok(self.values(field)?.into_iter().map(DataValue::to_label).collect())
    }

    /// The explicit canonical order annotated for a field, if any.
    #[must_use]
    pub fn canonical_order(&self, field: &str) -> Option<&[String]> {
        self.orders.get(field).map(Vec::as_slice)
    }

    /// Distinct values of a field: canonical order when annotated, first-encountered otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::UnknownField`] if no record has the field.
    pub fn levels(&self, field: &str) -> PlotResult<Vec<String>> {
        if let Some(order) = self.canonical_order(field) {
            return Ok(order.to_vec());
        }
        Ok(first_encountered(self.categorical(field)?))
    }

    /// Partition row indices by a field's value, groups in first-encountered order.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::UnknownField`] if no record has the field.
    pub fn partition(&self, field: &str) -> PlotResult<Vec<(String, Vec<usize>)>> {
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (row, key) in self.categorical(field)?.into_iter().enumerate() {
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((key, vec![row])),
            }
        }
        Ok(groups)
    }

    /// A new dataset over the same records carrying an explicit canonical order for `field`.
    ///
    /// Palettes and legends consult this order instead of first appearance.
    /// Listed values absent from the data are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::IncompleteOrder`] if a value present in the data is
    /// not listed, or [`PlotError::UnknownField`] for an unknown field.
    pub fn with_canonical_order<I, S>(&self, field: &str, ordered: I) -> PlotResult<Dataset>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let present = first_encountered(self.categorical(field)?);
        let mut order: Vec<String> = Vec::new();
        for value in ordered {
            let value = value.into();
            if order.contains(&value) {
                continue;
            }
            if present.contains(&value) {
                order.push(value);
            } else {
                warn!(field, value = %value, "canonical order lists a value absent from the data");
            }
        }
        if let Some(missing) = present.iter().find(|v| !order.contains(v)) {
            return Err(PlotError::IncompleteOrder {
                field: field.to_string(),
                value: missing.clone(),
            });
        }
        Ok(self.with_order_annotation(field, order))
    }

    /// Copy of this dataset with a raw order annotation, no validation.
    pub(crate) fn with_order_annotation(&self, field: &str, order: Vec<String>) -> Dataset {
        let mut orders = self.orders.clone();
        orders.insert(field.to_string(), order);
        Dataset { records: Arc::clone(&self.records), field_names: Arc::clone(&self.field_names), orders }
    }

    /// Whether two datasets share the same underlying record storage.
    #[must_use]
    pub fn shares_records_with(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }
}

/// Distinct values keeping first appearance.
pub(crate) fn first_encountered<I: IntoIterator<Item = String>>(values: I) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Columnar dataset builder.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    columns: Vec<(String, Vec<DataValue>)>,
}

impl DatasetBuilder {
    /// Add a numeric column.
    #[must_use]
    pub fn numeric(mut self, name: &str, data: &[f64]) -> Self {
        self.columns.push((name.to_string(), data.iter().map(|&v| DataValue::Number(v)).collect()));
        self
    }

    /// Add a text column.
    #[must_use]
    pub fn categorical<S: AsRef<str>>(mut self, name: &str, data: &[S]) -> Self {
        self.columns.push((
            name.to_string(),
            data.iter().map(|s| DataValue::Text(s.as_ref().to_string())).collect(),
        ));
        self
    }

    /// Assemble records row by row.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::EmptyData`] without columns and
    /// [`PlotError::DataLengthMismatch`] if columns differ in length.
    pub fn build(self) -> PlotResult<Dataset> {
        if self.columns.is_empty() {
            return Err(PlotError::EmptyData);
        }
        let expected = self.columns.first().map_or(0, |(_, c)| c.len());
        if let Some((field, col)) = self.columns.iter().find(|(_, c)| c.len() != expected) {
            return Err(PlotError::DataLengthMismatch {
                field: field.clone(),
                len: col.len(),
                expected,
            });
        }

        let records = (0..expected)
            .map(|row| {
                self.columns
                    .iter()
                    .fold(Record::new(), |rec, (name, col)| rec.with(name, col[row].clone()))
            })
            .collect();
        Ok(Dataset::from_records(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vowels() -> Dataset {
        Dataset::builder()
            .numeric("F1", &[300.0, 310.0, 700.0, 650.0])
            .numeric("F2", &[2300.0, 2250.0, 1200.0, 1100.0])
            .categorical("vowel", &["i", "i", "a", "a"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_and_access() {
        let df = vowels();
        assert_eq!(df.len(), 4);
        assert!(!df.is_empty());
        assert!(df.has_field("F1"));
        assert_eq!(df.field_names(), &["F1", "F2", "vowel"]);
        assert_eq!(df.numeric("F1").unwrap(), vec![300.0, 310.0, 700.0, 650.0]);
        assert_eq!(df.categorical("vowel").unwrap(), vec!["i", "i", "a", "a"]);
    }

    #[test]
    fn test_builder_length_mismatch() {
        let err = Dataset::builder()
            .numeric("F1", &[1.0, 2.0])
            .categorical("vowel", &["i"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PlotError::DataLengthMismatch { field: "vowel".into(), len: 1, expected: 2 }
        );
        assert_eq!(Dataset::builder().build().unwrap_err(), PlotError::EmptyData);
    }

    #[test]
    fn test_unknown_field() {
        let df = vowels();
        assert_eq!(df.numeric("F3").unwrap_err(), PlotError::UnknownField("F3".into()));
        let unknown = PlotError::UnknownField("speaker".into());
        assert_eq!(df.categorical("speaker").unwrap_err(), unknown);
        assert_eq!(df.partition("speaker").unwrap_err(), unknown);
        assert_eq!(df.values("F1").unwrap().len(), df.len());
    }

    #[test]
    fn test_numeric_rejects_text() {
        let df = vowels();
        assert_eq!(
            df.numeric("vowel").unwrap_err(),
            PlotError::NonNumericValue { field: "vowel".into(), row: 0 }
        );
    }

    #[test]
    fn test_missing_values_are_nan_and_na() {
        let df = Dataset::from_records(vec![
            Record::new().with("x", 1.0).with("g", "a"),
            Record::new().with("x", DataValue::Null),
            Record::new().with("g", "b"),
        ]);
        let x = df.numeric("x").unwrap();
        assert_eq!(x[0], 1.0);
        assert!(x[1].is_nan());
        assert!(x[2].is_nan());
        assert_eq!(df.categorical("g").unwrap(), vec!["a", "NA", "b"]);
    }

    #[test]
    fn test_levels_first_encountered() {
        let df = vowels();
        assert_eq!(df.levels("vowel").unwrap(), vec!["i", "a"]);
    }

    #[test]
    fn test_with_canonical_order_shares_records() {
        let df = vowels();
        let ordered = df.with_canonical_order("vowel", ["a", "i"]).unwrap();
        assert!(ordered.shares_records_with(&df));
        assert_eq!(ordered.levels("vowel").unwrap(), vec!["a", "i"]);
        // The source is untouched.
        assert_eq!(df.levels("vowel").unwrap(), vec!["i", "a"]);
        assert!(df.canonical_order("vowel").is_none());
    }

    #[test]
    fn test_with_canonical_order_drops_absent_values() {
        let df = vowels();
        let ordered = df.with_canonical_order("vowel", ["u", "a", "a", "i"]).unwrap();
        assert_eq!(ordered.canonical_order("vowel").unwrap(), &["a", "i"]);
    }

    #[test]
    fn test_with_canonical_order_incomplete() {
        let df = vowels();
        let err = df.with_canonical_order("vowel", ["a"]).unwrap_err();
        assert_eq!(err, PlotError::IncompleteOrder { field: "vowel".into(), value: "i".into() });
    }

    #[test]
    fn test_partition() {
        let df = vowels();
        let groups = df.partition("vowel").unwrap();
        assert_eq!(groups, vec![("i".to_string(), vec![0, 1]), ("a".to_string(), vec![2, 3])]);
    }

    #[test]
    fn test_record_with_replaces() {
        let r = Record::new().with("x", 1.0).with("x", 2.0);
        assert_eq!(r.get("x"), Some(&DataValue::Number(2.0)));
        assert_eq!(r.fields().count(), 1);
    }

    #[test]
    fn test_from_xy() {
        let df = Dataset::from_xy(&[1.0, 2.0, 3.0], &[4.0, 5.0]);
        assert_eq!(df.len(), 2);
        assert_eq!(df.numeric("y").unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_data_value_labels() {
        assert_eq!(DataValue::from(300.0).to_label(), "300");
        assert_eq!(DataValue::from(2.5).to_label(), "2.5");
        assert_eq!(DataValue::from("heed").to_label(), "heed");
        assert_eq!(DataValue::Null.to_label(), "NA");
        assert_eq!(DataValue::from("x").as_f64(), None);
        assert_eq!(DataValue::from(1.0).as_str(), None);
    }
}
