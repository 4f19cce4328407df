use std::collections::HashMap;

use super::{collapse, MODELED_COLUMNS};
use crate::domain::Field;
use crate::pipeline::ingestion::{RawRecord, RawValue};

/// Column lookup plan for one header row.
///
/// Every field maps to the column positions worth trying, already in
/// resolution order: candidate by candidate, and within a candidate exact
/// matches, then whitespace-collapsed, then case-insensitive. A row only has
/// to pick the first populated position.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    columns: Vec<String>,
    lookups: HashMap<Field, Vec<usize>>,
    unmodeled: Vec<usize>,
}

fn push_matches(order: &mut Vec<usize>, hits: impl Iterator<Item = bool>) {
    for (index, hit) in hits.enumerate() {
        if hit && !order.contains(&index) {
            order.push(index);
        }
    }
}

impl ColumnLayout {
    pub fn new<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(str::to_string).collect();
        let collapsed: Vec<String> = columns.iter().map(|column| collapse(column)).collect();
        let lowered: Vec<String> = collapsed.iter().map(|column| column.to_lowercase()).collect();

        let mut lookups = HashMap::new();
        for field in Field::all() {
            let mut order = Vec::new();
            for candidate in field.columns() {
                let wanted = collapse(candidate);
                let wanted_lower = wanted.to_lowercase();
                push_matches(&mut order, columns.iter().map(|column| column == candidate));
                push_matches(&mut order, collapsed.iter().map(|column| *column == wanted));
                push_matches(&mut order, lowered.iter().map(|column| *column == wanted_lower));
            }
            if !order.is_empty() {
                lookups.insert(field, order);
            }
        }

        let unmodeled = lowered
            .iter()
            .enumerate()
            .filter(|(_, column)| !MODELED_COLUMNS.contains(column.as_str()))
            .map(|(index, _)| index)
            .collect();

        Self {
            columns,
            lookups,
            unmodeled,
        }
    }

    pub fn for_record(record: &RawRecord) -> Self {
        Self::new(record.columns())
    }

    /// True when the record carries exactly this header.
    pub fn fits(&self, record: &RawRecord) -> bool {
        self.columns.len() == record.fields.len()
            && self.columns.iter().zip(record.columns()).all(|(ours, theirs)| ours == theirs)
    }

    pub fn resolve<'a>(&self, record: &'a RawRecord, field: Field) -> Option<&'a RawValue> {
        self.lookups
            .get(&field)?
            .iter()
            .filter_map(|&index| record.fields.get(index).map(|(_, value)| value))
            .find(|value| !value.is_blank())
    }

    /// Cells in columns the catalog does not model, blanks included.
    pub fn unmodeled<'a>(&'a self, record: &'a RawRecord) -> impl Iterator<Item = &'a (String, RawValue)> + 'a {
        self.unmodeled.iter().filter_map(|&index| record.fields.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Metric, TextField};

    #[test]
    fn earlier_candidate_beats_closer_spelling_of_later_one() {
        let record = RawRecord::new("a.csv", 2)
            .with("ROE", "11")
            .with("roe ann %", "17");
        let layout = ColumnLayout::for_record(&record);
        assert_eq!(
            layout.resolve(&record, Field::Metric(Metric::Roe)),
            Some(&RawValue::from("17"))
        );
    }

    #[test]
    fn reused_for_rows_with_the_same_header_only() {
        let first = RawRecord::new("a.csv", 2).with("NSE Code ", "ACME").with("Note", "x");
        let second = RawRecord::new("a.csv", 3).with("NSE Code ", "ZED").with("Note", "");
        let other = RawRecord::new("b.csv", 2).with("NSE Code", "ZED");

        let layout = ColumnLayout::for_record(&first);
        assert!(layout.fits(&second));
        assert!(!layout.fits(&other));
        assert_eq!(
            layout.resolve(&second, Field::Text(TextField::NseCode)),
            Some(&RawValue::from("ZED"))
        );
        let extras: Vec<&str> = layout.unmodeled(&first).map(|(column, _)| column.as_str()).collect();
        assert_eq!(extras, vec!["Note"]);
    }
}
