// 🔎 Explorer - Browse the cleaned table by class
// Lists the weight/age classes a federation actually uses, then pulls the
// entries matching a sex / federation / class selection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AnalysisError, AnalysisResult};
use crate::matcher::PeerFilter;
use crate::records::{CompetitionRecord, WeightClass};

// ============================================================================
// CLASS OPTIONS
// ============================================================================

/// Distinct classes in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassOptions {
    pub weight_classes: Vec<WeightClass>,
    pub age_classes: Vec<String>,
}

impl ClassOptions {
    fn absorb(&mut self, record: &CompetitionRecord) {
        if !self.weight_classes.contains(&record.weight_class) {
            self.weight_classes.push(record.weight_class.clone());
        }
        if !record.age_class.is_empty() && !self.age_classes.contains(&record.age_class) {
            self.age_classes.push(record.age_class.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weight_classes.is_empty() && self.age_classes.is_empty()
    }
}

fn in_federations(federations: &[String], record: &CompetitionRecord) -> bool {
    federations.is_empty()
        || federations
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&record.federation))
}

/// Classes used by `federations` (every federation when empty).
pub fn class_options(records: &[CompetitionRecord], federations: &[String]) -> ClassOptions {
    let mut options = ClassOptions::default();
    for record in records.iter().filter(|r| in_federations(federations, r)) {
        options.absorb(record);
    }
    options
}

/// Class options keyed by federation name.
pub fn class_options_by_federation(records: &[CompetitionRecord]) -> BTreeMap<String, ClassOptions> {
    let mut by_federation: BTreeMap<String, ClassOptions> = BTreeMap::new();
    for record in records {
        by_federation
            .entry(record.federation.clone())
            .or_default()
            .absorb(record);
    }
    by_federation
}

// ============================================================================
// BROWSE
// ============================================================================

/// Entries matching `filter`, in table order.
///
/// Requested classes must be offered by the filter's federations; an unknown
/// class is an `InvalidArgument` rather than a silently empty result.
pub fn browse<'a>(
    records: &'a [CompetitionRecord],
    filter: &PeerFilter,
) -> AnalysisResult<Vec<&'a CompetitionRecord>> {
    let options = class_options(records, &filter.federations);

    if let Some(unknown) = filter
        .weight_classes
        .iter()
        .find(|c| !options.weight_classes.contains(c))
    {
        return Err(AnalysisError::invalid(format!(
            "weight class {} is not used by {}",
            unknown,
            filter.describe()
        )));
    }

    if let Some(unknown) = filter
        .age_classes
        .iter()
        .find(|c| !options.age_classes.contains(c))
    {
        return Err(AnalysisError::invalid(format!(
            "age class {} is not used by {}",
            unknown,
            filter.describe()
        )));
    }

    let selected = filter.apply(records);
    log::debug!("Browse {}: {} of {} entries", filter.describe(), selected.len(), records.len());
    Ok(selected)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::tests::create_test_record;
    use crate::records::Sex;

    fn entry(name: &str, federation: &str, class: &str, age_class: &str, sex: Sex) -> CompetitionRecord {
        let mut record = create_test_record(name, 30.0, "2019-03-02");
        record.federation = federation.to_string();
        record.weight_class = WeightClass::parse(class).unwrap();
        record.age_class = age_class.to_string();
        record.sex = sex;
        record
    }

    fn table() -> Vec<CompetitionRecord> {
        vec![
            entry("Alan", "USAPL", "83", "24-34", Sex::M),
            entry("Ben", "USAPL", "93", "24-34", Sex::M),
            entry("Cara", "USAPL", "63", "35-39", Sex::F),
            entry("Dan", "RPS", "120+", "40-44", Sex::M),
            entry("Eve", "RPS", "83", "24-34", Sex::M),
        ]
    }

    fn labels(options: &ClassOptions) -> Vec<String> {
        options.weight_classes.iter().map(|c| c.label()).collect()
    }

    #[test]
    fn test_class_options_for_all_federations() {
        let options = class_options(&table(), &[]);

        assert_eq!(labels(&options), vec!["83", "93", "63", "120+"]);
        assert_eq!(options.age_classes, vec!["24-34", "35-39", "40-44"]);
    }

    #[test]
    fn test_class_options_for_selected_federation() {
        let options = class_options(&table(), &["rps".to_string()]);

        assert_eq!(labels(&options), vec!["120+", "83"]);
        assert_eq!(options.age_classes, vec!["40-44", "24-34"]);
        assert!(class_options(&table(), &["IPF".to_string()]).is_empty());
    }

    #[test]
    fn test_class_options_by_federation() {
        let by_federation = class_options_by_federation(&table());

        let names: Vec<&String> = by_federation.keys().collect();
        assert_eq!(names, vec!["RPS", "USAPL"]);
        assert_eq!(labels(&by_federation["USAPL"]), vec!["83", "93", "63"]);
        assert_eq!(by_federation["RPS"].age_classes, vec!["40-44", "24-34"]);
    }

    #[test]
    fn test_browse_by_class() {
        let records = table();
        let mut filter = PeerFilter::new(Sex::M);
        filter.weight_classes = vec![WeightClass::parse("83").unwrap()];
        filter.age_classes = vec!["24-34".to_string()];

        let names: Vec<&str> = browse(&records, &filter)
            .unwrap()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alan", "Eve"]);

        filter.federations = vec!["USAPL".to_string()];
        assert_eq!(browse(&records, &filter).unwrap().len(), 1);
    }

    #[test]
    fn test_browse_rejects_class_outside_federation() {
        let records = table();
        let mut filter = PeerFilter::new(Sex::M);
        filter.federations = vec!["USAPL".to_string()];
        filter.weight_classes = vec![WeightClass::parse("120+").unwrap()];

        assert!(matches!(
            browse(&records, &filter),
            Err(AnalysisError::InvalidArgument(_))
        ));

        filter.weight_classes.clear();
        filter.age_classes = vec!["40-44".to_string()];
        assert!(matches!(
            browse(&records, &filter),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_browse_without_classes_is_the_plain_filter() {
        let records = table();
        let filter = PeerFilter::new(Sex::F);

        let selected = browse(&records, &filter).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Cara");
    }
}
