// End-to-end scenarios: golden values plus the CSV → cleaning → comparison pipeline.

use chrono::NaiveDate;
use std::path::PathBuf;
use strength_pulse::{
    apply_business_rules, browse, class_options_by_federation, compare, lifter_summary, load_csv,
    percentile_rank, persona_count, resolve_personas, wilks_score, AnalysisError, AppConfig,
    BusinessRules, CompetitionRecord, ComparisonQuery, Lift, PeerFilter, PersonaStrategy, Place,
    Ranking, Sex, Tested, Tier, UserProfile, Weight, WeightClass,
};

fn record(name: &str, age: f64, date: &str) -> CompetitionRecord {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    CompetitionRecord {
        name: name.to_string(),
        sex: Sex::M,
        event: "SBD".to_string(),
        equipment: Some("Raw".to_string()),
        age: Some(age),
        age_class: "20-23".to_string(),
        weight_class: WeightClass::parse("83").unwrap(),
        bodyweight_kg: Some(82.0),
        best3_squat_kg: Some(180.0),
        best3_bench_kg: Some(120.0),
        best3_deadlift_kg: Some(220.0),
        total_kg: Some(520.0),
        wilks: Some(350.0),
        place: Place::Rank(1),
        tested: Tested::Yes,
        country: Some("USA".to_string()),
        federation: "USAPL".to_string(),
        meet_name: format!("Meet {}", date),
        date,
    }
}

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("strength-pulse-{}-{}", label, std::process::id()))
}

#[test]
fn test_missing_peer_squat_counts_as_zero() {
    let peers = vec![Some(100.0), Some(150.0), Some(200.0), None];

    assert_eq!(percentile_rank(&peers, 175.0), Ranking::Ranked(75.0));
}

#[test]
fn test_shared_name_splits_into_two_personas() {
    let records = vec![
        record("A. Lifter", 20.0, "2020-01-01"),
        record("A. Lifter", 21.0, "2021-01-01"),
        record("A. Lifter", 35.0, "2019-06-01"),
    ];

    let table = resolve_personas(&records).unwrap();

    assert_eq!(table.persona_count(), 2);
    let flags: Vec<bool> = table.rows.iter().map(|r| r.new_lifter).collect();
    assert_eq!(flags, vec![false, false, true]);
    assert_eq!(persona_count(&records, "A. Lifter").unwrap(), 2);
}

#[test]
fn test_female_wilks_golden_value() {
    let score = wilks_score("f", 60.0, 300.0, false).unwrap();
    let expected = 334.466_062_587_915_1;

    assert!(((score - expected) / expected).abs() < 1e-6);
}

const CSV_HEADER: &str = "Name,Sex,Event,Equipment,Age,AgeClass,BirthYearClass,Division,BodyweightKg,WeightClassKg,Best3SquatKg,Best3BenchKg,Best3DeadliftKg,TotalKg,Place,Wilks,Tested,Country,Federation,Date,MeetName";

fn write_meet_csv(label: &str) -> PathBuf {
    let rows = [
        // Peers in the 83 kg / 24-34 class
        "Alan Peer,M,SBD,Raw,27,24-34,24-39,Open,82.1,83,150,100,190,440,2,290.1,Yes,USA,USAPL,2019-03-02,Spring Open",
        "Ben Peer,M,SBD,Raw,29,24-34,24-39,Open,81.5,83,200,130,240,570,1,377.3,Yes,USA,USAPL,2019-03-02,Spring Open",
        "Carl Peer,M,SBD,Raw,31,24-34,24-39,Open,80.9,83,170,,230,,3,,Yes,USA,USAPL,2019-03-02,Spring Open",
        "Dave Peer,M,SBD,Raw,26,24-34,24-39,Open,82.6,83,140,95,180,415,4,272.1,Yes,USA,USAPL,2019-03-02,Spring Open",
        // Heavier class, different age bucket
        "Dan Heavy,M,SBD,Raw,45,45-49,40-49,Masters,104.3,105,260,170,300,730,1,440.2,Yes,USA,USAPL,2019-03-02,Spring Open",
        // Age class missing, filled from birth-year class (so outside 24-34)
        "Eli Filled,M,SBD,Raw,30,,24-39,Open,82.4,83,140,95,180,415,5,273.5,Yes,USA,USAPL,2019-03-02,Spring Open",
        // Dropped: disqualified, too old a meet, too young, no class, foreign
        "Fred DQ,M,SBD,Raw,28,24-34,24-39,Open,82.0,83,,,,,DQ,,Yes,USA,USAPL,2019-03-02,Spring Open",
        "Gus Old,M,SBD,Raw,28,24-34,24-39,Open,82.0,83,150,100,190,440,1,290.0,Yes,USA,USAPL,2011-05-05,Old Classic",
        "Hal Kid,M,SBD,Raw,12,5-12,,Youth,50.0,52,60,40,80,180,1,160.0,Yes,USA,USAPL,2019-03-02,Spring Open",
        "Ian NoClass,M,SBD,Raw,28,24-34,24-39,Open,82.0,,150,100,190,440,1,290.0,Yes,USA,USAPL,2019-03-02,Spring Open",
        "Jon Abroad,M,SBD,Raw,28,24-34,24-39,Open,82.0,83,150,100,190,440,1,290.0,Yes,CAN,CPU,2019-03-02,Provincials",
        // Female entry, kept but outside a male comparison
        "Kim Lifter,F,SBD,Raw,28,24-34,24-39,Open,60.0,63,120,70,150,340,1,379.1,Yes,USA,USAPL,2019-03-02,Spring Open",
    ];

    let mut contents = String::from(CSV_HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');

    let path = temp_path(label);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_csv_pipeline_cleans_and_compares() {
    let path = write_meet_csv("pipeline.csv");
    let raw = load_csv(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(raw.len(), 12);

    let rules = BusinessRules {
        country: Some("USA".to_string()),
        ..Default::default()
    };
    let dataset = apply_business_rules(&raw, &rules).unwrap();

    assert_eq!(dataset.summary.kept_rows, 7);
    assert_eq!(dataset.summary.dropped_disqualified, 1);
    assert_eq!(dataset.summary.dropped_before_min_year, 1);
    assert_eq!(dataset.summary.dropped_age, 1);
    assert_eq!(dataset.summary.dropped_no_weight_class, 1);
    assert_eq!(dataset.summary.dropped_country, 1);
    assert_eq!(dataset.summary.age_class_filled, 1);

    let profile = UserProfile {
        name: "Visitor".to_string(),
        sex: Sex::M,
        age: 28.0,
        bodyweight: Weight::lb(180.0),
        squat: Some(Weight::lb(385.0)),
        bench: Some(Weight::lb(264.0)),
        deadlift: Some(Weight::lb(484.0)),
    };
    let report = compare(&dataset.records, &profile, &ComparisonQuery::default()).unwrap();

    // 180 lb = 81.8 kg, closest to Alan (82.1) in 83; age 28 ties Alan and Ben, first wins
    assert_eq!(report.estimated_class.weight_class.label(), "83");
    assert_eq!(report.estimated_class.age_class, "24-34");
    assert_eq!(report.peer_count, 4);

    // Squat 175 kg against 150, 200, 170, 140 (Eli's filled class keeps him out)
    let squat = report.ranking(Lift::Squat).unwrap();
    assert!((squat.value - 175.0).abs() < 1e-9);
    assert_eq!(squat.ranking, Ranking::Ranked(75.0));

    // Bench 120 kg against 100, 130, missing (0), 95
    let bench = report.ranking(Lift::Bench).unwrap();
    assert_eq!(bench.ranking, Ranking::Ranked(75.0));

    let total = report.ranking(Lift::Total).unwrap();
    assert!((total.value - 515.0).abs() < 1e-9);

    assert_eq!(report.tier, Some(Tier::Intermediate));
    assert!(report.warnings.is_empty());
}

#[test]
fn test_pipeline_reports_empty_population() {
    let path = write_meet_csv("empty.csv");
    let raw = load_csv(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let dataset = apply_business_rules(&raw, &BusinessRules::default()).unwrap();

    let profile = UserProfile {
        name: "Visitor".to_string(),
        sex: Sex::Mx,
        age: 28.0,
        bodyweight: Weight::kg(80.0),
        squat: Some(Weight::kg(150.0)),
        bench: None,
        deadlift: None,
    };

    assert!(matches!(
        compare(&dataset.records, &profile, &ComparisonQuery::default()),
        Err(AnalysisError::NoMatchingPopulation(_))
    ));
}

#[test]
fn test_config_drives_pipeline() {
    let config = AppConfig::from_toml(
        r#"
        [data]
        country = "USA"

        [persona]
        strategy = "age_date_delta"
        threshold = 1

        [comparison]
        grouping = "name"
        federations = ["USAPL"]
        "#,
    )
    .unwrap();

    let path = write_meet_csv("config.csv");
    let raw = load_csv(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let dataset = apply_business_rules(&raw, &config.business_rules()).unwrap();
    assert_eq!(dataset.summary.dropped_country, 1);

    let summary = lifter_summary(
        &dataset.records,
        "Ben Peer",
        &config.comparison.event,
        config.persona_strategy(),
    )
    .unwrap();
    assert_eq!(summary.competitions, 1);
    assert_eq!(summary.personas.strategy, PersonaStrategy::AgeDateDelta { threshold: 1 });
    assert_eq!(summary.best_placement.map(|p| p.rank), Some(1));
    assert!(!summary.best_placement.unwrap().sole_entrant);
}

#[test]
fn test_browse_cleaned_table_by_class() {
    let path = write_meet_csv("browse.csv");
    let raw = load_csv(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let dataset = apply_business_rules(&raw, &BusinessRules::default()).unwrap();

    let by_federation = class_options_by_federation(&dataset.records);
    let usapl = &by_federation["USAPL"];
    let labels: Vec<String> = usapl.weight_classes.iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["83", "105", "63"]);
    assert_eq!(usapl.age_classes, vec!["24-34", "45-49", "24-39"]);
    assert!(by_federation.contains_key("CPU"));

    let mut filter = PeerFilter::new(Sex::M);
    filter.federations = vec!["USAPL".to_string()];
    filter.weight_classes = vec![WeightClass::parse("83").unwrap()];
    filter.age_classes = vec!["24-34".to_string()];

    let names: Vec<&str> = browse(&dataset.records, &filter)
        .unwrap()
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alan Peer", "Ben Peer", "Carl Peer", "Dave Peer"]);

    filter.weight_classes = vec![WeightClass::parse("52").unwrap()];
    assert!(matches!(
        browse(&dataset.records, &filter),
        Err(AnalysisError::InvalidArgument(_))
    ));
}
