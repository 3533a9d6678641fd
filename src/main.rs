// Strength Pulse - CLI
// Loads the configured table, cleans it, then runs one analysis per subcommand.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use strength_pulse::{
    apply_business_rules, browse, class_options, class_options_by_federation, classify, compare,
    lifter_names, lifter_summary, load_csv, wilks_for_weights, AppConfig, ClassOptions,
    CleanedDataset, CompetitionRecord, ComparisonReport, LifterSummary, PeerFilter,
    ProgressionView, Sex, UserProfile, Weight, WeightClass, WeightUnit, VERSION,
};

#[derive(Parser)]
#[command(
    name = "strength-pulse",
    version = VERSION,
    about = "Powerlifting benchmarking against historical meet results"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "STRENGTH_PULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Historical results CSV (overrides [data].csv_path)
    #[arg(long, global = true, env = "STRENGTH_PULSE_DATA")]
    data: Option<PathBuf>,

    /// Print machine-readable JSON instead of a summary
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a Wilks score and its tier.
    Wilks {
        /// m or f
        sex: String,
        bodyweight: f64,
        total: f64,

        /// Bodyweight and total are in pounds
        #[arg(long, default_value_t = false)]
        lbs: bool,
    },
    /// Rank your lifts against historical peers in your estimated class.
    Compare {
        #[arg(long, default_value = "You")]
        name: String,

        #[arg(long)]
        sex: Sex,

        #[arg(long)]
        age: f64,

        #[arg(long)]
        bodyweight: f64,

        #[arg(long)]
        squat: Option<f64>,

        #[arg(long)]
        bench: Option<f64>,

        #[arg(long)]
        deadlift: Option<f64>,

        /// kg or lb (defaults to [comparison].unit)
        #[arg(long)]
        unit: Option<WeightUnit>,

        /// Restrict to these federations (repeatable)
        #[arg(long = "federation")]
        federations: Vec<String>,

        #[arg(long, default_value_t = false)]
        tested_only: bool,
    },
    /// Summarise one lifter's history, or list lifters when no name is given.
    Lifter {
        name: Option<String>,

        /// Used when listing names
        #[arg(long, default_value = "m")]
        sex: Sex,

        /// Defaults to [comparison].event
        #[arg(long)]
        event: Option<String>,

        /// date, age or weight
        #[arg(long, default_value = "date")]
        view: ProgressionView,
    },
    /// List class options per federation, or browse entries by class.
    Browse {
        #[arg(long, default_value = "m")]
        sex: Sex,

        /// Restrict to these federations (repeatable)
        #[arg(long = "federation")]
        federations: Vec<String>,

        /// e.g. 83 or 120+ (repeatable)
        #[arg(long = "weight-class")]
        weight_classes: Vec<String>,

        /// e.g. 24-34 (repeatable)
        #[arg(long = "age-class")]
        age_classes: Vec<String>,

        #[arg(long, default_value_t = false)]
        tested_only: bool,

        #[arg(long)]
        event: Option<String>,

        /// Only list the classes each federation uses
        #[arg(long, default_value_t = false)]
        options: bool,

        /// Rows to print (JSON output is never truncated)
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// Apply the business rules and report what was dropped.
    Clean {
        /// Write the cleaned records as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Wilks {
            sex,
            bodyweight,
            total,
            lbs,
        } => run_wilks(&sex, bodyweight, total, lbs, cli.json),
        Commands::Compare {
            name,
            sex,
            age,
            bodyweight,
            squat,
            bench,
            deadlift,
            unit,
            federations,
            tested_only,
        } => {
            let unit = unit.unwrap_or(config.comparison.unit);
            let profile = UserProfile {
                name,
                sex,
                age,
                bodyweight: Weight::new(bodyweight, unit),
                squat: squat.map(|v| Weight::new(v, unit)),
                bench: bench.map(|v| Weight::new(v, unit)),
                deadlift: deadlift.map(|v| Weight::new(v, unit)),
            };

            let mut query = config.comparison_query();
            if !federations.is_empty() {
                query.federations = federations;
            }
            query.tested_only |= tested_only;

            let dataset = load_dataset(&config, cli.data.as_deref())?;
            let report = compare(&dataset.records, &profile, &query)?;
            print_report(&report, cli.json)
        }
        Commands::Lifter {
            name,
            sex,
            event,
            view,
        } => {
            let event = event.unwrap_or_else(|| config.comparison.event.clone());
            let dataset = load_dataset(&config, cli.data.as_deref())?;

            match name {
                Some(name) => {
                    let summary =
                        lifter_summary(&dataset.records, &name, &event, config.persona_strategy())?;
                    print_lifter(&summary, view, cli.json)
                }
                None => {
                    let names = lifter_names(&dataset.records, sex, &event);
                    if cli.json {
                        return print_json(&names);
                    }
                    for name in &names {
                        println!("{}", name);
                    }
                    println!("\n✓ {} {} lifters ({})", names.len(), sex, event);
                    Ok(())
                }
            }
        }
        Commands::Browse {
            sex,
            federations,
            weight_classes,
            age_classes,
            tested_only,
            event,
            options,
            limit,
        } => {
            let dataset = load_dataset(&config, cli.data.as_deref())?;

            if options {
                return print_class_options(&dataset.records, &federations, cli.json);
            }

            let mut filter = PeerFilter::new(sex);
            filter.federations = federations;
            filter.tested_only = tested_only;
            filter.event = event;
            filter.age_classes = age_classes;
            filter.weight_classes = weight_classes
                .iter()
                .map(|raw| {
                    WeightClass::parse(raw)
                        .with_context(|| format!("Invalid weight class: '{}'", raw))
                })
                .collect::<Result<_>>()?;

            let selected = browse(&dataset.records, &filter)?;
            print_browse(&filter, &selected, limit, cli.json)
        }
        Commands::Clean { out } => {
            let dataset = load_dataset(&config, cli.data.as_deref())?;

            if let Some(out) = out {
                let file = std::fs::File::create(&out)
                    .with_context(|| format!("Failed to create {}", out.display()))?;
                serde_json::to_writer_pretty(file, &dataset.records)
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                log::info!("Wrote {} records to {}", dataset.records.len(), out.display());
            }

            if cli.json {
                return print_json(&dataset.summary);
            }

            println!("🧹 Cleaning Summary");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("{}", dataset.summary.summary());
            Ok(())
        }
    }
}

fn load_dataset(config: &AppConfig, data: Option<&Path>) -> Result<CleanedDataset> {
    let csv_path = match data.or(config.data.csv_path.as_deref()) {
        Some(path) => path,
        None => bail!("No data file: pass --data, set STRENGTH_PULSE_DATA, or set [data].csv_path"),
    };

    let raw = load_csv(csv_path)?;
    Ok(apply_business_rules(&raw, &config.business_rules())?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_wilks(sex: &str, bodyweight: f64, total: f64, lbs: bool, json: bool) -> Result<()> {
    let unit = WeightUnit::from_lbs_flag(lbs);
    let score = wilks_for_weights(sex, Weight::new(bodyweight, unit), Weight::new(total, unit))?;
    let tier = classify(score);

    if json {
        return print_json(&serde_json::json!({ "wilks": score, "tier": tier }));
    }

    println!("🏋️  Wilks: {:.2}", score);
    if let Some(tier) = tier {
        println!("🏅 Tier:  {}", tier);
    }
    Ok(())
}

fn print_report(report: &ComparisonReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    println!("🆚 {} vs {}", report.lifter, report.population);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "📏 Estimated class: {} kg / {}",
        report.estimated_class.weight_class, report.estimated_class.age_class
    );
    println!(
        "👥 Peers: {} ({} entries)",
        report.peer_count, report.peer_entries
    );

    println!();
    for ranking in &report.rankings {
        println!(
            "  {:<9} {:>8.1}  →  {}",
            ranking.lift.to_string(),
            ranking.value,
            ranking.ranking
        );
    }

    if let (Some(wilks), Some(tier)) = (report.wilks, report.tier) {
        println!("\n🏅 Wilks {:.2} ({})", wilks, tier);
    }

    for warning in &report.warnings {
        println!("⚠️  {}", warning);
    }

    Ok(())
}

fn print_class_options(records: &[CompetitionRecord], federations: &[String], json: bool) -> Result<()> {
    let by_federation: Vec<(String, ClassOptions)> = if federations.is_empty() {
        class_options_by_federation(records).into_iter().collect()
    } else {
        vec![(federations.join(", "), class_options(records, federations))]
    };

    if json {
        let map: serde_json::Map<String, serde_json::Value> = by_federation
            .into_iter()
            .map(|(name, options)| -> Result<(String, serde_json::Value)> {
                Ok((name, serde_json::to_value(options)?))
            })
            .collect::<Result<_>>()?;
        return print_json(&map);
    }

    println!("🏷️  Class Options");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (federation, options) in &by_federation {
        let weights: Vec<String> = options.weight_classes.iter().map(|c| c.label()).collect();
        println!("{}", federation);
        println!("  ⚖️  {}", weights.join(", "));
        println!("  🎂 {}", options.age_classes.join(", "));
    }
    Ok(())
}

fn print_browse(filter: &PeerFilter, selected: &[&CompetitionRecord], limit: usize, json: bool) -> Result<()> {
    if json {
        return print_json(&selected);
    }

    println!("🔎 {}", filter.describe());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for record in selected.iter().take(limit) {
        let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.1}", v));
        println!(
            "  {:<24} {:<6} {:<6} {:>7} {:>7}  {} {}",
            record.name,
            record.weight_class.label(),
            record.age_class,
            fmt(record.total_kg),
            fmt(record.wilks),
            record.date,
            record.meet_name
        );
    }
    if selected.len() > limit {
        println!("  … {} more", selected.len() - limit);
    }

    println!("\n✓ {} entries", selected.len());
    Ok(())
}

fn print_lifter(summary: &LifterSummary, view: ProgressionView, json: bool) -> Result<()> {
    let progression = summary.progression(view);

    if json {
        return print_json(&serde_json::json!({
            "summary": summary,
            "progression": progression,
        }));
    }

    println!("🏋️  {} ({})", summary.name, summary.event);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if summary.is_ambiguous() {
        for warning in &summary.warnings {
            println!("⚠️  {}", warning);
        }
    } else {
        println!("📅 Competitions: {}", summary.competitions);
        match summary.best_placement {
            Some(placement) => println!("🥇 Highest placement: {}", placement),
            None => println!("🥇 Highest placement: N/A"),
        }
    }

    println!();
    for point in &progression {
        let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.1}", v));
        println!(
            "  #{} {} {:<5} {:<6} {:>7} {:>7} {:>7}  {}",
            point.persona,
            point.date,
            fmt(point.age),
            fmt(point.bodyweight_kg),
            fmt(point.squat),
            fmt(point.bench),
            fmt(point.deadlift),
            point.meet
        );
    }

    Ok(())
}
