use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use yks_preference_list::{build_preference_list, report, Config, PreferenceList, TableLoader};

const DEFAULT_INPUT_FILE: &str = "tablo4_01082025d.xlsx";
const DEFAULT_OUTPUT_FILE: &str = "preference_list.csv";
const DEFAULT_CONFIG_FILE: &str = "preflist.toml";
const CONFIG_ENV: &str = "YKS_PREFLIST_CONFIG";

fn load_config() -> Result<Config> {
    let config_file = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    if Path::new(&config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(&config_file)
            .with_context(|| format!("Failed to load configuration: {}", config_file))
    } else {
        Ok(Config::default())
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let matches = Command::new("yks-preference-list")
        .version("0.1.0")
        .about("Builds a ranked preference list from the YKS quota guide table")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to the quota guide spreadsheet")
                .default_value(DEFAULT_INPUT_FILE),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output CSV file")
                .default_value(DEFAULT_OUTPUT_FILE),
        )
        .get_matches();

    let input_file = matches
        .get_one::<String>("file")
        .map(String::as_str)
        .unwrap_or(DEFAULT_INPUT_FILE);
    let output_file = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(DEFAULT_OUTPUT_FILE);

    let config = load_config()?;
    info!(header = ?config.header, rank_min = config.rank_min, rank_max = config.rank_max, "configuration ready");

    println!("📂 Reading program table from: {}", input_file);
    let loader = TableLoader::new(config.header.clone(), config.sheet.clone());
    let table = loader.load_file(Path::new(input_file))?;
    println!("   ✅ Loaded {} rows, {} columns", table.rows.len(), table.columns.len());

    println!("\n🎯 Classifying programs...");
    let list = build_preference_list(&table, &config)?;

    report::generate_preference_csv(&list, Path::new(output_file))?;

    print_summary(&list, &config);
    println!("\n✅ Preference list written to: {}", output_file);
    Ok(())
}

fn print_summary(list: &PreferenceList, config: &Config) {
    let stats = &list.stats;

    println!("\n📊 SUMMARY");
    println!("==========");
    println!("Rows loaded: {}", stats.total_rows);
    println!("Program rows: {}", stats.program_rows);
    println!("Matching a category: {}", stats.categorized);
    println!(
        "Rank within {}-{}: {}",
        config.rank_min, config.rank_max, stats.in_rank_band
    );
    println!("In allowed regions: {}", stats.in_allowed_region);

    if list.entries.is_empty() {
        println!("⚠️  No programs matched every filter");
        return;
    }

    println!("\n🎓 Programs by category:");
    for (priority, label) in [
        (1, "English language teaching"),
        (2, "English translation and interpreting"),
        (3, "Linguistics"),
    ] {
        println!("   {}. {}: {}", priority, label, list.count_by_priority(priority));
    }
}
