use agility_record::adapter::StaticConfirmation;
use agility_record::integration::{run_update_session, UpdateSettings};
use agility_record::Localization;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "arb_update")]
#[command(about = "Update an agility record book from a reference configuration")]
#[command(version)]
struct Args {
    /// YAML or JSON session settings; flags below override it
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Record book to update
    #[arg(long)]
    book: Option<PathBuf>,

    /// Reference configuration (DefaultConfig or Configuration document)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Where to write the updated book; defaults to the input book
    #[arg(long)]
    output: Option<PathBuf>,

    /// Refuse deletes that would remove dog records
    #[arg(long)]
    keep_records: bool,

    /// Drop calendar entries that ended before this date (YYYY-MM-DD)
    #[arg(long)]
    trim_before: Option<NaiveDate>,
}

fn settings_from(args: Args) -> Result<UpdateSettings, String> {
    let mut settings = match &args.settings {
        Some(path) => UpdateSettings::from_path(path).map_err(|e| e.to_string())?,
        None => {
            let book = args.book.clone().ok_or_else(|| "--book is required".to_string())?;
            let reference = args
                .reference
                .clone()
                .ok_or_else(|| "--reference is required".to_string())?;
            UpdateSettings::new(book, reference)
        }
    };
    if let Some(book) = args.book {
        settings.book = book;
    }
    if let Some(reference) = args.reference {
        settings.reference = reference;
    }
    if args.output.is_some() {
        settings.output = args.output;
    }
    if args.keep_records {
        settings.confirm_deletes = false;
    }
    if args.trim_before.is_some() {
        settings.trim_calendar_before = args.trim_before;
    }
    Ok(settings)
}

fn main() -> Result<(), String> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = settings_from(Args::parse())?;
    let text = Localization::new();
    let mut confirm = StaticConfirmation::new(settings.confirm_deletes);
    let outcome = run_update_session(&settings, &text, &mut confirm, env!("CARGO_PKG_VERSION"))
        .map_err(|e| e.to_string())?;

    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }
    if !settings.confirm_deletes {
        for msg in confirm.pre_delete_messages() {
            eprintln!("skipped: {msg}");
        }
    }
    if outcome.trimmed_calendar > 0 {
        println!("Removed {} past calendar entries", outcome.trimmed_calendar);
    }
    if outcome.report.changed() {
        print!("{}", outcome.info);
    } else {
        println!("No changes");
    }
    Ok(())
}
