use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use order_core::{FormOptions, LabEntryForm};
use shared::domain::PatientId;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod config;
mod controller;
mod scenario;

use backend_bridge::{commands::BackendCommand, runtime};
use config::load_settings;
use controller::{driver::FormDriver, events::UiEvent};
use scenario::Scenario;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "lab_entry.toml")]
    config: PathBuf,
    #[arg(long)]
    scenario: PathBuf,
    #[arg(long)]
    patient_id: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let scenario = Scenario::load(&args.scenario)?;
    let patient_id = args
        .patient_id
        .or_else(|| scenario.patient_id.clone())
        .unwrap_or_else(|| settings.patient_id.clone());

    let mut options = FormOptions::new(
        PatientId::new(patient_id),
        settings.concept_representation.clone(),
    );
    options.locale = settings.locale.clone();
    options.order_created_message = settings.order_created_message.clone();

    let (form, initial) = LabEntryForm::new(scenario.orderables.clone(), options)
        .context("No Lab Orderables was found")?;

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(settings.command_queue_capacity);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(settings.event_queue_capacity);
    let worker = runtime::launch(cmd_rx, ui_tx, scenario.fixtures());

    let mut driver = FormDriver::start(form, initial, cmd_tx, ui_rx)?;
    for step in &scenario.steps {
        if let Some(event) = step.to_event(driver.form()) {
            driver.interact(event)?;
        }
    }

    let form = driver.form();
    let (category_id, category_name) = form.active_category();
    println!("active category: {category_name} ({category_id})");
    println!("lab form: {}", serde_json::to_string_pretty(&form.field_set())?);
    println!("drafts: {}", serde_json::to_string_pretty(&form.draft_list())?);
    for toast in driver.toasts() {
        println!("toast [{:?}]: {}", toast.kind, toast.message);
    }
    for err in driver.errors() {
        println!("error [{:?}]: {}", err.category(), err.message());
    }
    println!("selected order resets: {}", driver.selected_order_resets());
    if !driver.status().is_empty() {
        println!("status: {}", driver.status());
    }

    drop(driver);
    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }

    Ok(())
}
