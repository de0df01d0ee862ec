use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skindose::{
    config::Settings,
    dose::{Driver, DoseReport, Options},
    event::EventTable,
    io::{raw, report::Summary},
    phantom::StlDirectory,
    scene::Scene,
    store::CorrectionTables,
    utils::{group_digits, timing::Progress},
    Error, Result,
};

mod cli;
mod progress;

use cli::{Cli, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Calculate { settings, events, output, report, no_geometry_reuse } =>
            calculate(&settings, &events, &output, report.as_deref(), !no_geometry_reuse),
        Command::Phantom { settings, output } =>
            phantom(&settings, &output),
    }
}

fn calculate(settings: &Path, events: &Path, output: &Path, report: Option<&Path>, reuse_geometry: bool) -> Result<()> {
    let mut progress = Progress::new();

    // --- Read inputs ---------------------------------------------------------------
    progress.start("Reading settings, events and lookup tables");
    let settings = Settings::read(settings)?;
    let events = EventTable::read(events, &settings.normalization)?;
    let store = match &settings.corrections.lookup {
        Some(path) => CorrectionTables::read(path)?,
        None       => CorrectionTables::default(),
    };
    progress.done();
    info!(events = events.len(), "read event table");

    // --- Build the scene -----------------------------------------------------------
    progress.start("Building phantoms");
    let meshes = StlDirectory::new(&settings.phantom.mesh_directory);
    let mut scene = Scene::new(&settings.phantom, &meshes)?;
    progress.done_with_message(&format!("{} patient cells", group_digits(scene.patient.len())));

    // --- Accumulate dose -----------------------------------------------------------
    let options = Options { table_correction: settings.corrections.table_correction(), reuse_geometry };
    let bar = progress::events_bar(events.len());
    let mut driver = Driver::new(&mut scene, &events, &store, options);
    let mut results = Vec::with_capacity(events.len());
    for result in driver.by_ref() {
        let result = result?;
        bar.set_message(format!("event {}", result.index));
        bar.inc(1);
        results.push(result);
    }
    bar.finish_with_message("done");
    let (dose_map, fallbacks) = driver.finish();
    fallbacks.log();
    let dose = DoseReport { dose_map, events: results, fallbacks };

    // --- Write outputs -------------------------------------------------------------
    progress.start("Writing dose map");
    raw::write_dose_map(&dose.dose_map, output)
        .map_err(|source| Error::Output { path: output.into(), source })?;
    progress.done();
    if let Some(path) = report {
        Summary::from(&dose).write(path)?;
    }
    let peak = dose.dose_map.fold(0.0, |a: f32, &b| a.max(b));
    println!("Peak skin dose: {peak:.2} mGy");
    Ok(())
}

fn phantom(settings: &Path, output: &Path) -> Result<()> {
    let settings = Settings::read(settings)?;
    let meshes = StlDirectory::new(&settings.phantom.mesh_directory);
    let scene = Scene::new(&settings.phantom, &meshes)?;
    raw::write_points(scene.patient.cells(), output)
        .map_err(|source| Error::Output { path: output.into(), source })?;
    println!("Wrote {} cells to {}", group_digits(scene.patient.len()), output.display());
    Ok(())
}
