use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the events of a procedure
pub (super) fn events_bar(n_events: usize) -> ProgressBar {
    let bar = ProgressBar::new(n_events as u64).with_message("event 0");
    if let Ok(style) = ProgressStyle::default_bar()
        .template("Accumulating dose: {msg}\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")
    {
        bar.set_style(style);
    }
    bar.tick();
    bar
}
