use std::path::PathBuf;

/// Command line interface for `skindose` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "skindose",
    about = "Skin dose maps from fluoroscopy irradiation event reports",
)]
pub (super) struct Cli {
    #[clap(subcommand)]
    pub (super) command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub (super) enum Command {

    /// Accumulate the dose of every event onto the patient phantom
    Calculate {
        /// TOML file describing phantom, corrections and normalization
        #[clap(short, long)]
        settings: PathBuf,

        /// TOML file containing the irradiation events
        #[clap(short, long)]
        events: PathBuf,

        /// Dose map output: one little-endian f32 per patient cell, in mGy
        #[clap(short, long)]
        output: PathBuf,

        /// Per-event summary, written as TOML
        #[clap(short, long)]
        report: Option<PathBuf>,

        /// Recompute the geometry of every event, even when unchanged
        #[clap(long)]
        no_geometry_reuse: bool,
    },

    /// Write the patient phantom's cells, as placed on the table
    Phantom {
        /// TOML file describing the phantom
        #[clap(short, long)]
        settings: PathBuf,

        /// Output: x, y, z (cm) of each cell as little-endian f32
        #[clap(short, long)]
        output: PathBuf,
    },
}
