//! Application entry point for the bubble layout viewer.
//!
//! Sets up logging, loads the goal dataset and hands control to
//! [`Viewer`] from the `viewer` module.

mod viewer;

use bubble_core::Dataset;
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// The first command line argument, if any, is a path to a JSON goal
/// dataset; the built-in demo dataset is used otherwise or when loading
/// fails.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bubble_core=debug")),
        )
        .init();

    let dataset = match std::env::args().nth(1) {
        Some(path) => Dataset::load(&path).unwrap_or_else(|err| {
            tracing::error!(%err, %path, "falling back to the demo dataset");
            Dataset::demo()
        }),
        None => Dataset::demo(),
    };

    eframe::run_native(
        "Bubbles",
        eframe::NativeOptions::default(),
        Box::new(|_cc| Ok(Box::new(Viewer::new(dataset)))),
    )
}
