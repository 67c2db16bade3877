//! # photo-triage CLI
//!
//! Command-line interface for the photo triage engine.
//!
//! ## Usage
//! ```bash
//! photo-triage scan ~/Photos --mode combined
//! photo-triage scan ~/Photos --resume --output json
//! photo-triage clear-cache ~/Photos
//! ```

mod cli;

use photo_triage::Result;

fn main() -> Result<()> {
    photo_triage::init_tracing();
    cli::run()
}
