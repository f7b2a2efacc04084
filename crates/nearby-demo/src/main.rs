#![forbid(unsafe_code)]

//! Store finder demo binary entry point.

use std::io::{self, Write};

use nearby_demo::app::DemoApp;
use nearby_demo::cli;

fn main() {
    let opts = cli::Opts::parse();

    if opts.json_logs && !nearby_core::logging::init() {
        eprintln!("Logging was already initialized");
    }

    let mut app = match DemoApp::from_opts(&opts) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = app.run(&mut out).and_then(|()| out.flush()) {
        eprintln!("Output error: {e}");
        std::process::exit(1);
    }
}
