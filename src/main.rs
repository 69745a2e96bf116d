//! tern — a small self-contained web browser core.
//!
//! Headless driver: load a URL through the full pipeline (TLS, HTML, CSS,
//! layout) and emit the rendered page as text, to stdout or to a file.
//!
//! ```text
//! tern <url> [--print <path>] [--config <path>]
//! ```

mod shell;

use anyhow::{Result, bail};
use page::{Browser, Config, NullJsFactory, StdFilesystem};
use shell::TextCanvas;
use tracing_subscriber::EnvFilter;

/// Frames to pump before giving up on a load.
const MAX_FRAMES: usize = 32;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let mut url = None;
    let mut print_path = None;
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--print" => print_path = args.next(),
            "--config" => config_path = args.next(),
            "--help" | "-h" => {
                eprintln!("usage: tern <url> [--print <path>] [--config <path>]");
                return Ok(());
            }
            other if url.is_none() => url = Some(other.to_string()),
            other => bail!("unexpected argument: {other}"),
        }
    }

    let config = match config_path {
        Some(path) => Config::load(&path),
        None => Config::default(),
    };
    let url = url.unwrap_or_else(|| config.homepage.clone());

    let mut browser = Browser::new(config, Box::new(NullJsFactory), Box::new(StdFilesystem));
    browser.navigate(&url);

    // Pump the reactor until the page settles.
    let (vw, vh) = (
        browser.config.viewport_width,
        browser.config.viewport_height,
    );
    let mut canvas = TextCanvas::new(vw, vh);
    let mut frames = 0;
    while browser.render(&mut canvas) && frames < MAX_FRAMES {
        frames += 1;
        canvas = TextCanvas::new(vw, vh);
    }

    if !browser.active().title.is_empty() {
        eprintln!("title: {}", browser.active().title);
    }
    if !browser.active().status.is_empty() {
        eprintln!("status: {}", browser.active().status);
    }

    match print_path {
        Some(path) => {
            if !browser.print_to_file(&path) {
                bail!("could not write {path}");
            }
            eprintln!("printed to {path}");
        }
        None => {
            println!("{}", canvas.to_text());
        }
    }

    Ok(())
}
