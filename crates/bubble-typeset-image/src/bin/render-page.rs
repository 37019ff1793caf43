use std::env;
use std::path::Path;
use std::process::ExitCode;

use bubble_typeset::{StyleConfig, TextArea};
use bubble_typeset_image::{compose_page_with_backend, MonoFontBackend, TtfFontBackend};
use bubble_typeset_render::RenderPage;

#[derive(Clone, Debug)]
struct Args {
    page_path: String,
    areas_path: String,
    out_path: String,
    style_path: Option<String>,
    links_path: Option<String>,
    mono: bool,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;

    let style = match &cli.style_path {
        Some(path) => StyleConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => StyleConfig::default(),
    };
    let areas = load_areas(&cli.areas_path)?;
    log::info!("loaded {} text areas from {}", areas.len(), cli.areas_path);

    let mut canvas = image::open(&cli.page_path)
        .map_err(|e| format!("cannot open page image '{}': {}", cli.page_path, e))?
        .to_rgba8();

    let page = if cli.mono {
        compose_page_with_backend(&mut canvas, &areas, &style, MonoFontBackend)
    } else {
        let backend = TtfFontBackend::from_style(&style);
        compose_page_with_backend(&mut canvas, &areas, &style, backend)
    };
    for skipped in &page.skipped {
        eprintln!("warning: text area {} skipped: {}", skipped.area_index, skipped.error);
    }

    ensure_parent_dir(&cli.out_path)?;
    canvas
        .save(&cli.out_path)
        .map_err(|e| format!("cannot write '{}': {}", cli.out_path, e))?;

    if let Some(links_path) = &cli.links_path {
        write_links(&page, links_path)?;
    }

    println!(
        "rendered {} of {} text areas ({} skipped, {} hyperlinks) -> {}",
        page.layers.len(),
        areas.len(),
        page.skipped.len(),
        page.hyperlinks.len(),
        cli.out_path
    );
    Ok(())
}

fn load_areas(path: &str) -> Result<Vec<TextArea>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read areas file '{}': {}", path, e))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid areas file '{}': {}", path, e))
}

fn write_links(page: &RenderPage, path: &str) -> Result<(), String> {
    let json = page.hyperlinks_json().map_err(|e| e.to_string())?;
    ensure_parent_dir(path)?;
    std::fs::write(path, json).map_err(|e| format!("cannot write '{}': {}", path, e))
}

fn ensure_parent_dir(path: &str) -> Result<(), String> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let mut positional = Vec::new();
    let mut out_path = None;
    let mut style_path = None;
    let mut links_path = None;
    let mut mono = false;

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--out requires a value".to_string())?;
                out_path = Some(v.clone());
                i += 2;
            }
            "--style" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--style requires a value".to_string())?;
                style_path = Some(v.clone());
                i += 2;
            }
            "--links" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--links requires a value".to_string())?;
                links_path = Some(v.clone());
                i += 2;
            }
            "--mono" => {
                mono = true;
                i += 1;
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{}'", other));
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let [page_path, areas_path]: [String; 2] = positional
        .try_into()
        .map_err(|_| "expected <page-image> and <areas.json>".to_string())?;
    let out_path = out_path.ok_or_else(|| "--out is required".to_string())?;
    if out_path.is_empty() {
        return Err("--out must not be empty".to_string());
    }

    Ok(Args {
        page_path,
        areas_path,
        out_path,
        style_path,
        links_path,
        mono,
    })
}

fn help_text() -> &'static str {
    "usage: render-page <page-image> <areas.json> --out <out.png> [options]

Lays out the text areas described in <areas.json> and composites them onto
the page image.

options:
  --out <path>      output image (format from extension)
  --style <path>    style config JSON (font files per role, colors)
  --links <path>    write hyperlink rectangles as JSON
  --mono            ignore font files and use the built-in mono faces
  -h, --help        show this help"
}
