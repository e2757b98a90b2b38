use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use qprompt_core::export::{default_export_file_name, to_json, write_document};
use qprompt_core::{CancelToken, EntropySourceManager, Generation, Variation, VariationGenerator};

pub struct GenerateCommandConfig<'a> {
    pub config_path: Option<&'a Path>,
    pub prompt: &'a str,
    pub count: usize,
    pub parallel: bool,
    pub output: Option<&'a Path>,
    pub save: bool,
    pub json: bool,
}

pub fn run(cfg: GenerateCommandConfig<'_>) {
    let mut config = super::load_config(cfg.config_path);
    config.parallel_draws |= cfg.parallel;
    let (manager, catalog) = super::make_runtime(&config);

    let cancel = CancelToken::new();
    let c = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || c.cancel()) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    if !cfg.json {
        println!(
            "Drawing {} technique indices from {} provider(s)...",
            cfg.count,
            manager.provider_count()
        );
    }

    let generation = VariationGenerator::new(&manager, &catalog)
        .with_parallel_draws(config.parallel_draws)
        .generate_report(cfg.prompt, cfg.count, &cancel)
        .unwrap_or_else(|e| super::fail(&e));

    if cfg.json {
        let json = to_json(&generation).unwrap_or_else(|e| super::fail(&e));
        println!("{json}");
    } else {
        print_generation(&generation, &manager);
    }

    if let Some(path) = export_path(cfg.output, cfg.save) {
        write_document(&path, &generation.variations).unwrap_or_else(|e| super::fail(&e));
        eprintln!("Saved {} variations to {}", generation.variations.len(), path.display());
    }
}

/// Where to write the text export, if anywhere.
fn export_path(output: Option<&Path>, save: bool) -> Option<PathBuf> {
    if let Some(path) = output {
        return Some(path.to_path_buf());
    }
    if save {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        return Some(PathBuf::from(default_export_file_name(secs)));
    }
    None
}

fn print_generation(generation: &Generation, manager: &EntropySourceManager) {
    println!();
    println!(
        "Generated {} quantum-optimized variations",
        generation.variations.len()
    );
    let powered_by: Vec<String> = generation
        .sources_used()
        .into_iter()
        .map(|name| match manager.provider_info(name) {
            Some(info) => format!("{name} ({})", info.description),
            None => name.to_string(),
        })
        .collect();
    println!("Powered by: {}", powered_by.join(", "));

    for v in &generation.variations {
        println!();
        println!("{}", variation_header(v));
        println!("{}", v.text);
    }
}

/// Heading line for one variation. `index` is already 1-based.
fn variation_header(v: &Variation) -> String {
    format!(
        "── Variation {}: {} ──  [{} · {}]",
        v.index,
        v.technique_name,
        super::badge(v.quantum_verified),
        v.source_name
    )
}
