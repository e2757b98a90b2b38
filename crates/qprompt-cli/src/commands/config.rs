use std::path::Path;

use qprompt_core::QpromptConfig;

pub fn run(config_path: Option<&Path>, default: bool) {
    let mut config = if default {
        QpromptConfig::default()
    } else {
        super::load_config(config_path)
    };
    redact_api_keys(&mut config);
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn redact_api_keys(config: &mut QpromptConfig) {
    for p in &mut config.providers {
        if p.api_key.is_some() {
            p.api_key = Some("***".to_string());
        }
    }
}
