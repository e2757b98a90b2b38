use std::path::Path;

use qprompt_core::CancelToken;

pub fn run(config_path: Option<&Path>, min: i64, max: i64, count: usize) {
    let config = super::load_config(config_path);
    let (manager, _) = super::make_runtime(&config);

    let cancel = CancelToken::new();
    let c = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || c.cancel()) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    let results = if config.parallel_draws {
        manager.draw_many_parallel(count, min, max, &cancel)
    } else {
        manager.draw_many_cancellable(count, min, max, &cancel)
    }
    .unwrap_or_else(|e| super::fail(&e));

    for r in &results {
        println!("{:>20}  {}", r.value, r.source_name);
    }
}
