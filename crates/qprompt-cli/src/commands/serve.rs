use std::path::Path;
use std::sync::Arc;

pub fn run(config_path: Option<&Path>, host: &str, port: u16) {
    let config = super::load_config(config_path);
    let (manager, catalog) = super::make_runtime(&config);
    let manager = Arc::new(manager);
    let catalog = Arc::new(catalog);

    let base = format!("http://{host}:{port}");
    println!("qprompt server v{}", qprompt_core::VERSION);
    println!("   {base}");
    println!(
        "   {} provider(s): {}",
        manager.provider_count(),
        manager.provider_names().join(" → ")
    );
    println!("   {} techniques", catalog.size());
    println!();
    println!("   Endpoints:");
    println!("     GET  /                     API index");
    println!("     POST /api/v1/generate      {{\"prompt\": \"...\", \"count\": 5}}");
    println!("     GET  /techniques           Technique catalog");
    println!("     GET  /providers            Provider health");
    println!("     GET  /health               Server health check");
    println!();
    println!("   Example:");
    println!(
        "     curl -X POST {base}/api/v1/generate -H 'content-type: application/json' \\"
    );
    println!("          -d '{{\"prompt\": \"Explain quantum computing\", \"count\": 3}}'");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    let served = rt.block_on(qprompt_server::run_server(
        Arc::clone(&manager),
        Arc::clone(&catalog),
        config.parallel_draws,
        host,
        port,
    ));
    drop(rt);

    if let Err(e) = served {
        eprintln!("Error: server on {base} failed: {e}");
        std::process::exit(1);
    }
}
