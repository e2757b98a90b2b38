use std::path::Path;

pub fn run(config_path: Option<&Path>) {
    let config = super::load_config(config_path);
    let catalog = config.build_catalog().unwrap_or_else(|e| super::fail(&e));

    println!("{} techniques (index = drawn value):\n", catalog.size());
    for (i, t) in catalog.iter().enumerate() {
        println!("  {:>2}  {:<22} {:<28} {}", i, t.key, t.name, t.description);
    }
}
