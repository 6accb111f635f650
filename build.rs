use std::env;
use std::path::Path;

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_default();

    // 检查 micro-cap 列表是否存在
    let universe = Path::new(&manifest_dir).join("Start Your Own").join("microcap_universe.csv");
    if !universe.exists() {
        println!("cargo:warning=Start Your Own/microcap_universe.csv not found. `fetch` will load no tickers unless --universe is given.");
    }
    println!("cargo:rerun-if-changed=build.rs");
}
