#[tokio::main]
async fn main() {
    if let Err(e) = soilsense::run().await {
        eprintln!("soilsense: {e}");
        std::process::exit(1);
    }
}
