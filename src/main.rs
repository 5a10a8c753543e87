fn main() {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[L10n] failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(l10n_lib::run()) {
        eprintln!("[L10n] {}", e);
        std::process::exit(1);
    }
}
