fn main() {
    if let Err(err) = purrchat::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
