fn main() {
    if let Err(error) = segpreview::run_cli() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
