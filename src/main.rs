fn main() {
    if let Err(ref err) = rollovers4ynab::run() {
        eprintln!("Error: {}", err);
        for cause in err.iter().skip(1) {
            eprintln!("  Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
