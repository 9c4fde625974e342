fn main() {
    if let Err(err) = stepchart::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
