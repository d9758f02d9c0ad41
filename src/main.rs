use std::process;

fn main() {
    if let Err(e) = rassets::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
