use std::process;

fn main() {
    quotebook::init();

    if let Err(err) = quotebook::cli::run_cli() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
