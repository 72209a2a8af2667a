use annospec::cli::run_cli;
use annospec::logging::init_logging_from_env;

fn main() {
    if let Err(err) = init_logging_from_env() {
        eprintln!("Warning: {err:#}");
    }
    if let Err(err) = run_cli() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
