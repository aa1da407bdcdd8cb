use clap::Parser;

fn main() {
    use oauth2_diesel_store::util::cli::*;

    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let opts = Options::parse();
    match run_cli_action(opts) {
        Ok(()) => println!("OK!"),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            std::process::exit(1);
        }
    }
}
