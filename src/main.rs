//! Netscope - command-line entry point

use netscope::cli::{CliApp, exit_codes};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let exit_code = match CliApp::new().await {
        Ok(app) => match app.run().await {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "Command failed");
                eprintln!("Error: {:#}", e);
                exit_codes::INTERNAL_ERROR
            }
        },
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::CONFIG_ERROR
        }
    };

    std::process::exit(exit_code);
}
