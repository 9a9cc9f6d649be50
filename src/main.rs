use std::fmt::Debug;
use std::fmt::Display;

use securelex_mailer::configuration::get_configuration;
use securelex_mailer::startup::Application;
use securelex_mailer::telemetry::get_subscriber;
use securelex_mailer::telemetry::init_subscriber;
use tokio::task::JoinError;

fn report_exit(
    name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }

        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (inner)"
            )
        }

        Err(e) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (outer)"
            )
        }
    }
}

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("securelex-mailer", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;

    let server = Application::build(cfg).await?.run_until_stopped();
    report_exit("API", tokio::spawn(server).await);

    Ok(())
}
