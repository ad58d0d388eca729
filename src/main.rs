use keygrab::{Config, Listener};
use std::env;
use std::io;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match &*env::args().skip(1).collect::<Vec<_>>() {
        [] => Config::default(),
        [name] => Config::default().with_device_name(name.as_str()),
        _ => {
            eprintln!("usage: {} [DEVICE_NAME]", env!("CARGO_PKG_NAME"));
            return ExitCode::from(2);
        }
    };

    match Listener::new(config).run(&mut io::stdout().lock()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
