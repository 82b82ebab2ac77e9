use timetable_generator::config::ServerConfig;
use timetable_generator::server;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = match ServerConfig::from_env() {
        Ok(config) => server::run_server(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
