use shortspace::config;
use shortspace::runtime;
use shortspace::system::logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = config::init_config();
    let _guard = logging::init_logging(config);

    runtime::server::run_server().await
}
