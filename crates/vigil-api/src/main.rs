use vigil_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let app = vigil_api::setup::initialize_app(config.clone()).await?;

    vigil_api::setup::server::start_server(&config, app).await?;

    Ok(())
}
