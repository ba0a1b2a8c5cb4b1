use anyhow::Context;

use k6svc_core::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("failed to process env vars")?;

    k6svc_observability::init(config.env);

    k6svc_api::server::run(config).await
}
