use anyhow::Result;
use invoice_checker::utils::logging;
use invoice_checker::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;
    config.validate()?;

    // 初始化日志
    logging::init(&config.debug_log_file)?;

    // 初始化并运行应用
    let _stats = App::initialize(config).await?.run().await?;

    Ok(())
}
