use anyhow::Result;
use studypal::utils::logging;
use studypal::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置：studypal.toml（如存在）→ 环境变量覆盖
    let config = Config::load("studypal.toml")?;

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
