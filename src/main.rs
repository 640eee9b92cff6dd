use anyhow::Result;
use take_exam::orchestrator::parse_args;
use take_exam::utils::logging;
use take_exam::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    // 加载配置
    let config = Config::resolve()?;

    // 初始化日志
    logging::init(&config);

    // 初始化并运行应用
    App::initialize(config).await?.run(args).await?;

    Ok(())
}
