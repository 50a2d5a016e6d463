use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use avspider::sources::javbus;
use avspider::{util, Config, HttpTransport, ScrapeError, Spider};

#[derive(Parser, Debug)]
#[command(name = "avspider", version, about = "抓取番号详情与磁力发布列表", long_about = None)]
struct Cli {
    /// 统一输出为 JSON
    #[arg(long, global = true)]
    json: bool,

    /// 输出调试日志
    #[arg(long, global = true)]
    debug: bool,

    /// 只显示无码 / 破解的发布
    #[arg(long = "uncen", short = 'u', global = true)]
    uncen: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 展示该番号的详细信息
    Detail { num: String },

    /// 列出该番号（或详情页地址）的磁力发布
    #[command(visible_alias = "ls")]
    Releases { target: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_logging(cli.debug);

    let config = Config::from_env();
    let adapter = javbus::adapter(&config).context("Javbus adapter")?;
    let transport = HttpTransport::new(&config, &adapter.host).context("HTTP client")?;
    let spider = Spider::new(transport, adapter);

    match cli.command {
        Commands::Detail { num } => {
            let pb = util::spinner(format!("{} {}", spider.adapter().name, num));
            let result = spider.fetch_detail(&num).await;
            pb.finish_and_clear();
            match result {
                Ok(detail) if cli.json => util::print_json(&detail)?,
                Ok(detail) => util::print_detail_human(&detail),
                Err(ScrapeError::NotFound(_)) => println!("{} {}", "未找到番号".red().bold(), num),
                Err(e) => return Err(e).context(format!("detail {num}")),
            }
        }
        Commands::Releases { target } => {
            let url = if target.starts_with("http://") || target.starts_with("https://") {
                target.clone()
            } else {
                spider.adapter().detail_url(&target)?.to_string()
            };
            let pb = util::spinner(format!("{} {}", spider.adapter().name, url));
            let result = spider.fetch_releases(&url).await;
            pb.finish_and_clear();
            let mut items = result.with_context(|| format!("releases {url}"))?;
            if cli.uncen {
                items.retain(|i| i.is_uncensored);
            }
            if cli.json {
                util::print_json(&items)?;
            } else {
                util::print_releases_table(&items);
            }
        }
    }
    Ok(())
}
