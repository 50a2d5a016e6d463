use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::types::{SubscribeScrape, VideoDetail};

/// Logs go to stderr; `RUST_LOG` wins over the `--debug` default.
pub fn init_logging(debug: bool) {
    let default = if debug { "avspider=debug" } else { "avspider=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Spinner on stderr; hidden when stderr is not a terminal.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_detail_human(detail: &VideoDetail) {
    println!("番号： {}", detail.num.bold());
    println!("标题： {}", detail.title);
    if !detail.actors.is_empty() {
        let names: Vec<&str> = detail.actors.iter().map(|a| a.name.as_str()).collect();
        println!("演员： {}", names.join(", "));
    }
    if let Some(date) = &detail.premiered {
        println!("发行： {}", date);
    }
    if let Some(cover) = &detail.cover {
        println!("封面： {}", cover);
    }
    if let Some(mins) = &detail.runtime {
        println!("时长： {} 分钟", mins);
    }
    if let Some(dir) = &detail.director {
        println!("导演： {}", dir);
    }
    if let Some(studio) = &detail.studio {
        println!("片商： {}", studio);
    }
    if let Some(publisher) = &detail.publisher {
        println!("发行商： {}", publisher);
    }
    if let Some(series) = &detail.series {
        println!("系列： {}", series);
    }
    if !detail.tags.is_empty() {
        println!("类别： {}", detail.tags.join(", "));
    }
    for url in &detail.website {
        println!("来源： {}", url.dimmed());
    }
}

fn flags(r: &SubscribeScrape) -> String {
    let mut out = Vec::new();
    if r.is_hd {
        out.push("HD".green().to_string());
    }
    if r.is_zh {
        out.push("字幕".yellow().to_string());
    }
    if r.is_uncensored {
        out.push("无码".red().to_string());
    }
    out.join(" ")
}

pub fn print_releases_table(items: &[SubscribeScrape]) {
    println!("{} {}", "共".bold(), items.len());
    if items.is_empty() {
        println!("{}", "未找到可用的磁力链接".red().bold());
        return;
    }

    let size_width = std::cmp::max("大小".len(), items.iter().map(|i| i.size.len()).max().unwrap_or(0));
    let date_width = std::cmp::max("日期".len(), items.iter().map(|i| i.publish_date.len()).max().unwrap_or(0));

    for (idx, item) in items.iter().enumerate() {
        println!(
            "{}. {:<sw$}  {:<dw$}  {} {}",
            idx + 1,
            item.size,
            item.publish_date,
            item.name,
            flags(item),
            sw = size_width,
            dw = date_width
        );
        println!("   {}", item.magnet.cyan());
    }
}
