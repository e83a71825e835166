use clap::Parser;
use std::path::PathBuf;

use chrono::NaiveDate;
use smartclass_downloader::auth::session::DEFAULT_BASE_URL;
use smartclass_downloader::common::client::models::SearchCondition;
use smartclass_downloader::downloader::{EngineConfig, MediaType};

/// 智慧课堂录播下载器
#[derive(Parser, Debug)]
#[command(name = "smartclass-dl")]
#[command(version = "0.1")]
#[command(about = "下载智慧课堂录播视频，并从屏幕录像中提取幻灯片", long_about = None)]
pub struct Cli {
    /// 录播编号 (可重复指定)
    #[arg(long = "video-id", value_name = "ID", required_unless_present = "search")]
    pub video_ids: Vec<String>,

    /// 按标题关键字搜索录播，下载全部结果
    #[arg(long, value_name = "KEYWORD")]
    pub search: Option<String>,

    /// 搜索起始日期 (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "search", value_parser = parse_date)]
    pub start_date: Option<String>,

    /// 搜索结束日期 (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "search", value_parser = parse_date)]
    pub end_date: Option<String>,

    /// 登录后的Cookie字符串，如 "JSESSIONID=...; token=..."
    #[arg(long, value_name = "COOKIE")]
    pub cookie: String,

    /// 智慧课堂站点地址
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub base_url: String,

    /// 视频保存目录
    #[arg(long, value_name = "DIR")]
    #[arg(default_value = "./SmartclassDownload")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// 要下载的视频类型，逗号分隔
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    #[arg(default_value = "VGA,Video1,Video2,Video3")]
    pub types: Vec<MediaType>,

    /// 不从屏幕录像中提取幻灯片
    #[arg(long)]
    pub no_slides: bool,

    /// 幻灯片提取程序路径 (默认读取 SLIDES_EXTRACTOR_PATH)
    #[arg(long, value_name = "PATH")]
    #[arg(value_hint = clap::ValueHint::ExecutablePath)]
    pub extractor: Option<PathBuf>,

    /// 传给提取程序的额外参数 (可重复指定)
    #[arg(long = "extractor-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub extractor_args: Vec<String>,

    #[arg(long, value_name = "N", default_value_t = 2)]
    pub index_workers: usize,
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub download_workers: usize,
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub extract_workers: usize,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            index_workers: self.index_workers,
            download_workers: self.download_workers,
            extract_workers: self.extract_workers,
        }
    }

    pub fn search_condition(&self) -> Option<SearchCondition> {
        let title_key = self.search.clone()?;
        Some(SearchCondition {
            title_key,
            start_date: self.start_date.clone().unwrap_or_default(),
            end_date: self.end_date.clone().unwrap_or_default(),
            ..SearchCondition::default()
        })
    }

    // 去重并保持原有顺序
    pub fn type_filter(&self) -> Vec<MediaType> {
        let mut types = Vec::new();
        for media_type in &self.types {
            if !types.contains(media_type) {
                types.push(*media_type);
            }
        }
        types
    }
}

fn parse_date(text: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("日期格式应为 YYYY-MM-DD: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "smartclass-dl",
            "--video-id",
            "a1",
            "--video-id",
            "b2",
            "--cookie",
            "JSESSIONID=x",
            "--types",
            "VGA,Video2,VGA",
            "--no-slides",
            "--extractor-arg",
            "--dpi=150",
            "--download-workers",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.video_ids, vec!["a1", "b2"]);
        assert_eq!(cli.type_filter(), vec![MediaType::Vga, MediaType::Video2]);
        assert!(cli.no_slides);
        assert_eq!(cli.extractor_args, vec!["--dpi=150"]);
        assert_eq!(cli.engine_config().download_workers, 8);
        assert_eq!(cli.engine_config().index_workers, 2);
        assert_eq!(cli.output_dir, PathBuf::from("./SmartclassDownload"));
    }

    #[test]
    fn defaults_to_every_type() {
        let cli =
            Cli::try_parse_from(["smartclass-dl", "--video-id", "a1", "--cookie", "a=b"]).unwrap();
        assert_eq!(cli.type_filter(), MediaType::ALL.to_vec());
        assert!(!cli.no_slides);
        assert_eq!(cli.search_condition(), None);
    }

    #[test]
    fn search_replaces_video_ids() {
        let cli = Cli::try_parse_from([
            "smartclass-dl",
            "--cookie",
            "a=b",
            "--search",
            "电路",
            "--start-date",
            "2024-03-01",
        ])
        .unwrap();
        assert!(cli.video_ids.is_empty());
        let condition = cli.search_condition().unwrap();
        assert_eq!(condition.title_key, "电路");
        assert_eq!(condition.start_date, "2024-03-01");
        assert_eq!(condition.end_date, "");
        assert_eq!(condition.page_number, 1);
    }

    #[test]
    fn needs_video_id_or_search() {
        assert!(Cli::try_parse_from(["smartclass-dl", "--cookie", "a=b"]).is_err());
        assert!(
            Cli::try_parse_from([
                "smartclass-dl",
                "--cookie",
                "a=b",
                "--search",
                "x",
                "--end-date",
                "2024/03/01"
            ])
            .is_err()
        );
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(
            Cli::try_parse_from([
                "smartclass-dl",
                "--video-id",
                "a1",
                "--cookie",
                "a=b",
                "--types",
                "vga"
            ])
            .is_err()
        );
    }
}
