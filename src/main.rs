use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use smartclass_downloader::auth::SessionCookies;
use smartclass_downloader::common::client::client::SmartclassClient;
use smartclass_downloader::common::logger::PrettyLogger;
use smartclass_downloader::common::naming::{video_destination, video_title};
use smartclass_downloader::common::task_board::TaskBoard;
use smartclass_downloader::downloader::{DownloadOptions, IndexTask, TaskManager};
use smartclass_downloader::post_process::ExtractorCommand;
use smartclass_downloader::{log_error, log_info, log_step, log_success, log_warning};

mod cli;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 从命令行参数生成下载选项
fn create_download_options(args: &cli::Cli) -> anyhow::Result<DownloadOptions> {
    let type_filter = args.type_filter();
    if type_filter.is_empty() {
        bail!("至少需要选择一种视频类型");
    }

    let mut extractor = match &args.extractor {
        Some(program) => ExtractorCommand::new(program, Vec::new()),
        None => ExtractorCommand::default(),
    };
    extractor.args = args.extractor_args.clone();
    debug!("幻灯片提取程序: {:?}", extractor);

    Ok(DownloadOptions {
        type_filter,
        extract_slides: !args.no_slides,
        extractor,
    })
}

/// 查询每个录播的信息并提交索引任务，返回成功提交的数量
async fn submit_videos(
    args: &cli::Cli,
    session: &SessionCookies,
    options: &DownloadOptions,
    manager: &TaskManager,
) -> anyhow::Result<usize> {
    let client = SmartclassClient::from_session(session).context("创建HTTP客户端失败")?;
    let mut submitted = 0;
    let mut seen: HashSet<String> = HashSet::new();

    if let Some(condition) = args.search_condition() {
        log_step!("搜索录播: {}", condition.title_key);
        let videos = client
            .search_video_all(&condition)
            .await
            .context("搜索录播失败")?;
        log_info!("搜索到 {} 个录播", videos.len());

        for video in videos {
            if !seen.insert(video.id.clone()) {
                continue;
            }
            let title = video_title(&video.course_name, video.start_time, video.stop_time);
            let destination = video_destination(
                &args.output_dir,
                &video.course_name,
                video.start_time,
                video.stop_time,
            );
            PrettyLogger::file_info("保存到", destination.display().to_string());

            let id = manager.submit(IndexTask::new(
                title,
                video.id.clone(),
                destination,
                session.clone(),
                options.clone(),
            ));
            info!("已提交索引任务 {}: {} ({})", id, video.id, video.title);
            submitted += 1;
        }
    }

    for video_id in &args.video_ids {
        if !seen.insert(video_id.clone()) {
            debug!("录播 {} 已在搜索结果中", video_id);
            continue;
        }
        let video_info = match client.get_video_info_by_id(video_id).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                log_warning!("找不到录播 {}", video_id);
                continue;
            }
            Err(e) => {
                error!("获取录播 {} 的信息失败: {}", video_id, e);
                log_error!("获取录播 {} 的信息失败: {}", video_id, e);
                continue;
            }
        };

        let title = video_title(
            &video_info.course_name,
            video_info.start_time,
            video_info.stop_time,
        );
        let destination = video_destination(
            &args.output_dir,
            &video_info.course_name,
            video_info.start_time,
            video_info.stop_time,
        );
        PrettyLogger::video_info(&title, video_info.segments.len());
        PrettyLogger::file_info("保存到", destination.display().to_string());

        let id = manager.submit(IndexTask::new(
            title,
            video_id.clone(),
            destination,
            session.clone(),
            options.clone(),
        ));
        info!("已提交索引任务 {}: {}", id, video_id);
        submitted += 1;
    }
    Ok(submitted)
}

// 每秒刷新一次任务面板，直到所有任务结束
async fn watch_tasks(manager: &TaskManager) {
    let mut board = TaskBoard::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let idle = manager.wait_until_idle();
    tokio::pin!(idle);

    loop {
        tokio::select! {
            _ = &mut idle => break,
            _ = ticker.tick() => board.render(&manager.snapshot()),
        }
    }
    board.render(&manager.snapshot());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);

    let options = create_download_options(&args)?;
    let session = SessionCookies::from_cookie_header(&args.base_url, &args.cookie)
        .context("Cookie 或站点地址无效")?;
    if session.cookies().is_empty() {
        warn!("未提供任何Cookie，接口大概率会拒绝请求");
    }

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("创建输出目录失败: {}", args.output_dir.display()))?;

    log_step!("查询录播信息");
    let manager = TaskManager::new(args.engine_config());
    let submitted = submit_videos(&args, &session, &options, &manager).await?;
    if submitted == 0 {
        bail!("没有可以下载的录播");
    }

    log_step!("开始下载 {} 个录播", submitted);
    watch_tasks(&manager).await;

    let failed = PrettyLogger::task_summary(&manager.snapshot());
    if failed > 0 {
        bail!("{} 个任务失败", failed);
    }

    log_info!("文件保存在 {}", display_dir(&args.output_dir));
    log_success!("{}", "下载完成！".green());
    Ok(())
}

fn display_dir(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
