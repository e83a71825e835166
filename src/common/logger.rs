use colored::*;

use crate::downloader::models::{TaskStatus, TaskView};

use super::task_board::format_duration;

/// 命令行输出工具，和 tracing 日志分开，只面向使用者
pub struct PrettyLogger;

impl PrettyLogger {
    pub fn success(message: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), message.as_ref());
    }

    pub fn info(message: impl AsRef<str>) {
        println!("{} {}", "ℹ".blue().bold(), message.as_ref());
    }

    pub fn warning(message: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow().bold(), message.as_ref());
    }

    pub fn error(message: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), message.as_ref());
    }

    /// 显示步骤开始
    pub fn step_start(step: impl AsRef<str>) {
        println!("\n{} {}", "▶".cyan().bold(), step.as_ref().bold());
    }

    /// 显示一次录播的信息
    pub fn video_info(title: impl AsRef<str>, segments: usize) {
        println!(
            "{} {} ({})",
            "🎬".magenta().bold(),
            title.as_ref().bold(),
            format!("{} 个分段", segments).cyan()
        );
    }

    pub fn file_info(label: impl AsRef<str>, path: impl AsRef<str>) {
        println!("{} {}: {}", "📁".blue().bold(), label.as_ref().bold(), path.as_ref());
    }

    pub fn separator() {
        println!("{}", "─".repeat(50).bright_black());
    }

    /// 所有任务结束后的汇总，返回失败的任务数
    pub fn task_summary(views: &[TaskView]) -> usize {
        Self::separator();
        let failed: Vec<&TaskView> = views
            .iter()
            .filter(|view| view.status == TaskStatus::Failed)
            .collect();
        let completed = views
            .iter()
            .filter(|view| view.status == TaskStatus::Completed)
            .count();

        if failed.is_empty() {
            println!("{}", "🎉 全部任务完成！".green().bold());
        } else {
            println!("{}", format!("有 {} 个任务失败", failed.len()).red().bold());
            for view in &failed {
                println!(
                    "  {} [{}] {} ({}): {}",
                    "✗".red(),
                    view.id,
                    view.display_name,
                    format_duration(view.elapsed),
                    view.error.as_deref().unwrap_or("未知错误")
                );
            }
        }
        println!(
            "  共 {} 个任务，完成 {}，失败 {}",
            views.len(),
            completed,
            failed.len()
        );
        failed.len()
    }
}

/// 便捷宏用于漂亮的日志输出
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::success(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::warning(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_step {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::step_start(format!($($arg)*))
    };
}
