use std::collections::HashMap;
use std::time::Duration;

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::downloader::models::{TaskId, TaskStatus, TaskView};

const BAR_LENGTH: u64 = 1000;

/// 把耗时格式化为 `42s` 或 `3m5s`
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m{}s", secs / 60, secs % 60)
    }
}

// 状态列的文字，运行中时附带当前步骤
fn status_text(view: &TaskView) -> String {
    match (view.status, &view.step_name) {
        (TaskStatus::Running, Some(step)) => format!("{} {}", view.status, step),
        _ => view.status.to_string(),
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// 命令行里的任务面板，每个任务一行
///
/// 每次拿到快照后按任务编号对齐，新任务追加一行，已结束的任务不再刷新。
pub struct TaskBoard {
    multi: MultiProgress,
    bars: HashMap<TaskId, ProgressBar>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
        }
    }

    pub fn render(&mut self, views: &[TaskView]) {
        for view in views {
            let bar = self.bars.entry(view.id).or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new(BAR_LENGTH));
                bar.set_style(bar_style());
                bar.set_prefix(format!("[{}] {}", view.id, view.display_name));
                bar
            });
            if bar.is_finished() {
                continue;
            }

            let position = view
                .step_progress
                .map(|p| (p.clamp(0.0, 1.0) * BAR_LENGTH as f64) as u64)
                .unwrap_or(0);
            let elapsed = format_duration(view.elapsed);

            match view.status {
                TaskStatus::Completed => {
                    bar.set_position(BAR_LENGTH);
                    bar.finish_with_message(format!("{} {}", view.status.to_string().green(), elapsed));
                }
                TaskStatus::Failed => {
                    let reason = view.error.as_deref().unwrap_or("未知错误");
                    bar.abandon_with_message(format!(
                        "{} {} {}",
                        view.status.to_string().red(),
                        elapsed,
                        reason
                    ));
                }
                TaskStatus::Queued | TaskStatus::Running => {
                    bar.set_position(position);
                    bar.set_message(format!("{} {}", status_text(view), elapsed));
                }
            }
        }
    }
}

impl Default for TaskBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::ResourceClass;

    fn view(id: u64, status: TaskStatus) -> TaskView {
        TaskView {
            id: TaskId(id),
            display_name: format!("任务{}", id),
            resource_class: ResourceClass::Download,
            status,
            error: None,
            step_name: Some("Downloading".to_string()),
            step_progress: Some(0.5),
            elapsed: Duration::from_secs(3),
        }
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_millis(42_900)), "42s");
        assert_eq!(format_duration(Duration::from_secs(185)), "3m5s");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn step_is_shown_only_while_running() {
        assert_eq!(status_text(&view(1, TaskStatus::Running)), "运行中 Downloading");
        assert_eq!(status_text(&view(1, TaskStatus::Completed)), "已完成");
    }

    #[test]
    fn reconciles_rows_by_id() {
        let mut board = TaskBoard::new();
        board.render(&[view(1, TaskStatus::Running)]);
        board.render(&[view(1, TaskStatus::Completed), view(2, TaskStatus::Queued)]);
        board.render(&[view(1, TaskStatus::Completed), view(2, TaskStatus::Failed)]);
        assert_eq!(board.bars.len(), 2);
    }
}
