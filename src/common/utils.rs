use std::path::{Path, PathBuf};

// 下载或提取过程中使用的临时文件：`<path>.part`
pub fn part_path(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".part");
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("a/b/VGA.mp4")),
            PathBuf::from("a/b/VGA.mp4.part")
        );
        assert_eq!(
            part_path(Path::new("Slides.pdf")),
            PathBuf::from("Slides.pdf.part")
        );
    }
}
