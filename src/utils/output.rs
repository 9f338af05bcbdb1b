//! # 美化输出工具
//!
//! 提供统一的终端输出样式。
//!
//! ## 依赖关系
//! - 被 `main.rs` 和所有 `commands/` 模块使用
//! - 使用 `colored` crate

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印跳过消息
pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印已加载的剖面文件: `文件 -> 区域 (N profiles)`
pub fn print_loaded(source: &str, regions: &[&str], profiles: usize) {
    println!("{}", loaded_line(source, regions, profiles));
}

fn loaded_line(source: &str, regions: &[&str], profiles: usize) -> String {
    let count = match profiles {
        1 => "(1 profile)".to_string(),
        n => format!("({} profiles)", n),
    };
    format!(
        "{} {} {} {} {}",
        "[OK]".green().bold(),
        source.dimmed(),
        "->".cyan(),
        regions.join(", ").bold(),
        count.dimmed()
    )
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_line() {
        let line = loaded_line("profiledata1.csv", &["Region 1", "Region 2"], 12);
        assert!(line.contains("profiledata1.csv"));
        assert!(line.contains("Region 1, Region 2"));
        assert!(line.contains("(12 profiles)"));

        let line = loaded_line("a.csv", &["Tetragonal"], 1);
        assert!(line.contains("(1 profile)"));
    }
}
