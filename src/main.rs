//! # domainwidth - TEM 线剖面纳米畴宽度分析
//!
//! 从透射电镜图像的强度线剖面中提取铁电纳米畴宽度，按区域统计并拟合分布。
//!
//! ## 子命令
//! - `analyze` - 完整分析：极小值 → 畴宽 → 直方图与高斯拟合 → 三联图
//! - `minima`  - 检查单个文件中每条剖面的极小值
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (输入文件收集)
//!   │     ├── parsers/   (剖面 CSV 解析)
//!   │     ├── analysis/  (极小值、畴宽、拟合、绘图)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod analysis;
mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
