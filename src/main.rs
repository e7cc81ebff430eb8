//! # Tab Groups 命令行入口
//!
//! 核心逻辑位于库中（`tab_groups::cli`），此处只负责初始化日志、
//! 解析参数并把错误映射为非零退出码。

use std::process::ExitCode;

use clap::Parser;

use tab_groups::cli::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Cli::parse();
    match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
