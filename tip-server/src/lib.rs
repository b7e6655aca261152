//! Tip Server - 餐厅小费账本与动态分组分配引擎
//!
//! # 架构概述
//!
//! 本模块是小费账本节点的主入口，提供以下核心功能：
//!
//! - **账本** (`tips::ledger`): 只追加的小费账本，余额 = 历史求和
//! - **小费池** (`tips::groups`): 分段建模的动态成员历史
//! - **归属解析** (`tips::ownership`): 订单结算时的小费归属快照
//! - **分出规则** (`tips::tip_out`): 交班时按角色对重分配
//! - **调整引擎** (`tips::adjustment`): 回放 + 差额修正，不改历史
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! tip-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── tips/          # 小费引擎 (账本、池、归属、分出、调整)
//! ├── db/            # 数据库层 (SQLite + 仓储)
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod tips;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use tips::{
    AdjustmentEngine, GroupEngine, LedgerService, OwnershipResolver, TemplateBinder, TipError,
    TipOutEngine, TipResult,
};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
  ______ _         __                __
 /_  __/(_)____   / /   ___  ____ _ / /___  ___   _____
  / /  / // __ \ / /   / _ \/ __ `// __/ / / _ \ / ___/
 / /  / // /_/ // /___/  __/ /_/ // /_/ /_/  __// /
/_/  /_// .___//_____/\___/\__,_/ \__,_(_)\___//_/
       /_/
    "#
    );
}
