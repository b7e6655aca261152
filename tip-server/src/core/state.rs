use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::tips::{
    AdjustmentEngine, GroupEngine, LedgerService, OwnershipResolver, TemplateBinder, TipOutEngine,
};

/// 服务器状态 - 持有所有引擎的共享引用
///
/// Clone 成本极低：所有字段要么是轻量值，要么内部持有连接池。
///
/// # 组件
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | ledger | 账本服务（余额、流水、现金支出） |
/// | groups | 小费池引擎 |
/// | resolver | 订单归属解析器 |
/// | tip_outs | 小费分出规则引擎 |
/// | binder | 模板/打卡绑定器 |
/// | adjustments | 调整与重算引擎 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// Server instance epoch - unique ID generated on startup.
    /// Clients use it to detect server restarts.
    pub epoch: String,
    pub ledger: LedgerService,
    pub groups: GroupEngine,
    pub resolver: OwnershipResolver,
    pub tip_outs: TipOutEngine,
    pub binder: TemplateBinder,
    pub adjustments: AdjustmentEngine,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("tips.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::with_pool(config.clone(), db_service.pool)
    }

    /// 基于现有连接池构造状态 (测试和内存模式)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let groups = GroupEngine::new(pool.clone());
        Self {
            config,
            epoch: uuid::Uuid::new_v4().to_string(),
            ledger: LedgerService::new(pool.clone()),
            resolver: OwnershipResolver::new(pool.clone()),
            tip_outs: TipOutEngine::new(pool.clone()),
            binder: TemplateBinder::new(pool.clone(), groups.clone()),
            adjustments: AdjustmentEngine::new(pool.clone()),
            groups,
            pool,
        }
    }
}
