use chrono_tz::Tz;
use std::path::PathBuf;

/// 服务器配置 - 小费账本节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/tips | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | TIMEZONE | Europe/Madrid | 业务时区 |
/// | ENVIRONMENT | development | 运行环境 |
/// | GROUP_IDLE_EXPIRY_HOURS | 18 | 闲置小费池自动关闭时长 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/tips HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 业务时区 (日期范围查询的边界计算)
    pub timezone: Tz,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 闲置小费池自动关闭时长（小时）
    pub group_idle_expiry_hours: i64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/tips".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Europe::Madrid),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            group_idle_expiry_hours: std::env::var("GROUP_IDLE_EXPIRY_HOURS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(18),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
