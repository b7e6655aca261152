//! 后台任务
//!
//! 唯一的后台任务是闲置小费池的惰性过期清扫：关闭打烊后没人离开的
//! 池子。幂等，不在正确性关键路径上；任何一次失败都只是推迟到下一轮。

use crate::core::ServerState;
use shared::util::now_millis;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 过期清扫间隔
const EXPIRY_SWEEP_INTERVAL_SECS: u64 = 15 * 60;

/// Spawn the idle-group expiry sweep
pub fn spawn_expiry_sweep(state: ServerState, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(EXPIRY_SWEEP_INTERVAL_SECS));
        // The first tick fires immediately; skip it so startup stays quiet
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Expiry sweep stopped");
                    break;
                }
                _ = interval.tick() => {
                    let cutoff = now_millis()
                        - state.config.group_idle_expiry_hours * 60 * 60 * 1000;
                    match state.groups.expire_idle_groups(cutoff).await {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(expired = n, "Idle tip groups closed"),
                        Err(e) => tracing::warn!(error = %e, "Expiry sweep failed, will retry"),
                    }
                }
            }
        }
    })
}
