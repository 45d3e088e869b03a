//! 启动状态机
//!
//! 状态只能逐级前进；任一阶段失败直接跳到 `Stopped`

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::error::LifecycleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    Unconfigured,
    ConfiguredLogging,
    ConnectionsProvisioned,
    ServicesComposed,
    Serving,
    ShuttingDown,
    Stopped,
}

impl BootstrapState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unconfigured => Some(Self::ConfiguredLogging),
            Self::ConfiguredLogging => Some(Self::ConnectionsProvisioned),
            Self::ConnectionsProvisioned => Some(Self::ServicesComposed),
            Self::ServicesComposed => Some(Self::Serving),
            Self::Serving => Some(Self::ShuttingDown),
            Self::ShuttingDown => Some(Self::Stopped),
            Self::Stopped => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::ConfiguredLogging => "configured_logging",
            Self::ConnectionsProvisioned => "connections_provisioned",
            Self::ServicesComposed => "services_composed",
            Self::Serving => "serving",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        }
    }
}

/// 状态记录与广播
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<BootstrapState>,
    history: Vec<BootstrapState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(BootstrapState::Unconfigured);
        Self {
            tx,
            history: vec![BootstrapState::Unconfigured],
        }
    }

    pub fn state(&self) -> BootstrapState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<BootstrapState> {
        self.tx.subscribe()
    }

    pub fn history(&self) -> &[BootstrapState] {
        &self.history
    }

    /// 前进到紧邻的下一个状态
    pub fn advance(&mut self, to: BootstrapState) -> Result<(), LifecycleError> {
        let from = self.state();
        if from.next() != Some(to) {
            return Err(LifecycleError { from, to });
        }
        self.set(to);
        Ok(())
    }

    /// 失败：从任意未停止状态直接进入 `Stopped`
    pub fn fail(&mut self) {
        if self.state() != BootstrapState::Stopped {
            self.set(BootstrapState::Stopped);
        }
    }

    fn set(&mut self, state: BootstrapState) {
        debug!(state = state.as_str(), "Bootstrap state changed");
        self.history.push(state);
        self.tx.send_replace(state);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BootstrapState::*;

    #[test]
    fn test_full_forward_walk() {
        let mut lifecycle = Lifecycle::new();
        for state in [
            ConfiguredLogging,
            ConnectionsProvisioned,
            ServicesComposed,
            Serving,
            ShuttingDown,
            Stopped,
        ] {
            lifecycle.advance(state).unwrap();
        }

        assert_eq!(lifecycle.state(), Stopped);
        assert_eq!(lifecycle.history().len(), 7);
        assert!(lifecycle.history().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rejects_skipping_and_going_back() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.advance(ServicesComposed).unwrap_err();
        assert_eq!(err.from, Unconfigured);
        assert_eq!(err.to, ServicesComposed);

        lifecycle.advance(ConfiguredLogging).unwrap();
        assert!(lifecycle.advance(Unconfigured).is_err());
        assert!(lifecycle.advance(ConfiguredLogging).is_err());
        assert_eq!(lifecycle.state(), ConfiguredLogging);
    }

    #[test]
    fn test_failure_jumps_to_stopped() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(ConfiguredLogging).unwrap();
        lifecycle.fail();

        assert_eq!(lifecycle.history(), &[Unconfigured, ConfiguredLogging, Stopped]);
        lifecycle.fail();
        assert_eq!(lifecycle.history().len(), 3);
        assert!(lifecycle.advance(ShuttingDown).is_err());
    }

    #[test]
    fn test_subscribers_observe_changes() {
        let mut lifecycle = Lifecycle::new();
        let rx = lifecycle.subscribe();
        lifecycle.advance(ConfiguredLogging).unwrap();
        assert_eq!(*rx.borrow(), ConfiguredLogging);
    }
}
