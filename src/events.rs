use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{event, Level};

use crate::error::Error;

/// Lifecycle events emitted by the operator framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEvent {
    Install,
    UpgradeCharm,
    ConfigChanged,
    Start,
    LeaderElected,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Install => "install",
            LifecycleEvent::UpgradeCharm => "upgrade-charm",
            LifecycleEvent::ConfigChanged => "config-changed",
            LifecycleEvent::Start => "start",
            LifecycleEvent::LeaderElected => "leader-elected",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The state handed to a [`Hook`] when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookContext {
    pub event: LifecycleEvent,
    /// Whether this unit currently holds application leadership.
    pub leader: bool,
}

/// A handler that the framework runs when a subscribed event fires.
#[async_trait::async_trait]
pub trait Hook: Send + Sync {
    /// Runs the handler. Returning `Err` fails the hook for the whole unit,
    /// so only conditions the framework cannot continue past should do so.
    async fn handle(&self, ctx: &HookContext) -> Result<(), Error>;
}

/// The subscription surface of the operator framework.
pub trait EventSource {
    /// The name of the application owning this unit.
    fn app_name(&self) -> &str;

    /// Registers `hook` to run whenever `event` fires.
    fn subscribe(&mut self, event: LifecycleEvent, hook: Arc<dyn Hook>);
}

/// A minimal in-memory [`EventSource`] that runs hooks in the order they
/// subscribed. Useful for hosting hooks outside of a full framework, and in
/// tests.
pub struct Dispatcher {
    app_name: String,
    hooks: BTreeMap<LifecycleEvent, Vec<Arc<dyn Hook>>>,
}

impl Dispatcher {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            hooks: BTreeMap::new(),
        }
    }

    /// Number of hooks subscribed to `event`.
    pub fn subscriptions(&self, event: LifecycleEvent) -> usize {
        self.hooks.get(&event).map_or(0, Vec::len)
    }

    /// Fires `event`, running each subscribed hook to completion before the
    /// next. Stops at, and returns, the first error.
    pub async fn emit(&self, event: LifecycleEvent, leader: bool) -> Result<(), Error> {
        let ctx = HookContext { event, leader };
        let Some(hooks) = self.hooks.get(&event) else {
            return Ok(());
        };
        event!(
            Level::TRACE,
            event = %event,
            app = %self.app_name,
            hooks = hooks.len(),
            "Dispatching {} event.",
            event
        );
        for hook in hooks {
            hook.handle(&ctx).await?;
        }
        Ok(())
    }
}

impl EventSource for Dispatcher {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn subscribe(&mut self, event: LifecycleEvent, hook: Arc<dyn Hook>) {
        self.hooks.entry(event).or_default().push(hook);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<HookContext>>,
    }

    #[async_trait::async_trait]
    impl Hook for Recorder {
        async fn handle(&self, ctx: &HookContext) -> Result<(), Error> {
            self.seen.lock().unwrap().push(*ctx);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Hook for Failing {
        async fn handle(&self, _ctx: &HookContext) -> Result<(), Error> {
            Err(Error::InvalidPort {
                name: "broken".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn runs_only_subscribed_hooks() {
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = Dispatcher::new("test-charm");
        dispatcher.subscribe(LifecycleEvent::Install, Arc::<Recorder>::clone(&recorder));

        dispatcher.emit(LifecycleEvent::Install, true).await.unwrap();
        dispatcher.emit(LifecycleEvent::Start, true).await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![HookContext {
                event: LifecycleEvent::Install,
                leader: true,
            }]
        );
    }

    #[tokio::test]
    async fn first_error_stops_dispatch() {
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = Dispatcher::new("test-charm");
        dispatcher.subscribe(LifecycleEvent::Install, Arc::new(Failing));
        dispatcher.subscribe(LifecycleEvent::Install, Arc::<Recorder>::clone(&recorder));

        assert!(dispatcher.emit(LifecycleEvent::Install, false).await.is_err());
        assert!(recorder.seen.lock().unwrap().is_empty());
        assert_eq!(dispatcher.subscriptions(LifecycleEvent::Install), 2);
    }

    #[test]
    fn event_names() {
        assert_eq!(LifecycleEvent::UpgradeCharm.to_string(), "upgrade-charm");
        assert_eq!(LifecycleEvent::Install.as_str(), "install");
    }
}
