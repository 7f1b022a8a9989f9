//! Tower integration.
//!
//! [`GovernorLayer`] wraps a bot handler (`Service<Trigger, Response = Option<String>>`,
//! where the response is an optional reply). Triggers carrying a command go through the
//! command gate, everything else through the middleware gate. Suppressed triggers never
//! reach the handler; the response is then the hint, if any.

use crate::dispatch::{GateOutcome, Governor};
use crate::telemetry::{NullSink, TelemetrySink};
use crate::trigger::Trigger;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A layer that puts a [`Governor`] in front of a handler.
#[derive(Clone, Debug)]
pub struct GovernorLayer<S = NullSink> {
    governor: Governor<S>,
}

impl<S> GovernorLayer<S> {
    pub fn new(governor: Governor<S>) -> Self {
        Self { governor }
    }
}

impl<Inner, S: Clone> Layer<Inner> for GovernorLayer<S> {
    type Service = GovernorService<Inner, S>;

    fn layer(&self, inner: Inner) -> Self::Service {
        GovernorService { inner, governor: self.governor.clone() }
    }
}

/// Middleware service produced by [`GovernorLayer`].
#[derive(Clone, Debug)]
pub struct GovernorService<Inner, S = NullSink> {
    inner: Inner,
    governor: Governor<S>,
}

impl<Inner, S> GovernorService<Inner, S> {
    pub fn governor(&self) -> &Governor<S> {
        &self.governor
    }
}

impl<Inner, S> Service<Trigger> for GovernorService<Inner, S>
where
    Inner: Service<Trigger, Response = Option<String>> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    Inner::Error: Send + 'static,
    S: TelemetrySink,
    S::Future: Send + 'static,
{
    type Response = Option<String>;
    type Error = Inner::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, trigger: Trigger) -> Self::Future {
        let governor = self.governor.clone();
        // Keep the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match governor.gate(&trigger).await {
                GateOutcome::Proceed => inner.call(trigger).await,
                GateOutcome::Suppress => Ok(None),
                GateOutcome::SuppressWithHint(hint) => Ok(Some(hint)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{CommandOverride, GovernorConfig};
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    #[tokio::test]
    async fn suppressed_commands_skip_the_handler() {
        let config = GovernorConfig::default()
            .command("ping", CommandOverride::new().max_usage(1_i64));
        let governor = Governor::new(config).with_clock(ManualClock::starting_at(0));
        let echo = service_fn(|t: Trigger| async move {
            Ok::<_, Infallible>(t.text().map(str::to_owned))
        });
        let svc = GovernorLayer::new(governor).layer(echo);

        let trigger = Trigger::new().user("u1").command("ping").content("pong");
        let first = svc.clone().oneshot(trigger.clone()).await.unwrap();
        assert_eq!(first.as_deref(), Some("pong"));

        let second = svc.oneshot(trigger).await.unwrap();
        assert_eq!(second, None);
    }
}
