//! Cross-cutting behaviors wrapped around every handler.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::Instant;

use budgetdesk_domain::error::AppError;
use budgetdesk_domain::validation::ValidationErrors;

use super::{DynHandler, Request, RequestContext};
use crate::validation::DynValidator;

/// One link of a pipeline. Calls `next.run(request)` to continue the chain.
pub trait Behavior<R: Request>: Send + Sync {
    fn handle<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response, AppError>>;
}

/// The remainder of a pipeline: the behaviors not yet run, then the handler.
pub struct Next<'a, R: Request> {
    behaviors: &'a [Box<dyn Behavior<R>>],
    handler: &'a dyn DynHandler<R>,
    ctx: &'a RequestContext,
}

impl<'a, R: Request> Next<'a, R> {
    pub(crate) fn new(
        behaviors: &'a [Box<dyn Behavior<R>>],
        handler: &'a dyn DynHandler<R>,
        ctx: &'a RequestContext,
    ) -> Self {
        Self {
            behaviors,
            handler,
            ctx,
        }
    }

    /// Continue with the next behavior, or the handler once none remain.
    pub fn run(self, request: R) -> BoxFuture<'a, Result<R::Response, AppError>> {
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                let next = Self::new(rest, self.handler, self.ctx);
                behavior.handle(self.ctx, request, next)
            }
            None => self.handler.call(request),
        }
    }
}

/// Logs failures that are not user-correctable, and panics, with the
/// request context. Never swallows: errors are returned and panics resumed.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnhandledErrorLogging;

impl<R: Request> Behavior<R> for UnhandledErrorLogging {
    fn handle<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response, AppError>> {
        Box::pin(async move {
            match AssertUnwindSafe(next.run(request)).catch_unwind().await {
                Ok(Ok(response)) => {
                    tracing::debug!(
                        request = ctx.name,
                        request_id = %ctx.request_id,
                        "request succeeded"
                    );
                    Ok(response)
                }
                Ok(Err(err)) if err.is_expected() => {
                    tracing::debug!(
                        request = ctx.name,
                        request_id = %ctx.request_id,
                        error = %err,
                        "request rejected"
                    );
                    Err(err)
                }
                Ok(Err(err)) => {
                    tracing::error!(
                        request = ctx.name,
                        request_id = %ctx.request_id,
                        error = %err,
                        source = ?std::error::Error::source(&err),
                        "unhandled error while handling request"
                    );
                    Err(err)
                }
                Err(panic) => {
                    tracing::error!(
                        request = ctx.name,
                        request_id = %ctx.request_id,
                        "request handler panicked"
                    );
                    std::panic::resume_unwind(panic)
                }
            }
        })
    }
}

/// Runs every validator for the request and short-circuits on failure.
///
/// All validators run even after one reports failures, so the caller sees
/// every violation at once.
pub struct ValidationBehavior<R: Request> {
    validators: Vec<Box<dyn DynValidator<R>>>,
}

impl<R: Request> ValidationBehavior<R> {
    pub(crate) fn new(validators: Vec<Box<dyn DynValidator<R>>>) -> Self {
        Self { validators }
    }
}

impl<R: Request> Behavior<R> for ValidationBehavior<R> {
    fn handle<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response, AppError>> {
        Box::pin(async move {
            if !self.validators.is_empty() {
                tracing::debug!(
                    request = ctx.name,
                    request_id = %ctx.request_id,
                    validators = self.validators.len(),
                    "validating request"
                );
                let mut errors = ValidationErrors::new();
                for validator in &self.validators {
                    errors.extend(validator.call(&request).await?);
                }
                if !errors.is_empty() {
                    return Err(AppError::Validation(errors));
                }
            }
            tracing::debug!(request = ctx.name, request_id = %ctx.request_id, "executing request");
            next.run(request).await
        })
    }
}

/// Warns when the rest of the chain runs longer than `threshold`. Never
/// alters the outcome.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceLogging {
    threshold: Duration,
}

impl PerformanceLogging {
    #[must_use]
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }
}

impl<R: Request> Behavior<R> for PerformanceLogging {
    fn handle<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response, AppError>> {
        Box::pin(async move {
            let started = Instant::now();
            let result = next.run(request).await;
            let elapsed = started.elapsed();
            if elapsed > self.threshold {
                tracing::warn!(
                    request = ctx.name,
                    request_id = %ctx.request_id,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    threshold_ms = u64::try_from(self.threshold.as_millis()).unwrap_or(u64::MAX),
                    "long running request"
                );
            }
            result
        })
    }
}
