//! Mediator: routes each typed request to exactly one handler.
//!
//! Handlers and validators are registered explicitly on a
//! [`MediatorBuilder`], which produces a fixed table from request type to
//! pipeline. Every pipeline wraps its handler in the same, statically ordered
//! behavior chain:
//!
//! 1. [`UnhandledErrorLogging`]: logs unexpected failures and panics, then
//!    passes them on unchanged;
//! 2. [`ValidationBehavior`]: runs every validator registered for the
//!    request type and rejects the request without calling the handler if
//!    any rule fails;
//! 3. [`PerformanceLogging`]: warns when the rest of the chain runs longer
//!    than the configured threshold.
//!
//! A request moves through `received → validating → (rejected | executing)
//! → (succeeded | faulted)`; each step is traced at `debug`.

pub mod behaviors;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;

use budgetdesk_domain::error::AppError;

use crate::validation::{DynValidator, Validator};

pub use behaviors::{Behavior, Next, PerformanceLogging, UnhandledErrorLogging, ValidationBehavior};

/// Handlers slower than this are reported by [`PerformanceLogging`].
pub const DEFAULT_SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(500);

/// A message describing one intended operation.
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;

    /// Name used in logs and errors.
    #[must_use]
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Executes one request type.
pub trait Handler<R: Request>: Send + Sync + 'static {
    fn handle(&self, request: R) -> impl Future<Output = Result<R::Response, AppError>> + Send;
}

/// Object-safe form of [`Handler`], used inside pipelines.
pub(crate) trait DynHandler<R: Request>: Send + Sync {
    fn call(&self, request: R) -> BoxFuture<'_, Result<R::Response, AppError>>;
}

impl<R: Request, H: Handler<R>> DynHandler<R> for H {
    fn call(&self, request: R) -> BoxFuture<'_, Result<R::Response, AppError>> {
        Box::pin(self.handle(request))
    }
}

/// Per-dispatch data visible to behaviors.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: uuid::Uuid,
    pub name: &'static str,
}

impl RequestContext {
    fn new(name: &'static str) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4(),
            name,
        }
    }
}

/// Errors detected while assembling the registration table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediatorError {
    #[error("request {0} already has a handler")]
    DuplicateHandler(&'static str),
    #[error("request {0} has validators but no handler")]
    MissingHandler(&'static str),
}

struct Pipeline<R: Request> {
    behaviors: Vec<Box<dyn Behavior<R>>>,
    handler: Box<dyn DynHandler<R>>,
}

struct Slot<R: Request> {
    handler: Option<Box<dyn DynHandler<R>>>,
    validators: Vec<Box<dyn DynValidator<R>>>,
}

impl<R: Request> Default for Slot<R> {
    fn default() -> Self {
        Self {
            handler: None,
            validators: Vec::new(),
        }
    }
}

/// A registration whose request type has been erased.
trait PendingPipeline: Send + Sync {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn finish(
        self: Box<Self>,
        slow_request_threshold: Duration,
    ) -> Result<Box<dyn Any + Send + Sync>, MediatorError>;
}

impl<R: Request> PendingPipeline for Slot<R> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn finish(
        self: Box<Self>,
        slow_request_threshold: Duration,
    ) -> Result<Box<dyn Any + Send + Sync>, MediatorError> {
        let Slot {
            handler,
            validators,
        } = *self;
        let handler = handler.ok_or(MediatorError::MissingHandler(R::name()))?;
        let behaviors: Vec<Box<dyn Behavior<R>>> = vec![
            Box::new(UnhandledErrorLogging),
            Box::new(ValidationBehavior::new(validators)),
            Box::new(PerformanceLogging::new(slow_request_threshold)),
        ];
        Ok(Box::new(Pipeline {
            behaviors,
            handler,
        }))
    }
}

/// Collects handlers and validators, then freezes them into a [`Mediator`].
pub struct MediatorBuilder {
    slots: HashMap<TypeId, Box<dyn PendingPipeline>>,
    errors: Vec<MediatorError>,
    slow_request_threshold: Duration,
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            errors: Vec::new(),
            slow_request_threshold: DEFAULT_SLOW_REQUEST_THRESHOLD,
        }
    }
}

impl MediatorBuilder {
    #[must_use]
    pub fn slow_request_threshold(mut self, threshold: Duration) -> Self {
        self.slow_request_threshold = threshold;
        self
    }

    fn slot<R: Request>(&mut self) -> &mut Slot<R> {
        let pending = match self.slots.entry(TypeId::of::<R>()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Box::new(Slot::<R>::default())),
        };
        match pending.as_any_mut().downcast_mut::<Slot<R>>() {
            Some(slot) => slot,
            None => unreachable!("slots are keyed by the TypeId of their request"),
        }
    }

    /// Register the handler for `R`. A second registration for the same
    /// request type makes [`Self::build`] fail.
    #[must_use]
    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: Handler<R>,
    {
        let slot = self.slot::<R>();
        if slot.handler.is_some() {
            self.errors.push(MediatorError::DuplicateHandler(R::name()));
        } else {
            slot.handler = Some(Box::new(handler));
        }
        self
    }

    /// Add a validator for `R`. Validators run in registration order.
    #[must_use]
    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R>,
    {
        self.slot::<R>().validators.push(Box::new(validator));
        self
    }

    /// Freeze the registration table.
    ///
    /// # Errors
    ///
    /// Returns the first [`MediatorError`] found: a request type registered
    /// twice, or validators registered for a request with no handler.
    pub fn build(self) -> Result<Mediator, MediatorError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        let threshold = self.slow_request_threshold;
        let pipelines = self
            .slots
            .into_iter()
            .map(|(type_id, pending)| Ok((type_id, pending.finish(threshold)?)))
            .collect::<Result<HashMap<_, _>, MediatorError>>()?;
        tracing::debug!(handlers = pipelines.len(), "mediator built");
        Ok(Mediator { pipelines })
    }
}

/// Dispatches requests through their registered pipeline.
pub struct Mediator {
    pipelines: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Mediator {
    #[must_use]
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// Whether a handler is registered for `R`.
    #[must_use]
    pub fn handles<R: Request>(&self) -> bool {
        self.pipelines.contains_key(&TypeId::of::<R>())
    }

    /// Send `request` through its pipeline.
    ///
    /// Dropping the returned future cancels the in-flight handler; writes
    /// already committed by the store stay committed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoHandler`] for an unregistered request type,
    /// [`AppError::Validation`] when a validator rejects it, or whatever the
    /// handler returns.
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, AppError> {
        let pipeline = self
            .pipelines
            .get(&TypeId::of::<R>())
            .and_then(|pipeline| pipeline.downcast_ref::<Pipeline<R>>())
            .ok_or(AppError::NoHandler(R::name()))?;

        let ctx = RequestContext::new(R::name());
        tracing::debug!(request = ctx.name, request_id = %ctx.request_id, "request received");
        let next = Next::new(&pipeline.behaviors, pipeline.handler.as_ref(), &ctx);
        next.run(request).await
    }
}
