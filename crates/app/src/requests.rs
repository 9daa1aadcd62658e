//! Generic CRUD requests and the handler that serves them for any entity.
//!
//! One [`CrudHandler`] per entity type answers all eight requests by
//! delegating to a [`Repository`]. [`register_crud`] wires them into a
//! [`MediatorBuilder`] explicitly.

pub mod countries;

use std::marker::PhantomData;
use std::sync::Arc;

use budgetdesk_domain::entity::Entity;
use budgetdesk_domain::error::{AppError, NotFoundError};
use budgetdesk_domain::query::{Filter, Page, Projection, QuerySpec};

use crate::mediator::{Handler, MediatorBuilder, Request};
use crate::ports::Repository;

/// Persist a new entity.
#[derive(Debug, Clone)]
pub struct Create<E> {
    pub entity: E,
}

/// Overwrite an existing entity.
#[derive(Debug, Clone)]
pub struct Update<E> {
    pub entity: E,
}

/// Delete by key.
#[derive(Debug, Clone)]
pub struct Delete<E: Entity> {
    pub id: E::Id,
}

/// Fetch one entity by key. `spec` carries includes and flags; its filter
/// and window are ignored.
#[derive(Debug, Clone)]
pub struct GetById<E: Entity> {
    pub id: E::Id,
    pub spec: QuerySpec,
}

/// A page of entities.
#[derive(Debug, Clone)]
pub struct List<E> {
    pub spec: QuerySpec,
    entity: PhantomData<fn() -> E>,
}

/// Number of matching entities.
#[derive(Debug, Clone)]
pub struct Count<E> {
    pub spec: QuerySpec,
    entity: PhantomData<fn() -> E>,
}

/// Whether any entity matches.
#[derive(Debug, Clone)]
pub struct Exists<E> {
    pub spec: QuerySpec,
    entity: PhantomData<fn() -> E>,
}

/// Named fields of every matching entity.
#[derive(Debug, Clone)]
pub struct Select<E> {
    pub spec: QuerySpec,
    pub fields: Vec<String>,
    entity: PhantomData<fn() -> E>,
}

impl<E> Create<E> {
    pub fn new(entity: E) -> Self {
        Self { entity }
    }
}

impl<E> Update<E> {
    pub fn new(entity: E) -> Self {
        Self { entity }
    }
}

impl<E: Entity> Delete<E> {
    pub fn new(id: E::Id) -> Self {
        Self { id }
    }
}

impl<E: Entity> GetById<E> {
    pub fn new(id: E::Id) -> Self {
        Self {
            id,
            spec: QuerySpec::new(),
        }
    }

    #[must_use]
    pub fn with_spec(mut self, spec: QuerySpec) -> Self {
        self.spec = spec;
        self
    }
}

impl<E> List<E> {
    pub fn new(spec: QuerySpec) -> Self {
        Self {
            spec,
            entity: PhantomData,
        }
    }
}

impl<E> Count<E> {
    pub fn new(spec: QuerySpec) -> Self {
        Self {
            spec,
            entity: PhantomData,
        }
    }
}

impl<E> Exists<E> {
    pub fn new(spec: QuerySpec) -> Self {
        Self {
            spec,
            entity: PhantomData,
        }
    }
}

impl<E> Select<E> {
    pub fn new(spec: QuerySpec, fields: Vec<String>) -> Self {
        Self {
            spec,
            fields,
            entity: PhantomData,
        }
    }
}

impl<E: Entity> Request for Create<E> {
    type Response = E;
}

impl<E: Entity> Request for Update<E> {
    type Response = E;
}

impl<E: Entity> Request for Delete<E> {
    type Response = ();
}

impl<E: Entity> Request for GetById<E> {
    type Response = E;
}

impl<E: Entity> Request for List<E> {
    type Response = Page<E>;
}

impl<E: Entity> Request for Count<E> {
    type Response = u64;
}

impl<E: Entity> Request for Exists<E> {
    type Response = bool;
}

impl<E: Entity> Request for Select<E> {
    type Response = Vec<Projection>;
}

/// Serves every CRUD request for `E` from one repository.
pub struct CrudHandler<E, R> {
    repo: Arc<R>,
    entity: PhantomData<fn() -> E>,
}

impl<E, R> Clone for CrudHandler<E, R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            entity: PhantomData,
        }
    }
}

impl<E, R> CrudHandler<E, R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            entity: PhantomData,
        }
    }
}

impl<E, R> Handler<Create<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: Create<E>) -> Result<E, AppError> {
        self.repo.insert(request.entity).await
    }
}

impl<E, R> Handler<Update<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: Update<E>) -> Result<E, AppError> {
        self.repo.update(request.entity).await
    }
}

impl<E, R> Handler<Delete<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: Delete<E>) -> Result<(), AppError> {
        self.repo.delete(request.id).await
    }
}

impl<E, R> Handler<GetById<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: GetById<E>) -> Result<E, AppError> {
        let spec = QuerySpec {
            filter: Some(Filter::eq("id", request.id)),
            sort: Vec::new(),
            skip: 0,
            take: Some(1),
            ..request.spec
        };
        self.repo
            .list(&spec)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                NotFoundError {
                    entity: E::NAME,
                    id: request.id.to_string(),
                }
                .into()
            })
    }
}

impl<E, R> Handler<List<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: List<E>) -> Result<Page<E>, AppError> {
        self.repo.page(&request.spec).await
    }
}

impl<E, R> Handler<Count<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: Count<E>) -> Result<u64, AppError> {
        self.repo.count(&request.spec).await
    }
}

impl<E, R> Handler<Exists<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: Exists<E>) -> Result<bool, AppError> {
        self.repo.exists(&request.spec).await
    }
}

impl<E, R> Handler<Select<E>> for CrudHandler<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    async fn handle(&self, request: Select<E>) -> Result<Vec<Projection>, AppError> {
        self.repo.select(&request.spec, &request.fields).await
    }
}

/// Register a [`CrudHandler`] for every CRUD request of `E`.
#[must_use]
pub fn register_crud<E, R>(builder: MediatorBuilder, repo: Arc<R>) -> MediatorBuilder
where
    E: Entity,
    R: Repository<E> + 'static,
{
    let handler = CrudHandler::<E, R>::new(repo);
    builder
        .handler::<Create<E>, _>(handler.clone())
        .handler::<Update<E>, _>(handler.clone())
        .handler::<Delete<E>, _>(handler.clone())
        .handler::<GetById<E>, _>(handler.clone())
        .handler::<List<E>, _>(handler.clone())
        .handler::<Count<E>, _>(handler.clone())
        .handler::<Exists<E>, _>(handler.clone())
        .handler::<Select<E>, _>(handler)
}
