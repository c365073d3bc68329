//! Mutation handles.

use crate::error::SyncResult;
use async_trait::async_trait;
use recordsync_cache::Record;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An asynchronous create, update or delete operation.
#[async_trait]
pub trait Mutation<I: Send + 'static, O: Send + 'static>: Send + Sync {
    /// Runs the mutation.
    async fn invoke(&self, input: I) -> SyncResult<O>;
}

#[async_trait]
impl<I, O, M> Mutation<I, O> for Arc<M>
where
    I: Send + 'static,
    O: Send + 'static,
    M: Mutation<I, O> + ?Sized,
{
    async fn invoke(&self, input: I) -> SyncResult<O> {
        (**self).invoke(input).await
    }
}

/// Adapts an async closure into a [`Mutation`].
pub struct FnMutation<F, I, O> {
    f: F,
    _marker: PhantomData<fn(I) -> O>,
}

/// Wraps `f` as a [`Mutation`].
pub fn mutation_fn<F, Fut, I, O>(f: F) -> FnMutation<F, I, O>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = SyncResult<O>> + Send,
{
    FnMutation {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, I, O> Mutation<I, O> for FnMutation<F, I, O>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = SyncResult<O>> + Send,
    I: Send + 'static,
    O: Send + 'static,
{
    async fn invoke(&self, input: I) -> SyncResult<O> {
        (self.f)(input).await
    }
}

/// A mutation together with its pending flag.
pub struct MutationHandle<I: Send + 'static, O: Send + 'static> {
    inner: Box<dyn Mutation<I, O>>,
    pending: AtomicUsize,
}

impl<I: Send + 'static, O: Send + 'static> MutationHandle<I, O> {
    /// Wraps a mutation.
    pub fn new(mutation: impl Mutation<I, O> + 'static) -> Self {
        Self {
            inner: Box::new(mutation),
            pending: AtomicUsize::new(0),
        }
    }

    /// Returns true while at least one invocation has not settled.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Runs the mutation, tracking it as pending until it settles.
    pub async fn invoke(&self, input: I) -> SyncResult<O> {
        let _pending = PendingGuard::enter(&self.pending);
        self.inner.invoke(input).await
    }
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The create, update and delete mutations of one record type.
///
/// Create and update take record-type-specific JSON payloads and resolve to
/// the stored record, if the endpoint returns one. Delete takes the wire
/// identifier and its result is ignored.
pub struct MutationSet<R: Record, W: Send + 'static = <R as Record>::Key> {
    /// Create mutation.
    pub create: MutationHandle<Value, Option<R>>,
    /// Update mutation.
    pub update: MutationHandle<Value, Option<R>>,
    /// Delete mutation.
    pub delete: MutationHandle<W, ()>,
}

impl<R: Record, W: Send + 'static> MutationSet<R, W> {
    /// Bundles three mutations.
    pub fn new(
        create: impl Mutation<Value, Option<R>> + 'static,
        update: impl Mutation<Value, Option<R>> + 'static,
        delete: impl Mutation<W, ()> + 'static,
    ) -> Self {
        Self {
            create: MutationHandle::new(create),
            update: MutationHandle::new(update),
            delete: MutationHandle::new(delete),
        }
    }
}
