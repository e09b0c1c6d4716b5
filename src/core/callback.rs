use crate::core::error::InteropError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawns `future` and hands its outcome to `callback` once it settles.
///
/// Awaiting the returned handle waits for the callback to have run.
pub fn nodeify<Fut, T, E, C>(future: Fut, callback: C) -> JoinHandle<()>
where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    C: FnOnce(Result<T, E>) + Send + 'static,
{
    tokio::spawn(async move {
        callback(future.await);
    })
}

/// Runs `future` detached. Failures are logged instead of returned.
pub fn asyncify<Fut, T, E>(future: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = future.await {
            tracing::error!(error = %e, "Detached task failed");
        }
    })
}

type AsyncFn<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Named async functions exposed through completion callbacks.
pub struct CallbackRegistry<A, T, E> {
    functions: HashMap<String, AsyncFn<A, T, E>>,
}

impl<A, T, E> CallbackRegistry<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register<F, Fut>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let name = name.into();
        tracing::debug!(name = %name, "Registered callback function");
        self.functions
            .insert(name, Arc::new(move |args| function(args).boxed()));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invokes `name` with `args`, delivering its outcome to `callback`.
    pub fn call<C>(&self, name: &str, args: A, callback: C) -> Result<JoinHandle<()>, InteropError>
    where
        C: FnOnce(Result<T, E>) + Send + 'static,
    {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| InteropError::UnknownFunction(name.to_string()))?;

        Ok(nodeify(function(args), callback))
    }
}

impl<A, T, E> Default for CallbackRegistry<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
