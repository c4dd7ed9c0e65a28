//! Before/after hooks around a transition.
//!
//! Hooks are registered per document type, per state and per phase, and run
//! in registration order. A `before` hook returning `false` vetoes the
//! transition and stops the chain. `after` hook results are ignored.
//! A hook returning `Err` stops its phase immediately.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RelateError, Result};
use crate::state::StateName;

/// A callable run before or after a transition.
///
/// Plain closures are hooks:
///
/// ```ignore
/// let has_body = |post: &Post| -> anyhow::Result<bool> { Ok(!post.body.is_empty()) };
/// ```
///
/// Implement the trait directly for hooks that need IO:
///
/// ```ignore
/// struct NotifyAuthor { mailer: Arc<Mailer> }
///
/// #[async_trait]
/// impl Hook<Post> for NotifyAuthor {
///     async fn call(&self, post: &Post) -> anyhow::Result<bool> {
///         self.mailer.send_accepted(post.author).await?;
///         Ok(true)
///     }
/// }
/// ```
#[async_trait]
pub trait Hook<D>: Send + Sync {
    /// Returns whether the chain should continue.
    async fn call(&self, doc: &D) -> anyhow::Result<bool>;
}

#[async_trait]
impl<D, F> Hook<D> for F
where
    D: Send + Sync,
    F: Fn(&D) -> anyhow::Result<bool> + Send + Sync,
{
    async fn call(&self, doc: &D) -> anyhow::Result<bool> {
        (self)(doc)
    }
}

/// When a hook runs relative to the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => write!(f, "before"),
            Phase::After => write!(f, "after"),
        }
    }
}

/// A hook with the name it was registered under.
pub struct NamedHook<D> {
    name: String,
    hook: Arc<dyn Hook<D>>,
}

impl<D> NamedHook<D> {
    pub fn new(name: impl Into<String>, hook: impl Hook<D> + 'static) -> Self {
        Self {
            name: name.into(),
            hook: Arc::new(hook),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<D> Clone for NamedHook<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            hook: Arc::clone(&self.hook),
        }
    }
}

impl<D> fmt::Debug for NamedHook<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedHook").field(&self.name).finish()
    }
}

/// Options accepted when configuring a state on a document type.
///
/// ```ignore
/// MarkOptions::new()
///     .before("has_body", |post: &Post| -> anyhow::Result<bool> {
///         Ok(!post.body.is_empty())
///     })
///     .after("notify_author", NotifyAuthor::new(mailer))
/// ```
pub struct MarkOptions<D> {
    pub(crate) before: Vec<NamedHook<D>>,
    pub(crate) after: Vec<NamedHook<D>>,
}

impl<D> MarkOptions<D> {
    pub fn new() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    pub fn before(mut self, name: impl Into<String>, hook: impl Hook<D> + 'static) -> Self {
        self.before.push(NamedHook::new(name, hook));
        self
    }

    pub fn after(mut self, name: impl Into<String>, hook: impl Hook<D> + 'static) -> Self {
        self.after.push(NamedHook::new(name, hook));
        self
    }
}

impl<D> Default for MarkOptions<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered hooks for one state on one document type.
pub struct HookChain<D> {
    state: StateName,
    before: Vec<NamedHook<D>>,
    after: Vec<NamedHook<D>>,
}

impl<D: Send + Sync> HookChain<D> {
    pub fn new(state: StateName) -> Self {
        Self {
            state,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Appends the options' hooks after those already registered.
    ///
    /// A hook registered again under a name the phase already has replaces
    /// the earlier registration and moves to the end of the chain.
    pub fn extend(&mut self, options: MarkOptions<D>) {
        for named in options.before {
            Self::register(&mut self.before, named);
        }
        for named in options.after {
            Self::register(&mut self.after, named);
        }
    }

    fn register(phase: &mut Vec<NamedHook<D>>, named: NamedHook<D>) {
        phase.retain(|existing| existing.name != named.name);
        phase.push(named);
    }

    pub fn before_hooks(&self) -> &[NamedHook<D>] {
        &self.before
    }

    pub fn after_hooks(&self) -> &[NamedHook<D>] {
        &self.after
    }

    /// Runs before hooks in order. Returns `false` at the first veto.
    pub async fn run_before(&self, doc: &D) -> Result<bool> {
        for named in &self.before {
            let proceed = named
                .hook
                .call(doc)
                .await
                .map_err(|source| self.hook_error(Phase::Before, named, source))?;

            if !proceed {
                debug!(state = %self.state, hook = named.name(), "before hook halted the chain");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Runs after hooks in order. Their results do not matter.
    pub async fn run_after(&self, doc: &D) -> Result<()> {
        for named in &self.after {
            let returned = named
                .hook
                .call(doc)
                .await
                .map_err(|source| self.hook_error(Phase::After, named, source))?;

            if !returned {
                debug!(state = %self.state, hook = named.name(), "after hook returned false, ignored");
            }
        }
        Ok(())
    }

    fn hook_error(&self, phase: Phase, named: &NamedHook<D>, source: anyhow::Error) -> RelateError {
        RelateError::Hook {
            state: self.state.clone(),
            phase,
            hook: named.name.clone(),
            source,
        }
    }
}
