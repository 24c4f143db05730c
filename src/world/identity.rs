//! World attribution for generation calls.
//!
//! Hosts rarely say which world a callback belongs to, so the resolver walks
//! an ordered chain of heuristics and stops at the first hit. Successful
//! resolutions are written back to the per-thread cache and the handle table
//! so later calls short-circuit.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::world::registry::WorldRegistry;

/// Interned world name. Cloning is a pointer copy so identities can flow
/// through caches and maps freely.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct WorldId(Arc<str>);

impl WorldId {
    pub fn new(name: &str) -> Self {
        WorldId(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque host-side handle (a level pointer, an instance id) that the host
/// may pass instead of a world name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HandleId(pub u64);

/// What the host actually told us about one generation call.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    pub world: Option<WorldId>,
    pub handle: Option<HandleId>,
}

impl CallContext {
    pub fn anonymous() -> Self {
        CallContext::default()
    }

    pub fn for_world(name: &str) -> Self {
        CallContext {
            world: Some(WorldId::new(name)),
            handle: None,
        }
    }

    pub fn with_handle(mut self, handle: HandleId) -> Self {
        self.handle = Some(handle);
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    Explicit,
    ThreadCache,
    Handle,
    ThreadNamePrefix,
    SingleActive,
    DefaultWorld,
}

pub struct IdentityResolver {
    registry: Arc<WorldRegistry>,
    order: Vec<Strategy>,
}

impl IdentityResolver {
    pub fn new(registry: Arc<WorldRegistry>) -> Self {
        IdentityResolver {
            registry,
            order: vec![
                Strategy::Explicit,
                Strategy::ThreadCache,
                Strategy::Handle,
                Strategy::ThreadNamePrefix,
                Strategy::SingleActive,
                Strategy::DefaultWorld,
            ],
        }
    }

    /// Walk the strategy chain and return the first world it attributes the
    /// call to. `None` means every heuristic came up empty; the caller
    /// decides what a safe answer looks like.
    pub fn resolve(&self, ctx: &CallContext) -> Option<WorldId> {
        for &strategy in &self.order {
            if let Some(world) = self.try_strategy(strategy, ctx) {
                trace!(world = %world, ?strategy, "resolved call identity");
                if strategy != Strategy::ThreadCache {
                    self.remember(ctx, &world);
                }
                return Some(world);
            }
        }
        debug!("call identity unresolved, no heuristic matched");
        None
    }

    fn try_strategy(&self, strategy: Strategy, ctx: &CallContext) -> Option<WorldId> {
        match strategy {
            Strategy::Explicit => ctx.world.clone(),
            Strategy::ThreadCache => self.registry.thread_world(),
            Strategy::Handle => ctx.handle.and_then(|h| self.registry.handle_world(h)),
            Strategy::ThreadNamePrefix => {
                let thread = std::thread::current();
                thread.name().and_then(|n| self.registry.prefix_world(n))
            }
            Strategy::SingleActive => self.registry.single_active(),
            Strategy::DefaultWorld => self.registry.default_world(),
        }
    }

    fn remember(&self, ctx: &CallContext, world: &WorldId) {
        self.registry.note_thread_world(world);
        if let Some(handle) = ctx.handle {
            self.registry.register_handle(handle, world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<WorldRegistry> {
        Arc::new(WorldRegistry::new())
    }

    #[test]
    fn test_explicit_wins_over_everything() {
        let reg = registry();
        reg.set_default_world(&WorldId::new("default"));
        reg.mark_active(&WorldId::new("other"));
        let resolver = IdentityResolver::new(reg);

        let ctx = CallContext::for_world("alpha");
        assert_eq!(resolver.resolve(&ctx), Some(WorldId::new("alpha")));
    }

    #[test]
    fn test_handle_association() {
        let reg = registry();
        reg.register_handle(HandleId(42), &WorldId::new("beta"));
        let resolver = IdentityResolver::new(reg);

        let ctx = CallContext::anonymous().with_handle(HandleId(42));
        assert_eq!(resolver.resolve(&ctx), Some(WorldId::new("beta")));
    }

    #[test]
    fn test_thread_name_prefix() {
        let reg = registry();
        reg.register_thread_prefix("bg-worker", &WorldId::new("alpha"));
        let resolver = IdentityResolver::new(reg);

        let handle = std::thread::Builder::new()
            .name("bg-worker-7".to_string())
            .spawn(move || resolver.resolve(&CallContext::anonymous()))
            .unwrap();
        assert_eq!(handle.join().unwrap(), Some(WorldId::new("alpha")));
    }

    #[test]
    fn test_single_active_world() {
        let reg = registry();
        reg.mark_active(&WorldId::new("solo"));
        let resolver = IdentityResolver::new(reg.clone());

        // Resolve on a fresh thread so no thread cache interferes.
        let handle = std::thread::spawn(move || resolver.resolve(&CallContext::anonymous()));
        assert_eq!(handle.join().unwrap(), Some(WorldId::new("solo")));

        // A second active world makes the heuristic ambiguous.
        reg.mark_active(&WorldId::new("duo"));
        let resolver = IdentityResolver::new(reg.clone());
        reg.set_default_world(&WorldId::new("fallback"));
        let handle = std::thread::spawn(move || resolver.resolve(&CallContext::anonymous()));
        assert_eq!(handle.join().unwrap(), Some(WorldId::new("fallback")));
    }

    #[test]
    fn test_unresolved_when_nothing_known() {
        let resolver = IdentityResolver::new(registry());
        let handle = std::thread::spawn(move || resolver.resolve(&CallContext::anonymous()));
        assert_eq!(handle.join().unwrap(), None);
    }

    #[test]
    fn test_successful_resolution_populates_thread_cache() {
        let reg = registry();
        let resolver = IdentityResolver::new(reg.clone());
        resolver.resolve(&CallContext::for_world("gamma"));
        assert_eq!(reg.thread_world(), Some(WorldId::new("gamma")));
    }
}
