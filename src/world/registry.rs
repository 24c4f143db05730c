//! Per-world generator lifecycle: lazy construction, sharing, invalidation.
//!
//! Hot-path lookups go through a thread-local mirror so steady-state chunk
//! generation never touches a lock. The slow path serializes construction
//! per world behind a re-entrant lock and re-checks the shared table before
//! building, so concurrent callers get one generator instance.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use crate::constants::MAX_CONSTRUCTION_DEPTH;
use crate::error::GenError;
use crate::world::identity::{HandleId, WorldId};
use crate::world::profile::{BiomeSource, GenerationProfile, ProfileProvider, TerrainEngine};

/// Fully constructed generation state for one world.
pub struct GeneratorEntry {
    pub engine: Arc<dyn TerrainEngine>,
    pub biomes: Arc<dyn BiomeSource>,
    pub profile: String,
    pub seed: i64,
    pub created: Instant,
    stale: AtomicBool,
}

impl GeneratorEntry {
    fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }
}

// Manual impl; the engine and biome trait objects have no Debug bound.
impl fmt::Debug for GeneratorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorEntry")
            .field("profile", &self.profile)
            .field("seed", &self.seed)
            .field("stale", &self.is_stale())
            .finish_non_exhaustive()
    }
}

struct ThreadState {
    epoch: u64,
    last_world: Option<WorldId>,
    mirror: FxHashMap<WorldId, Arc<GeneratorEntry>>,
    depth: u32,
}

impl ThreadState {
    fn fresh(epoch: u64) -> Self {
        ThreadState {
            epoch,
            last_world: None,
            mirror: FxHashMap::default(),
            depth: 0,
        }
    }
}

thread_local! {
    // Keyed by registry id so independent registries (tests) don't share
    // thread state.
    static THREAD_STATE: RefCell<FxHashMap<u64, ThreadState>> =
        RefCell::new(FxHashMap::default());
}

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

pub struct WorldRegistry {
    id: u64,
    epoch: AtomicU64,
    entries: RwLock<FxHashMap<WorldId, Arc<GeneratorEntry>>>,
    init_locks: Mutex<FxHashMap<WorldId, Arc<ReentrantMutex<()>>>>,
    handles: RwLock<FxHashMap<HandleId, WorldId>>,
    thread_prefixes: RwLock<Vec<(String, WorldId)>>,
    seeds: RwLock<FxHashMap<WorldId, i64>>,
    active: RwLock<FxHashSet<WorldId>>,
    default_world: RwLock<Option<WorldId>>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        WorldRegistry {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            epoch: AtomicU64::new(0),
            entries: RwLock::new(FxHashMap::default()),
            init_locks: Mutex::new(FxHashMap::default()),
            handles: RwLock::new(FxHashMap::default()),
            thread_prefixes: RwLock::new(Vec::new()),
            seeds: RwLock::new(FxHashMap::default()),
            active: RwLock::new(FxHashSet::default()),
            default_world: RwLock::new(None),
        }
    }

    /// Fetch the world's generator, constructing it on first use.
    ///
    /// Re-entrant calls from the same thread (a host that constructs worlds
    /// from inside generation callbacks) are allowed up to
    /// `MAX_CONSTRUCTION_DEPTH` nested constructions, then rejected.
    pub fn get_or_init(
        &self,
        world: &WorldId,
        hint: Option<&str>,
        profiles: &dyn ProfileProvider,
    ) -> Result<Arc<GeneratorEntry>, GenError> {
        if let Some(entry) = self.mirror_get(world) {
            return Ok(entry);
        }
        if let Some(entry) = self.shared_get(world) {
            self.mirror_put(world, &entry);
            return Ok(entry);
        }

        let lock = self.init_lock(world);
        let _guard = lock.lock();

        // Another thread may have finished while we waited.
        if let Some(entry) = self.shared_get(world) {
            self.mirror_put(world, &entry);
            return Ok(entry);
        }

        let depth = self.enter_construction();
        let _depth = DepthGuard { registry: self };
        if depth > MAX_CONSTRUCTION_DEPTH {
            return Err(GenError::RecursionExceeded(MAX_CONSTRUCTION_DEPTH));
        }
        let entry = self.construct(world, hint, profiles)?;

        self.entries.write().insert(world.clone(), entry.clone());
        self.mirror_put(world, &entry);
        self.mark_active(world);
        Ok(entry)
    }

    fn construct(
        &self,
        world: &WorldId,
        hint: Option<&str>,
        profiles: &dyn ProfileProvider,
    ) -> Result<Arc<GeneratorEntry>, GenError> {
        let start = Instant::now();
        let profile = self.select_profile(world, hint, profiles)?;
        let seed = self.seed_of(world);
        let (engine, biomes) = profile.build(seed)?;
        info!(
            world = %world,
            profile = profile.name(),
            seed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "constructed world generator"
        );
        Ok(Arc::new(GeneratorEntry {
            engine,
            biomes,
            profile: profile.name().to_string(),
            seed,
            created: start,
            stale: AtomicBool::new(false),
        }))
    }

    fn select_profile(
        &self,
        world: &WorldId,
        hint: Option<&str>,
        profiles: &dyn ProfileProvider,
    ) -> Result<Arc<dyn GenerationProfile>, GenError> {
        if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
            match profiles.get_by_name(hint) {
                Some(profile) => return Ok(profile),
                None => warn!(world = %world, hint, "hinted profile not found, trying by name"),
            }
        }

        let wanted = similarity_key(world.as_str());
        for profile in profiles.list_all() {
            if names_similar(&wanted, &similarity_key(profile.name())) {
                return Ok(profile);
            }
        }

        profiles.default_profile().ok_or_else(|| {
            GenError::ProfileMissing(hint.unwrap_or(world.as_str()).to_string())
        })
    }

    fn init_lock(&self, world: &WorldId) -> Arc<ReentrantMutex<()>> {
        self.init_locks
            .lock()
            .entry(world.clone())
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
            .clone()
    }

    fn shared_get(&self, world: &WorldId) -> Option<Arc<GeneratorEntry>> {
        self.entries
            .read()
            .get(world)
            .filter(|e| !e.is_stale())
            .cloned()
    }

    // Thread-local mirror

    fn with_thread_state<R>(&self, f: impl FnOnce(&mut ThreadState) -> R) -> R {
        let epoch = self.epoch.load(Ordering::Acquire);
        THREAD_STATE.with(|cell| {
            let mut map = cell.borrow_mut();
            let state = map
                .entry(self.id)
                .or_insert_with(|| ThreadState::fresh(epoch));
            if state.epoch != epoch {
                let depth = state.depth;
                *state = ThreadState::fresh(epoch);
                state.depth = depth;
            }
            f(state)
        })
    }

    fn mirror_get(&self, world: &WorldId) -> Option<Arc<GeneratorEntry>> {
        self.with_thread_state(|state| {
            match state.mirror.get(world) {
                Some(entry) if !entry.is_stale() => Some(entry.clone()),
                Some(_) => {
                    state.mirror.remove(world);
                    None
                }
                None => None,
            }
        })
    }

    fn mirror_put(&self, world: &WorldId, entry: &Arc<GeneratorEntry>) {
        self.with_thread_state(|state| {
            state.mirror.insert(world.clone(), entry.clone());
        });
    }

    fn enter_construction(&self) -> u32 {
        self.with_thread_state(|state| {
            state.depth += 1;
            state.depth
        })
    }

    fn exit_construction(&self) {
        self.with_thread_state(|state| {
            state.depth = state.depth.saturating_sub(1);
        });
    }

    // Identity bookkeeping used by the resolver

    pub fn note_thread_world(&self, world: &WorldId) {
        self.with_thread_state(|state| state.last_world = Some(world.clone()));
    }

    pub fn thread_world(&self) -> Option<WorldId> {
        self.with_thread_state(|state| state.last_world.clone())
    }

    pub fn register_handle(&self, handle: HandleId, world: &WorldId) {
        self.handles.write().insert(handle, world.clone());
    }

    pub fn handle_world(&self, handle: HandleId) -> Option<WorldId> {
        self.handles.read().get(&handle).cloned()
    }

    /// Associate a host worker-thread name prefix with a world, for hosts
    /// that run generation on named background pools.
    pub fn register_thread_prefix(&self, prefix: &str, world: &WorldId) {
        let mut prefixes = self.thread_prefixes.write();
        prefixes.retain(|(p, _)| p != prefix);
        prefixes.push((prefix.to_string(), world.clone()));
    }

    pub fn prefix_world(&self, thread_name: &str) -> Option<WorldId> {
        self.thread_prefixes
            .read()
            .iter()
            .find(|(prefix, _)| thread_name.starts_with(prefix.as_str()))
            .map(|(_, world)| world.clone())
    }

    pub fn mark_active(&self, world: &WorldId) {
        self.active.write().insert(world.clone());
    }

    /// The single active world, or `None` when zero or several are active.
    pub fn single_active(&self) -> Option<WorldId> {
        let active = self.active.read();
        if active.len() == 1 {
            active.iter().next().cloned()
        } else {
            None
        }
    }

    pub fn set_default_world(&self, world: &WorldId) {
        *self.default_world.write() = Some(world.clone());
    }

    pub fn default_world(&self) -> Option<WorldId> {
        self.default_world.read().clone()
    }

    /// Pin the current thread to a world regardless of what the heuristics
    /// would say.
    pub fn force_identity(&self, world: &WorldId) {
        self.mark_active(world);
        self.note_thread_world(world);
    }

    pub fn bind_seed(&self, world: &WorldId, seed: i64) {
        self.seeds.write().insert(world.clone(), seed);
    }

    /// Bind a seed only if the world has none yet, so a configured seed
    /// never clobbers one the host already supplied.
    pub fn bind_seed_if_absent(&self, world: &WorldId, seed: i64) {
        self.seeds.write().entry(world.clone()).or_insert(seed);
    }

    pub fn seed_of(&self, world: &WorldId) -> i64 {
        self.seeds.read().get(world).copied().unwrap_or(0)
    }

    /// Drop one world's generator. The next `get_or_init` reconstructs it;
    /// mirrors on other threads notice through the stale flag.
    pub fn invalidate(&self, world: &WorldId) {
        if let Some(entry) = self.entries.write().remove(world) {
            entry.mark_stale();
            info!(world = %world, "invalidated world generator");
        }
    }

    /// Drop every generator, force all thread mirrors to rebuild, and wipe
    /// the identity registries (handles, thread prefixes, active set,
    /// default world). Seeds and init locks survive; `reset_all` takes
    /// those too.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write();
        for entry in entries.values() {
            entry.mark_stale();
        }
        let count = entries.len();
        entries.clear();
        drop(entries);
        self.handles.write().clear();
        self.thread_prefixes.write().clear();
        self.active.write().clear();
        *self.default_world.write() = None;
        self.epoch.fetch_add(1, Ordering::Release);
        info!(count, "invalidated all world generators and identity mappings");
    }

    /// Forget everything recorded about one world, identity state included.
    pub fn reset_world(&self, world: &WorldId) {
        self.invalidate(world);
        self.init_locks.lock().remove(world);
        self.handles.write().retain(|_, w| w != world);
        self.thread_prefixes.write().retain(|(_, w)| w != world);
        self.seeds.write().remove(world);
        self.active.write().remove(world);
        let mut default = self.default_world.write();
        if default.as_ref() == Some(world) {
            *default = None;
        }
    }

    /// Full teardown, for host shutdown or reload.
    pub fn reset_all(&self) {
        self.invalidate_all();
        self.init_locks.lock().clear();
        self.seeds.write().clear();
    }
}

impl Default for WorldRegistry {
    fn default() -> Self {
        WorldRegistry::new()
    }
}

// Unwinds the construction depth counter even when a profile build
// errors or panics.
struct DepthGuard<'a> {
    registry: &'a WorldRegistry,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.registry.exit_construction();
    }
}

/// Strip non-alphanumerics and lowercase, so `my_world-1` and `MyWorld1`
/// compare equal.
fn similarity_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn names_similar(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a == b || a.contains(b) || b.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::profile::StaticProfiles;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    struct NullEngine;
    impl TerrainEngine for NullEngine {
        fn fill_chunk(
            &self,
            _chunk: &mut dyn crate::core::ChunkSink,
            _biomes: &dyn BiomeSource,
            _cx: i32,
            _cz: i32,
        ) -> Result<(), GenError> {
            Ok(())
        }
    }

    struct NullBiomes;
    impl BiomeSource for NullBiomes {
        fn biome_at(&self, _x: i32, _z: i32) -> crate::core::BiomeKey {
            crate::core::BiomeKey::plains()
        }
    }

    struct CountingProfile {
        name: String,
        builds: Arc<AtomicUsize>,
    }

    impl GenerationProfile for CountingProfile {
        fn name(&self) -> &str {
            &self.name
        }

        fn build(
            &self,
            _seed: i64,
        ) -> Result<(Arc<dyn TerrainEngine>, Arc<dyn BiomeSource>), GenError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok((Arc::new(NullEngine), Arc::new(NullBiomes)))
        }
    }

    fn counting_provider(name: &str) -> (StaticProfiles, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        let profile = Arc::new(CountingProfile {
            name: name.to_string(),
            builds: builds.clone(),
        }) as Arc<dyn GenerationProfile>;
        (StaticProfiles::with_default(vec![profile]), builds)
    }

    #[test]
    fn test_concurrent_init_constructs_once() {
        let registry = Arc::new(WorldRegistry::new());
        let (provider, builds) = counting_provider("default");
        let provider = Arc::new(provider);
        let world = WorldId::new("race");

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let registry = registry.clone();
                let provider = provider.clone();
                let world = world.clone();
                scope.spawn(move || {
                    registry.get_or_init(&world, None, provider.as_ref()).unwrap();
                });
            }
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_instance_returned_until_invalidated() {
        let registry = WorldRegistry::new();
        let (provider, builds) = counting_provider("default");
        let world = WorldId::new("stable");

        let first = registry.get_or_init(&world, None, &provider).unwrap();
        let again = registry.get_or_init(&world, None, &provider).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        registry.invalidate(&world);
        let rebuilt = registry.get_or_init(&world, None, &provider).unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_all_rebuilds_on_same_thread() {
        let registry = WorldRegistry::new();
        let (provider, _) = counting_provider("default");
        let world = WorldId::new("epochs");

        let first = registry.get_or_init(&world, None, &provider).unwrap();
        registry.invalidate_all();
        // The thread mirror still holds `first`; the epoch bump must
        // prevent it from being served.
        let rebuilt = registry.get_or_init(&world, None, &provider).unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[test]
    fn test_profile_selected_by_hint_then_similarity() {
        let builds = Arc::new(AtomicUsize::new(0));
        let mk = |name: &str| -> Arc<dyn GenerationProfile> {
            Arc::new(CountingProfile {
                name: name.to_string(),
                builds: builds.clone(),
            })
        };
        let provider = StaticProfiles::new(vec![mk("overworld"), mk("skylands")]);
        let registry = WorldRegistry::new();

        let entry = registry
            .get_or_init(&WorldId::new("w1"), Some("skylands"), &provider)
            .unwrap();
        assert_eq!(entry.profile, "skylands");

        // No hint, but the world name matches a profile name loosely.
        let entry = registry
            .get_or_init(&WorldId::new("My_Overworld-1"), None, &provider)
            .unwrap();
        assert_eq!(entry.profile, "overworld");

        // No hint, no match, no default.
        let err = registry
            .get_or_init(&WorldId::new("unrelated"), None, &provider)
            .unwrap_err();
        assert!(matches!(err, GenError::ProfileMissing(_)));
    }

    struct ReentrantProfile {
        registry: Arc<WorldRegistry>,
    }

    impl GenerationProfile for ReentrantProfile {
        fn name(&self) -> &str {
            "reentrant"
        }

        fn build(
            &self,
            _seed: i64,
        ) -> Result<(Arc<dyn TerrainEngine>, Arc<dyn BiomeSource>), GenError> {
            let provider = StaticProfiles::with_default(vec![Arc::new(ReentrantProfile {
                registry: self.registry.clone(),
            }) as Arc<dyn GenerationProfile>]);
            self.registry
                .get_or_init(&WorldId::new("loop"), None, &provider)?;
            Ok((Arc::new(NullEngine), Arc::new(NullBiomes)))
        }
    }

    #[test]
    fn test_recursive_construction_bounded() {
        let registry = Arc::new(WorldRegistry::new());
        let provider = StaticProfiles::with_default(vec![Arc::new(ReentrantProfile {
            registry: registry.clone(),
        }) as Arc<dyn GenerationProfile>]);

        let err = registry
            .get_or_init(&WorldId::new("loop"), None, &provider)
            .unwrap_err();
        assert!(matches!(err, GenError::RecursionExceeded(_)));

        // The depth counter unwinds; a sane profile works afterwards.
        let (sane, _) = counting_provider("default");
        registry.get_or_init(&WorldId::new("loop"), None, &sane).unwrap();
    }

    struct GatedProfile {
        // (started, release): signals entry into build, then waits.
        gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl GenerationProfile for GatedProfile {
        fn name(&self) -> &str {
            "slow"
        }

        fn build(
            &self,
            _seed: i64,
        ) -> Result<(Arc<dyn TerrainEngine>, Arc<dyn BiomeSource>), GenError> {
            if let Some((started, release)) = self.gate.lock().take() {
                started.send(()).ok();
                release.recv().ok();
            }
            Ok((Arc::new(NullEngine), Arc::new(NullBiomes)))
        }
    }

    #[test]
    fn test_slow_init_does_not_block_other_worlds() {
        let registry = Arc::new(WorldRegistry::new());
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let builds = Arc::new(AtomicUsize::new(0));
        // Name-matched profiles, so only the `slow` world hits the gate.
        let slow = Arc::new(GatedProfile {
            gate: Mutex::new(Some((started_tx, release_rx))),
        }) as Arc<dyn GenerationProfile>;
        let fast = Arc::new(CountingProfile {
            name: "fast".to_string(),
            builds: builds.clone(),
        }) as Arc<dyn GenerationProfile>;
        let provider = Arc::new(StaticProfiles::new(vec![slow, fast]));

        let blocked = {
            let registry = registry.clone();
            let provider = provider.clone();
            std::thread::spawn(move || {
                registry.get_or_init(&WorldId::new("slow"), None, provider.as_ref())
            })
        };

        // Wait until the slow build is actually inside `build`, then make
        // sure another world still initializes while it is stuck there.
        started_rx.recv().unwrap();
        registry
            .get_or_init(&WorldId::new("fast"), None, provider.as_ref())
            .unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        blocked.join().unwrap().unwrap();
    }

    #[test]
    fn test_invalidate_all_clears_identity_registries() {
        let registry = WorldRegistry::new();
        let world = WorldId::new("w");
        registry.register_handle(HandleId(9), &world);
        registry.register_thread_prefix("w-gen", &world);
        registry.mark_active(&world);
        registry.set_default_world(&world);
        registry.bind_seed(&world, 77);

        registry.invalidate_all();
        assert!(registry.handle_world(HandleId(9)).is_none());
        assert!(registry.prefix_world("w-gen-1").is_none());
        assert!(registry.single_active().is_none());
        assert!(registry.default_world().is_none());
        // Seeds outlive invalidation; only reset_all forgets them.
        assert_eq!(registry.seed_of(&world), 77);

        registry.reset_all();
        assert_eq!(registry.seed_of(&world), 0);
    }

    #[test]
    fn test_entry_debug_omits_trait_objects() {
        let registry = WorldRegistry::new();
        let (provider, _) = counting_provider("default");
        let entry = registry
            .get_or_init(&WorldId::new("dbg"), None, &provider)
            .unwrap();
        let text = format!("{entry:?}");
        assert!(text.contains("profile"));
        assert!(text.contains("default"));
    }

    #[test]
    fn test_reset_world_clears_identity_state() {
        let registry = WorldRegistry::new();
        let (provider, _) = counting_provider("default");
        let world = WorldId::new("gone");

        registry.get_or_init(&world, None, &provider).unwrap();
        registry.register_handle(HandleId(7), &world);
        registry.register_thread_prefix("gone-gen", &world);
        registry.bind_seed(&world, 1234);
        registry.set_default_world(&world);

        registry.reset_world(&world);
        assert!(registry.handle_world(HandleId(7)).is_none());
        assert!(registry.prefix_world("gone-gen-0").is_none());
        assert_eq!(registry.seed_of(&world), 0);
        assert!(registry.default_world().is_none());
        assert!(registry.single_active().is_none());
    }
}
