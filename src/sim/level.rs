//! Level lifecycle
//!
//! Owns the catalog, the instantiated level and the "current level" identity.
//! Load/unload notifications are queued as `LevelEvent`s; the owner of the
//! manager drains them right after each call, so there is no subscriber list
//! that can outlive its subscriber.

use std::collections::VecDeque;

use super::catalog::LevelCatalog;
use crate::config::LevelsConfig;
use crate::error::LevelError;
use crate::persistence::ProgressStore;
use crate::platform::{InstanceHandle, World};

/// Lifecycle notification, queued in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEvent {
    /// The previous level is about to be destroyed
    Unloaded { index: usize },
    /// A new level is instantiated and current
    Loaded {
        instance: InstanceHandle,
        index: usize,
    },
}

/// Result of advancing to the next level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextLevel {
    Loaded(usize),
    /// Past the last level with looping disabled; nothing loaded
    EndOfContent,
}

pub struct LevelLifecycleManager {
    catalog: LevelCatalog,
    config: LevelsConfig,
    current_index: Option<usize>,
    current_instance: Option<InstanceHandle>,
    events: VecDeque<LevelEvent>,
}

impl LevelLifecycleManager {
    pub fn new(catalog: LevelCatalog, config: LevelsConfig) -> Self {
        Self {
            catalog,
            config,
            current_index: None,
            current_instance: None,
            events: VecDeque::new(),
        }
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &LevelsConfig {
        &self.config
    }

    /// Index of the current level, `None` until the first successful load
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_instance(&self) -> Option<InstanceHandle> {
        self.current_instance
    }

    /// Next queued notification
    pub fn pop_event(&mut self) -> Option<LevelEvent> {
        self.events.pop_front()
    }

    /// Index a fresh session should start from
    pub fn resolve_start_index(&self, store: &dyn ProgressStore) -> Result<usize, LevelError> {
        if self.catalog.is_empty() {
            log::error!("[LevelManager] No levels in the catalog");
            return Err(LevelError::EmptyCatalog);
        }

        let mut start = self.config.default_start_index;
        if self.config.save_progress {
            if let Some(saved) = store.read_last_level_index() {
                start = saved;
            }
        }
        if store.has_seen_intro() && Some(start) == self.config.demo_index {
            start = self.config.first_real_index;
        }
        self.catalog.clamp(start).ok_or(LevelError::EmptyCatalog)
    }

    /// Load the startup level
    pub fn start(
        &mut self,
        world: &mut dyn World,
        store: &mut dyn ProgressStore,
    ) -> Result<usize, LevelError> {
        let start = self.resolve_start_index(store)?;
        self.load_level(start, world, store)
    }

    /// Tear down the current level and instantiate `index` (clamped)
    ///
    /// A catalog entry without content aborts before anything is torn down,
    /// so the current level stays valid and current.
    pub fn load_level(
        &mut self,
        index: usize,
        world: &mut dyn World,
        store: &mut dyn ProgressStore,
    ) -> Result<usize, LevelError> {
        let Some(index) = self.catalog.clamp(index) else {
            log::error!("[LevelManager] No levels in the catalog");
            return Err(LevelError::EmptyCatalog);
        };
        let entry = self
            .catalog
            .get(index)
            .ok_or(LevelError::EmptyCatalog)?;
        let Some(content) = entry.content else {
            log::error!("[LevelManager] Level {index} has no content");
            return Err(LevelError::MissingContent { index });
        };
        let name = entry.instance_name(index);

        let cleared = world.clear_runtime();
        if cleared > 0 {
            log::debug!("[LevelManager] Cleared {cleared} runtime objects");
        }

        if let Some(instance) = self.current_instance.take() {
            if let Some(previous) = self.current_index {
                self.events.push_back(LevelEvent::Unloaded { index: previous });
            }
            world.destroy(instance);
        }

        let instance = world.instantiate(content, &name);
        self.current_instance = Some(instance);
        self.current_index = Some(index);

        if self.config.save_progress {
            store.write_last_level_index(index);
        }

        self.events
            .push_back(LevelEvent::Loaded { instance, index });
        log::info!("[LevelManager] Loaded level {index} ({name})");
        Ok(index)
    }

    /// Reload the current level; `None` if nothing has loaded yet
    pub fn replay(
        &mut self,
        world: &mut dyn World,
        store: &mut dyn ProgressStore,
    ) -> Result<Option<usize>, LevelError> {
        match self.current_index {
            Some(index) => self.load_level(index, world, store).map(Some),
            None => Ok(None),
        }
    }

    /// Advance to the following level, wrapping or stopping at the end
    pub fn next_level(
        &mut self,
        world: &mut dyn World,
        store: &mut dyn ProgressStore,
    ) -> Result<NextLevel, LevelError> {
        if self.catalog.is_empty() {
            return Err(LevelError::EmptyCatalog);
        }

        let mut next = self.current_index.map_or(0, |i| i + 1);
        if next >= self.catalog.len() {
            if self.config.loop_at_end {
                next = self.config.default_start_index;
            } else {
                log::info!("[LevelManager] Reached the last level, not loading further");
                return Ok(NextLevel::EndOfContent);
            }
        }
        self.load_level(next, world, store).map(NextLevel::Loaded)
    }

    /// Load by catalog id; never falls back to another level
    pub fn load_level_by_id(
        &mut self,
        id: &str,
        world: &mut dyn World,
        store: &mut dyn ProgressStore,
    ) -> Result<usize, LevelError> {
        match self.catalog.position_of(id) {
            Some(index) => self.load_level(index, world, store),
            None => {
                log::warn!("[LevelManager] No level with id '{id}'");
                Err(LevelError::NotFound { id: id.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, SaveData};
    use crate::platform::{ContentHandle, HeadlessWorld, LevelTemplate, WorldCall};
    use crate::sim::catalog::LevelEntry;

    fn catalog() -> LevelCatalog {
        LevelCatalog::new(vec![
            LevelEntry::new("demo", ContentHandle(10)),
            LevelEntry::new("one", ContentHandle(11)),
            LevelEntry {
                id: Some("broken".into()),
                content: None,
            },
            LevelEntry::new("three", ContentHandle(13)),
        ])
        .unwrap()
    }

    fn world() -> HeadlessWorld {
        HeadlessWorld::new()
            .with_template(ContentHandle(10), LevelTemplate::new(1, vec![]))
            .with_template(ContentHandle(11), LevelTemplate::new(2, vec![]))
            .with_template(ContentHandle(13), LevelTemplate::new(3, vec![]))
    }

    fn drain(mgr: &mut LevelLifecycleManager) -> Vec<LevelEvent> {
        std::iter::from_fn(|| mgr.pop_event()).collect()
    }

    #[test]
    fn test_load_sequence_and_events() {
        let mut world = world();
        let probe = world.probe();
        let mut store = MemoryStore::new();
        let mut mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());

        mgr.load_level(0, &mut world, &mut store).unwrap();
        let first = mgr.current_instance().unwrap();
        assert_eq!(
            drain(&mut mgr),
            vec![LevelEvent::Loaded {
                instance: first,
                index: 0
            }]
        );

        mgr.load_level(1, &mut world, &mut store).unwrap();
        let second = mgr.current_instance().unwrap();
        assert_eq!(
            drain(&mut mgr),
            vec![
                LevelEvent::Unloaded { index: 0 },
                LevelEvent::Loaded {
                    instance: second,
                    index: 1
                }
            ]
        );

        // clear runtime, destroy old, instantiate new
        let calls = probe.calls();
        let tail = &calls[calls.len() - 3..];
        assert_eq!(tail[0], WorldCall::ClearRuntime(0));
        assert_eq!(tail[1], WorldCall::Destroy(first));
        assert!(matches!(&tail[2], WorldCall::Instantiate { name, .. } if name == "one"));
        assert_eq!(probe.live_instances(), 1);
        assert_eq!(store.read_last_level_index(), Some(1));
    }

    #[test]
    fn test_index_is_clamped() {
        let mut world = world();
        let mut store = MemoryStore::new();
        let mut mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());
        assert_eq!(mgr.load_level(99, &mut world, &mut store), Ok(3));
    }

    #[test]
    fn test_missing_content_leaves_current_level() {
        let mut world = world();
        let probe = world.probe();
        let mut store = MemoryStore::new();
        let mut mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());
        mgr.load_level(1, &mut world, &mut store).unwrap();
        let instance = mgr.current_instance();
        drain(&mut mgr);

        assert_eq!(
            mgr.load_level(2, &mut world, &mut store),
            Err(LevelError::MissingContent { index: 2 })
        );
        assert_eq!(mgr.current_index(), Some(1));
        assert_eq!(mgr.current_instance(), instance);
        assert_eq!(probe.live_instances(), 1);
        assert!(drain(&mut mgr).is_empty());
        assert_eq!(store.read_last_level_index(), Some(1));
    }

    #[test]
    fn test_replay_before_any_load_is_noop() {
        let mut world = world();
        let mut store = MemoryStore::new();
        let mut mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());
        assert_eq!(mgr.replay(&mut world, &mut store), Ok(None));
        assert!(mgr.pop_event().is_none());
    }

    #[test]
    fn test_next_level_wraps_or_stops() {
        let mut world = world();
        let mut store = MemoryStore::new();
        let mut mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());
        mgr.load_level(3, &mut world, &mut store).unwrap();
        assert_eq!(
            mgr.next_level(&mut world, &mut store),
            Ok(NextLevel::Loaded(0))
        );

        let config = LevelsConfig {
            loop_at_end: false,
            ..Default::default()
        };
        let mut mgr = LevelLifecycleManager::new(catalog(), config);
        mgr.load_level(3, &mut world, &mut store).unwrap();
        drain(&mut mgr);
        assert_eq!(
            mgr.next_level(&mut world, &mut store),
            Ok(NextLevel::EndOfContent)
        );
        assert_eq!(mgr.current_index(), Some(3));
        assert!(mgr.pop_event().is_none());
    }

    #[test]
    fn test_load_by_id() {
        let mut world = world();
        let mut store = MemoryStore::new();
        let mut mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());
        assert_eq!(mgr.load_level_by_id("three", &mut world, &mut store), Ok(3));
        assert_eq!(
            mgr.load_level_by_id("missing", &mut world, &mut store),
            Err(LevelError::NotFound {
                id: "missing".into()
            })
        );
        assert_eq!(mgr.current_index(), Some(3));
    }

    #[test]
    fn test_start_uses_saved_progress() {
        let mut world = world();
        let mut store = MemoryStore::with_data(SaveData {
            last_level_index: Some(7),
            ..Default::default()
        });
        let mut mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());
        // Saved index is clamped into the catalog
        assert_eq!(mgr.start(&mut world, &mut store), Ok(3));

        let config = LevelsConfig {
            save_progress: false,
            ..Default::default()
        };
        let mut store = MemoryStore::with_data(SaveData {
            last_level_index: Some(3),
            ..Default::default()
        });
        let mut mgr = LevelLifecycleManager::new(catalog(), config);
        assert_eq!(mgr.start(&mut world, &mut store), Ok(0));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_seen_intro_skips_demo() {
        let mut store = MemoryStore::with_data(SaveData {
            has_seen_intro: true,
            ..Default::default()
        });
        let mgr = LevelLifecycleManager::new(catalog(), LevelsConfig::default());
        assert_eq!(mgr.resolve_start_index(&store), Ok(1));
        store.write_last_level_index(3);
        assert_eq!(mgr.resolve_start_index(&store), Ok(3));
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let mut world = world();
        let mut store = MemoryStore::new();
        let mut mgr = LevelLifecycleManager::new(LevelCatalog::default(), LevelsConfig::default());
        assert_eq!(mgr.start(&mut world, &mut store), Err(LevelError::EmptyCatalog));
        assert_eq!(
            mgr.next_level(&mut world, &mut store),
            Err(LevelError::EmptyCatalog)
        );
    }
}
