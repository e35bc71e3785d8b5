//! Process-wide codec registry.
//!
//! Maps a codec name to a constructor. The global instance is created on
//! first access and pre-populated with the built-in codecs, so registration
//! from any module, library or thread never depends on initialization order.
//! A single mutex guards the map; it is held only while the map is read or
//! mutated, never while a constructor runs.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::adf::{AdfCodec, ADF_CODEC_NAME};
use crate::pcm::{PcmCodec, PCM_CODEC_NAME};
use crate::AudioCodec;

/// Zero-argument factory producing a fresh, exclusively owned codec.
pub type CodecConstructor = Arc<dyn Fn() -> Box<dyn AudioCodec> + Send + Sync>;

/// Name → constructor map with first-registration-wins semantics.
#[derive(Default)]
pub struct CodecRegistry {
    constructors: Mutex<BTreeMap<String, CodecConstructor>>,
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in codecs (`pcm`, `adf`).
    pub fn with_builtin_codecs() -> Self {
        let registry = Self::new();
        register_builtin_codecs(&registry);
        registry
    }

    /// The process-wide registry, created with the built-in codecs on first use.
    pub fn global() -> &'static CodecRegistry {
        static GLOBAL: OnceLock<CodecRegistry> = OnceLock::new();
        GLOBAL.get_or_init(CodecRegistry::with_builtin_codecs)
    }

    /// Register `constructor` under `name`.
    ///
    /// Returns `false` and keeps the existing entry if `name` is taken.
    pub fn register<F>(&self, name: impl Into<String>, constructor: F) -> bool
    where
        F: Fn() -> Box<dyn AudioCodec> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut constructors = self.constructors.lock();
        if constructors.contains_key(&name) {
            tracing::debug!(codec = %name, "Codec already registered, keeping the first");
            return false;
        }
        tracing::info!(codec = %name, "Registered codec");
        constructors.insert(name, Arc::new(constructor));
        true
    }

    /// Construct a new instance of the codec registered as `name`.
    ///
    /// Returns `None` for unknown names.
    pub fn create(&self, name: &str) -> Option<Box<dyn AudioCodec>> {
        let constructor = self.constructors.lock().get(name).cloned();
        match constructor {
            Some(constructor) => Some(constructor()),
            None => {
                tracing::debug!(codec = name, "Unknown codec requested");
                None
            }
        }
    }

    /// Whether a codec is registered as `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.lock().contains_key(name)
    }

    /// All registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.constructors.lock().keys().cloned().collect()
    }
}

/// Register every codec this crate ships with.
pub fn register_builtin_codecs(registry: &CodecRegistry) {
    registry.register(PCM_CODEC_NAME, || Box::new(PcmCodec::new()) as Box<dyn AudioCodec>);
    registry.register(ADF_CODEC_NAME, || Box::new(AdfCodec::new()) as Box<dyn AudioCodec>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AudioFormat;

    #[test]
    fn test_builtin_codecs_are_registered() {
        let registry = CodecRegistry::with_builtin_codecs();
        assert_eq!(registry.names(), vec!["adf".to_string(), "pcm".to_string()]);

        for name in ["pcm", "adf"] {
            let codec = registry.create(name).unwrap();
            assert_eq!(codec.name(), name, "instance name must match registry key");
            assert!(codec.format().is_unset());
        }
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let registry = CodecRegistry::new();
        assert!(registry.register("dup", || Box::new(PcmCodec::new()) as Box<dyn AudioCodec>));
        assert!(!registry.register("dup", || Box::new(AdfCodec::new()) as Box<dyn AudioCodec>));

        let codec = registry.create("dup").unwrap();
        assert_eq!(codec.name(), "pcm");
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn test_unknown_name_creates_nothing() {
        let registry = CodecRegistry::with_builtin_codecs();
        assert!(registry.create("unknown-codec").is_none());
        assert!(!registry.contains("unknown-codec"));
        assert!(CodecRegistry::new().create("pcm").is_none());
    }

    #[test]
    fn test_each_create_returns_a_fresh_instance() {
        let registry = CodecRegistry::with_builtin_codecs();
        let mut first = registry.create("pcm").unwrap();
        first.initialize(AudioFormat::new(44100, 2, 16)).unwrap();

        let second = registry.create("pcm").unwrap();
        assert!(second.format().is_unset());
        assert_eq!(first.format().sample_rate, 44100);
    }

    #[test]
    fn test_concurrent_registration_has_one_winner() {
        let registry = CodecRegistry::new();
        let wins: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        registry.register("contended", || {
                            Box::new(PcmCodec::new()) as Box<dyn AudioCodec>
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(wins.iter().filter(|&&won| won).count(), 1);
        assert!(registry.contains("contended"));
    }

    #[test]
    fn test_constructor_runs_outside_the_lock() {
        static ISOLATED: OnceLock<CodecRegistry> = OnceLock::new();
        fn isolated() -> &'static CodecRegistry {
            ISOLATED.get_or_init(CodecRegistry::with_builtin_codecs)
        }

        isolated().register("reentrant", || {
            // Would deadlock if `create` held the registry mutex here.
            assert!(isolated().contains("pcm"));
            Box::new(PcmCodec::new()) as Box<dyn AudioCodec>
        });
        assert!(isolated().create("reentrant").is_some());
        assert!(!CodecRegistry::global().contains("reentrant"));
    }

    #[test]
    fn test_global_is_shared() {
        let a = CodecRegistry::global() as *const CodecRegistry;
        let b = CodecRegistry::global() as *const CodecRegistry;
        assert_eq!(a, b);
        assert!(CodecRegistry::global().contains("adf"));
    }
}
