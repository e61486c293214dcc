//! Scroll-triggered reveal animations.

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use atelier_core::config::AnimationConfig;

use crate::host::AnimationHost;

pub const ANIMATED_CLASS: &str = "is-animated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedElement {
    pub id: String,
    /// Value of the element's animation attribute; blank means the default.
    pub effect: Option<String>,
}

impl AnimatedElement {
    pub fn new(id: impl Into<String>, effect: Option<&str>) -> Self {
        Self {
            id: id.into(),
            effect: effect.map(str::to_string),
        }
    }
}

/// One visibility observation reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityEntry {
    pub id: String,
    pub is_intersecting: bool,
    pub intersection_ratio: f32,
}

#[derive(Default)]
struct Watch {
    /// Armed elements in arming order, with their resolved effect.
    armed: VecDeque<(String, String)>,
    animated: HashSet<String>,
}

pub struct AnimationTrigger {
    host: Arc<dyn AnimationHost>,
    threshold: f32,
    default_effect: String,
    watch: Mutex<Watch>,
}

impl AnimationTrigger {
    pub fn new(host: Arc<dyn AnimationHost>, cfg: &AnimationConfig) -> Self {
        Self {
            host,
            threshold: cfg.threshold,
            default_effect: cfg.default_effect.clone(),
            watch: Mutex::new(Watch::default()),
        }
    }

    /// Start watching `elements`. Elements already armed or already animated
    /// are skipped. Returns how many were newly armed.
    pub fn arm(&self, elements: impl IntoIterator<Item = AnimatedElement>) -> usize {
        let mut watch = self.watch.lock();
        let mut armed = 0;
        for element in elements {
            if watch.animated.contains(&element.id)
                || watch.armed.iter().any(|(id, _)| *id == element.id)
            {
                continue;
            }
            let effect = element
                .effect
                .filter(|effect| !effect.trim().is_empty())
                .unwrap_or_else(|| self.default_effect.clone());
            watch.armed.push_back((element.id, effect));
            armed += 1;
        }
        armed
    }

    /// Apply the animation to every armed element that became visible and
    /// stop watching it. Returns the ids animated, in arming order.
    pub fn observe(&self, entries: &[VisibilityEntry]) -> Vec<String> {
        let fired: Vec<(String, String)> = {
            let mut watch = self.watch.lock();
            let visible: HashSet<&str> = entries
                .iter()
                .filter(|entry| entry.is_intersecting && entry.intersection_ratio >= self.threshold)
                .map(|entry| entry.id.as_str())
                .collect();
            if visible.is_empty() {
                return Vec::new();
            }

            let (fired, still_armed): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut watch.armed)
                .into_iter()
                .partition(|(id, _)| visible.contains(id.as_str()));
            watch.armed = still_armed;
            for (id, _) in &fired {
                watch.animated.insert(id.clone());
            }
            fired.into_iter().collect()
        };

        for (id, effect) in &fired {
            let classes = [ANIMATED_CLASS.to_string(), format!("animate--{effect}")];
            self.host.apply_classes(id, &classes);
        }
        fired.into_iter().map(|(id, _)| id).collect()
    }

    pub fn armed_count(&self) -> usize {
        self.watch.lock().armed.len()
    }

    pub fn is_animated(&self, id: &str) -> bool {
        self.watch.lock().animated.contains(id)
    }
}
