use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorefrontConfig {
    pub shop: ShopConfig,
    pub recently_viewed: RecentlyViewedConfig,
    pub animation: AnimationConfig,
    pub storage: StorageConfig,
    /// Theme editor preview; enables re-rendering on section signals.
    pub design_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9292".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentlyViewedConfig {
    pub storage_key: String,
    pub max_items: usize,
}

impl Default for RecentlyViewedConfig {
    fn default() -> Self {
        Self {
            storage_key: "estelle_recently_viewed".to_string(),
            max_items: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Minimum visible ratio before an element counts as intersecting.
    pub threshold: f32,
    pub default_effect: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            default_effect: "fade-in".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Backing file for the durable store. `None` keeps everything in memory.
    pub path: Option<PathBuf>,
}

impl StorefrontConfig {
    pub fn load(path: &Path) -> CoreResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: StorefrontConfig = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.shop.base_url.trim().is_empty() {
            return Err(CoreError::Config("shop.base_url is required".to_string()));
        }
        if self.recently_viewed.max_items == 0 {
            return Err(CoreError::Config(
                "recently_viewed.max_items must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.animation.threshold) {
            return Err(CoreError::Config(format!(
                "animation.threshold must be within 0..=1, got {}",
                self.animation.threshold
            )));
        }
        Ok(())
    }
}
