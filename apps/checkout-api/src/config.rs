//! # Configuration
//!
//! Two sources:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Environment ──► ServerConfig        (where to listen, which database) │
//! │                                                                         │
//! │  storefronts.toml ──► StorefrontsConfig                                │
//! │                        └── [storefronts.<id>]                          │
//! │                             ├── pricing   → PricingPolicy              │
//! │                             ├── delivery  → free threshold, fees       │
//! │                             ├── checkout  → CheckoutRules              │
//! │                             └── limits    → rate limits, pending cap   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```toml
//! [storefronts.bengolsale]
//! name = "Bengol Sale"
//!
//! [storefronts.bengolsale.pricing]
//! shape = "pack"
//! pack_size = 6
//! pack_price_taka = 1350
//! unit_price_taka = 250
//!
//! [storefronts.bengolsale.checkout]
//! minimum_order_taka = 500
//! ```
//!
//! Every field has a default; an empty `[storefronts.<id>]` table is a
//! flat-priced shop with standard delivery fees and limits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use storefront_core::pricing::{PercentTier, TierShape};
use storefront_core::validation::CheckoutRules;
use storefront_core::{Money, PricingPolicy};

use crate::rate_limit::RateLimit;

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse storefront config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Storefront '{storefront}': {reason}")]
    InvalidStorefront { storefront: String, reason: String },

    #[error("No storefronts configured")]
    NoStorefronts,
}

// =============================================================================
// Server Config (environment)
// =============================================================================

/// Process settings, loaded from environment variables with defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `HOST`, default `0.0.0.0`
    pub host: String,

    /// `PORT`, default 8080
    pub port: u16,

    /// `DATABASE_PATH`, default `storefront.db`
    pub database_path: PathBuf,

    /// `STOREFRONTS_CONFIG`, default `config/storefronts.toml`
    pub storefronts_config: PathBuf,

    /// `NOTIFY_POLL_INTERVAL_SECS`, default 5
    pub notify_poll_interval_secs: u64,

    /// `NOTIFY_BATCH_SIZE`, default 50
    pub notify_batch_size: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "storefront.db".to_string())
                .into(),

            storefronts_config: env::var("STOREFRONTS_CONFIG")
                .unwrap_or_else(|_| "config/storefronts.toml".to_string())
                .into(),

            notify_poll_interval_secs: env::var("NOTIFY_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NOTIFY_POLL_INTERVAL_SECS".to_string()))?,

            notify_batch_size: env::var("NOTIFY_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NOTIFY_BATCH_SIZE".to_string()))?,
        };

        if config.notify_poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("NOTIFY_POLL_INTERVAL_SECS".to_string()));
        }
        if config.notify_batch_size == 0 {
            return Err(ConfigError::InvalidValue("NOTIFY_BATCH_SIZE".to_string()));
        }

        Ok(config)
    }

    /// Address to bind the HTTP listener to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HOST".to_string()))
    }

    pub fn notify_poll_interval(&self) -> Duration {
        Duration::from_secs(self.notify_poll_interval_secs)
    }
}

// =============================================================================
// Storefront Config (TOML)
// =============================================================================

/// All storefronts served by this process, keyed by storefront (brand) id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorefrontsConfig {
    #[serde(default)]
    pub storefronts: BTreeMap<String, StorefrontConfig>,
}

impl StorefrontsConfig {
    /// Reads, parses and validates a storefronts file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading storefront config");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&contents)?;
        info!(storefronts = config.storefronts.len(), "Storefront config loaded");
        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: StorefrontsConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every storefront.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storefronts.is_empty() {
            return Err(ConfigError::NoStorefronts);
        }

        for (id, storefront) in &self.storefronts {
            storefront
                .validate()
                .map_err(|reason| ConfigError::InvalidStorefront {
                    storefront: id.clone(),
                    reason,
                })?;
        }

        Ok(())
    }

    pub fn get(&self, storefront_id: &str) -> Option<&StorefrontConfig> {
        self.storefronts.get(storefront_id)
    }
}

/// One storefront's policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Display name, also used for the brand row.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Quantity-discount shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PricingConfig {
    /// No quantity discount.
    #[default]
    Flat,

    /// `pack_size` units for `pack_price_taka`, the rest at `unit_price_taka`.
    Pack {
        pack_size: i64,
        pack_price_taka: i64,
        unit_price_taka: i64,
    },

    /// Highest met tier applies.
    Percentage {
        #[serde(default = "default_percent_tiers")]
        tiers: Vec<PercentTierConfig>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentTierConfig {
    pub min_quantity: i64,
    pub discount_percent: u32,
}

/// Free-delivery threshold and flat fees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_true")]
    pub free_delivery: bool,

    /// Qualifying quantity that waives the fee.
    #[serde(default = "default_free_delivery_threshold")]
    pub free_delivery_threshold: i64,

    #[serde(default = "default_inside_fee")]
    pub inside_fee_taka: i64,

    #[serde(default = "default_outside_fee")]
    pub outside_fee_taka: i64,
}

/// Checkout gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Compared with the discounted subtotal; 0 disables the check.
    #[serde(default)]
    pub minimum_order_taka: i64,

    /// e.g. 10 rolls for the wallpaper shop.
    #[serde(default)]
    pub minimum_quantity: Option<i64>,

    #[serde(default = "default_min_address_length")]
    pub min_address_length: usize,
}

/// Abuse limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_ip_max_requests")]
    pub ip_max_requests: u32,

    #[serde(default = "default_ip_window_secs")]
    pub ip_window_secs: u64,

    #[serde(default = "default_phone_max_requests")]
    pub phone_max_requests: u32,

    #[serde(default = "default_phone_window_secs")]
    pub phone_window_secs: u64,

    /// Reject once a phone has this many `PENDING` orders.
    #[serde(default = "default_max_pending_orders")]
    pub max_pending_orders: i64,
}

// -----------------------------------------------------------------------------
// Defaults
// -----------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_percent_tiers() -> Vec<PercentTierConfig> {
    vec![
        PercentTierConfig {
            min_quantity: 6,
            discount_percent: 5,
        },
        PercentTierConfig {
            min_quantity: 3,
            discount_percent: 3,
        },
    ]
}

fn default_free_delivery_threshold() -> i64 {
    storefront_core::pricing::DEFAULT_FREE_DELIVERY_THRESHOLD
}

fn default_inside_fee() -> i64 {
    storefront_core::pricing::DEFAULT_INSIDE_FEE_TAKA
}

fn default_outside_fee() -> i64 {
    storefront_core::pricing::DEFAULT_OUTSIDE_FEE_TAKA
}

fn default_min_address_length() -> usize {
    storefront_core::DEFAULT_MIN_ADDRESS_LENGTH
}

fn default_ip_max_requests() -> u32 {
    50
}

fn default_ip_window_secs() -> u64 {
    15 * 60
}

fn default_phone_max_requests() -> u32 {
    200
}

fn default_phone_window_secs() -> u64 {
    60 * 60
}

fn default_max_pending_orders() -> i64 {
    20
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        DeliveryConfig {
            free_delivery: true,
            free_delivery_threshold: default_free_delivery_threshold(),
            inside_fee_taka: default_inside_fee(),
            outside_fee_taka: default_outside_fee(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            minimum_order_taka: 0,
            minimum_quantity: None,
            min_address_length: default_min_address_length(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            ip_max_requests: default_ip_max_requests(),
            ip_window_secs: default_ip_window_secs(),
            phone_max_requests: default_phone_max_requests(),
            phone_window_secs: default_phone_window_secs(),
            max_pending_orders: default_max_pending_orders(),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversion into domain policy
// -----------------------------------------------------------------------------

impl StorefrontConfig {
    /// Builds the pricing engine policy.
    pub fn pricing_policy(&self) -> PricingPolicy {
        let tiers = match &self.pricing {
            PricingConfig::Flat => TierShape::Flat,
            PricingConfig::Pack {
                pack_size,
                pack_price_taka,
                unit_price_taka,
            } => TierShape::Pack {
                pack_size: *pack_size,
                pack_price: Money::from_taka(*pack_price_taka),
                unit_price: Money::from_taka(*unit_price_taka),
            },
            PricingConfig::Percentage { tiers } => TierShape::Percentage {
                tiers: tiers
                    .iter()
                    .map(|t| PercentTier {
                        min_quantity: t.min_quantity,
                        discount_bps: t.discount_percent * 100,
                    })
                    .collect(),
            },
        };

        let threshold = self
            .delivery
            .free_delivery
            .then_some(self.delivery.free_delivery_threshold);

        PricingPolicy::new(tiers)
            .with_free_delivery_threshold(threshold)
            .with_delivery_fees(
                Money::from_taka(self.delivery.inside_fee_taka),
                Money::from_taka(self.delivery.outside_fee_taka),
            )
    }

    /// Builds the checkout gate rules.
    pub fn checkout_rules(&self) -> CheckoutRules {
        CheckoutRules {
            min_address_length: self.checkout.min_address_length,
            minimum_order: Money::from_taka(self.checkout.minimum_order_taka),
            minimum_quantity: self.checkout.minimum_quantity,
        }
    }

    pub fn ip_limit(&self) -> RateLimit {
        RateLimit::new(
            self.limits.ip_max_requests,
            Duration::from_secs(self.limits.ip_window_secs),
        )
    }

    pub fn phone_limit(&self) -> RateLimit {
        RateLimit::new(
            self.limits.phone_max_requests,
            Duration::from_secs(self.limits.phone_window_secs),
        )
    }

    /// Returns a human-readable reason on failure.
    fn validate(&self) -> Result<(), String> {
        match &self.pricing {
            PricingConfig::Flat => {}
            PricingConfig::Pack {
                pack_size,
                pack_price_taka,
                unit_price_taka,
            } => {
                if *pack_size < 2 {
                    return Err("pack_size must be at least 2".into());
                }
                if *pack_price_taka <= 0 || *unit_price_taka <= 0 {
                    return Err("pack and unit prices must be positive".into());
                }
            }
            PricingConfig::Percentage { tiers } => {
                if tiers.is_empty() {
                    return Err("percentage pricing needs at least one tier".into());
                }
                for tier in tiers {
                    if tier.min_quantity < 1 {
                        return Err("tier min_quantity must be at least 1".into());
                    }
                    if tier.discount_percent == 0 || tier.discount_percent >= 100 {
                        return Err("tier discount_percent must be between 1 and 99".into());
                    }
                }
            }
        }

        if self.delivery.free_delivery && self.delivery.free_delivery_threshold < 1 {
            return Err("free_delivery_threshold must be at least 1".into());
        }
        if self.delivery.inside_fee_taka < 0 || self.delivery.outside_fee_taka < 0 {
            return Err("delivery fees cannot be negative".into());
        }
        if self.checkout.minimum_order_taka < 0 {
            return Err("minimum_order_taka cannot be negative".into());
        }
        if matches!(self.checkout.minimum_quantity, Some(q) if q < 1) {
            return Err("minimum_quantity must be at least 1".into());
        }
        if self.limits.ip_max_requests == 0 || self.limits.phone_max_requests == 0 {
            return Err("rate limits must allow at least one request".into());
        }
        if self.limits.ip_window_secs == 0 || self.limits.phone_window_secs == 0 {
            return Err("rate limit windows must be non-zero".into());
        }
        if self.limits.max_pending_orders < 1 {
            return Err("max_pending_orders must be at least 1".into());
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{DeliveryArea, LineItem};

    const SAMPLE: &str = r#"
        [storefronts.stylehunt]
        name = "StyleHunt"

        [storefronts.stylehunt.pricing]
        shape = "percentage"

        [storefronts.bengolsale]
        name = "Bengol Sale"

        [storefronts.bengolsale.pricing]
        shape = "pack"
        pack_size = 6
        pack_price_taka = 1350
        unit_price_taka = 250

        [storefronts.abedinterior]
        name = "Abed Interior"

        [storefronts.abedinterior.checkout]
        minimum_quantity = 10

        [storefronts.abedinterior.delivery]
        free_delivery = false
    "#;

    #[test]
    fn test_parse_sample_with_defaults() {
        let config = StorefrontsConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.storefronts.len(), 3);

        let stylehunt = config.get("stylehunt").unwrap();
        assert_eq!(stylehunt.limits.ip_max_requests, 50);
        assert_eq!(stylehunt.limits.max_pending_orders, 20);
        assert_eq!(stylehunt.checkout.min_address_length, 10);
        assert_eq!(stylehunt.pricing_policy(), PricingPolicy::percentage_tiers());

        assert!(config.get("unknown").is_none());
    }

    #[test]
    fn test_pack_policy_prices_bundles() {
        let config = StorefrontsConfig::from_toml_str(SAMPLE).unwrap();
        let policy = config.get("bengolsale").unwrap().pricing_policy();

        let items = vec![LineItem::new("dates", "Dates", Money::from_taka(250), 7)];
        let quote = policy.price(&items, Some(DeliveryArea::Outside));
        assert_eq!(quote.subtotal, Money::from_taka(1600));
        assert!(quote.free_delivery);
    }

    #[test]
    fn test_free_delivery_can_be_disabled() {
        let config = StorefrontsConfig::from_toml_str(SAMPLE).unwrap();
        let abed = config.get("abedinterior").unwrap();
        assert_eq!(abed.pricing_policy().free_delivery_threshold, None);
        assert_eq!(abed.checkout_rules().minimum_quantity, Some(10));
    }

    #[test]
    fn test_rejects_invalid_storefront() {
        let err = StorefrontsConfig::from_toml_str(
            r#"
            [storefronts.broken.pricing]
            shape = "pack"
            pack_size = 1
            pack_price_taka = 100
            unit_price_taka = 50
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStorefront { ref storefront, .. } if storefront == "broken"));

        let err = StorefrontsConfig::from_toml_str("").unwrap_err();
        assert!(matches!(err, ConfigError::NoStorefronts));

        let err = StorefrontsConfig::from_toml_str("[storefronts.x.pricing]\nshape = \"bogus\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_server_config_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            database_path: PathBuf::from("test.db"),
            storefronts_config: PathBuf::from("config/storefronts.toml"),
            notify_poll_interval_secs: 5,
            notify_batch_size: 50,
        };
        assert_eq!(config.socket_addr().unwrap().port(), 9000);
        assert_eq!(config.notify_poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_shipped_storefronts_file_is_valid() {
        let config =
            StorefrontsConfig::from_toml_str(include_str!("../../../config/storefronts.toml")).unwrap();

        let abed = config.get("abedinterior").unwrap();
        assert_eq!(abed.checkout_rules().minimum_quantity, Some(10));
        assert_eq!(abed.pricing_policy().free_delivery_threshold, None);

        let fruits = config.get("fruits-zone").unwrap();
        assert_eq!(fruits.checkout_rules().minimum_order, Money::from_taka(500));
        assert_eq!(fruits.limits.max_pending_orders, 20);
    }
}
