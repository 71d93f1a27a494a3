//! Source manifest management
//!
//! The manifest lists the files a run fetches, where they come from and how
//! each is cleaned. Without a manifest file the built-in one is used.
//!
//! Example format:
//! ```yaml
//! sources:
//!   - name: orders.json.gz
//!     url: https://example.com/order.json.gz
//!     recipe:
//!       - op: handle_missing
//!         columns: [customer_id]
//!         policy: drop
//!   - name: ab_test.tar.gz
//!     url: https://example.com/ab_test_ref.tar.gz
//!     member_prefix: ab
//! ```

use crate::extract::ContainerKind;
use crate::transform::{MissingPolicy, Recipe, TargetType};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

const SOURCE_BUCKET: &str = "https://data-architect-test-source.s3-sa-east-1.amazonaws.com";

/// Suffix added to the artifact name of cleaned datasets
pub const PROCESSED_SUFFIX: &str = "_processed";

/// One remote file to fetch and process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceEntry {
    /// Local file name, e.g. `orders.json.gz`
    pub name: String,
    /// Remote location
    pub url: Url,
    /// Cleaning steps; `None` passes the table through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    /// Tar member prefix, for `.tar.gz` sources only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_prefix: Option<String>,
}

impl SourceEntry {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            recipe: None,
            member_prefix: None,
        }
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.recipe = Some(recipe);
        self
    }

    pub fn with_member_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.member_prefix = Some(prefix.into());
        self
    }

    /// Dataset name: the file name up to its first `.`
    pub fn stem(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Container kind from the file suffix, `None` when unsupported
    pub fn container_kind(&self) -> Option<ContainerKind> {
        let kind = ContainerKind::from_file_name(&self.name)?;
        Some(match &self.member_prefix {
            Some(prefix) => kind.with_member_prefix(prefix.as_str()),
            None => kind,
        })
    }

    /// Name of the final artifact, without extension
    pub fn artifact_name(&self) -> String {
        match &self.recipe {
            Some(_) => format!("{}{}", self.stem(), PROCESSED_SUFFIX),
            None => self.stem().to_string(),
        }
    }
}

/// Sources manifest structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourcesManifest {
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl SourcesManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(sources: Vec<SourceEntry>) -> Self {
        Self { sources }
    }

    /// The four datasets the pipeline was built for, with their recipes
    pub fn builtin() -> Result<Self> {
        let remote = |file: &str| -> Result<Url> {
            Url::parse(&format!("{SOURCE_BUCKET}/{file}"))
                .with_context(|| format!("Invalid built-in source URL for {file}"))
        };

        let orders = Recipe::new()
            .handle_missing(["customer_id"], MissingPolicy::Drop)
            .coerce_types([
                ("order_created_at", TargetType::Datetime),
                ("order_total_amount", TargetType::Float),
                ("order_scheduled_date", TargetType::Datetime),
            ])
            .deduplicate("order_id", "order_created_at");

        let consumers = Recipe::new()
            .handle_missing(["customer_name"], MissingPolicy::fill("n/d"))
            .coerce_types([
                ("created_at", TargetType::Datetime),
                ("customer_phone_number", TargetType::Integer),
            ])
            .deduplicate("customer_id", "created_at");

        let restaurants = Recipe::new()
            .handle_missing(["minimum_order_value"], MissingPolicy::fill(0i64))
            .coerce_types([
                ("created_at", TargetType::Datetime),
                ("price_range", TargetType::Integer),
                ("takeout_time", TargetType::Integer),
                ("average_ticket", TargetType::Float),
                ("delivery_time", TargetType::Float),
                ("minimum_order_value", TargetType::Float),
            ])
            .deduplicate("id", "created_at");

        Ok(Self::with_sources(vec![
            SourceEntry::new("orders.json.gz", remote("order.json.gz")?).with_recipe(orders),
            SourceEntry::new("consumers.csv.gz", remote("consumer.csv.gz")?)
                .with_recipe(consumers),
            SourceEntry::new("restaurants.csv.gz", remote("restaurant.csv.gz")?)
                .with_recipe(restaurants),
            SourceEntry::new("ab_test.tar.gz", remote("ab_test_ref.tar.gz")?),
        ]))
    }

    /// Look up a source by file name
    pub fn get(&self, name: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Get the number of sources in the manifest
    pub fn count(&self) -> usize {
        self.sources.len()
    }

    /// Read manifest from YAML file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read sources manifest: {}",
                path.as_ref().display()
            )
        })?;

        let manifest: Self = serde_yaml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse sources manifest YAML: {}",
                path.as_ref().display()
            )
        })?;

        Ok(manifest)
    }

    /// Write manifest to YAML file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml =
            serde_yaml::to_string(self).with_context(|| "Failed to serialize sources manifest")?;

        std::fs::write(path.as_ref(), yaml).with_context(|| {
            format!(
                "Failed to write sources manifest: {}",
                path.as_ref().display()
            )
        })?;

        log::debug!(
            "Wrote sources manifest with {} entries to {}",
            self.count(),
            path.as_ref().display()
        );
        Ok(())
    }
}
