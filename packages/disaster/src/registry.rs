//! Schema registry: loads every disaster schema from embedded TOML configs.
//!
//! Each `.toml` file in `packages/disaster/schemas/` is baked into the
//! binary at compile time via [`include_str!`].

use std::collections::BTreeMap;

use damage_map_disaster_models::DisasterType;

use crate::{
    FeatureError, SchemaError,
    schema::{DisasterSchema, parse_schema_toml},
};

/// TOML configs embedded at compile time.
const SCHEMA_TOMLS: &[(&str, &str)] = &[
    ("tornado", include_str!("../schemas/tornado.toml")),
    ("flood", include_str!("../schemas/flood.toml")),
    ("lightning", include_str!("../schemas/lightning.toml")),
    ("high_wind", include_str!("../schemas/high_wind.toml")),
    ("wildfire", include_str!("../schemas/wildfire.toml")),
    (
        "tropical_depression",
        include_str!("../schemas/tropical_depression.toml"),
    ),
];

/// Returns all embedded schema declarations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_schemas() -> Vec<DisasterSchema> {
    SCHEMA_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_schema_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// One schema per disaster type. Immutable after construction.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<DisasterType, DisasterSchema>,
}

impl SchemaRegistry {
    /// Builds the registry from the embedded schema configs.
    ///
    /// # Panics
    ///
    /// Panics if the embedded configs are malformed or do not declare
    /// exactly one schema per disaster type.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_schemas(all_schemas())
            .unwrap_or_else(|e| panic!("Invalid embedded schema set: {e}"))
    }

    /// Builds a registry from explicit schemas.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if a schema is inconsistent, a disaster type
    /// is declared twice, or a disaster type has no schema.
    pub fn from_schemas(schemas: Vec<DisasterSchema>) -> Result<Self, SchemaError> {
        let mut by_type = BTreeMap::new();

        for schema in schemas {
            schema.validate()?;
            let disaster = schema.disaster;
            if by_type.insert(disaster, schema).is_some() {
                return Err(SchemaError::DuplicateDisaster(disaster));
            }
        }

        if let Some(missing) = DisasterType::all()
            .iter()
            .find(|d| !by_type.contains_key(*d))
        {
            return Err(SchemaError::MissingDisaster(*missing));
        }

        Ok(Self { schemas: by_type })
    }

    /// Returns the schema for a disaster type.
    #[must_use]
    pub fn schema_for(&self, disaster: DisasterType) -> &DisasterSchema {
        // Every disaster type is present after `from_schemas`.
        &self.schemas[&disaster]
    }

    /// All schemas in disaster-type order.
    pub fn schemas(&self) -> impl Iterator<Item = &DisasterSchema> {
        self.schemas.values()
    }

    /// Returns `true` if `state` has recorded events of `disaster` since
    /// 2007.
    #[must_use]
    pub fn is_state_valid(&self, disaster: DisasterType, state: &str) -> bool {
        self.schema_for(disaster).is_state_valid(state)
    }

    /// Like [`Self::is_state_valid`], but produces the user-facing error.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::UnsupportedState`] if the state has no
    /// recorded events of this type.
    pub fn ensure_state_valid(
        &self,
        disaster: DisasterType,
        state: &str,
    ) -> Result<(), FeatureError> {
        if self.is_state_valid(disaster, state) {
            Ok(())
        } else {
            Err(FeatureError::UnsupportedState {
                disaster,
                state: state.to_string(),
            })
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::embedded()
    }
}
