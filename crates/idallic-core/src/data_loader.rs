//! Data-driven catalog loading.
//!
//! Deserializes a JSON catalog pack into a [`CatalogBuilder`], resolving
//! resource references by name. The pack format mirrors [`RecipeDef`] with
//! names in place of ids:
//!
//! ```json
//! {
//!   "resources": ["dirt", "water", "mud", "food"],
//!   "recipes": [
//!     {
//!       "name": "mud",
//!       "inputs": [
//!         { "resource": "dirt", "quantity": 2 },
//!         { "resource": "water", "quantity": 1 }
//!       ],
//!       "output": { "resource": "mud" },
//!       "production_per_tick": 2,
//!       "tick_duration_ms": 2000,
//!       "buy_cost": 8,
//!       "sell_cost": 2
//!     }
//!   ]
//! }
//! ```

use serde::Deserialize;

use crate::catalog::{
    Catalog, CatalogBuilder, CatalogError, PopulationEffect, RecipeDef, RecipeInput, RecipeOutput,
};
use crate::fixed::Millis;

/// Catalog pack loading errors.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("recipe '{recipe}' references undeclared resource '{resource}'")]
    UnknownResourceRef { recipe: String, resource: String },
}

#[derive(Debug, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<RecipeInputData>,
    pub output: RecipeOutputData,
    pub production_per_tick: u32,
    pub tick_duration_ms: Millis,
    pub buy_cost: u32,
    pub sell_cost: u32,
    #[serde(default)]
    pub population: Option<PopulationData>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeInputData {
    pub resource: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecipeOutputData {
    pub resource: String,
    #[serde(default = "default_output_amount")]
    pub amount: u32,
}

fn default_output_amount() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PopulationData {
    #[serde(default)]
    pub growth: Option<u32>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// Parse a pack into a builder, leaving room for programmatic tweaks before
/// the final `build`.
pub fn parse_catalog(json: &str) -> Result<CatalogBuilder, DataLoadError> {
    let data: CatalogData = serde_json::from_str(json)?;
    let mut builder = CatalogBuilder::new();

    for name in &data.resources {
        builder.register_resource(name);
    }

    for recipe in &data.recipes {
        let mut inputs = Vec::with_capacity(recipe.inputs.len());
        for input in &recipe.inputs {
            inputs.push(RecipeInput {
                resource: resolve(&builder, &recipe.name, &input.resource)?,
                quantity: input.quantity,
            });
        }
        let output = RecipeOutput {
            resource: resolve(&builder, &recipe.name, &recipe.output.resource)?,
            amount: recipe.output.amount,
        };

        builder.register_recipe(RecipeDef {
            name: recipe.name.clone(),
            inputs,
            output,
            production_per_tick: recipe.production_per_tick,
            tick_duration_ms: recipe.tick_duration_ms,
            buy_cost: recipe.buy_cost,
            sell_cost: recipe.sell_cost,
            population: recipe.population.as_ref().map(|p| PopulationEffect {
                growth: p.growth,
                capacity: p.capacity,
            }),
        });
    }

    Ok(builder)
}

/// Parse and build in one step.
pub fn load_catalog(json: &str) -> Result<Catalog, DataLoadError> {
    Ok(parse_catalog(json)?.build()?)
}

fn resolve(
    builder: &CatalogBuilder,
    recipe: &str,
    resource: &str,
) -> Result<crate::id::ResourceId, DataLoadError> {
    builder
        .resource_id(resource)
        .ok_or_else(|| DataLoadError::UnknownResourceRef {
            recipe: recipe.to_string(),
            resource: resource.to_string(),
        })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "resources": ["dirt", "water", "mud", "food"],
        "recipes": [
            {
                "name": "dirt",
                "output": { "resource": "dirt" },
                "production_per_tick": 1,
                "tick_duration_ms": 1000,
                "buy_cost": 5,
                "sell_cost": 1
            },
            {
                "name": "mud",
                "inputs": [
                    { "resource": "dirt", "quantity": 2 },
                    { "resource": "water", "quantity": 1 }
                ],
                "output": { "resource": "mud", "amount": 1 },
                "production_per_tick": 2,
                "tick_duration_ms": 2000,
                "buy_cost": 8,
                "sell_cost": 2,
                "population": { "growth": 1 }
            }
        ]
    }"#;

    #[test]
    fn parses_resources_and_recipes() {
        let catalog = load_catalog(SAMPLE).unwrap();
        assert_eq!(catalog.resource_count(), 4);
        assert_eq!(catalog.recipe_count(), 2);

        let mud = catalog.get_recipe(catalog.recipe_id("mud").unwrap()).unwrap();
        assert_eq!(mud.inputs.len(), 2);
        assert_eq!(mud.production_per_tick, 2);
        assert_eq!(mud.population.unwrap().growth, Some(1));

        let dirt = catalog.get_recipe(catalog.recipe_id("dirt").unwrap()).unwrap();
        assert!(dirt.is_producer());
        // Output amount defaults to 1 when omitted.
        assert_eq!(dirt.output.amount, 1);
    }

    #[test]
    fn undeclared_resource_reference_errors() {
        let json = r#"{
            "resources": ["food", "water"],
            "recipes": [{
                "name": "ghost",
                "inputs": [{ "resource": "ectoplasm", "quantity": 1 }],
                "output": { "resource": "food" },
                "production_per_tick": 1,
                "tick_duration_ms": 1000,
                "buy_cost": 1,
                "sell_cost": 1
            }]
        }"#;

        let err = parse_catalog(json).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnknownResourceRef { recipe, resource }
                if recipe == "ghost" && resource == "ectoplasm"
        ));
    }

    #[test]
    fn malformed_json_errors() {
        assert!(matches!(
            parse_catalog("{ not json"),
            Err(DataLoadError::JsonParse(_))
        ));
    }

    #[test]
    fn build_validation_still_applies() {
        // Parseable but missing the water staple.
        let json = r#"{
            "resources": ["food"],
            "recipes": []
        }"#;
        assert!(matches!(
            load_catalog(json),
            Err(DataLoadError::Catalog(CatalogError::MissingStaple("water")))
        ));
    }

    #[test]
    fn stock_catalog_equivalent_pack_round_trips() {
        // A pack can rebalance an existing recipe after parsing.
        let mut builder = parse_catalog(SAMPLE).unwrap();
        builder.mutate_recipe("mud", |def| def.buy_cost = 100).unwrap();
        let catalog = builder.build().unwrap();
        let mud = catalog.get_recipe(catalog.recipe_id("mud").unwrap()).unwrap();
        assert_eq!(mud.buy_cost, 100);
    }
}
