//! Recipe and resource catalog.
//!
//! The catalog is built once at startup and stays immutable while the
//! simulation runs. Construction goes through [`CatalogBuilder`], which
//! assigns dense ids and validates cross-references at [`CatalogBuilder::build`]
//! so the rest of the engine can index by id without re-checking names.
//!
//! A recipe with no inputs is a producer: its timer credits output
//! unconditionally. A recipe with inputs is a consumer: its timer only fires
//! usefully when every input is bound and covered by the shared ledger.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::fixed::Millis;
use crate::id::{RecipeId, ResourceId};

// ---------------------------------------------------------------------------
// Recipe definitions
// ---------------------------------------------------------------------------

/// One input requirement: `quantity` units of `resource` per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeInput {
    pub resource: ResourceId,
    pub quantity: u32,
}

/// The produced resource and its per-cycle amount (scaled by rate and level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeOutput {
    pub resource: ResourceId,
    pub amount: u32,
}

/// Population side effect applied on every successful consumer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationEffect {
    /// Added to the population total (clamped to capacity).
    pub growth: Option<u32>,
    /// Added to the population capacity (never clamped).
    pub capacity: Option<u32>,
}

/// A complete recipe definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDef {
    pub name: String,
    /// Empty for producers.
    pub inputs: Vec<RecipeInput>,
    pub output: RecipeOutput,
    /// Output multiplier per completed tick. At least 1.
    pub production_per_tick: u32,
    /// Repeating timer interval for nodes of this recipe. At least 1.
    pub tick_duration_ms: Millis,
    /// Coin cost to place a node of this recipe.
    pub buy_cost: u32,
    /// Coins credited per unit sold from the shared inventory.
    pub sell_cost: u32,
    pub population: Option<PopulationEffect>,
}

impl RecipeDef {
    /// Producers have no inputs and never stall.
    pub fn is_producer(&self) -> bool {
        self.inputs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Mutable registration phase. Ids are assigned in registration order.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    resources: Vec<String>,
    resource_ids: HashMap<String, ResourceId>,
    recipes: Vec<RecipeDef>,
    recipe_ids: HashMap<String, RecipeId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource kind. Registering the same name twice returns the
    /// id assigned the first time.
    pub fn register_resource(&mut self, name: &str) -> ResourceId {
        if let Some(&id) = self.resource_ids.get(name) {
            return id;
        }
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(name.to_string());
        self.resource_ids.insert(name.to_string(), id);
        id
    }

    /// Register a recipe. Duplicate names are caught at `build`.
    pub fn register_recipe(&mut self, def: RecipeDef) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipe_ids.insert(def.name.clone(), id);
        self.recipes.push(def);
        id
    }

    /// Adjust an already registered recipe before building, e.g. rebalancing
    /// costs loaded from a data file.
    pub fn mutate_recipe<F>(&mut self, name: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut RecipeDef),
    {
        let id = self
            .recipe_ids
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        f(&mut self.recipes[id.0 as usize]);
        Ok(())
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_ids.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_ids.get(name).copied()
    }

    /// Validate everything and freeze into an immutable [`Catalog`].
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut seen = HashSet::new();
        for def in &self.recipes {
            if !seen.insert(def.name.as_str()) {
                return Err(CatalogError::DuplicateRecipe(def.name.clone()));
            }

            if def.production_per_tick == 0 {
                return Err(CatalogError::ZeroRate {
                    recipe: def.name.clone(),
                });
            }
            if def.tick_duration_ms == 0 {
                return Err(CatalogError::ZeroTickDuration {
                    recipe: def.name.clone(),
                });
            }

            let resource_count = self.resources.len() as u32;
            for input in &def.inputs {
                if input.resource.0 >= resource_count {
                    return Err(CatalogError::InvalidResourceRef {
                        recipe: def.name.clone(),
                        resource: input.resource,
                    });
                }
            }
            if def.output.resource.0 >= resource_count {
                return Err(CatalogError::InvalidResourceRef {
                    recipe: def.name.clone(),
                    resource: def.output.resource,
                });
            }
        }

        // The population tick consumes these two every second; a catalog
        // without them cannot feed anyone.
        let food = self
            .resource_ids
            .get("food")
            .copied()
            .ok_or(CatalogError::MissingStaple("food"))?;
        let water = self
            .resource_ids
            .get("water")
            .copied()
            .ok_or(CatalogError::MissingStaple("water"))?;

        Ok(Catalog {
            resources: self.resources,
            resource_ids: self.resource_ids,
            recipes: self.recipes,
            recipe_ids: self.recipe_ids,
            staples: Staples { food, water },
        })
    }
}

// ---------------------------------------------------------------------------
// Immutable catalog
// ---------------------------------------------------------------------------

/// The two resources the population consumes every population tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staples {
    pub food: ResourceId,
    pub water: ResourceId,
}

/// Immutable, validated recipe and resource tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    resources: Vec<String>,
    resource_ids: HashMap<String, ResourceId>,
    recipes: Vec<RecipeDef>,
    recipe_ids: HashMap<String, RecipeId>,
    staples: Staples,
}

impl Catalog {
    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_ids.get(name).copied()
    }

    pub fn resource_name(&self, id: ResourceId) -> Option<&str> {
        self.resources.get(id.0 as usize).map(String::as_str)
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_ids.get(name).copied()
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    /// All recipes in registration order.
    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &RecipeDef)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, def)| (RecipeId(i as u32), def))
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn staples(&self) -> Staples {
        self.staples
    }
}

/// Catalog construction and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("no recipe named '{0}'")]
    NotFound(String),
    #[error("recipe name '{0}' registered twice")]
    DuplicateRecipe(String),
    #[error("recipe '{recipe}' references unregistered resource {resource:?}")]
    InvalidResourceRef { recipe: String, resource: ResourceId },
    #[error("recipe '{recipe}' has a production rate of zero")]
    ZeroRate { recipe: String },
    #[error("recipe '{recipe}' has a tick duration of zero")]
    ZeroTickDuration { recipe: String },
    #[error("catalog is missing the staple resource '{0}'")]
    MissingStaple(&'static str),
}

// ---------------------------------------------------------------------------
// Default content pack
// ---------------------------------------------------------------------------

/// The stock settlement catalog: four producers, nine consumers, and the
/// `food` staple only the farm can make.
pub fn default_catalog_builder() -> CatalogBuilder {
    let mut b = CatalogBuilder::new();

    let dirt = b.register_resource("dirt");
    let water = b.register_resource("water");
    let mud = b.register_resource("mud");
    let wood = b.register_resource("wood");
    let yurt = b.register_resource("yurt");
    let stone = b.register_resource("stone");
    let clay = b.register_resource("clay");
    let brick = b.register_resource("brick");
    let charcoal = b.register_resource("charcoal");
    let tool = b.register_resource("tool");
    let house = b.register_resource("house");
    // Farm and well nodes output food and water rather than a resource of
    // their own name, but the names stay registered for data-pack overrides.
    b.register_resource("farm");
    b.register_resource("well");
    let food = b.register_resource("food");

    b.register_recipe(RecipeDef {
        name: "dirt".into(),
        inputs: vec![],
        output: RecipeOutput { resource: dirt, amount: 1 },
        production_per_tick: 1,
        tick_duration_ms: 1000,
        buy_cost: 5,
        sell_cost: 1,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "water".into(),
        inputs: vec![],
        output: RecipeOutput { resource: water, amount: 1 },
        production_per_tick: 1,
        tick_duration_ms: 1000,
        buy_cost: 5,
        sell_cost: 1,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "mud".into(),
        inputs: vec![
            RecipeInput { resource: dirt, quantity: 2 },
            RecipeInput { resource: water, quantity: 1 },
        ],
        output: RecipeOutput { resource: mud, amount: 1 },
        production_per_tick: 2,
        tick_duration_ms: 2000,
        buy_cost: 8,
        sell_cost: 2,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "wood".into(),
        inputs: vec![],
        output: RecipeOutput { resource: wood, amount: 1 },
        production_per_tick: 2,
        tick_duration_ms: 1000,
        buy_cost: 10,
        sell_cost: 2,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "yurt".into(),
        inputs: vec![
            RecipeInput { resource: wood, quantity: 3 },
            RecipeInput { resource: mud, quantity: 5 },
            RecipeInput { resource: water, quantity: 1 },
        ],
        output: RecipeOutput { resource: yurt, amount: 1 },
        production_per_tick: 10,
        tick_duration_ms: 5000,
        buy_cost: 50,
        sell_cost: 20,
        population: Some(PopulationEffect {
            growth: None,
            capacity: Some(5),
        }),
    });
    b.register_recipe(RecipeDef {
        name: "stone".into(),
        inputs: vec![],
        output: RecipeOutput { resource: stone, amount: 1 },
        production_per_tick: 1,
        tick_duration_ms: 2000,
        buy_cost: 10,
        sell_cost: 2,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "clay".into(),
        inputs: vec![
            RecipeInput { resource: dirt, quantity: 3 },
            RecipeInput { resource: water, quantity: 1 },
        ],
        output: RecipeOutput { resource: clay, amount: 1 },
        production_per_tick: 1,
        tick_duration_ms: 3000,
        buy_cost: 12,
        sell_cost: 3,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "brick".into(),
        inputs: vec![
            RecipeInput { resource: clay, quantity: 2 },
            RecipeInput { resource: wood, quantity: 1 },
        ],
        output: RecipeOutput { resource: brick, amount: 1 },
        production_per_tick: 2,
        tick_duration_ms: 4000,
        buy_cost: 25,
        sell_cost: 6,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "charcoal".into(),
        inputs: vec![RecipeInput { resource: wood, quantity: 3 }],
        output: RecipeOutput { resource: charcoal, amount: 1 },
        production_per_tick: 2,
        tick_duration_ms: 3000,
        buy_cost: 20,
        sell_cost: 4,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "tool".into(),
        inputs: vec![
            RecipeInput { resource: wood, quantity: 2 },
            RecipeInput { resource: stone, quantity: 2 },
            RecipeInput { resource: charcoal, quantity: 1 },
        ],
        output: RecipeOutput { resource: tool, amount: 1 },
        production_per_tick: 5,
        tick_duration_ms: 5000,
        buy_cost: 40,
        sell_cost: 10,
        population: None,
    });
    b.register_recipe(RecipeDef {
        name: "house".into(),
        inputs: vec![
            RecipeInput { resource: wood, quantity: 5 },
            RecipeInput { resource: brick, quantity: 4 },
            RecipeInput { resource: mud, quantity: 2 },
        ],
        output: RecipeOutput { resource: house, amount: 1 },
        production_per_tick: 20,
        tick_duration_ms: 8000,
        buy_cost: 150,
        sell_cost: 50,
        population: Some(PopulationEffect {
            growth: None,
            capacity: Some(10),
        }),
    });
    b.register_recipe(RecipeDef {
        name: "farm".into(),
        inputs: vec![
            RecipeInput { resource: dirt, quantity: 2 },
            RecipeInput { resource: water, quantity: 2 },
            RecipeInput { resource: tool, quantity: 1 },
        ],
        output: RecipeOutput { resource: food, amount: 2 },
        production_per_tick: 3,
        tick_duration_ms: 4000,
        buy_cost: 30,
        sell_cost: 5,
        population: Some(PopulationEffect {
            growth: Some(2),
            capacity: None,
        }),
    });
    b.register_recipe(RecipeDef {
        name: "well".into(),
        inputs: vec![
            RecipeInput { resource: stone, quantity: 4 },
            RecipeInput { resource: wood, quantity: 2 },
        ],
        output: RecipeOutput { resource: water, amount: 3 },
        production_per_tick: 5,
        tick_duration_ms: 6000,
        buy_cost: 35,
        sell_cost: 4,
        population: None,
    });

    b
}

/// Build the stock catalog. The data above is statically valid.
pub fn default_catalog() -> Catalog {
    default_catalog_builder()
        .build()
        .expect("stock catalog data is valid")
}

// ===========================================================================
// Tests
// ===========================================================================
