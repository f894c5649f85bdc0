use cucumber::given;
use order_engine::db_types::NewProduct;

use crate::cucumber::{storefront_world::StorefrontSystem, StorefrontWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut StorefrontWorld) {
    let system = StorefrontSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a product '{word}' priced at {word}")]
async fn add_product(world: &mut StorefrontWorld, name: String, price: String) {
    let price = price.parse().expect("Not a valid price");
    let product = NewProduct::new(name.as_str(), price).with_description(format!("The {name}"));
    let product = world.system().db.insert_product(product).await.expect("Error adding product");
    world.products.insert(name, product.id);
}
