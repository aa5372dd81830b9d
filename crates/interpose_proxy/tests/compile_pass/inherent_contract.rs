use std::sync::Arc;

use interpose_proxy::{Dispatcher, contract};

pub struct Inventory {
    items: Vec<String>,
}

#[contract]
impl Inventory {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub async fn restock(&self, item: String) -> Result<usize, std::io::Error> {
        Ok(self.items.len() + item.len())
    }

    pub fn area(&self, (width, height): (u32, u32)) -> u32 {
        width * height
    }

    pub(crate) fn internal(&self) -> usize {
        0
    }

    fn private(&self) -> usize {
        self.internal()
    }
}

fn main() {
    let inventory = Arc::new(Inventory::new(vec!["bolt".to_string()]));
    let _ = inventory.private();
    let proxy: InventoryProxy = <Inventory as interpose_proxy::Contract>::synthesize(
        Dispatcher::without_interceptor(inventory),
    );
    let _ = proxy.len();
    let _ = proxy.area((2, 3));
}
