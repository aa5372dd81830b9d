use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use interpose_proxy::{BoxFuture, Dispatcher, contract};

#[derive(Debug)]
pub struct Missing;

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("missing")
    }
}

impl std::error::Error for Missing {}

#[contract]
pub trait Catalog: Send + Sync {
    fn count(&self) -> usize;

    fn lookup(&self, id: u64) -> Result<String, Missing>;

    fn clear(&self);

    fn refresh(&self) -> BoxFuture<'static, Result<(), Missing>>;

    fn warm(&self, keys: Vec<String>) -> Pin<Box<dyn Future<Output = usize> + Send>>;
}

struct Memory;

impl Catalog for Memory {
    fn count(&self) -> usize {
        0
    }

    fn lookup(&self, _id: u64) -> Result<String, Missing> {
        Err(Missing)
    }

    fn clear(&self) {}

    fn refresh(&self) -> BoxFuture<'static, Result<(), Missing>> {
        Box::pin(async { Ok(()) })
    }

    fn warm(&self, keys: Vec<String>) -> Pin<Box<dyn Future<Output = usize> + Send>> {
        Box::pin(async move { keys.len() })
    }
}

fn main() {
    let target: Arc<dyn Catalog> = Arc::new(Memory);
    let proxy: CatalogProxy =
        <dyn Catalog as interpose_proxy::Contract>::synthesize(Dispatcher::without_interceptor(target));
    let _ = proxy.count();
    let _ = proxy.lookup(7);
    let _ = proxy.clear();
}
