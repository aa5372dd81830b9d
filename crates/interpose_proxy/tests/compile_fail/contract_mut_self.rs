use interpose_proxy::contract;

#[contract]
pub trait Counter: Send + Sync {
    /// Proxies share their target, so `&mut self` is rejected.
    fn increment(&mut self) -> u32;
}

fn main() {}
