use interpose_proxy::contract;

#[contract]
pub trait Store: Send + Sync {
    /// Generic methods cannot be forwarded through a trait object.
    fn put<T: core::fmt::Debug>(&self, value: T);
}

fn main() {}
