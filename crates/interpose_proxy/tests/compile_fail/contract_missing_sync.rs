use interpose_proxy::contract;

#[contract]
pub trait Clock {
    fn now(&self) -> u64;
}

fn main() {}
