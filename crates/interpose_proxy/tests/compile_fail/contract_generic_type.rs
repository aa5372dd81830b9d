use interpose_proxy::contract;

pub struct Cache<T>(T);

#[contract]
impl<T: Send + Sync + 'static> Cache<T> {
    pub fn size(&self) -> usize {
        0
    }
}

fn main() {}
