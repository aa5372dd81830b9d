use interpose_proxy::contract;

#[contract]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: String);
}

fn main() {}
