use interpose_proxy::interceptor;

struct Loud;

#[interceptor]
impl Clone for Loud {
    fn clone(&self) -> Self {
        Loud
    }
}

fn main() {}
