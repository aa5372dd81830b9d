use interpose_proxy::implements;

struct Engine;

#[implements(Engine)]
struct Turbo;

fn main() {}
