//! `askpanda version`

pub fn run() {
    println!("Ask PanDA API version {}", env!("CARGO_PKG_VERSION"));
}
