//! Writes the default container and lid to `container_with_lid.stl`.
//!
//! ```text
//! cargo run --example export
//! RUST_LOG=boxlid=debug cargo run --example export
//! ```

use boxlid::{container_with_lid, BoxlidError, LidParams};

fn main() -> Result<(), BoxlidError> {
    // Default: WARN for everything, INFO for boxlid.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("boxlid=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let path = container_with_lid(&LidParams::default())?;
    println!("{}", path.display());
    Ok(())
}
