//! Inspect command implementation.

use super::StoreArgs;
use ancientkv_core::{AncientReaderOp, KeyValueStore};
use ancientkv_server::Backend;

/// Prints the store's statistics without serving it.
pub fn run(store: &StoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = store.storage_config();
    let backend = Backend::open(&config)?;

    println!("AncientKV Store Inspection");
    println!("==========================");
    println!();
    println!("Path:    {}", config.path.display());
    println!("Ancient: {}", config.ancient_dir().display());
    println!();
    println!("Frozen items: {}", backend.ancients()?);
    println!("Oldest item:  {}", backend.tail()?);
    println!();
    print!("{}", backend.stat("stats")?);

    Ok(())
}
