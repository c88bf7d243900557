//! Probe the PME register window on real hardware
//!
//! Needs root (or `CAP_SYS_RAWIO`) and a SoC with the engine mapped at
//! its default address.

use pme_driver::{MmioBus, Pme, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("pme_driver=debug")
        .init();

    let mut pme = Pme::new(MmioBus::open()?);
    println!("NSR   {:#06x}", pme.nsr());
    println!("GCR   {:#06x}", pme.gcr());
    println!("MINIF {:#06x}", pme.minif());
    println!("MAXIF {:#06x}", pme.maxif());
    println!("committed {}", pme.committed_count());

    pme.begin();
    let count = pme.learn(&[0x10, 0x20, 0x30], 1);
    println!("learned one vector -> {count} committed");
    println!("classify -> {}", pme.classify(&[0x11, 0x20, 0x30]));
    pme.forget();

    Ok(())
}
