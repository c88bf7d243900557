//! Print the exact register sequence of a learn, a classify and a save
//!
//! Run with `RUST_LOG=pme_driver=trace` to see the same accesses as log
//! lines.

use pme_driver::{AccessKind, Pme, RecordingBus, SoftwarePme};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let mut pme = Pme::new(RecordingBus::new(SoftwarePme::new()));
    pme.begin();
    pme.bus_mut().clear();

    pme.learn(&[1, 2, 3], 5);
    print_log("learn", &mut pme);

    pme.classify(&[1, 2, 4]);
    print_log("classify", &mut pme);

    let mut record = pme_driver::NeuronRecord::default();
    pme.read_neuron(1, &mut record);
    let log = pme.bus_mut().take_log();
    println!(
        "read_neuron: {} accesses ({} COMP reads)",
        log.len(),
        log.iter()
            .filter(|a| a.kind == AccessKind::Read && a.register == pme_driver::Register::Comp)
            .count()
    );
}

fn print_log(label: &str, pme: &mut Pme<RecordingBus<SoftwarePme>>) {
    println!("{label}:");
    for access in pme.bus_mut().take_log() {
        let arrow = match access.kind {
            AccessKind::Read => "->",
            AccessKind::Write => "<-",
        };
        println!("   {:<13} {arrow} {:#06x}", access.register, access.value);
    }
    println!();
}
