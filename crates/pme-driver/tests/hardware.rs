//! Hardware validation tests
//!
//! Run on a board with the PME mapped at its default address:
//! `sudo cargo test -p pme-driver --test hardware -- --ignored`

use pme_driver::chip::network::{MAX_VECTOR_SIZE, NO_MATCH};
use pme_driver::chip::regs::nsr;
use pme_driver::{MmioBus, NeuronRecord, Pme, PmeConfig, Register, RegisterBus};

fn open() -> Pme<MmioBus> {
    let mut pme = Pme::new(MmioBus::open().expect("map PME registers"));
    pme.begin_with(&PmeConfig::default());
    pme
}

#[test]
#[ignore] // Requires hardware
fn test_register_window_readable() {
    let mut bus = MmioBus::open().expect("map PME registers");
    for reg in Register::ALL {
        let value = bus.read16(reg);
        println!("{reg:<13} {value:#06x}");
    }
}

#[test]
#[ignore] // Requires hardware
fn test_begin_empties_network() {
    let mut pme = open();
    assert_eq!(pme.committed_count(), 0);
    assert_eq!(pme.nsr() & nsr::NET_MODE, 0);
}

#[test]
#[ignore] // Requires hardware
fn test_learn_classify_on_silicon() {
    let mut pme = open();
    let a = [0x20u8; MAX_VECTOR_SIZE];
    let b = [0xC0u8; MAX_VECTOR_SIZE];

    assert_eq!(pme.learn(&a, 1), 1);
    assert_eq!(pme.learn(&b, 2), 2);
    assert_eq!(pme.classify(&a), 1);
    assert_eq!(pme.classify(&b), 2);
    pme.forget();
    assert_eq!(pme.classify(&a), NO_MATCH);
}

#[test]
#[ignore] // Requires hardware
fn test_save_restore_on_silicon() {
    let mut pme = open();
    pme.learn(&[1, 2, 3, 4], 5);
    pme.learn(&[200, 201, 202, 203], 6);

    let saved = pme.save_knowledge();
    assert_eq!(saved.len(), 2);

    pme.restore_knowledge(&saved).expect("restore");
    assert_eq!(pme.save_knowledge(), saved);

    let mut record = NeuronRecord::default();
    pme.read_neuron(2, &mut record);
    assert_eq!(record.category_id(), 6);
}
