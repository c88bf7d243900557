//! Save a trained network to a file and restore it into a fresh engine

use pme_driver::{pack_knowledge, unpack_knowledge, Pme, Result, SoftwarePme};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("pme_driver=debug")
        .init();

    let mut trained = Pme::new(SoftwarePme::new());
    trained.begin();
    trained.learn(b"hello", 1);
    trained.learn(b"world", 2);
    trained.learn(b"rusty", 3);

    let records = trained.save_knowledge();
    let blob = pack_knowledge(&records)?;
    let path = std::env::temp_dir().join("pme_knowledge.bin");
    std::fs::write(&path, &blob)?;
    println!("💾 Saved {} neurons ({} bytes) to {}", records.len(), blob.len(), path.display());

    let mut fresh = Pme::new(SoftwarePme::new());
    fresh.begin();
    let restored = fresh.restore_knowledge(&unpack_knowledge(&std::fs::read(&path)?)?)?;
    println!("📂 Restored {restored} neurons");

    for word in [b"hellp", b"worle", b"rustz"] {
        println!(
            "   {} -> {}",
            String::from_utf8_lossy(word),
            fresh.classify(word)
        );
    }

    let mut record = pme_driver::NeuronRecord::default();
    fresh.read_neuron(2, &mut record);
    println!(
        "\n🔎 neuron 2: category {} aif {} degenerate {}",
        record.category_id(),
        record.influence,
        record.is_degenerate()
    );

    Ok(())
}
