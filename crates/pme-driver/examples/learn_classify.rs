//! Learn and classify with the software model
//!
//! Teaches three clusters of 8-component vectors and classifies noisy
//! samples around them, in RBF and then KNN mode.

use pme_driver::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("pme_driver=info")
        .init();

    println!("🧠 PME learn / classify\n");

    let mut pme = Pme::new(SoftwarePme::new());
    pme.begin_with(&PmeConfig::default().with_influence(2, 400));

    let centers: [(u16, u8); 3] = [(1, 20), (2, 120), (3, 220)];
    for &(category, center) in &centers {
        for offset in [0u8, 4, 8] {
            let pattern = [center + offset; 8];
            let count = pme.learn(&pattern, category);
            println!("📤 learn {:>3}.. as {category} -> {count} committed", pattern[0]);
        }
    }

    println!("\n📥 RBF");
    for probe in [22u8, 70, 118, 250] {
        let category = pme.classify(&[probe; 8]);
        println!("   {probe:>3} -> {}", describe(category));
    }

    pme.set_classifier_mode(ClassificationMode::Knn);
    println!("\n📥 KNN");
    for probe in [70u8, 250] {
        let neighbors = pme.nearest_neighbors(&[probe; 8], 3).unwrap_or_default();
        println!("   {probe:>3} -> {neighbors:?}");
    }

    println!("\n✅ {} neurons committed", pme.committed_count());
}

fn describe(category: u16) -> String {
    match category {
        VECTOR_OVERFLOW => "overflow".into(),
        pme_driver::chip::network::NO_MATCH => "unknown".into(),
        c => format!("category {c}"),
    }
}
