//! Property coverage of the driver contract against the software model.

#![allow(clippy::pedantic, clippy::cast_possible_truncation)]

use pme_driver::chip::network::{clamp_neuron_id, MAX_VECTOR_SIZE};
use pme_driver::chip::regs::{cat, gcr, ncr};
use pme_driver::{
    pack_knowledge, unpack_knowledge, ClassificationMode, DistanceMode, NeuronRecord, Pme,
    RecordingBus, Register, RegisterBus, SoftwarePme,
};
use proptest::prelude::*;

fn category_id() -> impl Strategy<Value = u16> {
    any::<u16>().prop_filter("category id must be non-zero", |c| c & cat::CATEGORY != 0)
}

fn training_set() -> impl Strategy<Value = Vec<(Vec<u8>, u16)>> {
    prop::collection::vec(
        (prop::collection::vec(any::<u8>(), 1..=16), 1u16..=10),
        0..=24,
    )
}

fn recorded() -> Pme<RecordingBus<SoftwarePme>> {
    let mut pme = Pme::new(RecordingBus::new(SoftwarePme::new()));
    pme.begin();
    pme.bus_mut().clear();
    pme
}

proptest! {
    #[test]
    fn property_learn_clamps_before_any_write(pattern in prop::collection::vec(any::<u8>(), 1..=300)) {
        let mut pme = recorded();
        pme.learn(&pattern, 1);

        let bus = pme.bus();
        let streamed = bus.writes_to(Register::Comp) + bus.writes_to(Register::Lcomp);
        prop_assert_eq!(streamed, pattern.len().min(MAX_VECTOR_SIZE));
    }

    #[test]
    fn property_read_neuron_clamps_id(id in 0usize..=1000) {
        let mut pme = recorded();
        let mut record = NeuronRecord::default();
        prop_assert_eq!(pme.read_neuron(id, &mut record), 0);

        // skips plus the closing CAT read of the capture
        prop_assert_eq!(pme.bus().reads_of(Register::Cat), clamp_neuron_id(id));
    }

    #[test]
    fn property_save_session_preserves_nsr(initial in any::<u16>()) {
        let mut pme = Pme::new(SoftwarePme::new());
        pme.bus_mut().write16(Register::Nsr, initial);

        let session = pme.begin_save_mode();
        prop_assert_eq!(session.saved_nsr(), initial);
        session.end();
        prop_assert_eq!(pme.nsr(), initial);

        drop(pme.begin_restore_mode());
        prop_assert_eq!(pme.nsr(), initial);
    }

    #[test]
    fn property_learn_then_classify_returns_category(
        pattern in prop::collection::vec(any::<u8>(), 1..=200),
        category in category_id(),
    ) {
        let mut pme = Pme::new(SoftwarePme::new());
        pme.begin();
        pme.learn(&pattern, category);

        let clamped = &pattern[..pattern.len().min(MAX_VECTOR_SIZE)];
        prop_assert_eq!(pme.classify(clamped), category & cat::CATEGORY);
    }

    #[test]
    fn property_save_restore_save_is_identity(examples in training_set()) {
        let mut source = Pme::new(SoftwarePme::new());
        source.begin();
        for (pattern, category) in &examples {
            source.learn(pattern, *category);
        }
        let first = source.save_knowledge();

        let mut target = Pme::new(SoftwarePme::new());
        target.begin();
        prop_assert_eq!(target.restore_knowledge(&first).unwrap(), first.len());
        let second = target.save_knowledge();

        prop_assert_eq!(&second, &first);
        prop_assert_eq!(unpack_knowledge(&pack_knowledge(&second).unwrap()).unwrap(), first);
    }

    #[test]
    fn property_context_accessors_round_trip(global in any::<u16>(), neuron in any::<u16>()) {
        let mut pme = Pme::new(SoftwarePme::new());
        pme.set_distance_mode(DistanceMode::LSup);

        pme.set_global_context(global);
        prop_assert_eq!(pme.global_context(), global & gcr::GLOBAL);
        prop_assert_eq!(pme.distance_mode(), DistanceMode::LSup);

        pme.set_neuron_context(neuron);
        prop_assert_eq!(pme.neuron_context(), neuron & ncr::CONTEXT);
    }

    #[test]
    fn property_mode_accessors_round_trip(lsup in any::<bool>(), knn in any::<bool>(), nsr in any::<u16>()) {
        let mut pme = Pme::new(SoftwarePme::new());
        // keep the model in normal mode
        pme.bus_mut().write16(Register::Nsr, nsr & !pme_driver::chip::regs::nsr::NET_MODE);

        let distance = if lsup { DistanceMode::LSup } else { DistanceMode::L1 };
        let mode = if knn { ClassificationMode::Knn } else { ClassificationMode::Rbf };
        let before = pme.nsr();

        pme.set_distance_mode(distance);
        pme.set_classifier_mode(mode);
        prop_assert_eq!(pme.distance_mode(), distance);
        prop_assert_eq!(pme.classifier_mode(), mode);
        prop_assert_eq!(pme.nsr() & !mode.nsr_bits(), before & !pme_driver::chip::regs::nsr::CLASS_MODE);
    }

    #[test]
    fn property_neighbors_ordered_by_distance(
        examples in training_set(),
        probe in prop::collection::vec(any::<u8>(), 1..=16),
        k in 0usize..=32,
    ) {
        let mut pme = Pme::new(SoftwarePme::new());
        pme.begin();
        for (pattern, category) in &examples {
            pme.learn(pattern, *category);
        }
        pme.set_classifier_mode(ClassificationMode::Knn);

        let committed = usize::from(pme.committed_count());
        let neighbors = pme.nearest_neighbors(&probe, k).unwrap();
        prop_assert_eq!(neighbors.len(), k.min(committed));
        prop_assert!(neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}
