use rand::RngCore;
use sched_core::rng::{derive_substream_seed, RngHandle};

#[test]
fn rng_emits_reproducible_sequence() {
    let mut rng_a = RngHandle::from_seed(1234);
    let mut rng_b = RngHandle::from_seed(1234);

    let seq_a: Vec<u64> = (0..100).map(|_| rng_a.next_u64()).collect();
    let seq_b: Vec<u64> = (0..100).map(|_| rng_b.next_u64()).collect();

    assert_eq!(seq_a, seq_b);
}

#[test]
fn substreams_are_independent_of_each_other() {
    assert_eq!(derive_substream_seed(7, 16000), derive_substream_seed(7, 16000));
    assert_ne!(derive_substream_seed(7, 16000), derive_substream_seed(7, 32000));

    let mut a = RngHandle::substream(7, 10);
    let mut b = RngHandle::substream(7, 10);
    assert_eq!(a.next_u32(), b.next_u32());
}
