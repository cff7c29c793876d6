//! SHA-256 digest tests.
//!
//! Validates the accumulator-based SHA-256 against:
//! 1. FIPS 180 test vectors
//! 2. Arbitrary partitions of the input stream
//! 3. Snapshot capture/restore and copy-of-a-copy branching
//! 4. Portable encoded-state reconstruction
//! 5. Offset-addressed digest output

use digests::{BlockDigest, DigestError, SHA256_DIGEST_LEN, Sha256, Snapshot};

use proptest::prelude::*;

/// Convert a byte slice to a lowercase hex string.
fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
    }
    out
}

const VECTORS: &[(&[u8], &str)] = &[
    (
        b"",
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    ),
    (
        b"a",
        "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb",
    ),
    (
        b"abc",
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
    ),
    (
        b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
        "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
    ),
];

#[test]
fn fips_vectors_one_shot() {
    for (input, expected) in VECTORS {
        assert_eq!(to_hex(&Sha256::digest(input)), *expected);
    }
}

#[test]
fn fips_vectors_byte_at_a_time() {
    for (input, expected) in VECTORS {
        let mut hasher = Sha256::new();
        for &byte in *input {
            hasher.update_byte(byte);
        }
        assert_eq!(to_hex(&hasher.finalize()), *expected);
    }
}

#[test]
fn million_a_vector() {
    let mut hasher = Sha256::new();
    let chunk = [b'a'; 1000];
    for _ in 0..1000 {
        hasher.update(&chunk);
    }
    assert_eq!(
        to_hex(&hasher.finalize()),
        "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0"
    );
}

#[test]
fn update_range_matches_sliced_update() {
    let data = b"the quick brown fox jumps over the lazy dog";

    let mut ranged = Sha256::new();
    ranged
        .update_range(data, 0, 7)
        .expect("in-bounds range is accepted");
    ranged
        .update_range(data, 7, data.len() - 7)
        .expect("in-bounds range is accepted");

    let mut sliced = Sha256::new();
    sliced.update(data);

    assert_eq!(ranged.finalize(), sliced.finalize());
}

#[test]
fn update_range_rejects_out_of_bounds() {
    let mut hasher = Sha256::new();
    let err = hasher
        .update_range(b"abcdef", 7, 1)
        .expect_err("offset past the end must be rejected");
    assert_eq!(
        err,
        DigestError::OutOfRange {
            offset: 7,
            len: 1,
            available: 6,
        }
    );
    assert_eq!(hasher.bytes_hashed(), 0);
}

#[test]
fn bytes_hashed_tracks_input_and_reset() {
    let mut hasher = Sha256::new();
    assert_eq!(hasher.bytes_hashed(), 0);

    hasher.update(b"abcdefgh");
    assert_eq!(hasher.bytes_hashed(), 8);
    hasher.update_byte(b'i');
    assert_eq!(hasher.bytes_hashed(), 9);

    hasher.reset();
    hasher.reset();
    assert_eq!(hasher.bytes_hashed(), 0);
}

#[test]
fn reset_reproduces_vectors() {
    let mut hasher = Sha256::new();
    hasher.update(b"some unrelated data");
    hasher.reset();

    hasher.update(b"abc");
    assert_eq!(
        to_hex(&hasher.finalize()),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn finalize_into_touches_only_the_target_range() {
    let mut hasher = Sha256::new();
    hasher.update(b"");

    let mut out = [0xcc_u8; SHA256_DIGEST_LEN + 11];
    let written = hasher
        .finalize_into(&mut out, 11)
        .expect("offset output fits");
    assert_eq!(written, SHA256_DIGEST_LEN);
    assert!(out[..11].iter().all(|&b| b == 0xcc));
    assert_eq!(
        to_hex(&out[11..]),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn finalize_into_rejects_short_destination_without_consuming() {
    let mut hasher = Sha256::new();
    hasher.update(b"abc");

    let mut out = [0u8; SHA256_DIGEST_LEN - 1];
    let err = hasher
        .finalize_into(&mut out, 0)
        .expect_err("destination shorter than the digest");
    assert!(matches!(err, DigestError::OutOfRange { .. }));

    assert_eq!(
        to_hex(&hasher.finalize()),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn snapshot_branches_reproduce_the_vector() {
    let (input, expected) = VECTORS[VECTORS.len() - 1];
    let mid = input.len() / 2;

    let mut hasher = Sha256::new();
    hasher.update(&input[..mid]);

    let copy1 = hasher.capture();
    let mut copy2 = copy1.capture();

    hasher.update(&input[mid..]);
    assert_eq!(to_hex(&hasher.finalize()), expected);

    let mut restored = Sha256::new();
    restored.update(b"noise that the restore must overwrite");
    restored.restore(&copy1);
    restored.update(&input[mid..]);
    assert_eq!(to_hex(&restored.finalize()), expected);

    copy2.update(&input[mid..]);
    assert_eq!(to_hex(&copy2.finalize()), expected);
}

#[test]
fn encoded_state_generations_reproduce_the_vector() {
    let (input, expected) = VECTORS[VECTORS.len() - 1];
    let mid = input.len() / 2;

    let mut hasher = Sha256::new();
    hasher.update(&input[..mid]);

    let mut copy1 = Sha256::from_encoded_state(&hasher.encoded_state())
        .expect("state produced by encoded_state always decodes");
    let mut copy2 = Sha256::from_encoded_state(&copy1.encoded_state())
        .expect("second-generation state decodes as well");

    hasher.update(&input[mid..]);
    assert_eq!(to_hex(&hasher.finalize()), expected);

    copy1.update(&input[mid..]);
    assert_eq!(to_hex(&copy1.finalize()), expected);

    copy2.update(&input[mid..]);
    assert_eq!(to_hex(&copy2.finalize()), expected);
}

#[test]
fn truncated_encoded_state_is_rejected() {
    let state = Sha256::new().encoded_state();
    let err = Sha256::from_encoded_state(&state[..12]).expect_err("short state must be rejected");
    assert_eq!(err, DigestError::Truncated { len: 12 });
}

#[test]
fn trait_constants_describe_the_algorithm() {
    assert_eq!(<Sha256 as BlockDigest>::DIGEST_LEN, 32);
    assert_eq!(<Sha256 as BlockDigest>::BLOCK_LEN, 64);
    assert_eq!(<Sha256 as BlockDigest>::NAME, "SHA-256");
}

proptest! {
    #[test]
    fn any_partition_matches_one_shot(
        data in prop::collection::vec(any::<u8>(), 0..=512),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..=6),
    ) {
        let mut bounds: Vec<usize> = cuts.iter().map(|cut| cut.index(data.len() + 1)).collect();
        bounds.push(0);
        bounds.push(data.len());
        bounds.sort_unstable();

        let mut partitioned = Sha256::new();
        for window in bounds.windows(2) {
            partitioned.update(&data[window[0]..window[1]]);
        }

        prop_assert_eq!(partitioned.finalize(), Sha256::digest(&data));
    }

    #[test]
    fn snapshot_fidelity_at_any_split(
        data in prop::collection::vec(any::<u8>(), 1..=256),
        split in any::<prop::sample::Index>(),
    ) {
        let split = split.index(data.len());

        let mut original = Sha256::new();
        original.update(&data[..split]);

        let mut copied = original.capture();
        let mut decoded = Sha256::from_encoded_state(&original.encoded_state())
            .expect("state produced by encoded_state always decodes");

        original.update(&data[split..]);
        copied.update(&data[split..]);
        decoded.update(&data[split..]);

        let expected = original.finalize();
        prop_assert_eq!(copied.finalize(), expected);
        prop_assert_eq!(decoded.finalize(), expected);
    }
}
