use sqlunwrap_core::{FamilyId, ObjectId, SubObjectId};
use sqlunwrap_crypto::{decode_utf16, decrypt, derive_key, encode_utf16le, encrypt, DecodeMode};

fn make_source(size: usize) -> String {
    "SELECT col_a, col_b FROM dbo.t WHERE id = @id;\n"
        .chars()
        .cycle()
        .take(size)
        .collect()
}

#[divan::bench]
fn bench_derive_key() -> sqlunwrap_crypto::DerivedKey {
    let family = FamilyId::from_bytes([0xABu8; 16]);
    derive_key(
        divan::black_box(&family),
        divan::black_box(ObjectId(245_575_913)),
        divan::black_box(SubObjectId(0)),
    )
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt_and_decode(bencher: divan::Bencher, size: usize) {
    let family = FamilyId::from_bytes([0xABu8; 16]);
    let plain = encode_utf16le(&make_source(size), false);
    let ciphertext = encrypt(derive_key(&family, ObjectId(1), SubObjectId(0)), &plain);
    bencher
        .counter(divan::counter::BytesCount::new(ciphertext.len()))
        .bench(|| {
            let key = derive_key(&family, ObjectId(1), SubObjectId(0));
            let bytes = decrypt(key, divan::black_box(&ciphertext));
            decode_utf16(&bytes, DecodeMode::Strict).unwrap()
        });
}

fn main() {
    divan::main();
}
