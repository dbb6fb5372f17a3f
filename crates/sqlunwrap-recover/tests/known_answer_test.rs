//! End-to-end known-answer checks with fixed ciphertext.
//!
//! family = 16 zero bytes, object id = 1, subobjid = 0
//! key    = SHA1(00..00 || 01 00 00 00 || 00 00) = 2f71c6b0...85b5

use proptest::prelude::*;

use sqlunwrap_catalog::MemoryCatalog;
use sqlunwrap_core::{EncryptedPayload, FamilyId, ObjectId, SubObjectId, UnwrapError};
use sqlunwrap_crypto::{derive_key, encode_utf16le, encrypt, DecodeMode};
use sqlunwrap_recover::{decrypt_payload, recover_object, RecoverOptions};

const SOURCE: &str = "CREATE PROC p AS SELECT 1";

/// RC4 of UTF-16LE(SOURCE)
const CIPHERTEXT: &str = "0x81160782c8b34c3e3c5c462335162071397b48c19bd0476756ad4c9205b3107f\
                          c25741d70976176a8c199659604cc7d3441c";

/// RC4 of FF FE || UTF-16LE(SOURCE)
const CIPHERTEXT_BOM: &str = "0x3de81682dfb3483e295c5723501650713b7b55c197d0246706ad1c9264b302\
                              7fb15732d71f761e6a85199059774cb3d3551caa3a";

fn bytes(hex_str: &str) -> Vec<u8> {
    sqlunwrap_catalog::decode_bytes(hex_str).unwrap()
}

fn catalog_with(ciphertext: Vec<u8>) -> MemoryCatalog {
    MemoryCatalog::builder()
        .family_id(vec![0u8; 16])
        .object("dbo.p", 1)
        .fragment(1, ciphertext, 0)
        .build()
        .unwrap()
}

#[test]
fn round_trip_fixture_recovers_source() {
    let mut catalog = catalog_with(bytes(CIPHERTEXT));
    let out = recover_object(&mut catalog, "p", RecoverOptions::default()).unwrap();
    assert_eq!(out.text, SOURCE);
    assert_eq!(out.object_id, ObjectId(1));
}

#[test]
fn bom_and_plain_fixture_decode_identically() {
    let mut plain = catalog_with(bytes(CIPHERTEXT));
    let mut with_bom = catalog_with(bytes(CIPHERTEXT_BOM));

    let a = recover_object(&mut plain, "p", RecoverOptions::default()).unwrap();
    let b = recover_object(&mut with_bom, "p", RecoverOptions::default()).unwrap();
    assert_eq!(a.text, b.text);
}

#[test]
fn truncated_ciphertext_is_decode_error() {
    let mut ct = bytes(CIPHERTEXT);
    ct.pop();
    let mut catalog = catalog_with(ct);
    let err = recover_object(&mut catalog, "p", RecoverOptions::default()).unwrap_err();
    assert!(matches!(err, UnwrapError::Decode(_)));
}

#[test]
fn snapshot_toml_fixture() {
    let snapshot = format!(
        r#"
family_guid = "00000000-0000-0000-0000-000000000000"

[[objects]]
name = "[dbo].[p]"
id = 1

[[objects.fragments]]
subobjid = 0
imageval = "{CIPHERTEXT}"
"#
    );
    let mut catalog = sqlunwrap_catalog::parse_snapshot(&snapshot).unwrap();
    let out = recover_object(&mut catalog, "dbo.p", RecoverOptions::default()).unwrap();
    assert_eq!(out.text, SOURCE);
}

#[test]
fn negative_snapshot_id_uses_wrapped_key() {
    let key = derive_key(&FamilyId::from_bytes([0; 16]), ObjectId(u32::MAX), SubObjectId(0));
    let ciphertext = encrypt(key, &encode_utf16le(SOURCE, false));
    let snapshot = format!(
        r#"
family_guid = "00000000-0000-0000-0000-000000000000"

[[objects]]
name = "dbo.p"
id = -1

[[objects.fragments]]
imageval = "0x{}"
"#,
        hex::encode(ciphertext)
    );
    let mut catalog = sqlunwrap_catalog::parse_snapshot(&snapshot).unwrap();
    let out = recover_object(&mut catalog, "p", RecoverOptions::default()).unwrap();
    assert_eq!(out.object_id, ObjectId(4_294_967_295));
    assert_eq!(out.text, SOURCE);
}

proptest! {
    #[test]
    fn any_family_change_alters_output(i in 0usize..16, v in 1u8..=255) {
        let mut family = [0u8; 16];
        family[i] = v;
        let payload = EncryptedPayload::new(bytes(CIPHERTEXT), 0);
        let out = decrypt_payload(
            &FamilyId::from_bytes(family),
            ObjectId(1),
            &payload,
            DecodeMode::Lossy,
        );
        prop_assert!(out.map(|t| t != SOURCE).unwrap_or(true));
    }

    #[test]
    fn any_object_id_change_alters_output(id in 2u32..) {
        let payload = EncryptedPayload::new(bytes(CIPHERTEXT), 0);
        let out = decrypt_payload(&FamilyId::from_bytes([0; 16]), ObjectId(id), &payload, DecodeMode::Lossy);
        prop_assert!(out.map(|t| t != SOURCE).unwrap_or(true));
    }

    #[test]
    fn any_subobjid_change_alters_output(sub in 1u16..) {
        let payload = EncryptedPayload::new(bytes(CIPHERTEXT), sub);
        let out = decrypt_payload(&FamilyId::from_bytes([0; 16]), ObjectId(1), &payload, DecodeMode::Lossy);
        prop_assert!(out.map(|t| t != SOURCE).unwrap_or(true));
    }
}
