//! Throughput of the envelope pipelines across payload sizes and setups.
//!
//! Run with: `cargo bench --bench envelope_benchmark`

use std::sync::Arc;

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sealfield::encoding::{Base64, Hex};
use sealfield::encryption::{Aes256Gcm, XChaCha20Poly1305};
use sealfield::serializing::{Cbor, Json};
use sealfield::signing::{Ed25519, HmacSha256};
use sealfield::{decrypt, decrypt_verify, encrypt_at, encrypt_sign, Config, Setup};

fn configs() -> Vec<(&'static str, Config)> {
    let at = Utc::now() - Duration::minutes(1);
    let build = |setup| Config::builder().setup(at, setup).build().unwrap();
    vec![
        (
            "base64-json-aes-ed25519",
            build(Setup::new(
                Arc::new(Base64),
                Arc::new(Json),
                Arc::new(Aes256Gcm::generate().unwrap()),
                Arc::new(Ed25519::generate().unwrap()),
            )),
        ),
        (
            "hex-cbor-xchacha-hmac",
            build(Setup::new(
                Arc::new(Hex),
                Arc::new(Cbor),
                Arc::new(XChaCha20Poly1305::generate().unwrap()),
                Arc::new(HmacSha256::generate().unwrap()),
            )),
        ),
    ]
}

fn benchmark_encrypt_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt_sign");
    let sizes = [("100B", 100), ("1KB", 1024), ("10KB", 10 * 1024)];

    for (setup_name, config) in configs() {
        for (size_name, size) in sizes {
            let payload = "x".repeat(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(setup_name, size_name),
                &payload,
                |b, payload| {
                    b.iter(|| encrypt_sign(black_box(&config), black_box(payload)).unwrap());
                },
            );
        }
    }
    group.finish();
}

fn benchmark_decrypt_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("decrypt_verify");

    for (setup_name, config) in configs() {
        let stored = encrypt_sign(&config, &"x".repeat(1024)).unwrap();
        group.throughput(Throughput::Bytes(1024));
        group.bench_function(BenchmarkId::new(setup_name, "1KB"), |b| {
            b.iter(|| decrypt_verify::<String>(black_box(&config), black_box(&stored)).unwrap());
        });
    }
    group.finish();
}

/// Reading data written under an older setup costs one failed envelope
/// parse per newer setup with a different serializer.
fn benchmark_rotated_read(c: &mut Criterion) {
    let now = Utc::now();
    let old = Config::builder()
        .setup(
            now - Duration::hours(2),
            Setup::new(
                Arc::new(Base64),
                Arc::new(Cbor),
                Arc::new(Aes256Gcm::generate().unwrap()),
                Arc::new(Ed25519::generate().unwrap()),
            ),
        )
        .build()
        .unwrap();
    let stored = encrypt_at(&old, &"x".repeat(1024), now - Duration::minutes(90)).unwrap();
    let rotated = old.with_setup(
        now - Duration::hours(1),
        Setup::new(
            Arc::new(Base64),
            Arc::new(Json),
            Arc::new(Aes256Gcm::generate().unwrap()),
            Arc::new(Ed25519::generate().unwrap()),
        ),
    );

    c.bench_function("decrypt_after_rotation", |b| {
        b.iter(|| decrypt::<String>(black_box(&rotated), black_box(&stored)).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_encrypt_sign,
    benchmark_decrypt_verify,
    benchmark_rotated_read
);
criterion_main!(benches);
