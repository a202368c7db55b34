use rand::rngs::StdRng;
use rand::SeedableRng;
use roe_core::config::KeySchedule;
use roe_crypto::{decrypt, derive_key_from_bytes, encrypt};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt(bencher: divan::Bencher, size: usize) {
    let key = derive_key_from_bytes(b"bench", KeySchedule::Rehash);
    let data = make_data(size);
    let mut rng = StdRng::seed_from_u64(7);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench_local(|| {
            let mut out = Vec::with_capacity(size + 4096);
            encrypt(
                divan::black_box(&data[..]),
                &mut out,
                divan::black_box(&key),
                size as u64,
                &mut rng,
            )
            .unwrap();
            out
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt(bencher: divan::Bencher, size: usize) {
    let key = derive_key_from_bytes(b"bench", KeySchedule::Rehash);
    let data = make_data(size);
    let mut container = Vec::new();
    encrypt(&data[..], &mut container, &key, size as u64, &mut StdRng::seed_from_u64(7)).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            let mut out = Vec::with_capacity(size);
            decrypt(
                divan::black_box(&container[..]),
                &mut out,
                divan::black_box(&key),
            )
            .unwrap();
            out
        });
}

#[divan::bench]
fn bench_derive_key() -> roe_crypto::Key {
    derive_key_from_bytes(divan::black_box(b"correct horse battery staple"), KeySchedule::Rehash)
}

fn main() {
    divan::main();
}
