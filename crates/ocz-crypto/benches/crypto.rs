use ocz_core::{AeadAlgorithm, ContainerConfig};
use ocz_crypto::{decode_container, encode_container, generate_data_key};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn config(algorithm: AeadAlgorithm) -> ContainerConfig {
    ContainerConfig {
        algorithm,
        ..ContainerConfig::default()
    }
}

#[divan::bench(args = [1024, 1048576, 10485760])]
fn encode_aes_gcm(bencher: divan::Bencher, size: usize) {
    let dek = generate_data_key();
    let data = make_data(size);
    let cfg = config(AeadAlgorithm::Aes256Gcm);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encode_container(
                divan::black_box(&data),
                divan::black_box(&dek),
                "bench-object",
                &cfg,
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 1048576, 10485760])]
fn encode_chacha(bencher: divan::Bencher, size: usize) {
    let dek = generate_data_key();
    let data = make_data(size);
    let cfg = config(AeadAlgorithm::ChaCha20Poly1305);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encode_container(
                divan::black_box(&data),
                divan::black_box(&dek),
                "bench-object",
                &cfg,
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 1048576, 10485760])]
fn decode_aes_gcm(bencher: divan::Bencher, size: usize) {
    let dek = generate_data_key();
    let data = make_data(size);
    let encoded =
        encode_container(&data, &dek, "bench-object", &config(AeadAlgorithm::Aes256Gcm)).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            decode_container(
                divan::black_box(&encoded.bytes),
                divan::black_box(&dek),
                "bench-object",
            )
            .unwrap()
        });
}

fn main() {
    divan::main();
}
