#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};
use vlbin::prelude::*;

const N_INTS: usize = 2000;

fn encode_ints() -> Vec<u8> {
    let mut w = Writer::new(Vec::new(), Options::default());
    w.begin_list(N_INTS);
    for i in 0..N_INTS {
        w.write_i64((i as i64 - 1000) * 7919);
    }
    w.end_list();
    w.finish()
}

fn bench_encode(c: &mut Criterion) {
    c.bench_function(
        &format!("Encoding {} tiered integers", N_INTS),
        |b| b.iter(|| black_box(encode_ints())),
    );
}

fn bench_decode(c: &mut Criterion) {
    let enc = encode_ints();
    c.bench_function(
        &format!("Decoding {} tiered integers from {} bytes", N_INTS, enc.len()),
        |b| {
            b.iter(|| {
                let mut r = Reader::from_slice(&enc, Options::default());
                let len = r.begin_list().unwrap();
                let mut sum = 0i64;
                for _ in 0..len {
                    sum = sum.wrapping_add(r.read_i64().unwrap());
                }
                r.end_list().unwrap();
                black_box(sum)
            })
        },
    );
}

fn bench_bitfields(c: &mut Criterion) {
    c.bench_function("Packing 2000 mixed-width bitfields", |b| {
        b.iter(|| {
            let mut w = Writer::new(Vec::new(), Options::default());
            for i in 0..2000u64 {
                w.write_bitfield_u64(i, (i % 63 + 1) as u32);
            }
            black_box(w.finish())
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_bitfields);
criterion_main!(benches);
