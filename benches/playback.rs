//! Playback throughput over a synthetic animation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use gif_player::Player;

/// Full-canvas frames over a 4-entry global table, each with a 100 ms delay.
fn synthetic_gif(width: u16, height: u16, frames: usize) -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&[0b1000_0001, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 255, 255, 255, 200, 30, 30, 30, 30, 200]);
    for i in 0..frames {
        bytes.extend_from_slice(&[0x21, 0xF9, 4, 0b0000_0100, 10, 0, 0, 0]);
        bytes.push(0x2C);
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.push(0);
        bytes.push(2);
        let pixels: Vec<u8> = (0..usize::from(width) * usize::from(height))
            .map(|p| ((p + i) % 4) as u8)
            .collect();
        let mut data = Vec::new();
        let mut encoder = weezl::encode::Encoder::new(weezl::BitOrder::Lsb, 2);
        let consumed = encoder.into_vec(&mut data).encode_all(&pixels).consumed_out;
        data.truncate(consumed);
        for chunk in data.chunks(255) {
            bytes.push(chunk.len() as u8);
            bytes.extend_from_slice(chunk);
        }
        bytes.push(0);
    }
    bytes.push(0x3B);
    bytes
}

fn playback(c: &mut Criterion) {
    let bytes = synthetic_gif(64, 64, 8);

    c.bench_function("advance 64x64, 8 frames", |b| {
        let mut player = Player::from_bytes(bytes.clone()).unwrap();
        let mut canvas = vec![0u8; player.buffer_size()];
        let mut now = 0u64;
        b.iter(|| {
            now += 1000;
            black_box(player.advance(&mut canvas, now));
        });
    });

    c.bench_function("open and scan 64x64, 8 frames", |b| {
        b.iter(|| Player::from_bytes(black_box(bytes.clone())).unwrap());
    });
}

criterion_group!(benches, playback);
criterion_main!(benches);
