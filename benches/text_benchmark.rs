// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use criterion::{criterion_group, criterion_main, Criterion};
use kaiwa_tutor::text::{japanese_words, safe_japanese_string, segment};
use serde_json::json;
use std::hint::black_box;

fn benchmark_text(c: &mut Criterion) {
    // A typical tutor reply with kanji, kana, punctuation and an English gloss
    let reply = "すみません、東京駅までの切符を二枚ください。 電車 は 何時 に 出発 しますか？ \
                 (Excuse me, two tickets to Tokyo Station please.)";
    let long_reply = reply.repeat(50);
    let stored = json!(reply);

    let mut group = c.benchmark_group("japanese_text");

    group.bench_function("safe_japanese_string", |b| {
        b.iter(|| safe_japanese_string(black_box(&stored), ""))
    });

    group.bench_function("japanese_words_short", |b| {
        b.iter(|| japanese_words(black_box(reply)))
    });

    group.bench_function("japanese_words_long", |b| {
        b.iter(|| japanese_words(black_box(&long_reply)))
    });

    group.bench_function("segment_short", |b| b.iter(|| segment(black_box(reply))));

    group.finish();
}

criterion_group!(benches, benchmark_text);
criterion_main!(benches);
