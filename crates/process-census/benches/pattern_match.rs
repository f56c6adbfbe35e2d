// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the whitelist pattern matcher.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use process_census::pattern;

fn bench_exact(c: &mut Criterion) {
    c.bench_function("pattern_exact", |b| {
        b.iter(|| pattern::matches(black_box("(systemd-journal)"), black_box("(systemd-journal)")))
    });
}

fn bench_starred(c: &mut Criterion) {
    c.bench_function("pattern_starred", |b| {
        b.iter(|| pattern::matches(black_box("(systemd*"), black_box("(systemd-timesyncd)")))
    });
}

fn bench_miss(c: &mut Criterion) {
    c.bench_function("pattern_miss", |b| {
        b.iter(|| pattern::matches(black_box("(a*b*c*d)"), black_box("(long-command-name-here)")))
    });
}

criterion_group!(benches, bench_exact, bench_starred, bench_miss);
criterion_main!(benches);
