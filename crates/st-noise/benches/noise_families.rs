// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use criterion::AxisScale;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, PlotConfiguration};
use st_noise::{prepare_noise, FieldSpec, PrepareOptions};

#[track_caller]
fn unwrap_ok<T, E: core::fmt::Debug>(context: &str, result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("{context}: {error:?}"),
    }
}

fn bench_noise_families(c: &mut Criterion) {
    st_noise::telemetry::init_tracing();
    let latent = unwrap_ok("latent shape", FieldSpec::from_dims(&[1, 4, 32, 32]));
    let mut group = c.benchmark_group("noise_families");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for noise_type in [
        "gaussian",
        "pink",
        "wavelet",
        "perlin",
        "studentt",
        "pyramid-bilinear",
        "hires-pyramid-bicubic",
        "pyramid-cascade_B",
        "brownian",
    ] {
        group.bench_function(noise_type, |b| {
            b.iter_batched(
                || PrepareOptions::default(),
                |options| {
                    black_box(unwrap_ok(
                        noise_type,
                        prepare_noise(&latent, 7, noise_type, &options),
                    ));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("gaussian_variation", |b| {
        b.iter_batched(
            || PrepareOptions::default().with_variation(11, 0.3),
            |options| {
                black_box(unwrap_ok(
                    "variation",
                    prepare_noise(&latent, 7, "gaussian", &options),
                ));
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_noise_families);
criterion_main!(benches);
