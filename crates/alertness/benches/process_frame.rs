use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use alertness::{AlertnessConfig, AlertnessMonitor, FaceId, RatioSample};

const FRAME_NS: u64 = 33_333_333;

/// One minute of 30fps frames cycling through open, drowsy, closed and yawning
fn session_frames() -> Vec<RatioSample> {
    (0..1800_u64)
        .map(|i| {
            let eye = match (i / 150) % 4 {
                0 => 0.31,
                1 => 0.21,
                2 => 0.12,
                _ => 0.28,
            };
            let mouth = if i % 200 < 30 { 0.9 } else { 0.35 };
            RatioSample::new(eye, eye, mouth, i * FRAME_NS)
        })
        .collect()
}

fn benchmark_process_frame(c: &mut Criterion) {
    let frames = session_frames();
    let mut group = c.benchmark_group("process_frame");

    for faces in [1_u32, 4].iter() {
        group.bench_with_input(BenchmarkId::new("faces", faces), faces, |b, &faces| {
            b.iter(|| {
                let mut monitor = AlertnessMonitor::new(AlertnessConfig::default()).unwrap();
                for sample in &frames {
                    for face in 0..faces {
                        black_box(monitor.process_frame(FaceId(face), *sample).unwrap());
                    }
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_process_frame);
criterion_main!(benches);
