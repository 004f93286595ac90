use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spacejam_loop::audio::{BusId, Mixer};
use spacejam_loop::messaging::Command;
use spacejam_loop::sequencer::LoopScheduler;
use spacejam_loop::synth::ScheduledVoice;
use spacejam_loop::synth::oscillator::{Oscillator, SimpleOscillator, WaveformType};

/// Benchmark oscillator generation (critical for real-time performance)
fn bench_oscillator_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("oscillator");
    let sample_rate = 48000.0;
    let buffer_size = 512;

    for waveform in [WaveformType::Sine, WaveformType::Square, WaveformType::Saw] {
        let mut osc = SimpleOscillator::new(waveform, sample_rate);
        osc.set_frequency(440.0);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", waveform)),
            &buffer_size,
            |b, &size| {
                b.iter(|| {
                    for _ in 0..size {
                        black_box(osc.next_sample());
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark laying one loop onto the timeline (control side cost per re-arm)
fn bench_schedule_loop(c: &mut Criterion) {
    let scheduler = LoopScheduler::default();
    let mut voices: Vec<ScheduledVoice> = Vec::with_capacity(256);

    c.bench_function("schedule_loop", |b| {
        b.iter(|| {
            voices.clear();
            black_box(scheduler.schedule_loop(&mut voices, black_box(1.0)));
        });
    });
}

/// Benchmark the mixer with a full loop queued (audio callback cost)
fn bench_mixer_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer");
    let sample_rate = 48000.0;

    let mut voices: Vec<ScheduledVoice> = Vec::new();
    LoopScheduler::default().schedule_loop(&mut voices, 0.0);

    for buffer_size in [64usize, 256, 512] {
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            &buffer_size,
            |b, &size| {
                let mut mixer = Mixer::new(sample_rate);
                let bus = BusId(1);
                mixer.apply(Command::CreateBus { bus, gain: 0.55 });
                for voice in &voices {
                    mixer.apply(Command::Schedule { bus, voice: *voice });
                }
                let mut block = vec![0.0_f32; size];

                b.iter(|| {
                    mixer.render(&mut block);
                    black_box(&block);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_oscillator_generation,
    bench_schedule_loop,
    bench_mixer_render
);
criterion_main!(benches);
