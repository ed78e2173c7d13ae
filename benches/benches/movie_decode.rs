use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use swiff_benches::{generate_flat_movie, generate_nested_movie, sound_payload};
use swiff_types::codec::{BitReader, MovieWriter};
use swiff_types::movie::Movie;
use swiff_types::sound::SoundDefinition;
use swiff_types::sound::adpcm::decode_adpcm;
use swiff_types::sound::pcm::decode_sound;
use swiff_types::tag::{TagCode, TagIter};

/// Benchmark a full parse of flat movies of increasing size
fn bench_parse(c: &mut Criterion) {
	let mut group = c.benchmark_group("movie_parse");

	for (shapes, frames) in [(10u16, 10u16), (100, 50), (500, 100)] {
		let data = generate_flat_movie(shapes, frames);
		group.throughput(Throughput::Bytes(data.len() as u64));
		group.bench_with_input(
			BenchmarkId::new("flat", format!("{shapes}x{frames}")),
			&data,
			|b, data| {
				b.iter(|| {
					let movie = Movie::from_bytes(black_box(data));
					black_box(movie)
				});
			},
		);
	}

	group.finish();
}

/// Benchmark tag iteration separately
fn bench_tag_iteration(c: &mut Criterion) {
	let mut group = c.benchmark_group("movie_tags");

	let data = generate_flat_movie(100, 50);
	let Ok((_, offset)) = swiff_types::header::Header::parse(&data) else {
		eprintln!("Warning: Could not parse generated header");
		return;
	};
	let tags = &data[offset..];
	group.throughput(Throughput::Bytes(tags.len() as u64));
	group.bench_function("iterate", |b| {
		b.iter(|| TagIter::new(black_box(tags)).filter(Result::is_ok).count());
	});

	group.finish();
}

/// Benchmark frame resolution on flat and nested timelines
fn bench_resolve(c: &mut Criterion) {
	let mut group = c.benchmark_group("movie_resolve");

	let flat = match Movie::from_bytes(&generate_flat_movie(200, 60)) {
		Ok(movie) => movie,
		Err(e) => {
			eprintln!("Warning: Could not parse flat movie: {e}");
			return;
		}
	};
	group.throughput(Throughput::Elements(200));
	group.bench_function("flat_last_frame", |b| {
		b.iter(|| black_box(flat.resolve_frame(black_box(59))));
	});

	for depth in [4u16, 16, 48] {
		let nested = match Movie::from_bytes(&generate_nested_movie(depth, 24)) {
			Ok(movie) => movie,
			Err(e) => {
				eprintln!("Warning: Could not parse nested movie: {e}");
				continue;
			}
		};
		group.throughput(Throughput::Elements(u64::from(depth)));
		group.bench_with_input(BenchmarkId::new("nested", depth), &nested, |b, movie| {
			b.iter(|| black_box(movie.resolve_frame(black_box(12))));
		});
	}

	group.finish();
}

/// Benchmark sound decoding
fn bench_sound(c: &mut Criterion) {
	let mut group = c.benchmark_group("sound_decode");

	let payload = sound_payload(1, 44100);
	let sound = match SoundDefinition::from_reader(&mut BitReader::new(&payload)) {
		Ok(sound) => sound,
		Err(e) => {
			eprintln!("Warning: Could not decode sound payload: {e}");
			return;
		}
	};
	group.throughput(Throughput::Elements(u64::from(sound.sample_count)));
	group.bench_function("pcm_16bit", |b| {
		b.iter(|| black_box(decode_sound(black_box(&sound), None)));
	});

	// 4-bit ADPCM: code size byte then one packet of header plus codes
	let mut adpcm = vec![0b1000_0000];
	adpcm.resize(2 + 4096 * 4 / 8 + 3, 0x5A);
	group.throughput(Throughput::Elements(4096));
	group.bench_function("adpcm_4bit", |b| {
		b.iter(|| black_box(decode_adpcm(black_box(&adpcm), 1, None)));
	});

	group.finish();
}

/// Benchmark writing a movie
fn bench_write(c: &mut Criterion) {
	let mut group = c.benchmark_group("movie_write");

	group.bench_function("empty_frames", |b| {
		b.iter(|| {
			let mut writer = MovieWriter::new(10);
			for _ in 0..1000 {
				writer.tag(TagCode::ShowFrame, &[]);
			}
			black_box(writer.finish())
		});
	});

	group.finish();
}

criterion_group!(benches, bench_parse, bench_tag_iteration, bench_resolve, bench_sound, bench_write);
criterion_main!(benches);
