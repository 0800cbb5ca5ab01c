/// Engine throughput benchmarks
///
/// Measures the hot loops of an analysis run on synthetic C text: include
/// extraction, syscall-name scanning of headers and call-site hunting.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use syscall_hunter::hunter::SyscallHunter;
use syscall_hunter::lexer;
use syscall_hunter::mapper::{MatchMode, SyscallHeaderMapper};
use syscall_hunter::{PrefixSet, SyscallCatalog};

fn synthetic_source(lines: usize) -> String {
    let mut src = String::new();
    for i in 0..lines {
        match i % 5 {
            0 => src.push_str(&format!("#include <sys/header_{}.h>\n", i)),
            1 => src.push_str("/* open() is mentioned in a comment */\n"),
            2 => src.push_str("    fd = open(path, O_RDONLY);\n"),
            3 => src.push_str("    n = read(fd, buf, sizeof buf);\n"),
            _ => src.push_str("    const char *msg = \"write(1)\";\n"),
        }
    }
    src
}

fn bench_include_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("include_lexer");
    for lines in [100usize, 1_000, 10_000] {
        let src = synthetic_source(lines);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &src, |b, src| {
            b.iter(|| black_box(lexer::includes(src).count()));
        });
    }
    group.finish();
}

fn bench_header_scan(c: &mut Criterion) {
    let catalog = SyscallCatalog::builtin();
    let src = synthetic_source(5_000);
    let mut group = c.benchmark_group("header_scan");
    group.throughput(Throughput::Bytes(src.len() as u64));

    for mode in [MatchMode::WordBoundary, MatchMode::Substring] {
        let mapper = SyscallHeaderMapper::new(&catalog, mode).expect("mapper");
        group.bench_function(format!("{:?}", mode), |b| {
            b.iter(|| black_box(mapper.syscalls_in(&src).len()));
        });
    }
    group.finish();
}

fn bench_call_hunter(c: &mut Criterion) {
    let catalog = SyscallCatalog::builtin();
    let hunter = SyscallHunter::new(&catalog).expect("hunter");
    let src = synthetic_source(5_000);

    let mut group = c.benchmark_group("call_hunter");
    group.throughput(Throughput::Bytes(src.len() as u64));
    group.bench_function("builtin_catalog", |b| {
        b.iter(|| black_box(hunter.hunt(&src)));
    });
    group.finish();
}

fn bench_prefix_set(c: &mut Criterion) {
    let keys: Vec<String> = (0..2_000)
        .map(|i| format!("/usr/include/sys/header_{}.h", i))
        .collect();

    c.bench_function("prefix_set_insert_2000", |b| {
        b.iter(|| {
            let mut set = PrefixSet::new();
            for key in &keys {
                set.insert(key);
            }
            black_box(set.len())
        });
    });
}

criterion_group!(
    benches,
    bench_include_lexer,
    bench_header_scan,
    bench_call_hunter,
    bench_prefix_set
);
criterion_main!(benches);
