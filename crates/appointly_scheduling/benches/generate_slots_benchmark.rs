use appointly_common::models::BusyInterval;
use appointly_scheduling::logic::{generate_slots, AvailabilityConfig, TimeWindow, WorkingHours};
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap()
}

fn weekday_config(slot_minutes: i64) -> AvailabilityConfig {
    AvailabilityConfig::new(
        WorkingHours::parse("09:00", "17:00").unwrap(),
        1..=5,
        slot_minutes,
        Tz::Europe__Zurich,
    )
    .unwrap()
}

// One-hour busy blocks every three hours from the window start
fn busy_periods(count: usize) -> Vec<BusyInterval> {
    (0..count)
        .map(|i| {
            let start = base() + Duration::hours(3 * i as i64 + 1);
            BusyInterval::new(start, start + Duration::hours(1))
        })
        .collect()
}

fn benchmark_generate_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_slots");
    let config = weekday_config(30);

    for days in [7i64, 30, 60] {
        let window = TimeWindow::new(base(), base() + Duration::days(days)).unwrap();
        group.bench_with_input(BenchmarkId::new("no_busy", days), &window, |b, window| {
            b.iter(|| generate_slots(black_box(window), black_box(&config), &[], base()))
        });
    }

    let window = TimeWindow::new(base(), base() + Duration::days(30)).unwrap();
    for count in [10usize, 100, 240] {
        let busy = busy_periods(count);
        group.bench_with_input(BenchmarkId::new("busy_30_days", count), &busy, |b, busy| {
            b.iter(|| generate_slots(black_box(&window), black_box(&config), black_box(busy), base()))
        });
    }

    let fine = weekday_config(5);
    group.bench_function("five_minute_slots_60_days", |b| {
        let window = TimeWindow::new(base(), base() + Duration::days(60)).unwrap();
        let busy = busy_periods(480);
        b.iter(|| generate_slots(black_box(&window), black_box(&fine), black_box(&busy), base()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_generate_slots);
criterion_main!(benches);
