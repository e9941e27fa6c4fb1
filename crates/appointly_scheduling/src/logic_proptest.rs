#[cfg(test)]
mod tests {
    use crate::logic::{generate_slots, AvailabilityConfig, Slot, TimeWindow, WorkingHours};
    use appointly_common::models::BusyInterval;
    use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
    use chrono_tz::Tz;
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        // a Monday
        Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap()
    }

    fn build_config(
        start_hour: u32,
        end_hour: u32,
        days: &[i64],
        slot_minutes: i64,
    ) -> AvailabilityConfig {
        AvailabilityConfig::new(
            WorkingHours::new(
                NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap(),
            )
            .unwrap(),
            days.iter().copied(),
            slot_minutes,
            Tz::UTC,
        )
        .unwrap()
    }

    // Busy intervals as (offset minutes from base, length minutes)
    fn build_busy(raw: &[(i64, i64)]) -> Vec<BusyInterval> {
        raw.iter()
            .map(|(offset, len)| {
                let start = base() + Duration::minutes(*offset);
                BusyInterval::new(start, start + Duration::minutes(*len))
            })
            .collect()
    }

    // Every aligned candidate, checked one by one against every busy interval
    fn brute_force(
        window: &TimeWindow,
        config: &AvailabilityConfig,
        busy: &[BusyInterval],
        now: DateTime<Utc>,
    ) -> Vec<Slot> {
        let step = config.slot_duration();
        let mut out = Vec::new();
        let mut day = window.start().date_naive();
        while day <= window.end().date_naive() {
            if let Some((span_start, span_end)) = config.working_span(day) {
                if config.is_working_day(day.weekday()) {
                    let mut start = span_start;
                    while start + step <= span_end {
                        let end = start + step;
                        let free = busy.iter().all(|b| !b.overlaps(start, end));
                        if start >= now && start >= window.start() && end <= window.end() && free {
                            out.push(Slot { start, end });
                        }
                        start = end;
                    }
                }
            }
            day = day.succ_opt().unwrap();
        }
        out
    }

    fn config_strategy() -> impl Strategy<Value = AvailabilityConfig> {
        (
            0..12u32,
            13..24u32,
            proptest::collection::btree_set(0..7i64, 1..=7),
            prop_oneof![Just(15i64), Just(20), Just(30), Just(45), Just(60), 1..240i64],
        )
            .prop_map(|(start, end, days, slot)| {
                let days: Vec<i64> = days.into_iter().collect();
                build_config(start, end, &days, slot)
            })
    }

    fn busy_strategy() -> impl Strategy<Value = Vec<BusyInterval>> {
        proptest::collection::vec((0..(7 * 24 * 60i64), 1..300i64), 0..12)
            .prop_map(|raw| build_busy(&raw))
    }

    proptest! {
        #[test]
        fn test_slots_lie_in_working_hours_with_exact_duration(
            config in config_strategy(),
            days in 1..7i64,
        ) {
            let window = TimeWindow::new(base(), base() + Duration::days(days)).unwrap();
            let slots = generate_slots(&window, &config, &[], base());
            let hours = config.working_hours();

            for slot in &slots {
                prop_assert_eq!(slot.end - slot.start, config.slot_duration());
                prop_assert!(slot.start.time() >= hours.start);
                prop_assert_eq!(slot.end.date_naive(), slot.start.date_naive());
                prop_assert!(slot.end.time() <= hours.end);
                prop_assert!(config.is_working_day(slot.start.weekday()));
            }
        }

        #[test]
        fn test_adjacent_busy_interval_keeps_slot(
            config in config_strategy(),
            before in 1..120i64,
            after in 1..120i64,
        ) {
            let window = TimeWindow::new(base(), base() + Duration::days(7)).unwrap();
            let free = generate_slots(&window, &config, &[], base());
            prop_assume!(!free.is_empty());
            let target = free[free.len() / 2];

            let busy = [
                BusyInterval::new(target.start - Duration::minutes(before), target.start),
                BusyInterval::new(target.end, target.end + Duration::minutes(after)),
            ];
            let slots = generate_slots(&window, &config, &busy, base());
            prop_assert!(slots.contains(&target));
        }

        #[test]
        fn test_overlapping_busy_interval_removes_slot(
            config in config_strategy(),
            busy in busy_strategy(),
        ) {
            let window = TimeWindow::new(base(), base() + Duration::days(7)).unwrap();
            let slots = generate_slots(&window, &config, &busy, base());

            for slot in &slots {
                for b in &busy {
                    prop_assert!(
                        !b.overlaps(slot.start, slot.end),
                        "slot {:?} overlaps busy {:?}", slot, b
                    );
                }
            }
        }

        #[test]
        fn test_no_slot_starts_before_now(
            config in config_strategy(),
            now_offset in 0..(7 * 24 * 60i64),
        ) {
            let now = base() + Duration::minutes(now_offset);
            let window = TimeWindow::new(base(), base() + Duration::days(7)).unwrap();
            let slots = generate_slots(&window, &config, &[], now);

            prop_assert!(slots.iter().all(|s| s.start >= now));
        }

        #[test]
        fn test_generation_is_deterministic_and_ordered(
            config in config_strategy(),
            busy in busy_strategy(),
            now_offset in 0..(3 * 24 * 60i64),
        ) {
            let now = base() + Duration::minutes(now_offset);
            let window = TimeWindow::new(base(), base() + Duration::days(7)).unwrap();

            let first = generate_slots(&window, &config, &busy, now);
            let second = generate_slots(&window, &config, &busy, now);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.windows(2).all(|w| w[0].end <= w[1].start));
        }

        #[test]
        fn test_matches_brute_force(
            config in config_strategy(),
            busy in busy_strategy(),
            start_offset in 0..(24 * 60i64),
            days in 1..7i64,
        ) {
            let start = base() + Duration::minutes(start_offset);
            let window = TimeWindow::new(start, start + Duration::days(days)).unwrap();
            let now = start + Duration::minutes(start_offset % 90);

            prop_assert_eq!(
                generate_slots(&window, &config, &busy, now),
                brute_force(&window, &config, &busy, now)
            );
        }
    }
}
