#[cfg(test)]
mod tests {
    use crate::logic::{
        generate_slots, is_offered, merge_busy_periods, parse_time_zone, AvailabilityConfig, Slot,
        SlotConfigError, TimeWindow, WorkingHours,
    };
    use appointly_common::models::BusyInterval;
    use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
    use chrono_tz::Tz;

    // 2025-05-05 is a Monday
    fn monday(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, hour, minute, 0).unwrap()
    }

    fn weekday_config(slot_minutes: i64) -> AvailabilityConfig {
        AvailabilityConfig::new(
            WorkingHours::parse("09:00", "17:00").unwrap(),
            1..=5,
            slot_minutes,
            Tz::UTC,
        )
        .unwrap()
    }

    fn monday_window() -> TimeWindow {
        TimeWindow::new(monday(0, 0), monday(23, 59)).unwrap()
    }

    fn slot(start: DateTime<Utc>, minutes: i64) -> Slot {
        Slot {
            start,
            end: start + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_full_free_monday_has_sixteen_half_hour_slots() {
        let slots = generate_slots(&monday_window(), &weekday_config(30), &[], monday(8, 0));

        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first(), Some(&slot(monday(9, 0), 30)));
        assert_eq!(slots.last(), Some(&slot(monday(16, 30), 30)));
    }

    #[test]
    fn test_busy_half_hour_removes_exactly_one_slot() {
        let busy = [BusyInterval::new(monday(10, 0), monday(10, 30))];
        let slots = generate_slots(&monday_window(), &weekday_config(30), &busy, monday(8, 0));

        assert_eq!(slots.len(), 15);
        assert!(slots.contains(&slot(monday(9, 30), 30)));
        assert!(!slots.contains(&slot(monday(10, 0), 30)));
        assert!(slots.contains(&slot(monday(10, 30), 30)));
    }

    #[test]
    fn test_slots_before_now_are_dropped() {
        let slots = generate_slots(&monday_window(), &weekday_config(30), &[], monday(9, 15));

        assert!(!slots.contains(&slot(monday(9, 0), 30)));
        assert_eq!(slots.first(), Some(&slot(monday(9, 30), 30)));
    }

    #[test]
    fn test_slot_starting_exactly_now_is_kept() {
        let slots = generate_slots(&monday_window(), &weekday_config(30), &[], monday(9, 30));
        assert_eq!(slots.first(), Some(&slot(monday(9, 30), 30)));
    }

    #[test]
    fn test_weekend_contributes_no_slots() {
        let saturday = Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap();
        let window = TimeWindow::new(saturday, saturday + Duration::days(2)).unwrap();
        let busy = [BusyInterval::new(
            saturday + Duration::hours(10),
            saturday + Duration::hours(11),
        )];

        assert!(generate_slots(&window, &weekday_config(30), &[], saturday).is_empty());
        assert!(generate_slots(&window, &weekday_config(30), &busy, saturday).is_empty());
    }

    #[test]
    fn test_weekend_is_skipped_but_days_keep_advancing() {
        let friday = Utc.with_ymd_and_hms(2025, 5, 9, 0, 0, 0).unwrap();
        let window = TimeWindow::new(friday, friday + Duration::days(4)).unwrap();
        let slots = generate_slots(&window, &weekday_config(60), &[], friday);

        // Friday and Monday, eight hourly slots each
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[8].start, Utc.with_ymd_and_hms(2025, 5, 12, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_touching_busy_intervals_leave_neighbours_free() {
        let busy = [
            BusyInterval::new(monday(8, 0), monday(9, 0)),
            BusyInterval::new(monday(17, 0), monday(18, 0)),
        ];
        let slots = generate_slots(&monday_window(), &weekday_config(30), &busy, monday(0, 0));

        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn test_partial_overlap_blocks_the_slot() {
        let busy = [BusyInterval::new(monday(9, 20), monday(9, 40))];
        let slots = generate_slots(&monday_window(), &weekday_config(30), &busy, monday(0, 0));

        assert!(!slots.contains(&slot(monday(9, 0), 30)));
        assert!(!slots.contains(&slot(monday(9, 30), 30)));
        assert_eq!(slots.len(), 14);
    }

    #[test]
    fn test_uneven_duration_drops_trailing_piece() {
        let slots = generate_slots(&monday_window(), &weekday_config(45), &[], monday(0, 0));

        // 8h / 45min = 10 whole slots, the last ending at 16:30
        assert_eq!(slots.len(), 10);
        assert_eq!(slots.last().map(|s| s.end), Some(monday(16, 30)));
    }

    #[test]
    fn test_window_cuts_the_day() {
        let window = TimeWindow::new(monday(0, 0), monday(12, 0)).unwrap();
        let slots = generate_slots(&window, &weekday_config(30), &[], monday(0, 0));

        assert_eq!(slots.len(), 6);
        assert!(slots.iter().all(|s| s.end <= monday(12, 0)));
    }

    #[test]
    fn test_working_hours_follow_seller_time_zone() {
        let zurich = parse_time_zone("Europe/Zurich").unwrap();
        let config = AvailabilityConfig::new(
            WorkingHours::parse("09:00", "10:00").unwrap(),
            [1],
            60,
            zurich,
        )
        .unwrap();
        let window = TimeWindow::new(monday(0, 0), monday(23, 0)).unwrap();
        let slots = generate_slots(&window, &config, &[], monday(0, 0));

        // CEST is UTC+2 in May
        assert_eq!(slots, vec![slot(monday(7, 0), 60)]);
    }

    #[test]
    fn test_spring_forward_day_keeps_working_hours_length() {
        let zurich = parse_time_zone("Europe/Zurich").unwrap();
        let config =
            AvailabilityConfig::new(WorkingHours::parse("01:00", "05:00").unwrap(), [0], 60, zurich)
                .unwrap();
        // 2025-03-30 02:00 local does not exist in Zurich
        let sunday = Utc.with_ymd_and_hms(2025, 3, 29, 12, 0, 0).unwrap();
        let window = TimeWindow::new(sunday, sunday + Duration::days(1)).unwrap();
        let slots = generate_slots(&window, &config, &[], sunday);

        // 01:00 CET = 00:00 UTC, 05:00 CEST = 03:00 UTC
        assert_eq!(slots.len(), 3);
        assert_eq!(
            slots.first().map(|s| s.start),
            Some(Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unsorted_busy_input_is_handled() {
        let busy = [
            BusyInterval::new(monday(15, 0), monday(16, 0)),
            BusyInterval::new(monday(9, 0), monday(10, 0)),
            BusyInterval::new(monday(12, 0), monday(12, 30)),
        ];
        let slots = generate_slots(&monday_window(), &weekday_config(30), &busy, monday(0, 0));

        assert_eq!(slots.len(), 11);
        assert!(slots.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_merge_busy_periods_joins_overlapping_and_touching() {
        let merged = merge_busy_periods(&[
            BusyInterval::new(monday(11, 0), monday(12, 0)),
            BusyInterval::new(monday(9, 0), monday(10, 0)),
            BusyInterval::new(monday(10, 0), monday(10, 30)),
            BusyInterval::new(monday(11, 30), monday(11, 45)),
            BusyInterval::new(monday(14, 0), monday(13, 0)),
        ]);

        assert_eq!(
            merged,
            vec![
                BusyInterval::new(monday(9, 0), monday(10, 30)),
                BusyInterval::new(monday(11, 0), monday(12, 0)),
            ]
        );
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let hours = WorkingHours::parse("09:00", "17:00").unwrap();

        assert!(matches!(
            WorkingHours::parse("17:00", "09:00"),
            Err(SlotConfigError::InvalidWorkingHours { .. })
        ));
        assert!(matches!(
            WorkingHours::parse("9am", "17:00"),
            Err(SlotConfigError::InvalidTime(_))
        ));
        assert_eq!(
            AvailabilityConfig::new(hours, 1..=5, 0, Tz::UTC),
            Err(SlotConfigError::NonPositiveSlotDuration(0))
        );
        assert_eq!(
            AvailabilityConfig::new(hours, [1, 7], 30, Tz::UTC),
            Err(SlotConfigError::InvalidWeekday(7))
        );
        assert_eq!(
            AvailabilityConfig::new(hours, Vec::<i64>::new(), 30, Tz::UTC),
            Err(SlotConfigError::NoWorkingDays)
        );
        assert!(matches!(
            parse_time_zone("Mars/Olympus"),
            Err(SlotConfigError::UnknownTimeZone(_))
        ));
        assert!(matches!(
            TimeWindow::new(monday(10, 0), monday(10, 0)),
            Err(SlotConfigError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_working_hours_accept_seconds() {
        let hours = WorkingHours::parse("08:30:00", "12:00").unwrap();
        assert_eq!(hours.start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(hours.to_string(), "08:30-12:00");
    }

    #[test]
    fn test_from_now_has_at_least_one_day() {
        let window = TimeWindow::from_now(monday(8, 0), 0);
        assert_eq!(window.end() - window.start(), Duration::days(1));
    }

    #[test]
    fn test_only_generated_slots_are_offered() {
        let config = weekday_config(30);
        let now = monday(8, 0);

        assert!(is_offered(&config, slot(monday(9, 0), 30), now));
        assert!(is_offered(&config, slot(monday(16, 30), 30), now));
        // off the grid, wrong length, outside hours, weekend, past
        assert!(!is_offered(&config, slot(monday(9, 15), 30), now));
        assert!(!is_offered(&config, slot(monday(9, 0), 60), now));
        assert!(!is_offered(&config, slot(monday(17, 0), 30), now));
        let saturday = Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap();
        assert!(!is_offered(&config, slot(saturday, 30), now));
        assert!(!is_offered(&config, slot(monday(9, 0), 30), monday(9, 1)));
    }
}
