use cadence_core::scheduler::{
    schedule_next_review, ScheduleInput, GRADUATING_INTERVAL_DAYS, MAX_EASE_FACTOR,
    MIN_EASE_FACTOR,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

fn arb_now() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn arb_input(score: impl Strategy<Value = f64>) -> impl Strategy<Value = ScheduleInput> {
    (score, -10.0f64..10.0, -50.0f64..20_000.0, -5.0f64..60.0, arb_now()).prop_map(
        |(recall_score, ease_factor, interval_days, repetition_count, now)| ScheduleInput {
            recall_score,
            ease_factor,
            interval_days,
            repetition_count,
            now,
        },
    )
}

/// Ease the scheduler should arrive at, before output rounding
fn expected_ease(score: f64, ease: f64) -> f64 {
    let score = score.clamp(0.0, 5.0);
    let penalty = 5.0 - score;
    let ease = ease.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR);
    (ease + (0.1 - penalty * (0.08 + penalty * 0.02))).clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)
}

proptest! {
    #[test]
    fn ease_always_within_bounds(input in arb_input(-1000.0f64..1000.0)) {
        let result = schedule_next_review(&input);
        prop_assert!(result.ease_factor >= MIN_EASE_FACTOR);
        prop_assert!(result.ease_factor <= MAX_EASE_FACTOR);
    }

    #[test]
    fn interval_always_at_least_one_day(input in arb_input(-10.0f64..10.0)) {
        let result = schedule_next_review(&input);
        prop_assert!(result.interval_days >= 1);
    }

    #[test]
    fn lapse_resets_streak(input in arb_input(-20.0f64..3.0)) {
        let result = schedule_next_review(&input);
        prop_assert_eq!(result.interval_days, 1);
        prop_assert_eq!(result.repetition_count, 0);
    }

    #[test]
    fn pass_follows_learning_steps_then_grows(input in arb_input(3.0f64..=5.0)) {
        let result = schedule_next_review(&input);
        let previous_reps = input.repetition_count.round().max(0.0) as u32;
        let previous_interval = input.interval_days.round().max(0.0) as u32;
        prop_assert_eq!(result.repetition_count, previous_reps + 1);

        let expected_interval = match previous_reps + 1 {
            1 => 1,
            2 => GRADUATING_INTERVAL_DAYS,
            _ => (f64::from(previous_interval) * expected_ease(input.recall_score, input.ease_factor))
                .round()
                .max(1.0) as u32,
        };
        prop_assert_eq!(result.interval_days, expected_interval);
    }

    #[test]
    fn mature_pass_keeps_growing_long_intervals(
        score in 3.0f64..=5.0,
        ease in 1.3f64..=3.5,
        interval in 10_000u32..1_000_000,
        reps in 2u32..40,
        now in arb_now(),
    ) {
        let result = schedule_next_review(&ScheduleInput {
            recall_score: score,
            ease_factor: ease,
            interval_days: f64::from(interval),
            repetition_count: f64::from(reps),
            now,
        });
        prop_assert!(result.interval_days > interval);
    }

    #[test]
    fn next_review_is_now_plus_interval(input in arb_input(-1.0f64..6.0)) {
        let result = schedule_next_review(&input);
        prop_assert_eq!(
            result.next_review_at,
            input.now + Duration::days(i64::from(result.interval_days))
        );
    }

    #[test]
    fn identical_inputs_give_identical_output(input in arb_input(-1.0f64..6.0)) {
        let a = schedule_next_review(&input);
        let b = schedule_next_review(&input);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn ease_is_reported_to_two_decimals(input in arb_input(0.0f64..=5.0)) {
        let result = schedule_next_review(&input);
        let cents = result.ease_factor * 100.0;
        prop_assert!((cents - cents.round()).abs() < 1e-6);
    }

    #[test]
    fn higher_pass_never_shortens_a_mature_interval(
        low in 3.0f64..=5.0,
        bump in 0.0f64..=2.0,
        ease in 1.3f64..=3.5,
        interval in 0u32..5_000,
        reps in 2u32..40,
        now in arb_now(),
    ) {
        let high = (low + bump).min(5.0);
        let base = ScheduleInput {
            recall_score: low,
            ease_factor: ease,
            interval_days: f64::from(interval),
            repetition_count: f64::from(reps),
            now,
        };
        let weaker = schedule_next_review(&base);
        let stronger = schedule_next_review(&ScheduleInput { recall_score: high, ..base });
        prop_assert!(weaker.interval_days <= stronger.interval_days);
        prop_assert!(weaker.ease_factor <= stronger.ease_factor);
    }

    #[test]
    fn feeding_output_back_never_drifts(
        score in 0.0f64..=5.0,
        start_ease in -5.0f64..10.0,
        rounds in 1usize..60,
        now in arb_now(),
    ) {
        let mut input = ScheduleInput {
            recall_score: score,
            ease_factor: start_ease,
            interval_days: 0.0,
            repetition_count: 0.0,
            now,
        };
        for _ in 0..rounds {
            let result = schedule_next_review(&input);
            prop_assert!(result.ease_factor >= MIN_EASE_FACTOR);
            prop_assert!(result.ease_factor <= MAX_EASE_FACTOR);
            input = ScheduleInput {
                recall_score: score,
                ease_factor: result.ease_factor,
                interval_days: f64::from(result.interval_days),
                repetition_count: f64::from(result.repetition_count),
                now,
            };
        }
    }
}
