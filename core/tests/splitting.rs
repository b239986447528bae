//! Submission validation and splitting tests.

use chrono::{NaiveDate, NaiveDateTime};
use visitor_core::{
    allocator::IdAllocator,
    record::{AgeBands, TicketCategory, VisitOccurrence, VisitReason},
    submission::{validate_and_split, Submission, TicketCounts},
    ValidationError,
};

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

/// Five people from Vilnius: three standard tickets, two seniors.
fn vilnius() -> Submission {
    Submission {
        visit_date:       NaiveDate::from_ymd_opt(2026, 7, 4).unwrap(),
        origin_city:      "Vilnius".into(),
        visit_reason:     VisitReason::ParkVisit,
        visit_occurrence: VisitOccurrence::First,
        duration_minutes: 90,
        total_visitors:   5,
        tickets: TicketCounts { standard: 3, senior: 2, ..Default::default() },
        ages: AgeBands {
            age_under_7: 0,
            age_7_19:    1,
            age_20_35:   2,
            age_36_60:   1,
            age_61_plus: 1,
        },
        comment: "Enjoyed the LC exhibition".into(),
    }
}

#[test]
fn vilnius_group_splits_into_standard_and_senior() {
    let mut ids = IdAllocator::starting_at(7);
    let records = validate_and_split(&vilnius(), at("2026-07-04T14:30:00"), &mut ids).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].ticket_category, TicketCategory::Standard);
    assert_eq!(records[0].visitor_count, 3);
    assert_eq!(records[1].ticket_category, TicketCategory::Senior);
    assert_eq!(records[1].visitor_count, 2);

    assert_eq!(records[0].record_id, 7);
    assert_eq!(records[1].record_id, 8);
    assert_eq!(ids.peek(), 9);

    for r in &records {
        assert_eq!(r.origin_city, "Vilnius");
        assert_eq!(r.visit_reason, VisitReason::ParkVisit);
        assert_eq!(r.visit_occurrence, VisitOccurrence::First);
        assert_eq!(r.ages, vilnius().ages);
        assert_eq!(r.duration_minutes, Some(90));
        assert_eq!(r.comment, "Enjoyed the LC exhibition");
        assert_eq!(r.recorded_at, at("2026-07-04T14:30:00"));
    }
}

/// Slice counts add up to the group size; every slice carries the full
/// group age breakdown, which also adds up to the group size.
#[test]
fn slices_preserve_group_totals() {
    let mut sub = vilnius();
    sub.total_visitors = 15;
    sub.tickets = TicketCounts { standard: 4, student_pupil: 3, senior: 2, free: 5, other: 1 };
    sub.ages = AgeBands { age_under_7: 5, age_7_19: 3, age_20_35: 4, age_36_60: 2, age_61_plus: 1 };

    let mut ids = IdAllocator::starting_at(1);
    let records = validate_and_split(&sub, at("2026-07-04T10:00:00"), &mut ids).unwrap();

    assert_eq!(records.len(), 5);
    let visitors: u32 = records.iter().map(|r| r.visitor_count).sum();
    assert_eq!(visitors, 15);
    for r in &records {
        assert_eq!(r.ages.sum(), 15);
    }

    let order: Vec<TicketCategory> = records.iter().map(|r| r.ticket_category).collect();
    assert_eq!(order, TicketCategory::ALL.to_vec());
    let ids_out: Vec<u64> = records.iter().map(|r| r.record_id).collect();
    assert_eq!(ids_out, vec![1, 2, 3, 4, 5]);
}

#[test]
fn zero_count_categories_produce_no_rows() {
    let mut sub = vilnius();
    sub.tickets = TicketCounts { free: 5, ..Default::default() };

    let mut ids = IdAllocator::starting_at(1);
    let records = validate_and_split(&sub, at("2026-07-04T10:00:00"), &mut ids).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ticket_category, TicketCategory::Free);
    assert_eq!(records[0].visitor_count, 5);
}

#[test]
fn ticket_mismatch_is_rejected_without_drawing_ids() {
    let mut sub = vilnius();
    sub.tickets = TicketCounts { standard: 2, senior: 2, ..Default::default() };

    let mut ids = IdAllocator::starting_at(3);
    let err = validate_and_split(&sub, at("2026-07-04T10:00:00"), &mut ids).unwrap_err();

    assert_eq!(err, ValidationError::TicketCountMismatch { ticket_sum: 4, declared_total: 5 });
    assert_eq!(ids.peek(), 3);
}

#[test]
fn age_mismatch_is_rejected() {
    let mut sub = vilnius();
    sub.ages.age_61_plus = 3;

    let mut ids = IdAllocator::starting_at(1);
    let err = validate_and_split(&sub, at("2026-07-04T10:00:00"), &mut ids).unwrap_err();

    assert_eq!(err, ValidationError::AgeCountMismatch { age_sum: 7, declared_total: 5 });
    assert_eq!(err.kind(), "age_count_mismatch");
}

/// Ticket counts are checked before ages when both are wrong.
#[test]
fn ticket_check_runs_before_age_check() {
    let mut sub = vilnius();
    sub.tickets.standard = 10;
    sub.ages.age_under_7 = 10;

    let err = sub.validate().unwrap_err();
    assert!(matches!(err, ValidationError::TicketCountMismatch { .. }));
}

/// A blank city is reported even when the counts are also inconsistent.
#[test]
fn blank_city_is_rejected_before_sum_checks() {
    let mut sub = vilnius();
    sub.origin_city = "   ".into();
    sub.tickets.standard = 0;
    sub.ages.age_20_35 = 0;

    let mut ids = IdAllocator::starting_at(1);
    let err = validate_and_split(&sub, at("2026-07-04T10:00:00"), &mut ids).unwrap_err();
    assert_eq!(err, ValidationError::EmptyCity);
    assert_eq!(err.to_string(), "Please enter the visitors' city");
}

#[test]
fn empty_group_is_rejected() {
    let mut sub = vilnius();
    sub.total_visitors = 0;
    sub.tickets = TicketCounts::default();
    sub.ages = AgeBands::default();

    assert_eq!(sub.validate().unwrap_err(), ValidationError::EmptyGroup);
}

#[test]
fn zero_duration_is_stored_as_absent() {
    let mut sub = vilnius();
    sub.duration_minutes = 0;

    let mut ids = IdAllocator::starting_at(1);
    let records = validate_and_split(&sub, at("2026-07-04T10:00:00"), &mut ids).unwrap();
    assert!(records.iter().all(|r| r.duration_minutes.is_none()));
}

#[test]
fn city_and_comment_are_trimmed_and_timestamp_truncated() {
    let mut sub = vilnius();
    sub.origin_city = "  Kaunas ".into();
    sub.comment = "\n dogs welcome \n".into();

    let stamped = at("2026-07-04T10:00:05")
        .checked_add_signed(chrono::Duration::milliseconds(750))
        .unwrap();
    let mut ids = IdAllocator::starting_at(1);
    let records = validate_and_split(&sub, stamped, &mut ids).unwrap();

    assert_eq!(records[0].origin_city, "Kaunas");
    assert_eq!(records[0].comment, "dogs welcome");
    assert_eq!(records[0].recorded_at, at("2026-07-04T10:00:05"));
}

/// Submissions arrive as JSON from the form; missing optional keys default.
#[test]
fn submission_deserializes_from_form_json() {
    let json = r#"{
        "visit_date": "2026-07-04",
        "origin_city": "Vilnius",
        "visit_reason": "Park visit",
        "visit_occurrence": "Second visit",
        "total_visitors": 2,
        "tickets": { "student_pupil": 2 },
        "ages": { "age_7_19": 2 }
    }"#;
    let sub: Submission = serde_json::from_str(json).unwrap();

    assert_eq!(sub.visit_occurrence, VisitOccurrence::Second);
    assert_eq!(sub.duration_minutes, 0);
    assert_eq!(sub.tickets.student_pupil, 2);
    assert_eq!(sub.comment, "");
    assert!(sub.validate().is_ok());
}
